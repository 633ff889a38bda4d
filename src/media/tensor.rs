//! Host image tensors and their conversions to `image` buffers and base64 PNG.

use crate::{Error, Result};
use base64::Engine as _;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// Side length of the placeholder returned when no image is available.
pub const PLACEHOLDER_SIZE: u32 = 512;

/// Batch of RGB frames laid out as `[batch, height, width, 3]`, values in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    batch: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl ImageTensor {
    pub const CHANNELS: usize = 3;

    pub fn new(batch: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        let expected = batch * height * width * Self::CHANNELS;
        if data.len() != expected {
            return Err(Error::InvalidInput(format!(
                "tensor data has {} values, expected {} for [{}, {}, {}, 3]",
                data.len(),
                expected,
                batch,
                height,
                width
            )));
        }
        Ok(Self {
            batch,
            height,
            width,
            data,
        })
    }

    /// Solid-color single frame.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self::from_rgb(&RgbImage::from_pixel(width, height, image::Rgb(color)))
    }

    /// The 512x512 black placeholder.
    pub fn placeholder() -> Self {
        Self::filled(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, [0, 0, 0])
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    fn frame_len(&self) -> usize {
        self.height * self.width * Self::CHANNELS
    }

    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        if index >= self.batch {
            return None;
        }
        let len = self.frame_len();
        Some(&self.data[index * len..(index + 1) * len])
    }

    pub fn from_rgb(image: &RgbImage) -> Self {
        let data = image.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Self {
            batch: 1,
            height: image.height() as usize,
            width: image.width() as usize,
            data,
        }
    }

    /// Converts any decoded image to a single-frame RGB tensor.
    pub fn from_image(image: &DynamicImage) -> Self {
        Self::from_rgb(&image.to_rgb8())
    }

    /// Stacks same-sized frames into one batch.
    pub fn from_frames(frames: &[RgbImage]) -> Result<Self> {
        let first = frames
            .first()
            .ok_or_else(|| Error::InvalidInput("no frames to stack".to_string()))?;
        let (width, height) = first.dimensions();
        if frames.iter().any(|f| f.dimensions() != (width, height)) {
            return Err(Error::InvalidInput(
                "frames in a batch must share dimensions".to_string(),
            ));
        }
        let data = frames
            .iter()
            .flat_map(|f| f.as_raw().iter().map(|&v| v as f32 / 255.0))
            .collect();
        Self::new(frames.len(), height as usize, width as usize, data)
    }

    fn frame_to_rgb(&self, frame: &[f32]) -> Option<RgbImage> {
        let raw = frame
            .iter()
            .map(|v| (v * 255.0).clamp(0.0, 255.0) as u8)
            .collect();
        RgbImage::from_raw(self.width as u32, self.height as u32, raw)
    }

    /// First frame as an RGB image.
    pub fn to_rgb(&self) -> Option<RgbImage> {
        self.frame(0).and_then(|f| self.frame_to_rgb(f))
    }

    /// Every frame of the batch.
    pub fn to_frames(&self) -> Vec<RgbImage> {
        (0..self.batch)
            .filter_map(|i| self.frame(i).and_then(|f| self.frame_to_rgb(f)))
            .collect()
    }
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn png_base64(image: &RgbImage) -> Result<String> {
    Ok(base64::engine::general_purpose::STANDARD.encode(encode_png(image)?))
}

/// First frame of `tensor` as base64 PNG, the inline attachment format.
pub fn tensor_to_png_base64(tensor: &ImageTensor) -> Result<String> {
    let image = tensor
        .to_rgb()
        .ok_or_else(|| Error::InvalidInput("image tensor is empty".to_string()))?;
    png_base64(&image)
}

pub fn decode_base64_image(data: &str) -> Result<DynamicImage> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Decodes encoded image bytes (PNG, JPEG, WebP, ...) into a tensor.
pub fn bytes_to_tensor(bytes: &[u8]) -> Result<ImageTensor> {
    Ok(ImageTensor::from_image(&image::load_from_memory(bytes)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    /// Shrink so neither side exceeds the limit; smaller images are untouched.
    MaxSide(u32),
    /// Shrink to fit inside the box, keeping the aspect ratio.
    Fit(u32, u32),
    /// Stretch to exactly this size.
    Exact(u32, u32),
}

pub fn resize_image(image: &DynamicImage, mode: Resize) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    match mode {
        Resize::MaxSide(max) if width > max || height > max => {
            let ratio = max as f64 / width.max(height) as f64;
            image.resize_exact(
                ((width as f64 * ratio) as u32).max(1),
                ((height as f64 * ratio) as u32).max(1),
                FilterType::Lanczos3,
            )
        }
        Resize::Fit(w, h) if width > w || height > h => image.resize(w, h, FilterType::Lanczos3),
        Resize::Exact(w, h) => image.resize_exact(w, h, FilterType::Lanczos3),
        _ => image.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_black_512() {
        let tensor = ImageTensor::placeholder();
        assert_eq!(tensor.batch(), 1);
        assert_eq!(tensor.height(), 512);
        assert_eq!(tensor.width(), 512);
        assert!(tensor.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_new_validates_length() {
        assert!(ImageTensor::new(1, 2, 2, vec![0.0; 12]).is_ok());
        assert!(matches!(
            ImageTensor::new(1, 2, 2, vec![0.0; 11]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tensor_to_rgb_scales_and_clamps() {
        let tensor = ImageTensor::new(1, 1, 2, vec![1.0, 0.5, 0.0, 2.0, -1.0, 0.25]).unwrap();
        let image = tensor.to_rgb().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 127, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 0, 63]);
    }

    #[test]
    fn test_rgb_to_tensor_normalizes() {
        let image = RgbImage::from_pixel(2, 1, image::Rgb([255, 0, 51]));
        let tensor = ImageTensor::from_rgb(&image);
        assert_eq!(tensor.data(), &[1.0, 0.0, 0.2, 1.0, 0.0, 0.2]);
    }

    #[test]
    fn test_batch_frames() {
        let red = RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]));
        let blue = RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 255]));
        let tensor = ImageTensor::from_frames(&[red.clone(), blue.clone()]).unwrap();

        assert_eq!(tensor.batch(), 2);
        assert_eq!(tensor.to_frames(), vec![red, blue]);
        assert!(tensor.frame(2).is_none());
    }

    #[test]
    fn test_mismatched_frames_rejected() {
        let a = RgbImage::new(2, 2);
        let b = RgbImage::new(3, 2);
        assert!(ImageTensor::from_frames(&[a, b]).is_err());
        assert!(ImageTensor::from_frames(&[]).is_err());
    }

    #[test]
    fn test_png_base64_decodes_back_to_same_pixels() {
        let tensor = ImageTensor::filled(4, 3, [10, 20, 30]);
        let b64 = tensor_to_png_base64(&tensor).unwrap();
        let decoded = decode_base64_image(&b64).unwrap();

        assert_eq!((decoded.width(), decoded.height()), (4, 3));
        assert_eq!(decoded.to_rgb8().get_pixel(3, 2).0, [10, 20, 30]);
    }

    #[test]
    fn test_bytes_to_tensor_rejects_garbage() {
        assert!(matches!(
            bytes_to_tensor(&[0x00, 0x01, 0x02]),
            Err(Error::Image(_))
        ));
    }

    #[test]
    fn test_resize_max_side_keeps_aspect() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(400, 200));
        let resized = resize_image(&image, Resize::MaxSide(100));
        assert_eq!((resized.width(), resized.height()), (100, 50));

        let untouched = resize_image(&image, Resize::MaxSide(1000));
        assert_eq!((untouched.width(), untouched.height()), (400, 200));
    }

    #[test]
    fn test_resize_fit_and_exact() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(400, 200));
        let fit = resize_image(&image, Resize::Fit(100, 100));
        assert_eq!((fit.width(), fit.height()), (100, 50));

        let exact = resize_image(&image, Resize::Exact(64, 64));
        assert_eq!((exact.width(), exact.height()), (64, 64));
    }
}
