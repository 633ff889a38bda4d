//! Media conversion helpers
//!
//! Image tensors, base64 PNG attachments, MIME lookup and output files.

pub mod files;
pub mod mime;
pub mod tensor;
pub mod video;

pub use files::output_path;
pub use mime::{attachment_mime, mime_for_path};
pub use tensor::{bytes_to_tensor, tensor_to_png_base64, ImageTensor};
pub use video::{save_video, video_output_path};
