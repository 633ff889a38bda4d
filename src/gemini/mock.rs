use super::types::{
    GenerateContentRequest, ImagenRequest, ModelDescriptor, Operation, ResponseEnvelope,
    VideoRequest,
};
use super::{ClientProvider, ClientSettings, GenerativeApi};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A call observed by [`MockGeminiApi`], with the serialized request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    GenerateContent { model: String, body: Value },
    Predict { model: String, body: Value },
    GenerateVideo { model: String, body: Value },
    Poll { name: String, max_wait: Duration },
    ListModels,
    Download { uri: String },
}

/// In-memory stand-in for the Gemini API. Clones share state.
#[derive(Clone, Default)]
pub struct MockGeminiApi {
    content_responses: Arc<Mutex<Vec<ResponseEnvelope>>>,
    operation: Arc<Mutex<Option<Operation>>>,
    poll_responses: Arc<Mutex<Vec<Operation>>>,
    models: Arc<Mutex<Vec<ModelDescriptor>>>,
    download: Arc<Mutex<Vec<u8>>>,
    failure: Arc<Mutex<Option<(u16, String)>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockGeminiApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a `generateContent`/`predict` reply; replies cycle once exhausted.
    pub fn with_content_response(self, envelope: Value) -> Self {
        self.content_responses
            .lock()
            .unwrap()
            .push(serde_json::from_value(envelope).unwrap_or_default());
        self
    }

    pub fn with_text_response(self, text: &str) -> Self {
        self.with_content_response(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
    }

    pub fn with_operation(self, operation: Value) -> Self {
        *self.operation.lock().unwrap() = Some(serde_json::from_value(operation).unwrap_or_default());
        self
    }

    /// Queues a poll result; the last one repeats.
    pub fn with_poll_response(self, operation: Value) -> Self {
        self.poll_responses
            .lock()
            .unwrap()
            .push(serde_json::from_value(operation).unwrap_or_default());
        self
    }

    pub fn with_models(self, models: Vec<ModelDescriptor>) -> Self {
        *self.models.lock().unwrap() = models;
        self
    }

    pub fn with_download(self, bytes: Vec<u8>) -> Self {
        *self.download.lock().unwrap() = bytes;
        self
    }

    /// Every call fails with an HTTP-status [`Error::Api`].
    pub fn with_failure(self, status: u16, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Body of the most recent `generateContent` call.
    pub fn last_content_body(&self) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|call| match call {
                RecordedCall::GenerateContent { body, .. } => Some(body.clone()),
                _ => None,
            })
    }

    fn record(&self, call: RecordedCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().as_ref() {
            Some((status, message)) => Err(Error::Api {
                message: message.clone(),
                status: Some(*status),
                body: None,
            }),
            None => Ok(()),
        }
    }

    fn next_content(&self) -> ResponseEnvelope {
        let responses = self.content_responses.lock().unwrap();
        if responses.is_empty() {
            return ResponseEnvelope::default();
        }
        let served = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RecordedCall::GenerateContent { .. } | RecordedCall::Predict { .. }
                )
            })
            .count();
        responses[(served.max(1) - 1) % responses.len()].clone()
    }
}

#[async_trait]
impl GenerativeApi for MockGeminiApi {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ResponseEnvelope> {
        self.record(RecordedCall::GenerateContent {
            model: model.to_string(),
            body: serde_json::to_value(request)?,
        })?;
        Ok(self.next_content())
    }

    async fn generate_image_predict(
        &self,
        model: &str,
        request: &ImagenRequest,
    ) -> Result<ResponseEnvelope> {
        self.record(RecordedCall::Predict {
            model: model.to_string(),
            body: serde_json::to_value(request)?,
        })?;
        Ok(self.next_content())
    }

    async fn generate_video(&self, model: &str, request: &VideoRequest) -> Result<Operation> {
        self.record(RecordedCall::GenerateVideo {
            model: model.to_string(),
            body: serde_json::to_value(request)?,
        })?;
        Ok(self.operation.lock().unwrap().clone().unwrap_or(Operation {
            name: Some("operations/mock".to_string()),
            ..Operation::default()
        }))
    }

    async fn poll_operation(
        &self,
        name: &str,
        max_wait: Duration,
        _poll_interval: Duration,
    ) -> Result<Operation> {
        self.record(RecordedCall::Poll {
            name: name.to_string(),
            max_wait,
        })?;
        let mut responses = self.poll_responses.lock().unwrap();
        let operation = match responses.len() {
            0 => Operation {
                name: Some(name.to_string()),
                done: true,
                ..Operation::default()
            },
            1 => responses[0].clone(),
            _ => responses.remove(0),
        };
        if operation.done {
            Ok(operation)
        } else {
            Err(Error::OperationTimeout {
                name: name.to_string(),
                waited: max_wait,
            })
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        self.record(RecordedCall::ListModels)?;
        Ok(self.models.lock().unwrap().clone())
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        self.record(RecordedCall::Download {
            uri: uri.to_string(),
        })?;
        Ok(self.download.lock().unwrap().clone())
    }
}

/// Provider that hands out clones of one [`MockGeminiApi`] and remembers
/// the settings each node asked for.
#[derive(Clone, Default)]
pub struct MockClientProvider {
    api: MockGeminiApi,
    settings: Arc<Mutex<Vec<ClientSettings>>>,
}

impl MockClientProvider {
    pub fn new(api: MockGeminiApi) -> Self {
        Self {
            api,
            settings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn api(&self) -> &MockGeminiApi {
        &self.api
    }

    pub fn clients_built(&self) -> usize {
        self.settings.lock().unwrap().len()
    }

    pub fn last_settings(&self) -> Option<ClientSettings> {
        self.settings.lock().unwrap().last().cloned()
    }
}

impl ClientProvider for MockClientProvider {
    fn client(&self, settings: &ClientSettings) -> Box<dyn GenerativeApi> {
        self.settings.lock().unwrap().push(settings.clone());
        Box::new(self.api.clone())
    }
}
