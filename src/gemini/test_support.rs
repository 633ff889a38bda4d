use super::{GeminiClient, RetryPolicy};
use std::time::Duration;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockBuilder, MockServer};

pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/.+:generateContent$";

pub fn post_path_regex(regex: &str) -> MockBuilder {
    Mock::given(method("POST")).and(path_regex(regex))
}

/// Client pointed at `server` with a millisecond backoff.
pub fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key".to_string())
        .with_base_url(server.uri())
        .with_retry_policy(RetryPolicy::new(3).with_backoff_unit(Duration::from_millis(1)))
}
