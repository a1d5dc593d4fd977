// network.rs - Network operations
use std::fmt;

use crate::types::ControlAction;

/// HTTP client for the backend's start/stop control endpoints.
///
/// Requests go through the dev-server proxy prefix, so the base URL is the
/// page origin plus the prefix (e.g. `http://localhost:8080/py`). The base
/// must be absolute: `reqwest` rejects origin-relative paths.
#[derive(Clone)]
pub struct ControlClient {
    client: reqwest::Client,
    base_url: String,
}

impl ControlClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint_url(&self, action: ControlAction) -> String {
        format!("{}/{}", self.base_url, action.endpoint())
    }

    /// Issues the control request for `action`. Any 2xx status is success;
    /// the response body is ignored.
    pub async fn send(&self, action: ControlAction) -> Result<(), ControlError> {
        let response = self
            .client
            .post(self.endpoint_url(action))
            .send()
            .await
            .map_err(|_| ControlError { action })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ControlError { action })
        }
    }

    pub async fn start(&self) -> Result<(), ControlError> {
        self.send(ControlAction::Start).await
    }

    pub async fn stop(&self) -> Result<(), ControlError> {
        self.send(ControlAction::Stop).await
    }
}

/// A start/stop request that did not come back with a success status (or did
/// not reach the backend at all).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ControlError {
    action: ControlAction,
}

impl ControlError {
    pub fn action(&self) -> ControlAction {
        self.action
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action.failure_message())
    }
}

impl std::error::Error for ControlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_error_displays_the_banner_text() {
        let err = ControlError {
            action: ControlAction::Start,
        };
        assert_eq!(err.to_string(), "Failed to start camera stream");
        assert_eq!(err.action(), ControlAction::Start);
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ControlClient::new("http://localhost:8080/py/");
        assert_eq!(client.base_url, "http://localhost:8080/py");
    }

    #[test]
    fn endpoint_urls_join_base_and_action() {
        let client = ControlClient::new("http://localhost:8080/py");
        assert_eq!(
            client.endpoint_url(ControlAction::Start),
            "http://localhost:8080/py/start"
        );
        assert_eq!(
            client.endpoint_url(ControlAction::Stop),
            "http://localhost:8080/py/stop"
        );
    }

    #[test]
    fn endpoint_urls_must_be_absolute_to_be_requestable() {
        // An origin-relative path is not a sendable request URL.
        assert!(reqwest::Url::parse("/py/start").is_err());

        let client = ControlClient::new("http://localhost:8080/py");
        assert!(reqwest::Url::parse(&client.endpoint_url(ControlAction::Start)).is_ok());
    }
}
