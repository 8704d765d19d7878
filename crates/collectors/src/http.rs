//! Shared HTTP plumbing for provider clients.

use econ_pulse_core::CollectError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Per-call timeout applied to every provider request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builds the reqwest client used by a collector.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn provider_client() -> Result<Client, CollectError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()?)
}

/// Maps a non-success response to a [`CollectError::Api`].
///
/// # Errors
///
/// Returns the API error carrying the status and a truncated body.
pub async fn check_status(response: Response) -> Result<Response, CollectError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut message = response.text().await.unwrap_or_default();
    truncate_lossy(&mut message, 200);
    Err(CollectError::api(status.as_u16(), message))
}

/// Truncates to at most `max_len` bytes without splitting a character.
fn truncate_lossy(message: &mut String, max_len: usize) {
    if message.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    message.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_check_status_passes_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = provider_client().unwrap();
        let response = client.get(format!("{}/ok", server.uri())).send().await.unwrap();
        assert!(check_status(response).await.is_ok());
    }

    // ==================== Truncation Tests ====================

    #[test]
    fn test_truncate_lossy_short_body_untouched() {
        let mut message = String::from("bad request");
        truncate_lossy(&mut message, 200);
        assert_eq!(message, "bad request");
    }

    #[test]
    fn test_truncate_lossy_backs_off_multibyte_boundary() {
        // Byte 200 lands mid-character; the cut must move back to the
        // last full character.
        let mut message = "a".repeat(199);
        message.push_str("é and more");
        truncate_lossy(&mut message, 200);
        assert_eq!(message.len(), 199);
        assert!(message.chars().all(|c| c == 'a'));
    }

    #[tokio::test]
    async fn test_check_status_truncates_non_ascii_error_body() {
        let server = MockServer::start().await;
        let mut body = "x".repeat(199);
        body.push_str("é indisponible");
        Mock::given(method("GET"))
            .and(path("/fail"))
            .respond_with(ResponseTemplate::new(503).set_body_string(body))
            .mount(&server)
            .await;

        let client = provider_client().unwrap();
        let response = client.get(format!("{}/fail", server.uri())).send().await.unwrap();
        let err = check_status(response).await.unwrap_err();
        match err {
            CollectError::Api { status, message } => {
                assert_eq!(status, 503);
                assert!(message.len() <= 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_check_status_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fail"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
            .mount(&server)
            .await;

        let client = provider_client().unwrap();
        let response = client.get(format!("{}/fail", server.uri())).send().await.unwrap();
        let err = check_status(response).await.unwrap_err();
        assert!(matches!(err, CollectError::Api { status: 503, .. }));
        assert!(err.is_transient());
    }
}
