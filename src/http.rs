//! HTTP utilities for the provider REST APIs

use crate::error::{CleanError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull `error.message` out of a GCP or ARM error body, falling back to the
/// sanitized body itself
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| sanitize_for_log(body))
}

/// Bearer-token HTTP client wrapper shared by the GCP and Azure adapters
#[derive(Clone)]
pub struct RestClient {
    client: Client,
}

impl RestClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("clean-cloud/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Access the underlying reqwest client for requests that are not
    /// bearer-authenticated (token endpoints)
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Send a request and turn non-success statuses into errors
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        check_status(response).await
    }

    /// Make a GET request and deserialize the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(url).bearer_auth(token)).await?;
        parse_json(response).await
    }

    /// Make a bodiless POST request and deserialize the JSON body
    pub async fn post_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        tracing::debug!("POST {}", url);
        let request = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LENGTH, "0");
        let response = self.send(request).await?;
        parse_json(response).await
    }

    /// Make a DELETE request, returning the raw response so callers can
    /// inspect status and polling headers
    pub async fn delete(&self, url: &str, token: &str) -> Result<Response> {
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(url).bearer_auth(token)).await
    }
}

/// Map a non-success response into the error taxonomy
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
    tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));

    let message = error_message(&body);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(CleanError::Auth(format!("{}: {}", status, message)));
    }

    Err(CleanError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Deserialize a JSON body, treating an empty body as JSON `null`
pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\nb\tc"), "abc");
    }

    #[test]
    fn test_error_message_prefers_structured_error() {
        let body = r#"{"error":{"code":"ResourceGroupNotFound","message":"Resource group 'rg' could not be found."}}"#;
        assert_eq!(
            error_message(body),
            "Resource group 'rg' could not be found."
        );
        assert_eq!(error_message("plain failure"), "plain failure");
    }
}
