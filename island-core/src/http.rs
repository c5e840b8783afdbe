//! Shared HTTP plumbing: one client with browser-like headers and
//! per-request deadlines.

use reqwest::{
    Client, RequestBuilder, Response,
    header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";
const LANGUAGE: &str = "zh-CN,zh;q=0.9";

/// Upper bound for requests that don't set their own deadline.
const CLIENT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{service} request timed out after {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} request failed with status {status} {status_text}")]
    Status {
        service: &'static str,
        status: u16,
        status_text: String,
    },
    #[error("failed to decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Builds the client every outbound call goes through.
pub fn build_client() -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(LANGUAGE));

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
        .build()
        .map_err(|source| FetchError::Transport { service: "http client", source })
}

/// Sends `request` and reads its body within `deadline`.
///
/// Returns the body text of a 2xx response; anything else is a [`FetchError`].
pub async fn send_with_deadline(
    service: &'static str,
    request: RequestBuilder,
    deadline: Option<Duration>,
) -> Result<String, FetchError> {
    let exchange = async {
        let response = request
            .send()
            .await
            .map_err(|source| transport_or_timeout(service, source))?;
        read_success_body(service, response).await
    };

    match deadline {
        Some(after) => tokio::time::timeout(after, exchange)
            .await
            .map_err(|_| FetchError::Timeout { service, after })?,
        None => exchange.await,
    }
}

/// Like [`send_with_deadline`], decoding the body as JSON.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
    deadline: Option<Duration>,
) -> Result<T, FetchError> {
    let body = send_with_deadline(service, request, deadline).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Decode {
        service,
        message: format!("{e}: {}", truncate_body(&body)),
    })
}

async fn read_success_body(service: &'static str, response: Response) -> Result<String, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            service,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    response
        .text()
        .await
        .map_err(|source| transport_or_timeout(service, source))
}

fn transport_or_timeout(service: &'static str, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout { service, after: Duration::from_secs(CLIENT_TIMEOUT_SECS) }
    } else {
        FetchError::Transport { service, source }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
