//! Retry with exponential backoff for card database requests.
//!
//! Every request goes through [`send_text`]. Connection failures,
//! timeouts, HTTP 429 and HTTP 5xx are retried after 2s, 4s, 8s, ...;
//! any other 4xx is permanent.

use std::time::Duration;

use crate::FetchError;

/// Default retry count. With backoff doubling from 2s the total wait
/// before giving up is 62 seconds.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Sends the request built by `build_request` and returns the body as
/// text.
///
/// `build_request` is called once per attempt since a
/// [`reqwest::RequestBuilder`] is consumed by `send()`. A body that fails
/// to read counts as one more transient failure.
///
/// # Errors
///
/// Returns [`FetchError::Status`] for permanent or exhausted HTTP
/// statuses and [`FetchError::Http`] for transport failures after all
/// retries.
#[allow(clippy::future_not_send)]
pub async fn send_text<F>(build_request: F, max_retries: u32) -> Result<String, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let response = send_inner(&build_request, max_retries).await?;
        let url = response.url().to_string();
        match response.text().await {
            Ok(text) => return Ok(text),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                let delay = backoff(attempt);
                log::warn!(
                    "Body read failed for {url} (retry {attempt}/{max_retries} in {delay:?}): {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                log::error!("Body read failed for {url} after {max_retries} retries: {e}");
                return Err(FetchError::Http(e));
            }
        }
    }
}

/// Retry loop over connection errors and retryable statuses. Returns the
/// first 2xx/3xx response.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(build_request: &F, max_retries: u32) -> Result<reqwest::Response, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(FetchError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) {
                    if attempt < max_retries {
                        log::warn!("  HTTP {status} from {}", response.url());
                        attempt += 1;
                        continue;
                    }
                    log::error!("HTTP {status} after {max_retries} retries");
                }
                if status.is_client_error() || status.is_server_error() {
                    return Err(FetchError::Status {
                        url: response.url().to_string(),
                        status: status.as_u16(),
                    });
                }
                return Ok(response);
            }
        }
    }
}

/// 2s, 4s, 8s, ... for attempts 1, 2, 3, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(10))
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn backoff_doubles() {
        let delays: Vec<u64> = (1..=5).map(|a| backoff(a).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 32]);
    }

    #[test]
    fn only_rate_limits_and_server_errors_are_retried() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::OK));
    }
}
