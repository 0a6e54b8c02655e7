//! Retry with exponential backoff for authority HTTP calls.
//!
//! Only transport errors are retried. Any HTTP response, including 5xx, is
//! returned to the caller as is. Which transport errors qualify depends on
//! the [`RetryPolicy`]: a request that may already have reached the authority
//! (read timeout, reset mid-response) is only resent when resending is safe.

use std::time::Duration;

/// Retry attempts after the initial request.
const MAX_RETRIES: u32 = 3;

/// First delay; doubles each attempt (200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Which transport failures may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryPolicy {
    /// Any transport failure. For calls the authority may receive twice.
    AnyTransport,
    /// Only failures to connect, where the request never left this host.
    /// Calculation calls are billable and must not be duplicated.
    ConnectOnly,
}

impl RetryPolicy {
    fn allows(self, err: &reqwest::Error) -> bool {
        match self {
            RetryPolicy::AnyTransport => true,
            RetryPolicy::ConnectOnly => err.is_connect(),
        }
    }
}

/// Send a request, retrying transport failures allowed by `policy` with
/// backoff.
///
/// `f` is called up to `MAX_RETRIES + 1` times.
pub(crate) async fn retry_send<F, Fut>(
    authority: &str,
    policy: RetryPolicy,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..MAX_RETRIES {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if !policy.allows(&e) => {
                tracing::warn!(authority, ?policy, "authority request failed, not retrying: {e}");
                return Err(e);
            }
            Err(e) => {
                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                tracing::warn!(
                    authority,
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    "authority request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    f().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn count_sends(policy: RetryPolicy, url: &'static str, timeout: Duration) -> u32 {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap();

        let result = retry_send("scripted", policy, || {
            c.fetch_add(1, Ordering::SeqCst);
            client.post(url).send()
        })
        .await;

        assert!(result.is_err());
        calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn exhausts_all_attempts_on_transport_failure() {
        let calls = count_sends(
            RetryPolicy::AnyTransport,
            "http://127.0.0.1:1/calculate",
            Duration::from_millis(50),
        )
        .await;
        assert_eq!(calls, MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn refused_connection_is_retried_even_for_single_delivery() {
        let calls = count_sends(
            RetryPolicy::ConnectOnly,
            "http://127.0.0.1:1/calculate",
            Duration::from_millis(50),
        )
        .await;
        assert_eq!(calls, MAX_RETRIES + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn read_timeout_is_not_retried_for_single_delivery() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let url = format!("{}/calculate", server.uri());

        let err = retry_send("slow", RetryPolicy::ConnectOnly, || {
            c.fetch_add(1, Ordering::SeqCst);
            client.post(&url).send()
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
