//! Retry policy for completion calls — linear backoff on rate limits.
//!
//! Wraps a provider and the quota guard into a client whose one public call
//! never fails: every provider error resolves to either a response or `None`.
//! Only rate-limit signals are retried; waits grow linearly
//! (`base_delay * attempt_number`), and each attempt carries an overall
//! deadline so a hung provider call cannot stall a message forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{error, warn};

use guildmind_core::error::ProviderError;
use guildmind_core::provider::{CompletionProvider, CompletionRequest, CompletionResponse};

use crate::quota::QuotaGuard;

/// How hard to try before giving up on one completion call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum completion attempts.
    pub max_retries: u32,

    /// Base wait after a rate-limit signal; attempt `n` waits `n * base_delay`.
    pub base_delay: Duration,

    /// Overall deadline for a single attempt.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// A completion client that absorbs provider failures.
pub struct RetryingClient {
    provider: Arc<dyn CompletionProvider>,
    guard: QuotaGuard,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        guard: QuotaGuard,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            guard,
            policy,
        }
    }

    /// Issue one completion call under the retry policy.
    ///
    /// 1. If the quota guard reports unavailable, give up immediately — no
    ///    point spending retries on a provider that is out of quota.
    /// 2. On a rate-limit signal, wait `base_delay * (attempt + 1)` and retry,
    ///    up to `max_retries` attempts.
    /// 3. On any other error, re-run the guard probe (it produces the
    ///    operational notification) and abort.
    ///
    /// All provider errors resolve to `None`; this never raises.
    pub async fn complete_or_none(&self, request: CompletionRequest) -> Option<CompletionResponse> {
        if !self.guard.check_available().await {
            return None;
        }

        for attempt in 0..self.policy.max_retries {
            match timeout(
                self.policy.request_timeout,
                self.provider.complete(request.clone()),
            )
            .await
            {
                Ok(Ok(response)) => return Some(response),
                Ok(Err(ProviderError::RateLimited { .. })) => {
                    // No retry is coming after the last attempt, so don't
                    // make the fallback wait out a useless backoff.
                    if attempt + 1 == self.policy.max_retries {
                        continue;
                    }
                    let wait = self.policy.base_delay * (attempt + 1);
                    warn!(
                        provider = self.provider.name(),
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "Rate limited, backing off before retry"
                    );
                    sleep(wait).await;
                }
                Ok(Err(e)) => {
                    warn!(
                        provider = self.provider.name(),
                        error = %e,
                        "Completion failed with a non-retryable error"
                    );
                    // Re-probe so the guard classifies the outage and notifies.
                    let _ = self.guard.check_available().await;
                    return None;
                }
                Err(_) => {
                    warn!(
                        provider = self.provider.name(),
                        timeout_secs = self.policy.request_timeout.as_secs(),
                        "Completion attempt timed out"
                    );
                    return None;
                }
            }
        }

        error!(
            provider = self.provider.name(),
            max_retries = self.policy.max_retries,
            "Retries exhausted"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use guildmind_core::event::EventBus;
    use guildmind_core::provider::ChatMessage;
    use std::sync::Mutex;

    /// A mock provider with scripted behavior and a call counter.
    struct ScriptedProvider {
        name: String,
        behavior: Behavior,
        completions: Mutex<usize>,
        probes: Mutex<usize>,
    }

    enum Behavior {
        Succeed(String),
        RateLimitForever,
        FailWith(ProviderError),
        Hang,
    }

    impl ScriptedProvider {
        fn new(behavior: Behavior) -> Self {
            Self {
                name: "scripted".into(),
                behavior,
                completions: Mutex::new(0),
                probes: Mutex::new(0),
            }
        }

        fn completions(&self) -> usize {
            *self.completions.lock().unwrap()
        }

        fn probes(&self) -> usize {
            *self.probes.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            *self.completions.lock().unwrap() += 1;
            match &self.behavior {
                Behavior::Succeed(text) => Ok(CompletionResponse {
                    text: text.clone(),
                    model: "test-model".into(),
                    usage: None,
                }),
                Behavior::RateLimitForever => {
                    Err(ProviderError::RateLimited { retry_after_secs: 5 })
                }
                Behavior::FailWith(e) => Err(e.clone()),
                Behavior::Hang => {
                    sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }

        async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
            *self.probes.lock().unwrap() += 1;
            Ok(vec!["test-model".into()])
        }
    }

    /// A probe target that is itself rate-limited.
    struct ExhaustedProbe;

    #[async_trait]
    impl CompletionProvider for ExhaustedProbe {
        fn name(&self) -> &str {
            "exhausted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            panic!("must not attempt completion when the guard says unavailable");
        }

        async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
            Err(ProviderError::RateLimited { retry_after_secs: 60 })
        }
    }

    fn test_request() -> CompletionRequest {
        CompletionRequest {
            model: "test-model".into(),
            messages: vec![ChatMessage::user("hello")],
            temperature: 1.0,
            max_tokens: Some(2000),
        }
    }

    fn client_for(provider: Arc<ScriptedProvider>, policy: RetryPolicy) -> RetryingClient {
        let guard = QuotaGuard::new(provider.clone(), Arc::new(EventBus::default()));
        RetryingClient::new(provider, guard, policy)
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let provider = Arc::new(ScriptedProvider::new(Behavior::Succeed("hi!".into())));
        let client = client_for(provider.clone(), RetryPolicy::default());

        let response = client.complete_or_none(test_request()).await;
        assert_eq!(response.unwrap().text, "hi!");
        assert_eq!(provider.completions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_exhausts_exactly_max_retries() {
        let provider = Arc::new(ScriptedProvider::new(Behavior::RateLimitForever));
        let client = client_for(provider.clone(), RetryPolicy::default());

        let response = client.complete_or_none(test_request()).await;
        assert!(response.is_none());
        assert_eq!(provider.completions(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_without_a_final_backoff() {
        let provider = Arc::new(ScriptedProvider::new(Behavior::RateLimitForever));
        let client = client_for(provider.clone(), RetryPolicy::default());

        let started = tokio::time::Instant::now();
        assert!(client.complete_or_none(test_request()).await.is_none());
        assert_eq!(provider.completions(), 3);

        // Only the waits between attempts (5s + 10s); nothing after the third.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(15), "elapsed: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(16), "elapsed: {elapsed:?}");
    }

    #[tokio::test]
    async fn unauthorized_aborts_after_one_attempt() {
        let provider = Arc::new(ScriptedProvider::new(Behavior::FailWith(
            ProviderError::Unauthorized("bad key".into()),
        )));
        let client = client_for(provider.clone(), RetryPolicy::default());

        let response = client.complete_or_none(test_request()).await;
        assert!(response.is_none());
        assert_eq!(provider.completions(), 1);
        // Initial pre-flight probe plus the diagnostic re-probe.
        assert_eq!(provider.probes(), 2);
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(Behavior::FailWith(
            ProviderError::Api {
                status_code: 500,
                message: "boom".into(),
            },
        )));
        let client = client_for(provider.clone(), RetryPolicy::default());

        assert!(client.complete_or_none(test_request()).await.is_none());
        assert_eq!(provider.completions(), 1);
    }

    #[tokio::test]
    async fn unavailable_guard_skips_completion_entirely() {
        let provider = Arc::new(ExhaustedProbe);
        let guard = QuotaGuard::new(provider.clone(), Arc::new(EventBus::default()));
        let client = RetryingClient::new(provider, guard, RetryPolicy::default());

        // ExhaustedProbe panics if complete() is ever reached.
        assert!(client.complete_or_none(test_request()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_hits_the_deadline() {
        let provider = Arc::new(ScriptedProvider::new(Behavior::Hang));
        let policy = RetryPolicy {
            request_timeout: Duration::from_secs(1),
            ..RetryPolicy::default()
        };
        let client = client_for(provider.clone(), policy);

        assert!(client.complete_or_none(test_request()).await.is_none());
        assert_eq!(provider.completions(), 1);
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay * 1, Duration::from_secs(5));
        assert_eq!(policy.base_delay * 2, Duration::from_secs(10));
        assert_eq!(policy.base_delay * 3, Duration::from_secs(15));
    }
}
