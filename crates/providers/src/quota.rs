//! Quota Guard — pre-flight availability probe.
//!
//! Uses the provider's model-listing endpoint as a cheap probe before
//! spending a real completion call. The probe is best-effort: a probe that
//! succeeds while the real call still fails is acceptable and handled by the
//! retry policy.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use guildmind_core::error::ProviderError;
use guildmind_core::event::{DomainEvent, EventBus};
use guildmind_core::provider::CompletionProvider;

/// Pre-flight check against the provider's availability.
///
/// Each failing probe emits at most one operational notification on the
/// event bus; rate-limit and authorization failures are distinguished so the
/// ops channel can tell "out of quota" from "key revoked".
pub struct QuotaGuard {
    provider: Arc<dyn CompletionProvider>,
    events: Arc<EventBus>,
}

impl QuotaGuard {
    pub fn new(provider: Arc<dyn CompletionProvider>, events: Arc<EventBus>) -> Self {
        Self { provider, events }
    }

    /// Probe the provider. Returns `true` only when the probe succeeds.
    pub async fn check_available(&self) -> bool {
        match self.provider.list_models().await {
            Ok(_) => {
                info!(provider = self.provider.name(), "Provider available");
                true
            }
            Err(ProviderError::RateLimited { retry_after_secs }) => {
                warn!(
                    provider = self.provider.name(),
                    retry_after_secs, "Provider quota exhausted"
                );
                self.events.publish(DomainEvent::QuotaExhausted {
                    provider: self.provider.name().to_string(),
                    timestamp: Utc::now(),
                });
                false
            }
            Err(ProviderError::Unauthorized(reason)) => {
                error!(
                    provider = self.provider.name(),
                    reason, "Provider rejected our credentials"
                );
                self.events.publish(DomainEvent::AuthFailure {
                    provider: self.provider.name().to_string(),
                    timestamp: Utc::now(),
                });
                false
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Provider probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use guildmind_core::provider::{CompletionRequest, CompletionResponse};

    struct ProbeProvider {
        result: Result<(), ProviderError>,
    }

    #[async_trait]
    impl CompletionProvider for ProbeProvider {
        fn name(&self) -> &str {
            "probe"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            unreachable!("guard never calls complete")
        }

        async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
            self.result.clone().map(|_| vec!["gpt-4o-mini".into()])
        }
    }

    fn guard_with(result: Result<(), ProviderError>) -> (QuotaGuard, Arc<EventBus>) {
        let events = Arc::new(EventBus::default());
        let guard = QuotaGuard::new(Arc::new(ProbeProvider { result }), events.clone());
        (guard, events)
    }

    #[tokio::test]
    async fn healthy_probe_is_available() {
        let (guard, _) = guard_with(Ok(()));
        assert!(guard.check_available().await);
    }

    #[tokio::test]
    async fn rate_limit_notifies_quota_exhausted() {
        let (guard, events) = guard_with(Err(ProviderError::RateLimited { retry_after_secs: 5 }));
        let mut rx = events.subscribe();

        assert!(!guard.check_available().await);
        match rx.try_recv().unwrap().as_ref() {
            DomainEvent::QuotaExhausted { provider, .. } => assert_eq!(provider, "probe"),
            other => panic!("Expected QuotaExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_notifies_auth_failure() {
        let (guard, events) = guard_with(Err(ProviderError::Unauthorized("revoked".into())));
        let mut rx = events.subscribe();

        assert!(!guard.check_available().await);
        match rx.try_recv().unwrap().as_ref() {
            DomainEvent::AuthFailure { provider, .. } => assert_eq!(provider, "probe"),
            other => panic!("Expected AuthFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_errors_log_without_notifying() {
        let (guard, events) = guard_with(Err(ProviderError::Network("conn refused".into())));
        let mut rx = events.subscribe();

        assert!(!guard.check_available().await);
        assert!(rx.try_recv().is_err());
    }
}
