use std::time::Duration;

use crate::ProviderId;

/// Per-provider call budget applied by the orchestrators around each
/// fan-out branch. One slow or hung provider never delays the others
/// past its own deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub call_timeout: Duration,
    pub retry_transient: bool,
}

impl ProviderPolicy {
    pub fn default_for(provider_id: ProviderId) -> Self {
        let call_timeout = match provider_id {
            // Lifemapper layer queries and MorphoSource specimen searches
            // routinely run long.
            ProviderId::Lifemapper | ProviderId::Morphosource => Duration::from_secs(30),
            _ => Duration::from_secs(10),
        };
        Self {
            provider_id,
            call_timeout,
            retry_transient: true,
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.call_timeout.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_providers_get_a_longer_budget() {
        let slow = ProviderPolicy::default_for(ProviderId::Lifemapper);
        let fast = ProviderPolicy::default_for(ProviderId::Gbif);

        assert_eq!(slow.call_timeout, Duration::from_secs(30));
        assert_eq!(fast.call_timeout, Duration::from_secs(10));
        assert!(fast.retry_transient);
    }
}
