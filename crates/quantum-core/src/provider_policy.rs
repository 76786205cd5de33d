use std::time::Duration;

use crate::ProviderId;

/// Published request quota of a vendor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub provider_id: ProviderId,
    pub window: Duration,
    pub limit: u32,
}

impl QuotaPolicy {
    /// Alpha Vantage free tier: 25 requests per day.
    pub const fn alphavantage_default() -> Self {
        Self {
            provider_id: ProviderId::AlphaVantage,
            window: Duration::from_secs(24 * 60 * 60),
            limit: 25,
        }
    }

    /// Twelve Data basic plan: 8 requests per minute.
    pub const fn twelvedata_default() -> Self {
        Self {
            provider_id: ProviderId::TwelveData,
            window: Duration::from_secs(60),
            limit: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphavantage_policy_matches_free_tier() {
        let policy = QuotaPolicy::alphavantage_default();

        assert_eq!(policy.provider_id, ProviderId::AlphaVantage);
        assert_eq!(policy.window, Duration::from_secs(86_400));
        assert_eq!(policy.limit, 25);
    }

    #[test]
    fn twelvedata_policy_matches_basic_plan() {
        let policy = QuotaPolicy::twelvedata_default();

        assert_eq!(policy.provider_id, ProviderId::TwelveData);
        assert_eq!(policy.window, Duration::from_secs(60));
        assert_eq!(policy.limit, 8);
    }
}
