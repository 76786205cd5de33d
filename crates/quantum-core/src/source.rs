use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Vendors the aggregation layer talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Yahoo,
    AlphaVantage,
    TwelveData,
}

impl ProviderId {
    /// Identifier used in logs, error codes and JSON output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::AlphaVantage => "alphavantage",
            Self::TwelveData => "twelvedata",
        }
    }

    /// Vendor name as shown to users.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Yahoo => "Yahoo Finance",
            Self::AlphaVantage => "Alpha Vantage",
            Self::TwelveData => "Twelve Data",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_wire_id_not_vendor_name() {
        assert_eq!(ProviderId::TwelveData.to_string(), "twelvedata");
        assert_eq!(ProviderId::TwelveData.display_name(), "Twelve Data");
    }

    #[test]
    fn serializes_lowercase() {
        let encoded = serde_json::to_string(&ProviderId::AlphaVantage).expect("serialize");
        assert_eq!(encoded, "\"alphavantage\"");
    }
}
