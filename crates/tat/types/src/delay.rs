//! Delay reasons accepted by timeline regeneration

use crate::TatError;
use serde::{Deserialize, Serialize};

/// Closed set of reasons a remaining schedule may be pushed out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayReason {
    ClientDelay,
    MaterialShortage,
    VendorDelay,
    SiteNotReady,
    PaymentPending,
    DesignChange,
    ForceMajeure,
}

impl DelayReason {
    pub const ALL: [DelayReason; 7] = [
        Self::ClientDelay,
        Self::MaterialShortage,
        Self::VendorDelay,
        Self::SiteNotReady,
        Self::PaymentPending,
        Self::DesignChange,
        Self::ForceMajeure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientDelay => "client_delay",
            Self::MaterialShortage => "material_shortage",
            Self::VendorDelay => "vendor_delay",
            Self::SiteNotReady => "site_not_ready",
            Self::PaymentPending => "payment_pending",
            Self::DesignChange => "design_change",
            Self::ForceMajeure => "force_majeure",
        }
    }
}

impl std::fmt::Display for DelayReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DelayReason {
    type Err = TatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == tag)
            .ok_or_else(|| TatError::InvalidReason(tag.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        for reason in DelayReason::ALL {
            assert_eq!(reason.as_str().parse::<DelayReason>().unwrap(), reason);
        }
    }

    #[test]
    fn test_unknown_tag_is_invalid_reason() {
        let err = "weather".parse::<DelayReason>().unwrap_err();
        assert_eq!(err, TatError::InvalidReason("weather".into()));
    }

    #[test]
    fn test_serde_matches_tags() {
        let json = serde_json::to_string(&DelayReason::SiteNotReady).unwrap();
        assert_eq!(json, "\"site_not_ready\"");
    }
}
