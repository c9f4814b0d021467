use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds a presentation's timestamp may be ahead of the verifier's clock
pub const DEFAULT_TIMESTAMP_TOLERANCE: u64 = 300;

/// Options of presentation verification. Fields missing from JSON take their default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub timestamp_tolerance: u64,
    /// Current time in seconds since the Unix epoch, the system clock when not set
    pub reference_time: Option<u64>,
    /// Whether referents without restrictions can be answered with self attested values
    pub accept_self_attested: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance: DEFAULT_TIMESTAMP_TOLERANCE,
            reference_time: None,
            accept_self_attested: true,
        }
    }
}

impl VerifierConfig {
    pub fn now(&self) -> u64 {
        self.reference_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        })
    }

    /// Latest timestamp accepted in a presentation
    pub fn max_timestamp(&self) -> u64 {
        self.now().saturating_add(self.timestamp_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_json() {
        let config: VerifierConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, VerifierConfig::default());

        let config: VerifierConfig =
            serde_json::from_str(r#"{"reference_time": 1000, "accept_self_attested": false}"#)
                .unwrap();
        assert_eq!(config.timestamp_tolerance, DEFAULT_TIMESTAMP_TOLERANCE);
        assert!(!config.accept_self_attested);
        assert_eq!(config.now(), 1000);
        assert_eq!(config.max_timestamp(), 1300);

        assert!(VerifierConfig::default().now() > 1_600_000_000);
    }
}
