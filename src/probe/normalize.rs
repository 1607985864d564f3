//! Classification of probe results into a boolean "unmuted" flag

use serde::{Deserialize, Serialize};

use super::command::ProbeResult;

/// The only payload that means the microphone is live
pub const UNMUTED_LITERAL: &str = "Unmuted";

/// How a payload is compared against [`UNMUTED_LITERAL`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Trimmed payload equals the literal
    #[default]
    Exact,
    /// Any trimmed line of the payload equals the literal
    Contains,
}

/// Maps probe results to `true` (unmuted) or `false` (muted)
#[derive(Debug, Clone, Copy, Default)]
pub struct StateNormalizer {
    strategy: MatchStrategy,
}

impl StateNormalizer {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Failures, empty output and anything unrecognized are muted
    pub fn normalize(&self, result: &ProbeResult) -> bool {
        let ProbeResult::Payload(payload) = result else {
            return false;
        };

        match self.strategy {
            MatchStrategy::Exact => payload.trim() == UNMUTED_LITERAL,
            MatchStrategy::Contains => payload.lines().any(|line| line.trim() == UNMUTED_LITERAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;

    fn payload(text: &str) -> ProbeResult {
        ProbeResult::Payload(text.to_string())
    }

    #[test]
    fn test_exact_match() {
        let normalizer = StateNormalizer::default();
        assert!(normalizer.normalize(&payload("Unmuted")));
        assert!(normalizer.normalize(&payload("  Unmuted\n")));
        assert!(!normalizer.normalize(&payload("Muted")));
        assert!(!normalizer.normalize(&payload("unmuted")));
        assert!(!normalizer.normalize(&payload("")));
        assert!(!normalizer.normalize(&payload("Unmuted\nMuted")));
    }

    #[test]
    fn test_failure_is_muted() {
        let normalizer = StateNormalizer::default();
        let failure = ProbeResult::Failure(ProbeError::InvalidOutput);
        assert!(!normalizer.normalize(&failure));
    }

    #[test]
    fn test_contains_matches_any_line() {
        let normalizer = StateNormalizer::new(MatchStrategy::Contains);
        assert!(normalizer.normalize(&payload("Meeting\n Unmuted \n")));
        assert!(!normalizer.normalize(&payload("Still Unmuted")));
        assert!(!normalizer.normalize(&payload("")));
    }

    #[test]
    fn test_strategy_serialization() {
        let json = serde_json::to_string(&MatchStrategy::Contains).unwrap();
        assert_eq!(json, r#""contains""#);
    }
}
