//! Last-value duplicate suppression
//!
//! Only the most recent accepted payload is remembered, so scanning the same
//! item again after something else in between is accepted again.

/// Suppresses back-to-back repeats of the same accepted payload
#[derive(Debug, Clone, Default)]
pub struct DedupFilter {
    last_accepted: Option<String>,
}

impl DedupFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `payload` equals the last accepted payload,
    /// otherwise remembers it and returns `true`
    pub fn should_accept(&mut self, payload: &str) -> bool {
        if self.last_accepted.as_deref() == Some(payload) {
            return false;
        }
        self.last_accepted = Some(payload.to_string());
        true
    }

    /// Forget the last accepted payload
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }

    /// The payload a repeat of which would be suppressed
    pub fn last_accepted(&self) -> Option<&str> {
        self.last_accepted.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_value_sequence() {
        let mut filter = DedupFilter::new();
        let results: Vec<bool> = ["A", "A", "B", "A"]
            .iter()
            .map(|p| filter.should_accept(p))
            .collect();
        assert_eq!(results, vec![true, false, true, true]);
        assert_eq!(filter.last_accepted(), Some("A"));
    }

    #[test]
    fn test_rejection_leaves_state_unchanged() {
        let mut filter = DedupFilter::new();
        assert!(filter.should_accept("4006381333931"));
        assert!(!filter.should_accept("4006381333931"));
        assert!(!filter.should_accept("4006381333931"));
        assert_eq!(filter.last_accepted(), Some("4006381333931"));
    }

    #[test]
    fn test_reset() {
        let mut filter = DedupFilter::new();
        assert!(filter.should_accept("A"));
        filter.reset();
        assert_eq!(filter.last_accepted(), None);
        assert!(filter.should_accept("A"));
    }

    #[test]
    fn test_empty_payload_is_a_value() {
        let mut filter = DedupFilter::new();
        assert!(filter.should_accept(""));
        assert!(!filter.should_accept(""));
    }
}
