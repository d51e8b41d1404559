//! Configuration for background query ranges.

use serde::{Deserialize, Serialize};

/// Settings for the worker thread and channel behind a query range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    /// Channel capacity between the worker and the consumer. `None`
    /// buffers without bound; `Some(n)` applies backpressure once `n`
    /// unconsumed matches are queued.
    pub channel_capacity: Option<usize>,
}

impl RangeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_unbounded() {
        assert_eq!(RangeConfig::new().channel_capacity, None);
        let config: RangeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RangeConfig::new());
    }

    #[test]
    fn test_builder_and_serde() {
        let config = RangeConfig::new().with_channel_capacity(16);
        let json = serde_json::to_string(&config).unwrap();
        let back: RangeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.channel_capacity, Some(16));
    }
}
