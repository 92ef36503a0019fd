use serde::Deserialize;

pub(crate) const DEFAULT_EVENT_CAPACITY: usize = 16;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Maximum number of scheduled jobs that have not settled yet. Scheduling beyond it fails
    /// instead of queueing.
    ///
    /// When set to None, the number of outstanding jobs is unbounded.
    pub max_pending: Option<usize>,
    /// Number of lifecycle events buffered per subscriber. Older events are dropped first.
    pub event_capacity: Option<usize>,
}

impl NotifierConfig {
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = Some(max_pending);
        self
    }

    pub fn event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = Some(event_capacity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: NotifierConfig = serde_json::from_str(r#"{"max_pending": 4}"#).unwrap();
        assert_eq!(config.max_pending, Some(4));
        assert_eq!(config.event_capacity, None);
        let config: NotifierConfig = serde_json::from_str("{}").unwrap();
        assert!(config.max_pending.is_none());
    }
}
