//! Registry configuration

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Topics that entries may not claim
    pub reserved_topics: Vec<String>,

    /// Capacity of the change notification channel
    pub notification_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reserved_topics: vec!["registry".to_string()],
            notification_capacity: 256,
        }
    }
}

impl RegistryConfig {
    /// Reserve an additional topic
    pub fn reserve_topic(mut self, topic: impl Into<String>) -> Self {
        self.reserved_topics.push(topic.into());
        self
    }

    /// Set the change notification channel capacity
    pub fn notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity.max(1);
        self
    }

    pub fn is_reserved_topic(&self, topic: &str) -> bool {
        self.reserved_topics.iter().any(|t| t == topic)
    }
}
