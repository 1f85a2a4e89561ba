use std::time::Duration;

/// Configuration for a classification pipeline session.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    labels: [String; 2],
    shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            labels: ["cat".to_string(), "dog".to_string()],
            shutdown_timeout: Duration::from_millis(500),
        }
    }
}

impl PipelineConfig {
    /// Set the display labels for class0 and class1.
    pub fn with_labels(mut self, class0: String, class1: String) -> Self {
        self.labels = [class0, class1];
        self
    }

    /// Set how long shutdown waits for an in-flight frame before proceeding.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    // Getters
    pub fn labels(&self) -> &[String; 2] {
        &self.labels
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}
