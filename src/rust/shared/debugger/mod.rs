/// Debugger utilities - timing of slow, non-realtime work (training, saving)
use std::sync::Arc;
use std::time::Instant;

use crate::tools::logger::Logger;

/// Logs how long a scope took, at debug level, when dropped.
pub struct DebugTimer {
    start: Instant,
    label: String,
    logger: Arc<Logger>,
}

impl DebugTimer {
    pub fn new(label: impl Into<String>, logger: Arc<Logger>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
            logger,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn log_elapsed(&self) {
        self.logger
            .debug(format!("{} took {:.1}ms", self.label, self.elapsed_ms()));
    }
}

impl Drop for DebugTimer {
    fn drop(&mut self) {
        self.log_elapsed();
    }
}

#[cfg(test)]
#[path = "test_shared_debugger.rs"]
mod tests;
