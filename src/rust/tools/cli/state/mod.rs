use std::sync::Arc;

use crate::tools::logger::Logger;

#[derive(Clone)]
pub struct CliContext {
    logger: Arc<Logger>,
}

impl CliContext {
    pub fn new(debug: bool) -> Self {
        Self {
            logger: Arc::new(Logger::with_debug(debug)),
        }
    }

    pub fn logger(&self) -> Arc<Logger> {
        Arc::clone(&self.logger)
    }
}
