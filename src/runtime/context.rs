use std::sync::Arc;
use std::time::Duration;

use crate::loader::CallExecutor;
use crate::service::{Catalog, Gateway, InMemoryGateway};
use crate::ui::Browser;

use super::{ClientConfig, Result};

/// Services shared by every component of a client session.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: ClientConfig,
    executor: CallExecutor,
}

impl AppContext {
    pub fn new(config: ClientConfig, gateway: Gateway) -> Result<Self> {
        config.validate()?;
        let executor = CallExecutor::new(gateway, config.worker_threads)?;
        Ok(Self { config, executor })
    }

    /// Session backed by an in-memory gateway serving `catalog`.
    pub fn with_catalog(config: ClientConfig, catalog: Catalog) -> Result<Self> {
        catalog.validate()?;
        let gateway = Gateway::in_memory(Arc::new(InMemoryGateway::new(catalog)));
        Self::new(config, gateway)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Gateway {
        self.executor.gateway()
    }

    pub fn executor(&self) -> &CallExecutor {
        &self.executor
    }

    pub fn load_timeout(&self) -> Duration {
        self.config.load_timeout()
    }

    /// Browser for the configured user, sharing this session's workers.
    pub fn browser(&self) -> Browser {
        Browser::new(
            self.executor.clone(),
            self.config.user_id,
            self.config.group_id,
        )
    }
}
