use lingua_core::{AccessPolicy, Clock, Config, SystemClock};
use lingua_db::Store;
use std::sync::Arc;

/// Collaborators shared by every service: the store, the role policy and the clock.
#[derive(Clone)]
pub struct ServiceContext {
    store: Arc<dyn Store>,
    policy: Arc<AccessPolicy>,
    clock: Arc<dyn Clock>,
    update_resets_status: bool,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn Store>, policy: AccessPolicy) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
            clock: Arc::new(SystemClock),
            update_resets_status: false,
        }
    }

    pub fn from_config(store: Arc<dyn Store>, config: &Config) -> Result<Self, anyhow::Error> {
        let policy = AccessPolicy::from_config(config)?;
        Ok(Self::new(store, policy).with_update_resets_status(config.update_resets_status()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// When set, a content update returns an approved or rejected message to PENDING
    pub fn with_update_resets_status(mut self, enabled: bool) -> Self {
        self.update_resets_status = enabled;
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn update_resets_status(&self) -> bool {
        self.update_resets_status
    }
}
