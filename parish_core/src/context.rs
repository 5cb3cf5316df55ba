use std::sync::Arc;

use anyhow::Result;

use crate::{
    backend::{Api, RestClient, Transport},
    config::Config,
    events::{Activity, EventBus},
};

#[derive(Clone)]
pub struct Context {
    pub config: Arc<Config>,
    pub api: Api,
    pub events: EventBus,
    pub activity: Activity,
}

impl Context {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            api: Api::new(transport),
            events: EventBus::new(),
            activity: Activity::new(),
        }
    }

    /// Context talking to the configured REST backend.
    pub fn connect(config: Arc<Config>) -> Result<Self> {
        let transport = RestClient::new(
            &config.backend_url,
            config.backend_token.as_deref(),
            config.request_timeout(),
        )?;
        Ok(Self::new(config, Arc::new(transport)))
    }
}
