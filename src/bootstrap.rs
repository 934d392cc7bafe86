use crate::api::CastApi;
use crate::config::SessionConfig;
use crate::error::{CastError, Result};
use crate::session::CastSession;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Event name the device API announces itself with
const HELLO_EVENT: &str = "Hello";

/// Builds the device API client once it is known to be available
pub type ApiFactory = Box<dyn Fn() -> Arc<dyn CastApi> + Send + Sync>;

/// Message posted by the device API when it becomes available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeMessage {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
}

impl HandshakeMessage {
    pub fn hello(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            event: Some(HELLO_EVENT.to_string()),
        }
    }

    fn is_hello_from(&self, source: &str) -> bool {
        self.source.as_deref() == Some(source) && self.event.as_deref() == Some(HELLO_EVENT)
    }
}

/// Waits for the device API and initializes the session exactly once
pub struct BootstrapGate {
    config: SessionConfig,
    factory: ApiFactory,
    /// Built on first detection and reused if the session has to be retried
    api: Option<Arc<dyn CastApi>>,
    session: Option<CastSession>,
}

impl BootstrapGate {
    pub fn new(config: SessionConfig, factory: ApiFactory) -> Self {
        Self {
            config: config.normalized(),
            factory,
            api: None,
            session: None,
        }
    }

    /// Initialize right away if the device API is already present
    ///
    /// Returns `true` when this call performed the initialization.
    pub fn detect(&mut self, api_present: bool) -> Result<bool> {
        if !api_present {
            tracing::debug!("Cast API not present, waiting for handshake");
            return Ok(false);
        }
        self.initialize()
    }

    /// Handle a message that may be the device API handshake
    pub fn on_message(&mut self, message: &HandshakeMessage) -> Result<bool> {
        if !message.is_hello_from(&self.config.handshake_source) {
            tracing::debug!("Ignoring message {:?}", message);
            return Ok(false);
        }
        self.initialize()
    }

    /// Handle a raw JSON message
    pub fn on_message_json(&mut self, json: &str) -> Result<bool> {
        let message: HandshakeMessage = serde_json::from_str(json)?;
        self.on_message(&message)
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    /// Get the session, once the device API has been detected
    pub fn session(&self) -> Result<&CastSession> {
        self.session.as_ref().ok_or(CastError::ApiUnavailable)
    }

    fn initialize(&mut self) -> Result<bool> {
        if self.session.is_some() {
            tracing::debug!("Cast API already initialized");
            return Ok(false);
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CastError::NoRuntime);
        }

        let factory = &self.factory;
        let api = self.api.get_or_insert_with(|| factory()).clone();
        let session = CastSession::new(api.clone(), &self.config)?;
        api.log_message("Cast API initialized.");
        self.session = Some(session);
        Ok(true)
    }
}
