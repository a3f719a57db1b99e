//! Session state for SQLFlow.
//!
//! Everything one user session needs lives in [`SessionContext`]: the form
//! configuration, the transcript, the gateway, and the model client. The UI
//! owns one context and hands it to each handler.

use crate::chat::{Orchestrator, TurnOutcome};
use crate::config::{Configuration, LlmConfig};
use crate::db::{gateway_for, DatabaseGateway};
use crate::error::{Result, SqlFlowError};
use crate::llm::{create_client, LlmClient, LlmProvider};
use crate::transcript::Transcript;
use tracing::{info, warn};

/// Whether the session can start a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// No model client; the user must enter an API key.
    NeedsApiKey,
    /// The last connection check failed or none was made.
    NeedsConnection,
}

impl Readiness {
    /// Message shown while the session is not ready.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            Self::Ready => None,
            Self::NeedsApiKey => {
                Some("Please enter your API key in the sidebar to continue.")
            }
            Self::NeedsConnection => Some("Connect to a database from the sidebar to start."),
        }
    }
}

/// Builds the model client for a configuration, or `None` when it cannot.
type ClientFactory = Box<dyn Fn(&Configuration) -> Option<Box<dyn LlmClient>> + Send + Sync>;

/// Per-session state.
pub struct SessionContext {
    config: Configuration,
    llm_config: LlmConfig,
    transcript: Transcript,
    gateway: Box<dyn DatabaseGateway>,
    llm: Option<Box<dyn LlmClient>>,
    client_factory: ClientFactory,
    connected: bool,
}

impl SessionContext {
    /// Creates a session with the gateway matching the configured backend.
    ///
    /// The session starts unconnected, and without a model client unless the
    /// configuration already carries a key or the provider needs none.
    pub fn new(config: Configuration, llm_config: LlmConfig) -> Self {
        let gateway = gateway_for(config.backend);
        let factory = provider_factory(&llm_config);
        Self::build(config, llm_config, gateway, factory)
    }

    /// Creates a session over a given gateway and model client.
    ///
    /// The client is only installed while the configuration has an API key,
    /// the same rule the provider clients follow.
    pub fn with_client<C>(config: Configuration, gateway: Box<dyn DatabaseGateway>, client: C) -> Self
    where
        C: LlmClient + Clone + 'static,
    {
        let factory: ClientFactory = Box::new(move |config: &Configuration| {
            config
                .has_api_key()
                .then(|| Box::new(client.clone()) as Box<dyn LlmClient>)
        });
        Self::build(config, LlmConfig::default(), gateway, factory)
    }

    fn build(
        config: Configuration,
        llm_config: LlmConfig,
        gateway: Box<dyn DatabaseGateway>,
        client_factory: ClientFactory,
    ) -> Self {
        let llm = client_factory(&config);
        Self {
            config,
            llm_config,
            transcript: Transcript::new(),
            gateway,
            llm,
            client_factory,
            connected: false,
        }
    }

    /// Stores a new configuration and checks the database connection.
    ///
    /// The model client is rebuilt from the new API key, or dropped when the
    /// key is blank. A failed check leaves the session unconnected and
    /// returns a connection error.
    pub async fn submit_configuration(&mut self, config: Configuration) -> Result<()> {
        if config.backend != self.config.backend {
            self.gateway = gateway_for(config.backend);
        }
        self.config = config;
        self.llm = (self.client_factory)(&self.config);

        info!("Checking connection to {}", self.config.display_string());
        match self.gateway.check_connection(&self.config).await {
            Ok(()) => {
                self.connected = true;
                info!("Connected");
                Ok(())
            }
            Err(e) => {
                self.connected = false;
                warn!("Connection check failed: {e}");
                Err(SqlFlowError::connection(e.message()))
            }
        }
    }

    /// Reports whether a turn can start.
    pub fn readiness(&self) -> Readiness {
        if self.llm.is_none() {
            Readiness::NeedsApiKey
        } else if !self.connected {
            Readiness::NeedsConnection
        } else {
            Readiness::Ready
        }
    }

    /// Runs one chat turn.
    ///
    /// Fails without touching the transcript unless the session is ready.
    /// Returns `Ok(None)` for blank input.
    pub async fn ask(&mut self, question: &str) -> Result<Option<TurnOutcome>> {
        let llm = match (self.readiness(), self.llm.as_deref()) {
            (Readiness::Ready, Some(llm)) => llm,
            (readiness, _) => {
                let reason = readiness
                    .prompt()
                    .unwrap_or("The session is not ready.");
                return Err(match readiness {
                    Readiness::NeedsConnection => SqlFlowError::connection(reason),
                    _ => SqlFlowError::llm(reason),
                });
            }
        };

        Orchestrator::new(&self.config, self.gateway.as_ref(), llm)
            .run_turn(&mut self.transcript, question)
            .await
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn llm_config(&self) -> &LlmConfig {
        &self.llm_config
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Factory for the configured provider. Only the form key is used; keys from
/// the environment are copied into the form at startup.
fn provider_factory(llm_config: &LlmConfig) -> ClientFactory {
    let provider = match llm_config.provider.parse::<LlmProvider>() {
        Ok(provider) => provider,
        Err(e) => {
            warn!("{e}");
            return Box::new(|_: &Configuration| None);
        }
    };
    let model = llm_config.model.clone();

    Box::new(move |config: &Configuration| {
        if provider != LlmProvider::Mock && !config.has_api_key() {
            return None;
        }
        match create_client(provider, Some(config.api_key.clone()), model.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Could not create LLM client: {e}");
                None
            }
        }
    })
}
