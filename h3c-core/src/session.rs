//! A single authenticated session bound to one engine instance.

use crate::config::{ConfigError, SessionConfig};
use crate::engine::{Engine, EngineError};
use crate::responder::ChallengeResponder;
use crate::status::{StatusCode, StatusReporter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("engine initialization failed: {0}")]
    EngineInit(#[source] EngineError),
}

impl InitError {
    pub fn status(&self) -> StatusCode {
        match self {
            InitError::Config(_) => StatusCode::InvalidParameters,
            InitError::EngineInit(_) => StatusCode::EngineInitError,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start authentication: {0}")]
    Start(#[source] EngineError),
    #[error("session terminated: {0}")]
    Dispatch(#[source] EngineError),
}

impl RunError {
    pub fn status(&self) -> StatusCode {
        match self {
            RunError::Start(_) => StatusCode::EngineStartError,
            RunError::Dispatch(EngineError::AuthFailure) => StatusCode::EapFailure,
            RunError::Dispatch(_) => StatusCode::ResponseError,
        }
    }
}

/// One-shot shutdown request, set from signal context and polled by the
/// dispatch loop between events.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A validated configuration with its responder registered on the engine.
pub struct Session<E: Engine> {
    config: Arc<SessionConfig>,
    reporter: StatusReporter,
    engine: E,
}

impl<E: Engine> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Validates `config` and registers its callbacks with `engine`.
pub fn init<E: Engine>(config: SessionConfig, engine: E) -> Result<Session<E>, InitError> {
    Session::init(config, engine)
}

impl<E: Engine> Session<E> {
    pub fn init(config: SessionConfig, mut engine: E) -> Result<Self, InitError> {
        config.validate()?;
        let Some(sink) = config.sink.clone() else {
            return Err(ConfigError::InvalidParameters { field: "sink" }.into());
        };

        let config = Arc::new(config);
        let reporter = StatusReporter::new(sink);
        let responder = ChallengeResponder::new(config.clone(), reporter.clone());

        engine
            .init(&config.interface, Box::new(responder))
            .map_err(InitError::EngineInit)?;
        info!("EAPoL engine bound to {}", config.interface);

        Ok(Session { config, reporter, engine })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs the session until shutdown is requested or the engine fails.
    ///
    /// A shutdown request logs off and releases the engine exactly once and
    /// returns `Ok`. Every engine error is fatal to this run and is reported
    /// to the sink like a lifecycle error.
    ///
    /// The flag is only checked between `dispatch` calls, so how quickly a
    /// shutdown takes effect is bounded by the engine's receive timeout.
    pub fn run(mut self, shutdown: &Shutdown) -> Result<(), RunError> {
        self.reporter.report(StatusCode::AuthStart);

        if let Err(e) = self.engine.start() {
            self.reporter.report(StatusCode::EngineStartError);
            error!("Failed to start authentication on {}: {}", self.config.interface, e);
            self.engine.cleanup();
            return Err(RunError::Start(e));
        }

        loop {
            if shutdown.is_requested() {
                info!("Shutdown requested, logging off {}", self.config.interface);
                self.engine.logoff();
                self.engine.cleanup();
                return Ok(());
            }

            if let Err(e) = self.engine.dispatch() {
                // on_failure has already reported EapFailure.
                if !matches!(e, EngineError::AuthFailure) {
                    self.reporter.report(StatusCode::ResponseError);
                }
                error!("EAPoL dispatch failed: {}", e);
                self.engine.cleanup();
                return Err(RunError::Dispatch(e));
            }
        }
    }
}
