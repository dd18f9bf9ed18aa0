pub mod config;
pub mod engine;
pub mod responder;
pub mod session;
pub mod status;

pub use config::{ConfigError, LogLevel, SessionConfig, Settings, MAX_USERNAME_LEN};
pub use engine::{
    BufferError, EapHandler, Engine, EngineError, ResponseBuffer, Verdict, MAX_RESPONSE_LEN,
};
pub use responder::{challenge_digest, ChallengeResponder, Salt, VERSION_INFO};
pub use session::{init, InitError, RunError, Session, Shutdown};
pub use status::{StatusCode, StatusReporter, StatusSink};
