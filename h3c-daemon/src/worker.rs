use crate::config::Options;
use crate::signals;
use anyhow::{anyhow, Context, Result};
use h3c_core::{Engine, SessionConfig, Shutdown, StatusCode, StatusSink};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Sink that writes every status message to the log.
pub fn status_sink() -> StatusSink {
    Arc::new(|code: StatusCode| match code {
        StatusCode::EapFailure => warn!("{}", code),
        code if code.is_error() => error!("{}", code),
        code => info!("{}", code),
    })
}

/// Runs one foreground session until a shutdown signal or a fatal error.
pub async fn run_session<E>(options: &Options, engine: E, sink: StatusSink) -> Result<()>
where
    E: Engine + 'static,
{
    let config = SessionConfig::new(
        options.interface.as_str(),
        options.username.as_str(),
        options.password.as_str(),
        sink.clone(),
    );

    let session = match h3c_core::init(config, engine) {
        Ok(session) => session,
        Err(e) => {
            sink(e.status());
            return Err(anyhow!(e)).context("Ethernet interface initialize fail.");
        }
    };

    let shutdown = Shutdown::new();
    let listener = signals::spawn_shutdown_listener(shutdown.clone());

    let joined = tokio::task::spawn_blocking(move || session.run(&shutdown)).await;
    listener.abort();

    match joined.context("session task failed")? {
        Ok(()) => {
            info!("Logged off {}", options.interface);
            Ok(())
        }
        Err(e) => Err(anyhow!(e)),
    }
}
