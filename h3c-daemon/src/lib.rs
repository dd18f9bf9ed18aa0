//! Command-line front end for H3C 802.1X sessions.
//!
//! An engine crate supplies the link-layer [`Engine`] and calls [`main`]:
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     h3c_daemon::main(|options| PcapEngine::open(&options.interface))
//! }
//! ```

pub mod config;
pub mod signals;
pub mod supervisor;
pub mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Args, Options, Role};
use h3c_core::{Engine, LogLevel, Settings};
use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use supervisor::{ProcessLauncher, Supervisor, RESTART_DELAY};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub fn main<E, F>(make_engine: F) -> ExitCode
where
    E: Engine + 'static,
    F: FnOnce(&Options) -> Result<E>,
{
    let args = Args::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args, make_engine)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if tracing::dispatcher::has_been_set() {
                error!("{:#}", e);
            } else {
                eprintln!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

pub async fn run<E, F>(args: Args, make_engine: F) -> Result<()>
where
    E: Engine + 'static,
    F: FnOnce(&Options) -> Result<E>,
{
    let settings = match &args.config {
        Some(path) => config::load_settings(path)?,
        None => Settings::default(),
    };
    init_tracing(config::log_level(&args, &settings), args.log_file.as_deref())?;

    info!(
        "h3c {} : A command line tool for H3C 802.1X authentication",
        env!("CARGO_PKG_VERSION")
    );

    config::ensure_root()?;
    let options = config::resolve(&args, settings, config::prompt_password)?;

    match args.role {
        Some(Role::Supervisor) => {
            supervisor::prepare_supervisor();
            let launcher = ProcessLauncher::for_worker(&options)
                .context("failed to locate current executable")?;
            Supervisor::new(launcher, RESTART_DELAY).run().await;
            Ok(())
        }
        Some(Role::Worker) => run_foreground(&options, make_engine).await,
        None if options.daemon && std::process::id() != 1 => {
            let pid = supervisor::spawn_supervisor(&options).context("failed to start daemon")?;
            info!("Daemon supervisor started with pid {}", pid);
            Ok(())
        }
        None => run_foreground(&options, make_engine).await,
    }
}

async fn run_foreground<E, F>(options: &Options, make_engine: F) -> Result<()>
where
    E: Engine + 'static,
    F: FnOnce(&Options) -> Result<E>,
{
    let engine = make_engine(options).context("failed to create EAPoL engine")?;
    worker::run_session(options, engine, worker::status_sink()).await
}

fn init_tracing(level: LogLevel, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!(e))
}
