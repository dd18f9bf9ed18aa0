//! Daemon detachment and crash-restart supervision.
//!
//! Each worker is a separate OS process running one foreground session, so a
//! crash or fatal authentication error takes down only that worker. The
//! supervisor respawns it after a fixed delay, forever.

use crate::config::{child_args, Options, Role, PASSWORD_ENV};
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::io;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{error, info, warn};

pub const RESTART_DELAY: Duration = Duration::from_secs(5);

/// How a worker process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    pub pid: u32,
    pub status: ExitStatus,
}

/// Starts one worker and waits for it to exit.
#[async_trait]
pub trait WorkerLauncher: Send {
    async fn run_worker(&mut self) -> io::Result<WorkerExit>;
}

/// Launches workers by re-executing a program with fixed arguments.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(String, String)>,
}

impl ProcessLauncher {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        ProcessLauncher {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            envs: Vec::new(),
        }
    }

    /// Re-executes the current program as a worker for `options`.
    pub fn for_worker(options: &Options) -> io::Result<Self> {
        let mut launcher = Self::new(std::env::current_exe()?, child_args(options, Role::Worker));
        launcher.envs.push((PASSWORD_ENV.to_string(), options.password.clone()));
        Ok(launcher)
    }
}

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn run_worker(&mut self) -> io::Result<WorkerExit> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .spawn()?;
        let pid = child.id().unwrap_or_default();
        info!("Start child {}", pid);
        let status = child.wait().await?;
        Ok(WorkerExit { pid, status })
    }
}

pub struct Supervisor<L> {
    launcher: L,
    delay: Duration,
    cycles: u64,
}

impl<L: WorkerLauncher> Supervisor<L> {
    pub fn new(launcher: L, delay: Duration) -> Self {
        Supervisor { launcher, delay, cycles: 0 }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs one worker to completion, then waits out the restart delay.
    pub async fn run_cycle(&mut self) {
        match self.launcher.run_worker().await {
            Ok(exit) if exit.status.success() => {
                info!("Child {} exited, will restart later!", exit.pid)
            }
            Ok(exit) => warn!("Child {} exited with {}, will restart later!", exit.pid, exit.status),
            Err(e) => error!("Failed to start child: {}", e),
        }
        self.cycles += 1;
        tokio::time::sleep(self.delay).await;
    }

    /// Respawns workers indefinitely. Never returns.
    pub async fn run(mut self) {
        info!("Start daemon");
        loop {
            self.run_cycle().await;
        }
    }
}

/// Re-executes the current program as a detached supervisor.
pub fn spawn_supervisor(options: &Options) -> io::Result<u32> {
    let child = spawn_detached(
        std::env::current_exe()?,
        child_args(options, Role::Supervisor),
        [(PASSWORD_ENV, options.password.as_str())],
    )?;
    Ok(child.id())
}

/// Starts `program` as the leader of a new session, with `/` as working
/// directory and standard I/O on `/dev/null`. The caller does not wait on it.
pub fn spawn_detached<I, S, V, K, X>(
    program: impl AsRef<OsStr>,
    args: I,
    envs: V,
) -> io::Result<std::process::Child>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    V: IntoIterator<Item = (K, X)>,
    K: AsRef<OsStr>,
    X: AsRef<OsStr>,
{
    let mut command = std::process::Command::new(program);
    command
        .args(args)
        .envs(envs)
        .current_dir("/")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    unsafe {
        command.pre_exec(|| {
            if libc::setsid() < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
    command.spawn()
}

/// Process-wide setup for the supervisor: clear the umask and ignore
/// job-control signals. SIGCHLD keeps its default so exits can be reaped.
pub fn prepare_supervisor() {
    unsafe {
        libc::umask(0);
        libc::signal(libc::SIGTSTP, libc::SIG_IGN);
        libc::signal(libc::SIGTTOU, libc::SIG_IGN);
        libc::signal(libc::SIGTTIN, libc::SIG_IGN);
    }
}
