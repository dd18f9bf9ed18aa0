use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use h3c_core::{LogLevel, Settings};
use std::ffi::OsString;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable carrying the password to re-executed processes.
pub const PASSWORD_ENV: &str = "H3C_PASSWORD";

/// Which part of the process tree this invocation plays.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Supervisor,
    Worker,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Supervisor => "supervisor",
            Role::Worker => "worker",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "h3c", author, version, about = "A command line tool for H3C 802.1X authentication", long_about = None)]
pub struct Args {
    /// Network interface (default: en0)
    #[clap(short, long)]
    pub interface: Option<String>,

    #[clap(short, long)]
    pub username: Option<String>,

    #[clap(short, long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// TOML settings file; command-line options take precedence
    #[clap(short, long, value_parser)]
    pub config: Option<PathBuf>,

    /// Detach and keep a worker running, restarting it whenever it exits
    #[clap(short, long)]
    pub daemon: bool,

    #[clap(long)]
    pub log_level: Option<LogLevel>,

    /// Append logs to this file instead of stderr
    #[clap(long, value_parser)]
    pub log_file: Option<PathBuf>,

    #[clap(long, value_enum, hide = true)]
    pub role: Option<Role>,
}

/// Fully resolved options for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub interface: String,
    pub username: String,
    pub password: String,
    pub daemon: bool,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = toml::from_str(&contents)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    info!("Settings loaded from {}", path.display());
    Ok(settings)
}

pub fn log_level(args: &Args, settings: &Settings) -> LogLevel {
    args.log_level.unwrap_or(settings.log_level)
}

/// Merges the command line over `settings`, prompting for the password if
/// neither supplies one.
pub fn resolve<P>(args: &Args, settings: Settings, prompt: P) -> Result<Options>
where
    P: FnOnce() -> Result<String>,
{
    let interface = args.interface.clone().unwrap_or(settings.interface);

    let Some(username) = args.username.clone().or(settings.username) else {
        bail!("Please specify username.");
    };

    let password = match args.password.clone().or(settings.password) {
        Some(password) => password,
        None => prompt()?,
    };
    if password.is_empty() {
        bail!("Incorrect password.");
    }

    let log_file = match &args.log_file {
        Some(path) if path.is_relative() => Some(std::env::current_dir()?.join(path)),
        other => other.clone(),
    };

    Ok(Options {
        interface,
        username,
        password,
        daemon: args.daemon || settings.daemon,
        log_level: args.log_level.unwrap_or(settings.log_level),
        log_file,
    })
}

/// Arguments that make a re-executed copy of this program play `role`.
/// The password travels through [`PASSWORD_ENV`], never argv.
pub fn child_args(options: &Options, role: Role) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--interface".into(),
        options.interface.clone().into(),
        "--username".into(),
        options.username.clone().into(),
        "--log-level".into(),
        options.log_level.as_str().into(),
        "--role".into(),
        role.as_str().into(),
    ];
    if let Some(path) = &options.log_file {
        args.push("--log-file".into());
        args.push(path.clone().into_os_string());
    }
    args
}

pub fn ensure_root() -> Result<()> {
    if unsafe { libc::geteuid() } != 0 {
        bail!("You have to run this program as root.");
    }
    Ok(())
}

/// Reads a password from the terminal with echo turned off.
pub fn prompt_password() -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "Password: ")?;
    stderr.flush()?;

    let fd = libc::STDIN_FILENO;
    let mut saved: libc::termios = unsafe { std::mem::zeroed() };
    let is_tty = unsafe { libc::tcgetattr(fd, &mut saved) } == 0;
    if is_tty {
        let mut silent = saved;
        silent.c_lflag &= !libc::ECHO;
        unsafe { libc::tcsetattr(fd, libc::TCSANOW, &silent) };
    }

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line);

    if is_tty {
        unsafe { libc::tcsetattr(fd, libc::TCSANOW, &saved) };
        writeln!(stderr)?;
    }
    read.context("failed to read password")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
