//! jdwp-client: entry point.
//!
//! Connects to a JVM started with the JDWP agent, performs the handshake,
//! and prints what the VM reports about itself: version, loaded classes,
//! identifier widths, capabilities, thread groups, and the names of all
//! live threads.
//!
//! # Starting a target VM
//!
//! ```text
//! java -agentlib:jdwp=transport=dt_socket,server=y,suspend=y,address=5005 -jar app.jar
//! ```
//!
//! With `suspend=y` the VM waits for a debugger before running `main`; the
//! probe resumes it (unless `--no-resume` is given) and then lists threads.
//!
//! # Usage
//!
//! ```text
//! jdwp-client [OPTIONS]
//!
//! Options:
//!   --config <PATH>              TOML config file (optional)
//!   --host <HOST>                Target host [config default: 127.0.0.1]
//!   --port <PORT>                Target port [config default: 5005]
//!   --read-timeout-ms <MS>       Bound on receiving one packet
//!   --write-timeout-ms <MS>      Bound on sending one packet
//!   --no-verify-handshake        Accept a VM that echoes the wrong handshake
//!   --no-resume                  Leave the VM suspended
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                     | Flag                    |
//! |------------------------------|-------------------------|
//! | `JDWP_CONFIG`                | `--config`              |
//! | `JDWP_HOST`                  | `--host`                |
//! | `JDWP_PORT`                  | `--port`                |
//! | `JDWP_READ_TIMEOUT_MS`       | `--read-timeout-ms`     |
//! | `JDWP_WRITE_TIMEOUT_MS`      | `--write-timeout-ms`    |
//! | `JDWP_NO_VERIFY_HANDSHAKE`   | `--no-verify-handshake` |
//!
//! Precedence: command line, then environment, then config file, then
//! built-in defaults.  Log verbosity comes from `RUST_LOG`, falling back to
//! the config file's `log_level`.
//!
//! # Architecture overview
//!
//! ```text
//! jdwp-client  ← this process
//!   application/      DebuggerCore: typed commands over a CommandChannel
//!   infrastructure/   TOML config → SessionConfig
//!       ↕
//! jdwp-session        handshake, inbound/outbound loops, correlation
//!       ↕  TCP
//! target JVM (JDWP agent)
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use jdwp_client::application::{CommandError, DebuggerCore};
use jdwp_client::infrastructure::storage::config::{load_config, AppConfig};
use jdwp_session::{Session, SessionState};

/// How long the VM runs after `Resume` before threads are listed.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Probe a running JVM over JDWP.
#[derive(Debug, Parser)]
#[command(
    name = "jdwp-client",
    about = "Connects to a JVM's JDWP agent and prints what it reports",
    version
)]
struct Cli {
    /// TOML config file.  A missing file is treated as empty.
    #[arg(long, env = "JDWP_CONFIG")]
    config: Option<PathBuf>,

    /// Host the target VM listens on.
    #[arg(long, env = "JDWP_HOST")]
    host: Option<String>,

    /// Port the target VM listens on.
    #[arg(long, env = "JDWP_PORT")]
    port: Option<u16>,

    /// Milliseconds allowed to receive the rest of a packet once it starts.
    #[arg(long, env = "JDWP_READ_TIMEOUT_MS")]
    read_timeout_ms: Option<u64>,

    /// Milliseconds allowed to send one packet.
    #[arg(long, env = "JDWP_WRITE_TIMEOUT_MS")]
    write_timeout_ms: Option<u64>,

    /// Do not check that the VM echoes `JDWP-Handshake` exactly.
    #[arg(long, env = "JDWP_NO_VERIFY_HANDSHAKE")]
    no_verify_handshake: bool,

    /// Leave a suspended VM suspended.
    #[arg(long)]
    no_resume: bool,
}

impl Cli {
    /// Loads the config file (if any) and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// combined settings are invalid.
    fn into_app_config(self) -> anyhow::Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => AppConfig::default(),
        };
        self.apply(&mut cfg);
        cfg.validate().context("invalid settings")?;
        Ok(cfg)
    }

    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(host) = &self.host {
            cfg.target.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.target.port = port;
        }
        if let Some(ms) = self.read_timeout_ms {
            cfg.timeouts.read_ms = ms;
        }
        if let Some(ms) = self.write_timeout_ms {
            cfg.timeouts.write_ms = ms;
        }
        if self.no_verify_handshake {
            cfg.session.verify_handshake = false;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let resume = !cli.no_resume;
    let cfg = cli.into_app_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins when set; otherwise the config file's `log_level`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&cfg.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let session_config = cfg.to_session_config();
    info!("jdwp-client starting, target={}", session_config.address());

    let session = Session::connect(session_config).await?;
    session.start().await.context("JDWP handshake failed")?;

    // Events must be drained or the inbound loop eventually stalls.
    if let Some(mut events) = session.take_command_receiver() {
        tokio::spawn(async move {
            while let Some(frame) = events.recv().await {
                debug!(
                    "event packet {} ({}, {}), {} bytes",
                    frame.id,
                    frame.packet.command_set,
                    frame.packet.command,
                    frame.packet.data.len()
                );
            }
        });
    }

    let core = DebuggerCore::new(session);
    if let Some(sizes) = cfg.id_sizes {
        core.set_id_sizes(sizes)?;
    }

    let outcome = tokio::select! {
        result = probe(&core, cfg.id_sizes.is_none(), resume) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, stopping");
            Ok(())
        }
    };

    let session = core.channel();
    if session.state() == SessionState::Open {
        session.stop().await?;
    }
    outcome?;

    info!("jdwp-client finished");
    Ok(())
}

/// Runs the probe sequence.  Errors the VM reports are logged and skipped;
/// a broken session ends the probe.
async fn probe(
    core: &DebuggerCore<Session>,
    query_id_sizes: bool,
    resume: bool,
) -> anyhow::Result<()> {
    let vm = core.vm();

    if let Some(version) = tolerate("Version", vm.version().await)? {
        println!(
            "version = {} (JDWP {}.{}, {} {})",
            version.description.lines().next().unwrap_or_default(),
            version.jdwp_major,
            version.jdwp_minor,
            version.vm_name,
            version.vm_version
        );
    }

    if query_id_sizes {
        tolerate("IDSizes", core.refresh_id_sizes().await)?;
    }
    println!("idSizes = {:?}", core.id_sizes());

    if let Some(classes) = tolerate("AllClasses", vm.all_classes().await)? {
        println!("allClasses = {} loaded", classes.len());
        for class in &classes {
            debug!("{} {} {} [{}]", class.ref_type_tag, class.type_id, class.signature, class.status);
        }
    }

    if let Some(caps) = tolerate("Capabilities", vm.capabilities().await)? {
        println!("caps = {caps:?}");
    }
    if let Some(caps) = tolerate("CapabilitiesNew", vm.capabilities_new().await)? {
        println!("capsNew = {caps:?}");
    }

    if let Some(groups) = tolerate("TopLevelThreadGroups", vm.top_level_thread_groups().await)? {
        let ids: Vec<String> = groups.iter().map(ToString::to_string).collect();
        println!("topLevelThreadGroups = [{}]", ids.join(", "));
    }

    if resume {
        tolerate("Resume", vm.resume().await)?;
        tokio::time::sleep(SETTLE_DELAY).await;
    }

    let threads = tolerate("AllThreads", vm.all_threads().await)?.unwrap_or_default();
    println!("allThreads = {} live", threads.len());
    for (idx, thread) in threads.into_iter().enumerate() {
        let name = tolerate("ThreadReference.Name", core.threads().name(thread).await)?;
        println!(
            "thread idx = {idx}, tid = {thread}, name = {}",
            name.as_deref().unwrap_or("<unavailable>")
        );
    }
    Ok(())
}

/// Logs and swallows errors the VM reported; propagates transport failures.
fn tolerate<T>(what: &str, result: Result<T, CommandError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CommandError::Session(e)) => Err(e).with_context(|| format!("{what} failed")),
        Err(e) => {
            warn!("{what} failed: {e}");
            Ok(None)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
