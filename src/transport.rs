//! Access to the inference endpoint.
//!
//! A [`Transport`] hands out one [`Session`] per run. The session knows the
//! base URL requests go to and owns whatever keeps that URL alive; for an SSH
//! tunnel that is the `ssh` child process. [`Session::release`] consumes the
//! session, so it can run at most once.
//!
//! # Example
//!
//! ```rust
//! use chatdigest::config::TransportConfig;
//! use chatdigest::transport::{Session, Transport, TransportManager};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> chatdigest::Result<()> {
//! let manager = TransportManager::new(TransportConfig::direct("http://localhost:11434"));
//! let session = manager.acquire().await?;
//! assert_eq!(session.endpoint(), "http://localhost:11434");
//! session.release().await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::{TransportConfig, TunnelConfig};
use crate::error::{ChatdigestError, Result};

/// Resolved access to the endpoint for the duration of a run.
pub trait Session: Send {
    /// Base URL requests go to.
    fn endpoint(&self) -> &str;

    /// Tears the session down. Failures are logged, never returned.
    fn release(self) -> impl Future<Output = ()> + Send;
}

/// Source of [`Session`]s.
pub trait Transport: Sync {
    type Session: Session;

    fn acquire(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Program, arguments and environment for the tunnel process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl TunnelCommand {
    /// `ssh` port-forward for `config`, wrapped in `sshpass -e` when a
    /// password is set. The password travels in `SSHPASS`, never in argv.
    pub fn ssh(config: &TunnelConfig) -> Self {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-p".to_string(),
            config.ssh_port.to_string(),
            "-N".to_string(),
            "-L".to_string(),
            format!("{}:localhost:{}", config.local_port, config.remote_port),
            format!("{}@{}", config.user, config.host),
        ];

        match &config.password {
            Some(password) => {
                let mut wrapped = vec!["-e".to_string(), "ssh".to_string()];
                wrapped.append(&mut args);
                Self {
                    program: "sshpass".to_string(),
                    args: wrapped,
                    env: vec![("SSHPASS".to_string(), password.clone())],
                }
            }
            None => Self {
                program: "ssh".to_string(),
                args,
                env: Vec::new(),
            },
        }
    }

    /// Arbitrary command, mainly for running the tunnel lifecycle without ssh.
    pub fn custom(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            env: Vec::new(),
        }
    }

    fn spawn(&self) -> Result<Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Own process group, so the whole tree can be signalled on release.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.spawn().map_err(|e| {
            ChatdigestError::transport(format!("failed to start `{}`: {e}", self.program))
        })
    }
}

/// Builds sessions from a [`TransportConfig`].
#[derive(Debug, Clone)]
pub struct TransportManager {
    config: TransportConfig,
    tunnel_command: Option<TunnelCommand>,
}

impl TransportManager {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            tunnel_command: None,
        }
    }

    /// Replaces the tunnel process. Only used by tunnel configurations.
    #[must_use]
    pub fn with_tunnel_command(mut self, command: TunnelCommand) -> Self {
        self.tunnel_command = Some(command);
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn open_tunnel(&self, tunnel: &TunnelConfig) -> Result<ActiveTransport> {
        let command = self
            .tunnel_command
            .clone()
            .unwrap_or_else(|| TunnelCommand::ssh(tunnel));

        let mut child = command.spawn()?;
        info!(
            host = %tunnel.host,
            local_port = tunnel.local_port,
            remote_port = tunnel.remote_port,
            pid = ?child.id(),
            "tunnel started"
        );

        // No readiness probe: the forward is assumed up after the grace period.
        tokio::time::sleep(tunnel.grace_period()).await;

        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                return Err(ChatdigestError::transport(format!(
                    "tunnel exited during startup ({status})"
                )));
            }
            Err(e) => {
                return Err(ChatdigestError::transport(format!(
                    "could not check tunnel process: {e}"
                )));
            }
        }

        Ok(ActiveTransport {
            endpoint: tunnel.local_endpoint(),
            tunnel: Some(child),
            shutdown_timeout: tunnel.shutdown_timeout(),
        })
    }
}

impl Transport for TransportManager {
    type Session = ActiveTransport;

    async fn acquire(&self) -> Result<ActiveTransport> {
        self.config.validate()?;
        match &self.config {
            TransportConfig::Direct { endpoint } => {
                debug!(%endpoint, "using direct endpoint");
                Ok(ActiveTransport::direct(endpoint.clone()))
            }
            TransportConfig::Tunnel(tunnel) => self.open_tunnel(tunnel).await,
        }
    }
}

/// Session handed out by [`TransportManager`].
///
/// Dropping it without [`release`](Session::release) still kills the tunnel
/// process, just without the graceful SIGTERM.
#[derive(Debug)]
pub struct ActiveTransport {
    endpoint: String,
    tunnel: Option<Child>,
    shutdown_timeout: Duration,
}

impl ActiveTransport {
    /// Session for an endpoint reachable as is.
    pub fn direct(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            tunnel: None,
            shutdown_timeout: Duration::ZERO,
        }
    }

    pub fn is_tunneled(&self) -> bool {
        self.tunnel.is_some()
    }
}

impl Session for ActiveTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn release(self) {
        if let Some(child) = self.tunnel {
            terminate(child, self.shutdown_timeout).await;
        }
    }
}

async fn terminate(mut child: Child, grace: Duration) {
    let Some(pid) = child.id() else {
        debug!("tunnel already reaped");
        return;
    };

    signal_terminate(&mut child, pid);

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => info!(pid, %status, "tunnel stopped"),
        Ok(Err(e)) => warn!(pid, error = %e, "waiting for tunnel failed"),
        Err(_) => {
            warn!(pid, timeout_ms = grace.as_millis() as u64, "tunnel ignored SIGTERM, killing");
            force_kill(&mut child, pid).await;
        }
    }
}

#[cfg(unix)]
fn signal_terminate(_child: &mut Child, pid: u32) {
    // SAFETY: killpg has no memory-safety preconditions; the group id is the
    // child's pid because it was spawned with process_group(0).
    let ret = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGTERM) };
    if ret != 0 {
        warn!(pid, error = %std::io::Error::last_os_error(), "SIGTERM to tunnel group failed");
    }
}

#[cfg(not(unix))]
fn signal_terminate(child: &mut Child, pid: u32) {
    if let Err(e) = child.start_kill() {
        warn!(pid, error = %e, "stopping tunnel failed");
    }
}

#[cfg(unix)]
async fn force_kill(child: &mut Child, pid: u32) {
    // SAFETY: see signal_terminate.
    let ret = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if ret != 0 {
        warn!(pid, error = %std::io::Error::last_os_error(), "SIGKILL to tunnel group failed");
    }
    if let Err(e) = child.wait().await {
        warn!(pid, error = %e, "reaping tunnel failed");
    }
}

#[cfg(not(unix))]
async fn force_kill(child: &mut Child, pid: u32) {
    if let Err(e) = child.kill().await {
        warn!(pid, error = %e, "killing tunnel failed");
    }
}
