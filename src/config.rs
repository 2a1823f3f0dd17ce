//! Configuration types for the pipeline and its collaborators.
//!
//! Plain structs with defaults and `with_*` builders, usable from library
//! code without any CLI framework. The binary fills them from flags and
//! environment variables.
//!
//! - [`InferenceConfig`] - model name, API key, request timeout
//! - [`TransportConfig`] - direct endpoint or SSH tunnel ([`TunnelConfig`])
//! - [`PipelineConfig`] - output directory, ledger location, prompt budget
//!
//! # Example
//!
//! ```rust
//! use chatdigest::config::{InferenceConfig, PipelineConfig, TransportConfig};
//!
//! let inference = InferenceConfig::new().with_model("llama3");
//! let transport = TransportConfig::direct("http://localhost:11434");
//! let pipeline = PipelineConfig::new().with_output_dir("out");
//!
//! assert_eq!(inference.model, "llama3");
//! assert_eq!(pipeline.ledger_path().to_str(), Some("out/history.jsonl"));
//! assert!(transport.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::prompt::DEFAULT_MAX_CHARS;
use crate::error::{ChatdigestError, Result};

/// Default ledger file name inside the output directory.
pub const LEDGER_FILE: &str = "history.jsonl";

/// Settings for the text-generation client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Model name sent with every request (default: `gemma3n`)
    pub model: String,

    /// Bearer token, sent only when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Upper bound for a whole request, body included (default: 180s)
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: "gemma3n".to_string(),
            api_key: None,
            timeout_secs: 180,
        }
    }
}

impl InferenceConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API key. Blank keys are treated as absent.
    #[must_use]
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// SSH port-forward to a remote model server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelConfig {
    pub host: String,
    pub user: String,

    /// SSH port (default: 22)
    pub ssh_port: u16,

    /// Local end of the forward (default: 11434)
    pub local_port: u16,

    /// Port of the model server on the remote host (default: 11434)
    pub remote_port: u16,

    /// Password passed to `sshpass` through the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Wait after spawning before the forward is assumed ready (default: 1000ms)
    pub grace_period_ms: u64,

    /// Wait for the tunnel to exit after SIGTERM before killing it (default: 5000ms)
    pub shutdown_timeout_ms: u64,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            ssh_port: 22,
            local_port: 11434,
            remote_port: 11434,
            password: None,
            grace_period_ms: 1000,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl TunnelConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ssh_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }

    #[must_use]
    pub fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = port;
        self
    }

    #[must_use]
    pub fn with_remote_port(mut self, port: u16) -> Self {
        self.remote_port = port;
        self
    }

    /// Sets the SSH password. Blank passwords are treated as absent.
    #[must_use]
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    #[must_use]
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period_ms = grace.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Endpoint the forward exposes locally.
    pub fn local_endpoint(&self) -> String {
        format!("http://localhost:{}", self.local_port)
    }
}

/// How the inference endpoint is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    /// The endpoint is reachable as is.
    Direct { endpoint: String },
    /// The endpoint is reached through an SSH port-forward.
    Tunnel(TunnelConfig),
}

impl TransportConfig {
    pub fn direct(endpoint: impl Into<String>) -> Self {
        TransportConfig::Direct {
            endpoint: endpoint.into(),
        }
    }

    pub fn tunnel(config: TunnelConfig) -> Self {
        TransportConfig::Tunnel(config)
    }

    /// Checks that the required fields are present.
    pub fn validate(&self) -> Result<()> {
        match self {
            TransportConfig::Direct { endpoint } if endpoint.trim().is_empty() => {
                Err(ChatdigestError::config("direct endpoint is empty"))
            }
            TransportConfig::Direct { .. } => Ok(()),
            TransportConfig::Tunnel(tunnel) if tunnel.host.trim().is_empty() => {
                Err(ChatdigestError::config("tunnel host is empty"))
            }
            TransportConfig::Tunnel(tunnel) if tunnel.user.trim().is_empty() => {
                Err(ChatdigestError::config("tunnel user is empty"))
            }
            TransportConfig::Tunnel(_) => Ok(()),
        }
    }
}

/// Settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory for artifacts and session records (default: `output`)
    pub output_dir: PathBuf,

    /// Ledger location (default: `<output_dir>/history.jsonl`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,

    /// Character budget for the conversation text in a prompt (default: 15000)
    pub max_prompt_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            ledger_path: None,
            max_prompt_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_max_prompt_chars(mut self, chars: usize) -> Self {
        self.max_prompt_chars = chars;
        self
    }

    /// Resolved ledger location.
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(LEDGER_FILE))
    }
}
