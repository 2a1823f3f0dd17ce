//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - top-level arguments, global logging flags included
//! - [`Command`] - `run` (the default) and `export`
//! - [`RunArgs`] / [`ExportArgs`] - per-command arguments
//!
//! Every connection setting can also come from the environment
//! (`LLM_HOST`, `SSH_HOST`, ...), so a `.env`-driven deployment keeps working
//! without flags.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{InferenceConfig, PipelineConfig, TransportConfig, TunnelConfig};
use crate::core::prompt::DEFAULT_MAX_CHARS;
use crate::error::{ChatdigestError, Result};

/// Analyze chat-export archives with a local LLM, one structured JSON
/// record per conversation. Reruns skip conversations already analyzed.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatdigest")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "EXAMPLES:
    chatdigest --chat-file data/result.json --llm-host http://localhost:11434
    SSH_HOST=gpu.example.com SSH_USER=ops chatdigest run -i data/result.json
    chatdigest export -d output -o output/export.csv")]
pub struct Args {
    /// Log format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,
}

impl Args {
    /// The command to execute; `run` when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }

    /// Default tracing filter for the verbosity level.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "chatdigest=info",
            1 => "chatdigest=debug",
            _ => "chatdigest=trace",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze the conversations of an archive (default)
    Run(RunArgs),

    /// Export analysis artifacts to semicolon-separated CSV
    Export(ExportArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Chat archive (.json export or plain-text transcript)
    #[arg(short, long = "chat-file", env = "CHAT_FILE", default_value = "data/chat.json")]
    pub input: PathBuf,

    /// Directory for artifacts, ledger and session records
    #[arg(short, long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Ledger file [default: <OUTPUT_DIR>/history.jsonl]
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Model server base URL; takes precedence over --ssh-host
    #[arg(long, env = "LLM_HOST", value_name = "URL")]
    pub llm_host: Option<String>,

    /// Model name
    #[arg(short, long, env = "LLM_MODEL", default_value = "gemma3n")]
    pub model: String,

    /// Bearer token for the model server
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 180)]
    pub timeout: u64,

    /// Character budget for the conversation text in a prompt
    #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
    pub max_prompt_chars: usize,

    /// SSH host to tunnel through when --llm-host is not set
    #[arg(long, env = "SSH_HOST")]
    pub ssh_host: Option<String>,

    /// SSH user [default: $USER]
    #[arg(long, env = "SSH_USER")]
    pub ssh_user: Option<String>,

    #[arg(long, env = "SSH_PORT", default_value_t = 22)]
    pub ssh_port: u16,

    /// Model server port on the SSH host
    #[arg(long, env = "REMOTE_PORT", default_value_t = 11434)]
    pub remote_port: u16,

    /// Local end of the tunnel
    #[arg(long, env = "LOCAL_PORT", default_value_t = 11434)]
    pub local_port: u16,

    /// SSH password, handed to sshpass
    #[arg(long, env = "SSH_PASS", hide_env_values = true)]
    pub ssh_pass: Option<String>,

    /// Print per-conversation progress to stderr
    #[arg(long)]
    pub progress: bool,
}

impl RunArgs {
    /// Direct endpoint when `--llm-host` is set, otherwise an SSH tunnel.
    pub fn transport_config(&self) -> Result<TransportConfig> {
        if let Some(host) = self.llm_host.as_deref().filter(|h| !h.trim().is_empty()) {
            return Ok(TransportConfig::direct(host));
        }

        let Some(ssh_host) = self.ssh_host.as_deref().filter(|h| !h.trim().is_empty()) else {
            return Err(ChatdigestError::config(
                "set --llm-host (LLM_HOST) or --ssh-host (SSH_HOST)",
            ));
        };

        let user = self
            .ssh_user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_default();

        Ok(TransportConfig::tunnel(
            TunnelConfig::new(ssh_host, user)
                .with_ssh_port(self.ssh_port)
                .with_remote_port(self.remote_port)
                .with_local_port(self.local_port)
                .with_password(self.ssh_pass.clone()),
        ))
    }

    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig::new()
            .with_model(&self.model)
            .with_api_key(self.api_key.clone())
            .with_timeout_secs(self.timeout)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let config = PipelineConfig::new()
            .with_output_dir(&self.output_dir)
            .with_max_prompt_chars(self.max_prompt_chars);
        match &self.ledger {
            Some(path) => config.with_ledger_path(path),
            None => config,
        }
    }

    /// The archive to read; see [`resolve_input`].
    pub fn resolve_input(&self) -> Result<PathBuf> {
        resolve_input(&self.input)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    /// Directory holding *_analysis.json files
    #[arg(short = 'd', long, env = "OUTPUT_DIR", default_value = "output")]
    pub dir: PathBuf,

    /// CSV file to write; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Returns `configured` if it exists, otherwise the first `*.json` or `*.txt`
/// file (by name) next to where it was expected.
pub fn resolve_input(configured: &Path) -> Result<PathBuf> {
    if configured.exists() {
        return Ok(configured.to_path_buf());
    }

    let dir = match configured.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .filter(|p| {
                    p.extension().and_then(|e| e.to_str()).is_some_and(|e| {
                        e.eq_ignore_ascii_case("json") || e.eq_ignore_ascii_case("txt")
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(found) => {
            info!(path = %found.display(), "using first chat file found");
            Ok(found)
        }
        None => Err(ChatdigestError::config(format!(
            "no chat file found at {} or next to it (set --chat-file / CHAT_FILE)",
            configured.display()
        ))),
    }
}
