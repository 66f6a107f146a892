//! CLI argument definitions for the `sakila` binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use sakila_chat::{PageSkin, Skin, TerminalSkin, WidgetSkin};

/// Sakila chat - ask the film database assistant questions.
#[derive(Parser, Debug)]
#[command(name = "sakila", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Answering service endpoint, e.g. http://127.0.0.1:8000/ask.
    #[arg(short = 'e', long = "endpoint", global = true)]
    pub endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive chat session.
    Chat {
        /// How rows are rendered.
        #[arg(long, value_enum, default_value_t = SkinKind::Terminal)]
        skin: SkinKind,
    },
    /// Ask a single question and print the conversation.
    Ask {
        /// The question; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Print the conversation snapshot as JSON.
        #[arg(long)]
        json: bool,

        /// How rows are rendered when not printing JSON.
        #[arg(long, value_enum, default_value_t = SkinKind::Terminal)]
        skin: SkinKind,
    },
    /// Run the same-origin relay server.
    Relay {
        /// Port to listen on.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
    },
}

/// Chat surface look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SkinKind {
    Terminal,
    Widget,
    Page,
}

impl SkinKind {
    pub fn build(self) -> Box<dyn Skin + Send + Sync> {
        match self {
            SkinKind::Terminal => Box::new(TerminalSkin::default()),
            SkinKind::Widget => Box::new(WidgetSkin::default()),
            SkinKind::Page => Box::new(PageSkin::default()),
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SAKILA_CONFIG env var > ~/.sakila/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SAKILA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the answering service endpoint.
    ///
    /// Priority: --endpoint flag > SAKILA_ENDPOINT env var > config file value.
    pub fn resolve_endpoint(&self, config_endpoint: &str) -> String {
        pick(
            self.endpoint.clone(),
            std::env::var("SAKILA_ENDPOINT").ok(),
            config_endpoint.to_string(),
        )
    }

    /// Resolve the relay port.
    ///
    /// Priority: --port flag > SAKILA_PORT env var > config file value.
    /// Returns `None` when not running the relay.
    pub fn resolve_port(&self, config_port: u16) -> Option<u16> {
        let Command::Relay { port } = &self.command else {
            return None;
        };
        let env = std::env::var("SAKILA_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok());
        Some(pick(*port, env, config_port))
    }

    /// Resolve the log filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_filter(&self, config_level: &str) -> String {
        pick(
            self.log_level.clone(),
            std::env::var("RUST_LOG").ok().filter(|v| !v.trim().is_empty()),
            config_level.to_string(),
        )
    }
}

fn pick<T>(flag: Option<T>, env: Option<T>, config: T) -> T {
    flag.or(env).unwrap_or(config)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sakila").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sakila").join("config.toml");
    }
    PathBuf::from("config.toml")
}
