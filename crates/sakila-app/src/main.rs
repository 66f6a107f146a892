//! Sakila application binary - composition root.
//!
//! 1. Parse the command line and load configuration from TOML
//! 2. Initialize tracing on stderr
//! 3. Run the requested surface: interactive chat, a single question, or
//!    the relay server

mod cli;
mod repl;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use sakila_chat::{project, FailureText, HttpTransport, Settlement, TurnController};
use sakila_core::config::SakilaConfig;

use sakila_api::routes;
use sakila_api::state::RelayState;

use cli::{CliArgs, Command, SkinKind};

fn init_tracing(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_controller(config: &SakilaConfig) -> Result<TurnController, Box<dyn std::error::Error>> {
    let transport = HttpTransport::from_config(&config.service)?;
    tracing::info!(endpoint = transport.endpoint(), "Answering service configured");
    Ok(TurnController::new(
        Arc::new(transport),
        FailureText::from(&config.chat),
    ))
}

/// Ask one question and print the resulting conversation.
///
/// Exits with status 1 when the recorded answer is an error.
async fn run_ask(
    config: &SakilaConfig,
    question: &str,
    json: bool,
    skin: SkinKind,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let controller = build_controller(config)?;
    let settlement = controller.submit(question)?.settled().await;
    let snapshot = controller.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", project(skin.build().as_ref(), &snapshot).render());
    }

    Ok(match settlement {
        Settlement::Recorded(message) if !message.is_error() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = if config_file.exists() {
        SakilaConfig::load(&config_file)?
    } else {
        SakilaConfig::default()
    };
    config.service.endpoint = args.resolve_endpoint(&config.service.endpoint);
    if let Some(port) = args.resolve_port(config.relay.port) {
        config.relay.port = port;
    }

    // Tracing.
    init_tracing(&args.resolve_log_filter(&config.general.log_level));
    tracing::debug!(
        path = %config_file.display(),
        exists = config_file.exists(),
        "Configuration resolved"
    );

    match args.command {
        Command::Chat { skin } => {
            let controller = build_controller(&config)?;
            repl::run(controller, skin.build()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ask {
            question,
            json,
            skin,
        } => run_ask(&config, &question.join(" "), json, skin).await,
        Command::Relay { .. } => {
            tracing::info!("Starting Sakila relay v{}", env!("CARGO_PKG_VERSION"));
            let state = RelayState::new(&config)?;
            routes::start_server(&config, state).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
