mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use chatline_core::{ChatController, Config, HttpTransport, SubmitOutcome};
use tracing::info;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "chatline")]
#[command(version, about = "Terminal chat client for a remote HTTP chat endpoint")]
struct Cli {
    /// Chat endpoint URL (overrides CHATLINE_ENDPOINT and the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds, 0 to wait forever
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Send {
        /// Message text
        text: String,
    },
    /// Show the effective configuration
    Config {
        /// Persist --endpoint/--timeout to the config file
        #[arg(long)]
        save: bool,
    },
}

impl Cli {
    fn apply_flags(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
    }

    /// File, then environment, then flags
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load()?;
        config.apply_env()?;
        self.apply_flags(&mut config);
        config.validate()?;
        Ok(config)
    }
}

fn build_controller(config: &Config) -> Result<ChatController> {
    let transport = HttpTransport::new(&config.endpoint, config.timeout())?;
    Ok(ChatController::new(Arc::new(transport)))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        None => run_tui(cli.resolve_config()?).await.map(|()| ExitCode::SUCCESS),
        Some(Commands::Send { text }) => send_once(cli.resolve_config()?, text).await,
        Some(Commands::Config { save }) => show_config(&cli, *save).map(|()| ExitCode::SUCCESS),
    }
}

async fn run_tui(config: Config) -> Result<()> {
    let _log_guard = if config.log_to_file {
        Some(logging::init_file(&Config::log_dir()?, &config.log_level)?)
    } else {
        None
    };
    info!(endpoint = %config.endpoint, timeout_secs = config.timeout_secs, "starting chatline");

    let mut app = App::new(build_controller(&config)?);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run_loop(&mut terminal, &mut app).await;
    tui::restore()?;

    if app.query_task.take().is_some() {
        info!("exited with an exchange still pending");
    }
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}

async fn send_once(config: Config, text: &str) -> Result<ExitCode> {
    logging::init_stderr(&config.log_level)?;

    let mut controller = build_controller(&config)?;
    let (code, reply) = exchange_once(&mut controller, text).await?;
    if code == ExitCode::SUCCESS {
        println!("{}", reply);
    } else {
        eprintln!("{}", reply);
    }
    Ok(code)
}

/// Run one exchange and return the exit status with the rendered remote text
async fn exchange_once(controller: &mut ChatController, text: &str) -> Result<(ExitCode, String)> {
    controller.set_input(text);

    let outcome = controller.submit().await;
    let reply = controller
        .transcript()
        .last()
        .map(|m| m.text().to_string())
        .unwrap_or_default();

    match outcome {
        SubmitOutcome::Ignored => bail!("nothing to send: message is empty"),
        SubmitOutcome::Replied => Ok((ExitCode::SUCCESS, reply)),
        SubmitOutcome::Failed => Ok((ExitCode::FAILURE, reply)),
    }
}

fn show_config(cli: &Cli, save: bool) -> Result<()> {
    let path = Config::get_config_path()?;

    if save {
        let mut stored = Config::load()?;
        cli.apply_flags(&mut stored);
        stored.validate()?;
        stored.save()?;
        println!("Saved {}", path.display());
    }

    let effective = cli.resolve_config()?;
    println!("config file: {}", path.display());
    println!("log dir:     {}", Config::log_dir()?.display());
    println!("{}", effective.to_json_pretty()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs_tui() {
        let cli = Cli::try_parse_from(["chatline"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.endpoint.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chatline", "send", "Hi", "--endpoint", "http://127.0.0.1:9/api/chat", "--timeout", "5",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Send { ref text }) if text == "Hi"));

        let mut config = Config::new();
        cli.apply_flags(&mut config);
        assert_eq!(config.endpoint, "http://127.0.0.1:9/api/chat");
        assert_eq!(config.timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_send_exit_status_follows_outcome() {
        let mut ok = app::tests::test_app(false).controller;
        let (code, reply) = exchange_once(&mut ok, "Hi").await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(reply, "echo Hi");

        let mut failing = app::tests::test_app(true).controller;
        let (code, reply) = exchange_once(&mut failing, "Hi").await.unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert!(reply.starts_with(chatline_core::error::ERROR_PREFIX));
    }

    #[tokio::test]
    async fn test_send_rejects_blank_text() {
        let mut controller = app::tests::test_app(false).controller;
        assert!(exchange_once(&mut controller, "   ").await.is_err());
    }

    #[test]
    fn test_send_requires_text() {
        assert!(Cli::try_parse_from(["chatline", "send"]).is_err());
    }
}
