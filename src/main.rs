use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use promptline::cli::Cli;
use promptline::controller::Completion;
use promptline::tui::{self, EventHandler, Tui};
use promptline::{handler, logging, ui, App, Config, GenerateClient, SubmissionController};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Runs without file logging when the log directory is unusable
    let _log_guard = logging::init(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::get_config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    cli.apply_to(&mut config);
    config.validate()?;

    if cli.save_config {
        config.save_to(&config_path)?;
        info!(path = %config_path.display(), "saved config");
    }

    let client = GenerateClient::new(&config.base_url, config.timeout())?;
    info!(endpoint = %client.endpoint(), "starting promptline");

    let (controller, completions) =
        SubmissionController::new(Arc::new(client), config.generation_options()?);
    let mut app = App::new(controller, config.base_url.clone());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, completions).await;
    tui::restore()?;

    info!("exiting");
    result
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    mut completions: mpsc::UnboundedReceiver<Completion>,
) -> Result<()> {
    let mut events = EventHandler::new(tui::TICK_RATE);

    while !app.should_quit {
        app.observe_session();
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event),
            Some(completion) = completions.recv() => app.resolve(completion),
            else => break,
        }
    }

    Ok(())
}
