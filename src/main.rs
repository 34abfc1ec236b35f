use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod app;
mod controller;
mod dataset;
mod inputter;
mod model;
mod ui;

use app::{AppConfig, AppError, Args};
use controller::Controller;
use dataset::Dataset;
use model::{Model, Status};
use ui::TableUI;

fn main() -> ExitCode {
    match run(Args::parse()) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

/// Logs go to a file, the terminal belongs to the ui. Pending lines are
/// flushed when the returned guard is dropped.
fn init_logging(config: &AppConfig) -> Result<WorkerGuard, AppError> {
    let file = File::create(&config.log_file)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;
    Ok(guard)
}

fn run(args: Args) -> Result<(), AppError> {
    let cfg = AppConfig::from_args(args)?;
    let _log_guard = init_logging(&cfg)?;
    info!("Starting pagetable on {}", cfg.path.display());

    let dataset = Dataset::load(&cfg.path)?;
    let mut model = Model::init(&dataset, &cfg)?;
    let mut ui = TableUI::new();
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &mut ui, &controller);
    ratatui::restore();

    info!("Shutting down");
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut TableUI,
    controller: &Controller,
) -> Result<(), AppError> {
    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model)? {
            model.update(message);
        };
    }
    Ok(())
}
