mod api;
mod app;
mod config;
mod handler;
mod tui;
mod ui;

use anyhow::Result;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use api::ChatClient;
use app::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|err| {
        // Tracing is not up yet, so this one warning goes to stderr
        eprintln!("WARN: failed to read config ({err}); using defaults");
        Config::default()
    });

    let _log_guard = init_tracing(&config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url(),
        "jarvis-chat starting"
    );

    let client = ChatClient::new(config.base_url());
    let mut app = App::new(client.base_url());

    // Advisory probe; the UI starts regardless of the outcome
    app.health_probe = Some(tokio::spawn({
        let client = client.clone();
        async move { client.health().await }
    }));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app, &client).await;

    tui::restore()?;

    if let Err(err) = &result {
        error!(error = %err, "exited with error");
    }
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
    client: &ChatClient,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, client, event).await?,
            None => break,
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = Config::app_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::never(&log_dir, "jarvis-chat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // JARVIS_LOG wins over the config value
    let env_filter = match tracing_subscriber::EnvFilter::try_from_env("JARVIS_LOG") {
        Ok(filter) => filter,
        Err(_) => match config.log_filter().parse::<tracing_subscriber::EnvFilter>() {
            Ok(filter) => filter,
            Err(_) => tracing_subscriber::EnvFilter::new(config::DEFAULT_LOG_FILTER),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
