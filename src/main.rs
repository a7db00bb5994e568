use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3explorer::app::{App, AppMode};
use s3explorer::config::{Overrides, Settings};
use s3explorer::datasource::{OpenDalDatasource, OpenDalTransfer, QueryBackend, TransferBackend};
use s3explorer::events::handle_events;
use s3explorer::ui::{render_delete_confirm, render_drawer, render_help_bar, render_input_popup, render_status_bar};

/// Browse and upload to an S3 bucket as if it were a directory tree
#[derive(Debug, Parser)]
#[command(name = "s3explorer", version)]
struct Cli {
    /// Config file (defaults to $CONFIG_DIR/s3explorer/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    bucket: Option<String>,

    #[arg(long)]
    region: Option<String>,

    /// S3-compatible endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Use an in-memory bucket instead of S3
    #[arg(long)]
    memory: bool,

    /// Initial location, e.g. "?prefix=logs%2F&explore=true"
    #[arg(long, default_value = "")]
    location: String,

    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path.cloned().or_else(|| dirs::cache_dir().map(|d| d.join("s3explorer").join("s3explorer.log"))) else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3explorer=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn build_backends(cli: &Cli, settings: &Settings) -> Result<(Arc<dyn QueryBackend>, Arc<dyn TransferBackend>, String)> {
    if cli.memory {
        let datasource = OpenDalDatasource::memory(&settings.bucket)?
            .with_session(settings.static_keys(), settings.session_duration());
        let transfer = OpenDalTransfer::shared(datasource.operator(), settings.part_size);
        let title = format!("memory://{}", datasource.bucket());
        return Ok((Arc::new(datasource), Arc::new(transfer), title));
    }

    settings.validate()?;
    let datasource = OpenDalDatasource::from_settings(settings)?;
    let transfer = OpenDalTransfer::s3(settings);
    let title = format!("{} ({})", datasource.display_path(""), settings.provider.display_name());
    Ok((Arc::new(datasource), Arc::new(transfer), title))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_overrides(Overrides {
        bucket: cli.bucket.clone(),
        region: cli.region.clone(),
        endpoint: cli.endpoint.clone(),
        log_file: cli.log_file.clone(),
    });
    if cli.memory && settings.bucket.is_empty() {
        settings.bucket = "scratch".to_string();
    }

    init_logging(settings.log_file.as_ref())?;
    let (query, transfer, title) = build_backends(&cli, &settings)?;
    tracing::info!(bucket = %settings.bucket, memory = cli.memory, "starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(query, transfer, &settings, &cli.location, title);

    // Main loop
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("{:#}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(0),    // Drawer
                    Constraint::Length(1), // Status bar
                    Constraint::Length(1), // Help bar
                ])
                .split(f.area());

            render_drawer(f, chunks[0], app);
            render_status_bar(f, chunks[1], &app.message);
            render_help_bar(f, chunks[2], app);

            match app.mode {
                AppMode::ConfirmDelete => render_delete_confirm(f, app),
                AppMode::UploadPrompt => render_input_popup(
                    f,
                    "Upload files",
                    "Local paths, separated by ';'",
                    &app.input,
                ),
                _ => {}
            }
        })?;

        handle_events(app).await?;

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
