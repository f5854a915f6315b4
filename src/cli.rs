use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::{
    api::{DashboardApi, HttpBackend},
    dashboard::{render, terminal, ActiveView, DashboardShell, DashboardState},
    geolocation,
    models::Position,
    settings::{DashboardSettings, SettingsStore},
};

pub const DEFAULT_CONFIG_PATH: &str = "flaresense.json";

#[derive(Parser, Debug)]
#[command(name = "flaresense")]
#[command(about = "Terminal dashboard for the FlareSense fire detection backend.")]
pub struct Cli {
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL; overrides the settings file and FLARESENSE_BACKEND_URL.
    #[arg(long, value_name = "URL")]
    pub backend: Option<String>,

    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Device latitude reported to the backend on startup.
    #[arg(long, value_name = "DEG", allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Device longitude reported to the backend on startup.
    #[arg(long, value_name = "DEG", allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Live dashboard: polls status and accepts commands on stdin.
    Watch {
        #[arg(long, value_name = "VIEW", default_value = "dashboard")]
        view: String,
    },
    /// Fetch and print the current status once.
    Status,
    /// Print aggregate statistics and recent events.
    Analytics,
    /// Print one event's full record.
    Event {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Switch the backend camera on or off.
    Camera {
        #[arg(value_enum)]
        state: CameraSwitch,
    },
    /// Download the PDF analytics report.
    Export {
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
    /// Print the effective settings, optionally saving them.
    Config {
        #[arg(long)]
        save: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraSwitch {
    On,
    Off,
}

/// Layers environment and command-line overrides on top of file settings.
pub fn resolve_settings(mut settings: DashboardSettings, cli: &Cli) -> Result<DashboardSettings> {
    settings.apply_env();
    if let Some(url) = &cli.backend {
        settings.backend_url = url.clone();
    }
    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        settings.position = Some(Position { lat, lon });
    }
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

pub async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let store = SettingsStore::new(config_path)?;
    let settings = resolve_settings(store.settings(), &cli)?;

    if let Commands::Config { save } = &cli.command {
        if *save {
            store.update(settings.clone())?;
        }
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let backend = HttpBackend::new(&settings.backend_url, settings.request_timeout())?;
    let endpoints = backend.endpoints().clone();
    let api: Arc<dyn DashboardApi> = Arc::new(backend);
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Watch { view } => {
            let view: ActiveView = view.parse()?;
            let source = geolocation::source_for(settings.position);
            let mut shell = DashboardShell::new(api, settings, source);
            shell.switch_view(view).await?;
            shell.mount().await?;
            terminal::run_interactive(&mut shell).await?;
        }
        Commands::Status => {
            let snapshot = api.fetch_status(&cancel).await?;
            let mut state = DashboardState::new(&settings);
            state.apply_status(snapshot, Local::now());
            print!("{}", render::status_panel(&state, &endpoints));
        }
        Commands::Analytics => {
            let snapshot = api.fetch_analytics(&cancel).await?;
            print!("{}", render::analytics(&snapshot, &endpoints));
        }
        Commands::Event { id } => {
            let event = api
                .fetch_event(id, &cancel)
                .await
                .with_context(|| format!("Failed to load event {id}"))?;
            print!("{}", render::event_detail(&event, &endpoints));
        }
        Commands::Camera { state } => {
            let active = state == CameraSwitch::On;
            api.set_camera_active(active, &cancel).await?;
            println!("Camera {}", if active { "ON" } else { "OFF" });
        }
        Commands::Export { out } => {
            let bytes = api.download_report(&cancel).await?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            info!("report saved to {} ({} bytes)", out.display(), bytes.len());
            println!("{}", out.display());
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
