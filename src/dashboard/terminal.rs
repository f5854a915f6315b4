//! Interactive terminal front-end for `DashboardShell`.

use anyhow::{anyhow, bail, Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

use crate::models::StatusSnapshot;

use super::{
    render,
    shell::{DashboardEvent, DashboardShell},
    state::ActiveView,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

const HELP: &str = "\
commands:
  view <dashboard|live|history|analytics>   switch view
  status                                    show current status
  log                                       show incident log
  clear                                     clear incident log
  camera                                    toggle the camera
  analytics                                 refresh analytics
  event <id>                                open event details
  close                                     close event details
  help                                      show this help
  quit                                      exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    View(ActiveView),
    Status,
    Log,
    Clear,
    Camera,
    Analytics,
    Event(i64),
    Close,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();
    if words.next().is_some() {
        bail!("too many arguments; type 'help'");
    }

    let command = match (verb.to_ascii_lowercase().as_str(), argument) {
        ("view", Some(view)) => Command::View(view.parse()?),
        ("view", None) => bail!("usage: view <dashboard|live|history|analytics>"),
        ("event", Some(id)) => Command::Event(
            id.parse()
                .map_err(|_| anyhow!("event id must be a number, got '{id}'"))?,
        ),
        ("event", None) => bail!("usage: event <id>"),
        ("status", None) => Command::Status,
        ("log", None) => Command::Log,
        ("clear", None) => Command::Clear,
        ("camera", None) => Command::Camera,
        ("analytics", None) => Command::Analytics,
        ("close", None) => Command::Close,
        ("help", None) | ("?", None) => Command::Help,
        ("quit", None) | ("exit", None) | ("q", None) => Command::Quit,
        (other, _) => bail!("unknown command '{other}'; type 'help'"),
    };
    Ok(Some(command))
}

/// Only redraw the status line when something a reader would notice changed.
fn status_changed(previous: Option<&StatusSnapshot>, next: &StatusSnapshot) -> bool {
    match previous {
        None => true,
        Some(prev) => {
            prev.detected != next.detected
                || prev.severity != next.severity
                || prev.message != next.message
        }
    }
}

/// Runs the shell until `quit`, end of input or Ctrl-C, then unmounts it.
pub async fn run_interactive(shell: &mut DashboardShell) -> Result<()> {
    let mut events = shell.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_status: Option<StatusSnapshot> = None;

    println!("{HELP}");
    print!("{}", render::status_panel(&shell.snapshot().await, shell.endpoints()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => handle_command(shell, command).await?,
                    Ok(None) => {}
                    Err(err) => println!("{err}"),
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(shell, event, &mut last_status).await,
                Err(RecvError::Lagged(skipped)) => {
                    log_warn!("terminal fell behind; skipped {skipped} dashboard events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    shell.unmount().await
}

async fn handle_command(shell: &mut DashboardShell, command: Command) -> Result<()> {
    match command {
        Command::View(view) => shell.switch_view(view).await?,
        Command::Status => {
            print!("{}", render::status_panel(&shell.snapshot().await, shell.endpoints()));
        }
        Command::Log => print!("{}", render::incident_log(shell.snapshot().await.incidents())),
        Command::Clear => shell.clear_incidents().await,
        Command::Camera => shell.spawn_toggle_camera(),
        Command::Analytics => shell.spawn_refresh_analytics(),
        Command::Event(id) => shell.spawn_open_event(id),
        Command::Close => shell.close_event().await,
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

async fn print_event(
    shell: &DashboardShell,
    event: DashboardEvent,
    last_status: &mut Option<StatusSnapshot>,
) {
    match event {
        DashboardEvent::StatusChanged(snapshot) => {
            if status_changed(last_status.as_ref(), &snapshot) {
                *last_status = Some(snapshot);
                println!("{}", render::status_line(&shell.snapshot().await));
            }
        }
        DashboardEvent::IncidentLogged(entry) => {
            println!("{}", render::incident_line(&entry));
        }
        DashboardEvent::IncidentsCleared => println!("Incident log cleared."),
        DashboardEvent::CameraChanged(active) => {
            println!("Camera {}", if active { "ON" } else { "OFF" });
        }
        DashboardEvent::ViewChanged(view) => {
            let state = shell.snapshot().await;
            println!("-- {view} --");
            match view {
                ActiveView::Dashboard | ActiveView::Live => {
                    print!("{}", render::status_panel(&state, shell.endpoints()));
                    print!("{}", render::incident_log(state.incidents()));
                }
                ActiveView::History => print!("{}", render::history(state.incidents())),
                ActiveView::Analytics => {}
            }
        }
        DashboardEvent::AnalyticsUpdated(snapshot) => {
            print!("{}", render::analytics(&snapshot, shell.endpoints()));
        }
        DashboardEvent::DetailChanged(detail) => {
            print!("{}", render::detail_state(&detail, shell.endpoints()));
        }
    }
}
