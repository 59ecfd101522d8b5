mod app;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use crate::state::loader::{LoaderWorker, LoadingState, load_all, source_for};
use crate::state::messages::{LoadRequest, LoadResponse, UiEvent};
use crate::state::refresher::PeriodicRefresher;
use anyhow::Context;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::error;
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Duration;
use tui::{Terminal, backend::CrosstermBackend};
use volley_engine::AggregateOptions;

/// LIVE badges only change on minute boundaries.
const CLOCK_TICK: Duration = Duration::from_secs(30);

enum CliMode {
    Tui,
    Dump,
    Exit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match handle_cli_args() {
        CliMode::Exit => return Ok(()),
        CliMode::Dump => return dump_stats().await,
        CliMode::Tui => {}
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Trace)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let settings = AppSettings::load();
    let options = aggregate_options(&settings);
    let sources = settings.sources.clone();
    let refresh_every = settings.refresh_every;
    let app = Arc::new(Mutex::new(App::new(settings)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (load_req_tx, load_req_rx) = mpsc::channel::<LoadRequest>(100);
    let (load_resp_tx, load_resp_rx) = mpsc::channel::<LoadResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Loader thread
    let loader = LoaderWorker::new(sources, options, load_req_rx, load_resp_tx);
    let loader_task = tokio::spawn(loader.run());

    // Periodic reload thread
    let periodic_task = refresh_every.map(|every| {
        let refresher = PeriodicRefresher::new(load_req_tx.clone(), every);
        tokio::spawn(refresher.run())
    });

    // Clock thread
    let clock_tx = ui_event_tx.clone();
    let clock_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLOCK_TICK);
        interval.tick().await;
        loop {
            interval.tick().await;
            if clock_tx.send(UiEvent::ClockTick).await.is_err() {
                break;
            }
        }
    });

    // Trigger the first load
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, load_req_tx, load_resp_rx).await;

    input_handler.abort();
    loader_task.abort();
    if let Some(task) = periodic_task {
        task.abort();
    }
    clock_task.abort();

    Ok(())
}

fn handle_cli_args() -> CliMode {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return CliMode::Tui;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            CliMode::Exit
        }
        "-V" | "--version" => {
            println!("rmvolley {}", env!("CARGO_PKG_VERSION"));
            CliMode::Exit
        }
        "--dump" => CliMode::Dump,
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "rmvolley - volleyball club match statistics in the terminal

Usage:
  rmvolley
  rmvolley --dump      print per-team statistics as JSON and exit
  rmvolley --help
  rmvolley --version

Environment:
  RMVOLLEY_CONFIG          Club config path or URL (default config.json)
  RMVOLLEY_FIXTURES        Fixture rows path or URL (default gare.json next to the config)
  RMVOLLEY_STANDINGS       Standings path or URL (default classifica.json next to the config)
  RMVOLLEY_REFRESH_SECS    Reload interval in seconds, 0 disables (default 300)
  RMVOLLEY_TIMEOUT_SECS    HTTP request timeout in seconds (default 10)
  RMVOLLEY_MISSING_DATES   Where undated matches sort: last, first or now (default last)
  RMVOLLEY_LOG             Log pane level: error, warn, info, debug, trace or off (default error)"
}

fn aggregate_options(settings: &AppSettings) -> AggregateOptions {
    AggregateOptions { missing_dates: settings.missing_dates, ..AggregateOptions::default() }
}

async fn dump_stats() -> anyhow::Result<()> {
    let settings = AppSettings::load();
    let source = source_for(&settings.sources);
    let data = load_all(&source, &settings.sources, aggregate_options(&settings))
        .await
        .with_context(|| format!("loading sources from {}", settings.sources.config))?;
    let json =
        serde_json::to_string_pretty(&data.stats).context("serializing team statistics")?;
    println!("{json}");
    Ok(())
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    load_requests: mpsc::Sender<LoadRequest>,
    mut load_responses: mpsc::Receiver<LoadResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &load_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = load_responses.recv() => {
                handle_load_response(response, &app, &mut loading).await;
                let mut app_guard = app.lock().await;
                draw::draw(&mut terminal, &mut app_guard, loading);
            }
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    load_requests: &mpsc::Sender<LoadRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let _ = load_requests.send(LoadRequest::LoadAll).await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, load_requests).await;
            true
        }
        UiEvent::Resize | UiEvent::ClockTick => true,
    }
}

async fn handle_load_response(
    response: LoadResponse,
    app: &Arc<Mutex<App>>,
    loading: &mut LoadingState,
) {
    match response {
        LoadResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
        }
        LoadResponse::DataLoaded { data } => {
            let mut guard = app.lock().await;
            guard.on_data_loaded(*data);
        }
        LoadResponse::Error { message } => {
            error!("Load error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide).unwrap();
    execute!(stdout, terminal::EnterAlternateScreen).unwrap();
    execute!(stdout, terminal::Clear(terminal::ClearType::All)).unwrap();
    terminal::enable_raw_mode().unwrap();
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::MoveTo(0, 0)).unwrap();
    execute!(stdout, terminal::Clear(terminal::ClearType::All)).unwrap();
    execute!(stdout, terminal::LeaveAlternateScreen).unwrap();
    execute!(stdout, cursor::Show).unwrap();
    terminal::disable_raw_mode().unwrap();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
