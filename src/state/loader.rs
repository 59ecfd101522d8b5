use crate::state::app_settings::SourceSettings;
use crate::state::messages::{LoadRequest, LoadResponse};
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use volley_engine::source::{Location, SourceResult, VolleySource};
use volley_engine::standings::Standings;
use volley_engine::{
    AggregateOptions, BATCH_SIZE, ClubConfig, MatchRow, StatsAggregator, TeamStatsMap,
};

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

const DEFAULT_FIXTURES_FILE: &str = "gare.json";
const DEFAULT_STANDINGS_FILE: &str = "classifica.json";

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Everything the dashboard shows, loaded and aggregated in one pass.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub config: ClubConfig,
    pub rows: Vec<MatchRow>,
    pub stats: TeamStatsMap,
    pub standings: Standings,
    pub loaded_at: DateTime<Local>,
}

/// Resolve the fixture and standings locations: explicit settings first, then
/// the file names from the club config, then the defaults, all next to the config.
pub fn resolve_locations(
    settings: &SourceSettings,
    config_location: &Location,
    config: &ClubConfig,
) -> (Location, Location) {
    let output = config.output.clone().unwrap_or_default();
    let fixtures = match &settings.fixtures {
        Some(raw) => Location::parse(raw),
        None => config_location
            .sibling(output.matches_file.as_deref().unwrap_or(DEFAULT_FIXTURES_FILE)),
    };
    let standings = match &settings.standings {
        Some(raw) => Location::parse(raw),
        None => config_location
            .sibling(output.standings_file.as_deref().unwrap_or(DEFAULT_STANDINGS_FILE)),
    };
    (fixtures, standings)
}

/// The source client configured from the settings' timeout.
pub fn source_for(settings: &SourceSettings) -> VolleySource {
    VolleySource::new().with_timeout(settings.timeout)
}

/// Load config, rows and standings, then aggregate in batches, yielding to the
/// runtime between them. A broken config or standings file is logged and
/// replaced by an empty value; only the fixture rows are required.
pub async fn load_all(
    source: &VolleySource,
    settings: &SourceSettings,
    options: AggregateOptions,
) -> SourceResult<LoadedData> {
    let config_location = Location::parse(&settings.config);
    let config = match source.fetch_config(&config_location).await {
        Ok(config) => config,
        Err(e) => {
            error!("club config unavailable, nothing will be tracked: {e}");
            ClubConfig::default()
        }
    };

    let (fixtures, standings_location) = resolve_locations(settings, &config_location, &config);
    let rows = source.fetch_rows(&fixtures).await?;
    let standings = match source.fetch_standings(&standings_location).await {
        Ok(standings) => standings,
        Err(e) => {
            warn!("standings unavailable: {e}");
            Standings::default()
        }
    };

    let mut aggregator = StatsAggregator::new(&config, options);
    aggregator.discover(&rows);
    for batch in rows.chunks(BATCH_SIZE) {
        aggregator.accumulate(batch);
        tokio::task::yield_now().await;
    }
    let stats = aggregator.finish();
    info!("loaded {} rows, {} tracked teams", rows.len(), stats.len());

    Ok(LoadedData { config, rows, stats, standings, loaded_at: Local::now() })
}

pub struct LoaderWorker {
    source: VolleySource,
    settings: SourceSettings,
    options: AggregateOptions,
    requests: mpsc::Receiver<LoadRequest>,
    responses: mpsc::Sender<LoadResponse>,
    is_loading: Arc<AtomicBool>,
}

impl LoaderWorker {
    pub fn new(
        settings: SourceSettings,
        options: AggregateOptions,
        requests: mpsc::Receiver<LoadRequest>,
        responses: mpsc::Sender<LoadResponse>,
    ) -> Self {
        Self {
            source: source_for(&settings),
            settings,
            options,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            if request == LoadRequest::Reload {
                debug!("reloading sources");
            }
            self.start_loading_animation().await;

            let result = load_all(&self.source, &self.settings, self.options).await;

            debug!("load request complete");
            self.stop_loading_animation(result.is_ok()).await;

            let response = match result {
                Ok(data) => LoadResponse::DataLoaded { data: Box::new(data) },
                Err(err) => LoadResponse::Error { message: err.to_string() },
            };

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send load response: {e}");
                break;
            }
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(LoadResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(LoadResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(LoadResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
