use crate::app::MenuItem;
use crate::state::loader::LoadedData;
use chrono::{Days, NaiveDate};
use volley_engine::post::default_week;
use volley_engine::query::MatchFilter;
use volley_engine::status::MatchStatus;

// ---------------------------------------------------------------------------
// Partite (match list)
// ---------------------------------------------------------------------------

/// Status filter values cycled with `s`; `None` is "all".
pub const STATUS_CYCLE: [Option<MatchStatus>; 4] = [
    None,
    Some(MatchStatus::ToBePlayed),
    Some(MatchStatus::Ratified),
    Some(MatchStatus::Unofficial),
];

#[derive(Debug, Default)]
pub struct MatchesState {
    /// 0 is "all teams", `n` is the n-th tracked team in name order.
    pub team_index: usize,
    pub status_index: usize,
    pub search: String,
    pub searching: bool,
    pub scroll_offset: u16,
}

impl MatchesState {
    pub fn cycle_team(&mut self, team_count: usize) {
        self.team_index = (self.team_index + 1) % (team_count + 1);
        self.scroll_offset = 0;
    }

    pub fn cycle_status(&mut self) {
        self.status_index = (self.status_index + 1) % STATUS_CYCLE.len();
        self.scroll_offset = 0;
    }

    pub fn filter(&self, teams: &[&str]) -> MatchFilter {
        let team = self
            .team_index
            .checked_sub(1)
            .and_then(|idx| teams.get(idx))
            .map(|name| name.to_string());
        MatchFilter {
            team,
            status: STATUS_CYCLE[self.status_index % STATUS_CYCLE.len()].clone(),
            search: self.search.clone(),
        }
    }

    pub fn scroll_down(&mut self, len: usize) {
        let max = len.saturating_sub(1) as u16;
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Squadre (team ranking and detail)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TeamsState {
    pub selected: usize,
    pub show_detail: bool,
}

impl TeamsState {
    pub fn select_next(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        if len == 0 {
            self.show_detail = false;
        }
    }
}

// ---------------------------------------------------------------------------
// Classifiche (standings)
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StandingsState {
    pub league_index: usize,
}

impl StandingsState {
    pub fn next_league(&mut self, len: usize) {
        if len > 0 {
            self.league_index = (self.league_index + 1) % len;
        }
    }

    pub fn prev_league(&mut self, len: usize) {
        if len > 0 {
            self.league_index = (self.league_index + len - 1) % len;
        }
    }
}

// ---------------------------------------------------------------------------
// Social (weekly post range)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SocialState {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SocialState {
    pub fn new(today: NaiveDate) -> Self {
        let (start, end) = default_week(today);
        Self { start, end }
    }

    pub fn previous_week(&mut self) {
        self.start = self.start - Days::new(7);
        self.end = self.end - Days::new(7);
    }

    pub fn next_week(&mut self) {
        self.start = self.start + Days::new(7);
        self.end = self.end + Days::new(7);
    }
}

// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub data: Option<LoadedData>,
    pub matches: MatchesState,
    pub teams: TeamsState,
    pub standings: StandingsState,
    pub social: SocialState,
}

impl AppState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            active_tab: MenuItem::default(),
            previous_tab: MenuItem::default(),
            show_logs: false,
            last_error: None,
            data: None,
            matches: MatchesState::default(),
            teams: TeamsState::default(),
            standings: StandingsState::default(),
            social: SocialState::new(today),
        }
    }
}
