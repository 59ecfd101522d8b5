use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::loader::LoadedData;
use chrono::{Local, NaiveDate, NaiveDateTime};
use volley_engine::post::{PostError, WeeklyPost, weekly_post};
use volley_engine::query::{filter_matches, rank_by_win_rate};
use volley_engine::{MatchRow, TeamStats};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Home,
    Matches,
    Teams,
    Standings,
    Social,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        if let Some(level) = settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        Self { state: AppState::new(today()), settings }
    }

    // -----------------------------------------------------------------------
    // Loader response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_data_loaded(&mut self, data: LoadedData) {
        let first_load = self.state.data.is_none();
        self.state.last_error = None;

        if first_load || self.state.standings.league_index >= data.standings.len() {
            self.state.standings.league_index = data.standings.default_league_index().unwrap_or(0);
        }
        let team_count = data.stats.len();
        self.state.data = Some(data);
        self.state.teams.clamp(team_count);
        if self.state.matches.team_index > team_count {
            self.state.matches.team_index = 0;
        }
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        if next == MenuItem::Teams {
            self.state.teams.show_detail = false;
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    // -----------------------------------------------------------------------
    // Views over the loaded data
    // -----------------------------------------------------------------------

    /// Tracked team names in name order, as cycled by the team filter.
    pub fn team_names(&self) -> Vec<&str> {
        self.state
            .data
            .as_ref()
            .map(|d| d.stats.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn filtered_matches(&self) -> Vec<&MatchRow> {
        let Some(data) = self.state.data.as_ref() else {
            return Vec::new();
        };
        let filter = self.state.matches.filter(&self.team_names());
        filter_matches(&data.rows, &filter, self.settings.missing_dates)
    }

    pub fn ranked_teams(&self) -> Vec<&TeamStats> {
        self.state.data.as_ref().map(|d| rank_by_win_rate(&d.stats)).unwrap_or_default()
    }

    pub fn selected_team(&self) -> Option<&TeamStats> {
        self.ranked_teams().get(self.state.teams.selected).copied()
    }

    pub fn weekly_post(&self) -> Option<Result<WeeklyPost, PostError>> {
        let data = self.state.data.as_ref()?;
        let social = &self.state.social;
        Some(weekly_post(&data.rows, &data.config, social.start, social.end))
    }

    // -----------------------------------------------------------------------
    // Partite
    // -----------------------------------------------------------------------

    pub fn matches_cycle_team(&mut self) {
        let count = self.team_names().len();
        self.state.matches.cycle_team(count);
    }

    pub fn matches_cycle_status(&mut self) {
        self.state.matches.cycle_status();
    }

    pub fn matches_scroll_down(&mut self) {
        let len = self.filtered_matches().len();
        self.state.matches.scroll_down(len);
    }

    pub fn matches_scroll_up(&mut self) {
        self.state.matches.scroll_up();
    }

    pub fn start_search(&mut self) {
        self.state.matches.searching = true;
    }

    pub fn end_search(&mut self) {
        self.state.matches.searching = false;
    }

    pub fn search_push(&mut self, c: char) {
        self.state.matches.search.push(c);
        self.state.matches.scroll_offset = 0;
    }

    pub fn search_pop(&mut self) {
        self.state.matches.search.pop();
        self.state.matches.scroll_offset = 0;
    }

    // -----------------------------------------------------------------------
    // Squadre
    // -----------------------------------------------------------------------

    pub fn teams_select_next(&mut self) {
        let len = self.ranked_teams().len();
        self.state.teams.select_next(len);
    }

    pub fn teams_select_prev(&mut self) {
        self.state.teams.select_prev();
    }

    pub fn teams_open_detail(&mut self) {
        if self.selected_team().is_some() {
            self.state.teams.show_detail = true;
        }
    }

    pub fn teams_close_detail(&mut self) {
        self.state.teams.show_detail = false;
    }

    // -----------------------------------------------------------------------
    // Classifiche
    // -----------------------------------------------------------------------

    fn league_count(&self) -> usize {
        self.state.data.as_ref().map(|d| d.standings.len()).unwrap_or(0)
    }

    pub fn standings_next_league(&mut self) {
        let len = self.league_count();
        self.state.standings.next_league(len);
    }

    pub fn standings_prev_league(&mut self) {
        let len = self.league_count();
        self.state.standings.prev_league(len);
    }

    // -----------------------------------------------------------------------
    // Social
    // -----------------------------------------------------------------------

    pub fn social_previous_week(&mut self) {
        self.state.social.previous_week();
    }

    pub fn social_next_week(&mut self) {
        self.state.social.next_week();
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
