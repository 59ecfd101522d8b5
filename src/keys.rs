use crate::app::{App, MenuItem};
use crate::state::messages::LoadRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    load_requests: &mpsc::Sender<LoadRequest>,
) {
    let mut guard = app.lock().await;

    // Search input swallows everything but Enter/Esc/Backspace.
    if guard.state.active_tab == MenuItem::Matches && guard.state.matches.searching {
        match (key_event.code, key_event.modifiers) {
            (Char('c'), KeyModifiers::CONTROL) => {
                crate::cleanup_terminal();
                std::process::exit(0);
            }
            (KeyCode::Enter | KeyCode::Esc, _) => guard.end_search(),
            (KeyCode::Backspace, _) => guard.search_pop(),
            (Char(c), _) => guard.search_push(c),
            _ => {}
        }
        return;
    }

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Home),
        (_, Char('2'), _) => guard.update_tab(MenuItem::Matches),
        (_, Char('3'), _) => guard.update_tab(MenuItem::Teams),
        (_, Char('4'), _) => guard.update_tab(MenuItem::Standings),
        (_, Char('5'), _) => guard.update_tab(MenuItem::Social),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Partite
        (MenuItem::Matches, Char('t'), _) => guard.matches_cycle_team(),
        (MenuItem::Matches, Char('s'), _) => guard.matches_cycle_status(),
        (MenuItem::Matches, Char('/'), _) => guard.start_search(),
        (MenuItem::Matches, Char('j') | KeyCode::Down, _) => guard.matches_scroll_down(),
        (MenuItem::Matches, Char('k') | KeyCode::Up, _) => guard.matches_scroll_up(),

        // Squadre
        (MenuItem::Teams, Char('j') | KeyCode::Down, _) => guard.teams_select_next(),
        (MenuItem::Teams, Char('k') | KeyCode::Up, _) => guard.teams_select_prev(),
        (MenuItem::Teams, KeyCode::Enter, _) => guard.teams_open_detail(),
        (MenuItem::Teams, KeyCode::Esc, _) => guard.teams_close_detail(),

        // Classifiche
        (MenuItem::Standings, Char('l') | KeyCode::Right, _) => guard.standings_next_league(),
        (MenuItem::Standings, Char('h') | KeyCode::Left, _) => guard.standings_prev_league(),

        // Social
        (MenuItem::Social, Char('['), _) => guard.social_previous_week(),
        (MenuItem::Social, Char(']'), _) => guard.social_next_week(),

        // Global
        (_, Char('R'), _) => {
            drop(guard);
            let _ = load_requests.send(LoadRequest::Reload).await;
        }
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }
}
