use crate::state::loader::{LoadedData, LoadingState};
use crossterm::event::KeyEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    LoadAll,
    /// Periodic or user-triggered refresh; the current view is kept.
    Reload,
}

#[derive(Debug)]
pub enum LoadResponse {
    LoadingStateChanged { loading_state: LoadingState },
    DataLoaded { data: Box<LoadedData> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    /// Redraw so LIVE badges follow the clock.
    ClockTick,
}
