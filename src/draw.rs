use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{self, App, MenuItem};
use crate::state::app_state::STATUS_CYCLE;
use crate::state::loader::{ERROR_CHAR, LoadedData, LoadingState};
use crate::ui::layout::LayoutAreas;
use volley_engine::query::{
    RECENT_RESULTS_LIMIT, TIMELINE_LIMIT, is_live, next_match, recent_results, result_badge,
    team_timeline, todays_matches,
};
use volley_engine::resolver::is_tracked_team;
use volley_engine::{ClubConfig, Form, MatchRow, Outcome, TeamStats};

static TABS: &[&str; 5] = &["Home", "Partite", "Squadre", "Classifiche", "Social"];

const HELP_TEXT: &str = "\
1-5        cambia scheda (Home, Partite, Squadre, Classifiche, Social)
?          questo aiuto, Esc per tornare
q, Ctrl-C  esci
R          ricarica i dati
f          schermo intero
\"          mostra/nascondi log

Partite:      t squadra  s stato  / cerca  j/k scorri
Squadre:      j/k seleziona  Enter dettaglio  Esc indietro
Classifiche:  h/l o ←/→ cambia campionato
Social:       [ / ] settimana precedente / successiva";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Home => draw_home(f, layout.main, app),
            MenuItem::Matches => draw_matches(f, layout.main, app),
            MenuItem::Teams => draw_teams(f, layout.main, app),
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Social => draw_social(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        let full = f.area();
        draw_loading_spinner(f, full, app, loading);
    });
    if let Err(e) = result {
        error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Home => 0,
        MenuItem::Matches => 1,
        MenuItem::Teams => 2,
        MenuItem::Standings => 3,
        MenuItem::Social => 4,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

/// The loaded data, or a placeholder explaining why there is none yet.
fn loaded_or_placeholder<'a>(f: &mut Frame, area: Rect, app: &'a App) -> Option<&'a LoadedData> {
    if let Some(data) = app.state.data.as_ref() {
        return Some(data);
    }
    let msg = match app.state.last_error.as_deref() {
        Some(err) => format!("Errore nel caricamento:\n{err}"),
        None => "Caricamento dati...".to_string(),
    };
    draw_placeholder(f, area, &msg);
    None
}

fn team_style(name: &str, config: &ClubConfig) -> Style {
    if is_tracked_team(name, config) {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn badge_span(outcome: Option<Outcome>) -> Span<'static> {
    let Some(outcome) = outcome else {
        return Span::raw("   ");
    };
    let bg = match outcome {
        Outcome::Win => Color::Green,
        Outcome::Loss => Color::Red,
    };
    Span::styled(format!(" {} ", outcome.badge()), Style::default().fg(Color::Black).bg(bg))
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

fn draw_home(f: &mut Frame, area: Rect, app: &App) {
    let Some(data) = loaded_or_placeholder(f, area, app) else {
        return;
    };

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)]).areas(area);
    let [today_area, next_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(6)]).areas(left);

    draw_todays_matches(f, today_area, data);
    draw_next_match(f, next_area, data);
    draw_recent_results(f, right, app, data);
}

fn draw_todays_matches(f: &mut Frame, area: Rect, data: &LoadedData) {
    let block = default_border(Color::White).title(" Partite di oggi ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let today = todays_matches(&data.rows, app::today());
    if today.is_empty() {
        f.render_widget(
            Paragraph::new("Nessuna partita oggi")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let now = app::now();
    let lines: Vec<Line> = today
        .iter()
        .map(|row| {
            let mut spans = vec![
                Span::raw(format!("{:>5}  ", or_dash(&row.time))),
                Span::styled(row.home_team.clone(), team_style(&row.home_team, &data.config)),
                Span::raw(" vs "),
                Span::styled(row.away_team.clone(), team_style(&row.away_team, &data.config)),
            ];
            if row.has_result() {
                spans.push(Span::raw(format!("  {}", row.result)));
            }
            if !row.set_scores.trim().is_empty() {
                spans.push(Span::styled(
                    format!("  {}", row.set_scores),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if is_live(row, now) {
                spans.push(Span::styled(
                    "  LIVE",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_next_match(f: &mut Frame, area: Rect, data: &LoadedData) {
    let block = default_border(Color::White).title(" Prossima partita ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(row) = next_match(&data.rows, app::today()) else {
        f.render_widget(
            Paragraph::new("Nessuna partita in programma").style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(row.home_team.clone(), team_style(&row.home_team, &data.config)),
            Span::raw(" vs "),
            Span::styled(row.away_team.clone(), team_style(&row.away_team, &data.config)),
        ]),
        Line::from(format!("{} {}", row.date, or_dash(&row.time))),
        Line::from(or_dash(&row.venue).to_string()),
        Line::from(Span::styled(row.league.clone(), Style::default().fg(Color::DarkGray))),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_recent_results(f: &mut Frame, area: Rect, app: &App, data: &LoadedData) {
    let block = default_border(Color::White).title(" Ultimi risultati ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let recent = recent_results(&data.rows, RECENT_RESULTS_LIMIT, app.settings.missing_dates);
    let lines: Vec<Line> = recent
        .iter()
        .map(|row| {
            Line::from(vec![
                badge_span(result_badge(row, &data.config)),
                Span::raw(format!(" {} ", or_dash(&row.date))),
                Span::styled(row.home_team.clone(), team_style(&row.home_team, &data.config)),
                Span::raw(format!(" {} ", row.result)),
                Span::styled(row.away_team.clone(), team_style(&row.away_team, &data.config)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Partite
// ---------------------------------------------------------------------------

fn draw_matches(f: &mut Frame, area: Rect, app: &App) {
    let Some(data) = loaded_or_placeholder(f, area, app) else {
        return;
    };

    let matches = app.filtered_matches();
    let block = default_border(Color::White)
        .title(" Partite ")
        .title_bottom(format!(" {} partite trovate ", matches.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [filters, list] =
        Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(inner);

    let state = &app.state.matches;
    let team_names = app.team_names();
    let team_label = state
        .team_index
        .checked_sub(1)
        .and_then(|idx| team_names.get(idx).copied())
        .unwrap_or("Tutte");
    let status_label = STATUS_CYCLE[state.status_index % STATUS_CYCLE.len()]
        .as_ref()
        .map(|s| s.label())
        .unwrap_or("Tutti");
    let cursor = if state.searching { "_" } else { "" };
    let filter_line = format!(
        "Squadra: {team_label}  |  Stato: {status_label}  |  Cerca: {}{cursor}",
        state.search
    );
    f.render_widget(
        Paragraph::new(vec![
            Line::from(filter_line),
            Line::from(Span::styled(
                "t squadra  s stato  / cerca  j/k scorri",
                Style::default().fg(Color::DarkGray),
            )),
        ]),
        filters,
    );

    let lines: Vec<Line> = matches.iter().map(|row| match_line(row, &data.config)).collect();
    f.render_widget(Paragraph::new(lines).scroll((state.scroll_offset, 0)), list);
}

fn match_line<'a>(row: &'a MatchRow, config: &ClubConfig) -> Line<'a> {
    let status = row.status();
    let status_color = if status.is_final() { Color::Green } else { Color::DarkGray };
    Line::from(vec![
        Span::raw(format!("{:<10} {:>5}  ", or_dash(&row.date), or_dash(&row.time))),
        Span::styled(row.home_team.as_str(), team_style(&row.home_team, config)),
        Span::raw(" vs "),
        Span::styled(row.away_team.as_str(), team_style(&row.away_team, config)),
        Span::raw(format!("  {}  ", or_dash(&row.result))),
        Span::styled(format!("[{}]", status.label()), Style::default().fg(status_color)),
        Span::styled(format!("  {}", row.venue), Style::default().fg(Color::DarkGray)),
    ])
}

// ---------------------------------------------------------------------------
// Squadre
// ---------------------------------------------------------------------------

fn draw_teams(f: &mut Frame, area: Rect, app: &App) {
    if loaded_or_placeholder(f, area, app).is_none() {
        return;
    }
    if app.state.teams.show_detail
        && let Some(team) = app.selected_team()
    {
        draw_team_detail(f, area, team);
        return;
    }

    let ranked = app.ranked_teams();
    let header = Row::new(["Squadra", "Categoria", "V", "P", "Da giocare", "Vitt. %"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = ranked
        .iter()
        .enumerate()
        .map(|(idx, team)| {
            let style = if idx == app.state.teams.selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(team.name.clone()),
                Cell::from(or_dash(&team.category).to_string()),
                Cell::from(team.wins.to_string()),
                Cell::from(team.losses.to_string()),
                Cell::from(team.to_play().to_string()),
                Cell::from(format!("{}%", team.win_rate_pct())),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Fill(3),
            Constraint::Fill(2),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(11),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        default_border(Color::White)
            .title(" Squadre ")
            .title_bottom(" j/k seleziona  Enter dettaglio "),
    );
    f.render_widget(table, area);
}

fn draw_team_detail(f: &mut Frame, area: Rect, team: &TeamStats) {
    let title = if team.category.is_empty() {
        format!(" {} ", team.name)
    } else {
        format!(" {} · {} ", team.name, team.category)
    };
    let block = default_border(Color::Yellow).title(title).title_bottom(" Esc indietro ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [cards_area, form_area, timeline_area] = Layout::vertical([
        Constraint::Length(9),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(inner);

    let cards = [
        ("Vittorie", team.wins.to_string()),
        ("Sconfitte", team.losses.to_string()),
        ("% Vittorie", format!("{}%", team.win_rate_pct())),
        ("Set vinti", team.sets_won.to_string()),
        ("% Set", format!("{}%", team.set_rate_pct())),
        ("Punti/set", format!("{:.1}", team.points_per_set())),
        ("Vitt. casa", team.home_wins.to_string()),
        ("Vitt. trasferta", team.away_wins.to_string()),
        ("Serie migliore", team.longest_win_streak.to_string()),
    ];
    let card_rows = Layout::vertical([Constraint::Length(3); 3]).split(cards_area);
    for (row_idx, row_area) in card_rows.iter().enumerate() {
        let columns = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(*row_area);
        for (col_idx, card_area) in columns.iter().enumerate() {
            let (label, value) = &cards[row_idx * 3 + col_idx];
            f.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    value.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )))
                .alignment(Alignment::Center)
                .block(default_border(Color::DarkGray).title(format!(" {label} "))),
                *card_area,
            );
        }
    }

    let mut form = vec![Span::raw("Forma: ")];
    form.extend(team.recent_form.iter().map(|token| {
        let bg = if *token == Form::W { Color::Green } else { Color::Red };
        Span::styled(format!(" {} ", token.as_char()), Style::default().fg(Color::Black).bg(bg))
    }));
    f.render_widget(Paragraph::new(Line::from(form)), form_area);

    let lines: Vec<Line> = team_timeline(team, TIMELINE_LIMIT)
        .into_iter()
        .map(|entry| {
            let venue = if entry.is_home { "casa" } else { "trasf." };
            Line::from(vec![
                badge_span(entry.outcome),
                Span::raw(format!(
                    " {:<10} {:<6} {}  {}",
                    or_dash(&entry.row.date),
                    venue,
                    entry.opponent,
                    entry.row.result
                )),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::TOP).title(" Ultime partite ")),
        timeline_area,
    );
}

// ---------------------------------------------------------------------------
// Classifiche
// ---------------------------------------------------------------------------

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let Some(data) = loaded_or_placeholder(f, area, app) else {
        return;
    };
    let Some(table) = data.standings.leagues.get(app.state.standings.league_index) else {
        draw_placeholder(f, area, "Classifica non disponibile");
        return;
    };

    let header = Row::new(["Pos.", "Squadra", "Punti", "PG", "PV", "PP", "SF", "SS"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|row| {
            let style = if table.is_highlighted(row, &data.config) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(row.position.to_string()),
                Cell::from(row.team.clone()),
                Cell::from(row.points.to_string()),
                Cell::from(row.played.to_string()),
                Cell::from(row.won.to_string()),
                Cell::from(row.lost.to_string()),
                Cell::from(row.sets_won.to_string()),
                Cell::from(row.sets_lost.to_string()),
            ])
            .style(style)
        })
        .collect();

    let updated = data.loaded_at.format("Agg. %d/%m/%Y %H:%M").to_string();
    let widget = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
        ],
    )
    .header(header)
    .block(
        default_border(Color::White)
            .title(format!(
                " {} ({}/{}) ",
                table.league,
                app.state.standings.league_index + 1,
                data.standings.len()
            ))
            .title_bottom(format!(" h/l campionato  ·  {updated} ")),
    );
    f.render_widget(widget, area);
}

// ---------------------------------------------------------------------------
// Social
// ---------------------------------------------------------------------------

fn draw_social(f: &mut Frame, area: Rect, app: &App) {
    let Some(post) = app.weekly_post() else {
        loaded_or_placeholder(f, area, app);
        return;
    };

    let social = &app.state.social;
    let block = default_border(Color::White)
        .title(format!(
            " Post settimanale {} - {} ",
            social.start.format("%d/%m/%Y"),
            social.end.format("%d/%m/%Y")
        ))
        .title_bottom(" [ settimana prec.  ] settimana succ. ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let post = match post {
        Ok(post) => post,
        Err(e) => {
            f.render_widget(
                Paragraph::new(e.to_string())
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                inner,
            );
            return;
        }
    };

    let [stats_area, text_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(format!("Partite: {}  ", post.total)),
            Span::styled(format!("Vittorie: {}  ", post.wins), Style::default().fg(Color::Green)),
            Span::styled(format!("Sconfitte: {}  ", post.losses), Style::default().fg(Color::Red)),
            Span::raw(format!("Categorie: {}", post.categories)),
        ])),
        stats_area,
    );
    f.render_widget(Paragraph::new(post.text).wrap(Wrap { trim: false }), text_area);
}

// ---------------------------------------------------------------------------

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Log "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .output_target(false)
        .output_file(false)
        .output_line(false);
    f.render_widget(logs, area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
