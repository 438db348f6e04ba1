use crate::cards::Card;
use crate::tui::app::{AppState, KEYMAPS};
use crate::tui::view::TableView;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::time::Duration;

use super::layout::{centered_rect, grid, inner};

const COLUMNS: usize = 4;
const PLAYER_COLORS: [Color; 6] =
    [Color::Cyan, Color::Magenta, Color::Yellow, Color::Green, Color::LightRed, Color::LightBlue];

fn player_color(player: usize) -> Color {
    PLAYER_COLORS[player % PLAYER_COLORS.len()]
}

fn seconds(d: Duration) -> String {
    format!("{}.{}s", d.as_secs(), d.subsec_millis() / 100)
}

pub(super) fn draw_table(f: &mut Frame, app: &AppState) {
    let view = app.view();
    let size = f.area();
    let players_height = view.scores.len() as u16 + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // countdown
            Constraint::Min(9),                 // table
            Constraint::Length(players_height), // players
            Constraint::Length(3),              // status bar
        ])
        .split(size);

    draw_header(f, chunks[0], &view);
    draw_slots(f, chunks[1], app, &view);
    draw_players(f, chunks[2], app, &view);

    let mut status = vec![Span::raw("? help • Esc quit")];
    if let Some(err) = app.press_error() {
        status.push(Span::raw("   "));
        status.push(Span::styled(format!("Error: {err}"), Style::default().fg(Color::Red)));
    }
    let para = Paragraph::new(Line::from(status))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(para, chunks[3]);

    if let Some(winners) = &view.winners {
        draw_winners(f, app, &view, winners);
    } else if app.help_open() {
        draw_help(f, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, view: &TableView) {
    let style = if view.warning {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let text = if view.warning { seconds(view.countdown) } else { format!("{}s", view.countdown.as_secs()) };
    let header = Paragraph::new(Line::from(Span::styled(format!("Reshuffle in {text}"), style)))
        .block(Block::default().title("set-rs").borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_slots(f: &mut Frame, area: Rect, app: &AppState, view: &TableView) {
    f.render_widget(Block::default().title("Table").borders(Borders::ALL), area);
    let rows = view.cards.len().div_ceil(COLUMNS);
    let cells = grid(inner(area), rows, COLUMNS);
    for (slot, (card, cell)) in view.cards.iter().zip(cells).enumerate() {
        render_slot(f, cell, app, view, slot, *card);
    }
}

fn render_slot(
    f: &mut Frame,
    area: Rect,
    app: &AppState,
    view: &TableView,
    slot: usize,
    card: Option<Card>,
) {
    let keys = KEYMAPS
        .iter()
        .take(app.humans)
        .filter_map(|k| k.get(slot))
        .map(|c| c.to_ascii_uppercase().to_string())
        .collect::<Vec<_>>()
        .join("/");
    let title = if keys.is_empty() { format!("{slot}") } else { format!("{slot} [{keys}]") };
    let markers = view.markers_on(slot);
    let mut block = Block::default().title(title).borders(Borders::ALL);
    if let [only] = markers.as_slice() {
        block = block.border_style(Style::default().fg(player_color(*only)));
    } else if markers.len() > 1 {
        block = block.border_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    }

    let mut lines: Vec<Line> = Vec::with_capacity(2);
    match card {
        Some(card) => {
            lines.push(Line::from(Span::styled(
                app.card_label(card),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                card.to_string(),
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
        None => lines.push(Line::from(Span::styled("--", Style::default().add_modifier(Modifier::DIM)))),
    }
    let flags: Vec<Span> = markers
        .iter()
        .map(|&p| Span::styled(format!("P{} ", p + 1), Style::default().fg(player_color(p))))
        .collect();
    lines.push(Line::from(flags));

    let para = Paragraph::new(lines).alignment(Alignment::Center).block(block);
    f.render_widget(para, area);
}

fn draw_players(f: &mut Frame, area: Rect, app: &AppState, view: &TableView) {
    let lines: Vec<Line> = view
        .scores
        .iter()
        .enumerate()
        .map(|(id, score)| {
            let name = app.names.get(id).cloned().unwrap_or_else(|| format!("Player {}", id + 1));
            let mut spans = vec![
                Span::styled(format!("P{} {name:<12}", id + 1), Style::default().fg(player_color(id))),
                Span::raw(format!(" score {score:>3}")),
            ];
            let cooldown = view.cooldowns.get(id).copied().unwrap_or_default();
            if !cooldown.is_zero() {
                spans.push(Span::styled(
                    format!("  frozen {}s", cooldown.as_secs().max(1)),
                    Style::default().fg(Color::Red),
                ));
            }
            Line::from(spans)
        })
        .collect();
    let para = Paragraph::new(lines).block(Block::default().title("Players").borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_winners(f: &mut Frame, app: &AppState, view: &TableView, winners: &[usize]) {
    let area = centered_rect(50, 40, f.area());
    let block = Block::default().title("Game over").borders(Borders::ALL);
    let mut lines: Vec<Line> = Vec::new();
    let names: Vec<String> = winners
        .iter()
        .map(|&p| app.names.get(p).cloned().unwrap_or_else(|| format!("Player {}", p + 1)))
        .collect();
    let headline = match names.as_slice() {
        [] => "No winner".to_string(),
        [one] => format!("{one} wins!"),
        many => format!("Tie: {}", many.join(", ")),
    };
    lines.push(Line::from(Span::styled(headline, Style::default().add_modifier(Modifier::BOLD))));
    lines.push(Line::from(""));
    for (id, score) in view.scores.iter().enumerate() {
        lines.push(Line::from(format!("P{}: {score}", id + 1)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Esc to exit", Style::default().add_modifier(Modifier::DIM))));
    let para = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(para, inner(area));
}

fn draw_help(f: &mut Frame, app: &AppState) {
    let area = centered_rect(70, 70, f.area());
    let block = Block::default().title("Help").borders(Borders::ALL);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from("Find three cards where every feature is all same or all different."),
        Line::from("Mark them with your keys; the third marker submits the claim."),
        Line::from("Pressing a marked slot again removes the marker."),
        Line::from(""),
    ];
    for (player, keys) in KEYMAPS.iter().take(app.humans).enumerate() {
        lines.push(Line::from(Span::styled(format!("Player {}:", player + 1), bold)));
        for row in keys.chunks(COLUMNS) {
            let row: String = row.iter().map(|c| format!("{} ", c.to_ascii_uppercase())).collect();
            lines.push(Line::from(format!("  {row}")));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Esc: quit • Close help: ?"));
    let para = Paragraph::new(lines).wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(para, inner(area));
}
