use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub(super) fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

pub(super) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);
    area[1]
}

/// Split `area` into `rows` x `cols` equal cells, row-major.
pub(super) fn grid(area: Rect, rows: usize, cols: usize) -> Vec<Rect> {
    let row_constraints = vec![Constraint::Ratio(1, rows.max(1) as u32); rows];
    let col_constraints = vec![Constraint::Ratio(1, cols.max(1) as u32); cols];
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area)
        .iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(col_constraints.clone())
                .split(*row)
                .to_vec()
        })
        .collect()
}
