use gallerist_core::Artwork;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::app::{App, Mode};
use crate::theme::TuiTheme;

const HEADERS: [&str; 7] = [
    "",
    "Title",
    "Place of Origin",
    "Artist",
    "Inscriptions",
    "Date Start",
    "Date End",
];

pub fn draw(f: &mut Frame, app: &App, thm: &TuiTheme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // table
            Constraint::Length(4), // shortcuts/status
        ])
        .split(f.area());

    draw_table(f, app, thm, chunks[0]);
    draw_footer(f, app, thm, chunks[1]);

    if app.mode == Mode::BulkInput {
        draw_bulk_overlay(f, app, thm);
    }
}

fn draw_table(f: &mut Frame, app: &App, thm: &TuiTheme, area: Rect) {
    let table = &app.table;
    // derived per frame from the global selection
    let checked = table.visible_selection();

    let rows: Vec<Row> = table
        .window()
        .iter()
        .map(|a| {
            let mark = if checked.contains(&a.id) {
                Cell::from("[x]").style(Style::default().fg(thm.checked_fg))
            } else {
                Cell::from("[ ]")
            };
            let mut cells = vec![mark];
            cells.extend(columns(a).into_iter().map(Cell::from));
            Row::new(cells)
        })
        .collect();

    let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h)))
        .style(Style::default().add_modifier(Modifier::BOLD));

    let mut title = format!("Artworks · page {}/{}", table.cursor(), table.total_pages().max(1));
    if table.is_loading() {
        title.push_str(" · loading…");
    }

    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(26),
        Constraint::Percentage(12),
        Constraint::Percentage(26),
        Constraint::Percentage(16),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    let widget = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(thm.border_fg)),
        )
        .row_highlight_style(
            Style::default()
                .fg(thm.highlight_fg)
                .bg(thm.highlight_bg)
                .add_modifier(Modifier::BOLD),
        );

    let selected = if table.window().is_empty() {
        None
    } else {
        Some(app.row.min(table.window().len() - 1))
    };
    f.render_stateful_widget(
        widget,
        area,
        &mut ratatui::widgets::TableState::default().with_selected(selected),
    );
}

/// Display cells for one artwork; absent values render empty.
pub fn columns(a: &Artwork) -> [String; 6] {
    fn text(v: &Option<String>) -> String {
        v.as_deref().unwrap_or("").replace(['\n', '\r'], " ")
    }
    fn year(v: Option<i64>) -> String {
        v.map(|y| y.to_string()).unwrap_or_default()
    }
    [
        text(&a.title),
        text(&a.place_of_origin),
        text(&a.artist_display),
        text(&a.inscriptions),
        year(a.date_start),
        year(a.date_end),
    ]
}

fn draw_footer(f: &mut Frame, app: &App, thm: &TuiTheme, area: Rect) {
    let table = &app.table;
    let ln1 = "Space toggle | a toggle page | ←/→ page | Home/End | b select first N | r reload | q quit";
    let mut ln2 = format!(
        "{} records | {} selected",
        table.total_records(),
        table.selection().len()
    );
    if table.is_bulk_loading() {
        ln2.push_str(" | selecting…");
    }
    if let Some(e) = table.page_error() {
        ln2.push_str(&format!(" | error: {} (r to retry)", truncate_msg(e, 60)));
    }
    if let Some(e) = table.bulk_error() {
        ln2.push_str(&format!(" | {}", truncate_msg(e, 60)));
    }
    if let Some(msg) = app.active_toast() {
        ln2.push_str(&format!(" | {msg}"));
    }
    let footer = Paragraph::new(vec![Line::raw(ln1), Line::raw(ln2)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Shortcuts")
                .border_style(Style::default().fg(thm.border_fg)),
        )
        .style(Style::default().fg(thm.help_fg))
        .wrap(Wrap { trim: true });
    f.render_widget(footer, area);
}

fn draw_bulk_overlay(f: &mut Frame, app: &App, thm: &TuiTheme) {
    let area = centered(f.area(), 44, 5);
    let hint = if app.table.is_bulk_loading() {
        "fetching pages…"
    } else {
        "Enter submit | Esc close"
    };
    let body = Paragraph::new(vec![
        Line::raw(if app.input.is_empty() { "Select rows..." } else { app.input.as_str() }),
        Line::raw(hint).style(Style::default().add_modifier(Modifier::DIM)),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Select first N")
            .border_style(Style::default().fg(thm.highlight_bg)),
    );
    f.render_widget(Clear, area);
    f.render_widget(body, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

fn truncate_msg(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}
