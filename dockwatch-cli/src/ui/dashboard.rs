use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use dockwatch_core::model::StreamKind;
use dockwatch_core::state::ScrollMode;
use dockwatch_core::view::{ColoredLine, DashboardView, ResourceSummary, ServiceRow};

use super::styles;

/// Screen regions, computed once per frame.
pub struct Areas {
    pub top_bar: Rect,
    pub services: Rect,
    pub resources: Rect,
    pub logs: Rect,
    pub footer: Rect,
}

impl Areas {
    pub fn new(area: Rect) -> Self {
        // Layout:
        // [ top bar ]
        // [ services | resources ]
        // [ logs ]
        // [ footer ]
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Percentage(40),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(outer[1]);

        Self {
            top_bar: outer[0],
            services: top[0],
            resources: top[1],
            logs: outer[2],
            footer: outer[3],
        }
    }

    /// Lines visible inside the bordered log panel.
    pub fn log_height(&self) -> usize {
        self.logs.height.saturating_sub(2) as usize
    }
}

pub fn draw(f: &mut Frame, areas: &Areas, view: &DashboardView, runtime: &str) {
    draw_top_bar(f, areas.top_bar, view, runtime);
    draw_services(f, areas.services, view);
    draw_resources(f, areas.resources, view.resources.as_ref());
    draw_logs(f, areas.logs, view, areas.log_height());
    draw_footer(f, areas.footer);
}

fn draw_top_bar(f: &mut Frame, area: Rect, view: &DashboardView, runtime: &str) {
    let running = view.rows.iter().filter(|r| r.running).count();
    let mut spans = vec![
        Span::styled(" dockwatch ", styles::header()),
        Span::styled(format!("[{}] ", runtime), styles::text_dim()),
        Span::styled(
            format!("{}/{} running", running, view.rows.len()),
            styles::text(),
        ),
    ];
    if let Some(stale) = &view.stale {
        spans.push(Span::styled(format!("  {} ", stale), styles::warn()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(Span::styled(format!(" {} ", title), styles::title()))
}

fn service_row(row: &ServiceRow) -> Row<'static> {
    Row::new(vec![
        Cell::from(Span::styled(row.service.clone(), styles::service(row.color))),
        Cell::from(Span::styled(row.state.clone(), styles::state(row.running))),
        Cell::from(Span::styled(row.image.clone(), styles::text_dim())),
        Cell::from(Span::styled(row.cpu.clone(), styles::text())),
        Cell::from(Span::styled(row.memory.clone(), styles::text())),
        Cell::from(Span::styled(row.logs.clone(), styles::text_dim())),
    ])
}

fn draw_services(f: &mut Frame, area: Rect, view: &DashboardView) {
    let block = panel("Services");

    if view.rows.is_empty() {
        let message = if view.resources.is_none() {
            "Waiting for first refresh..."
        } else {
            "No running containers"
        };
        let p = Paragraph::new(Span::styled(message, styles::placeholder()))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let header = Row::new(["Service", "State", "Image", "CPU %", "Memory", "Logs"])
        .style(styles::header());
    let widths = [
        Constraint::Percentage(18),
        Constraint::Percentage(12),
        Constraint::Percentage(26),
        Constraint::Percentage(10),
        Constraint::Percentage(16),
        Constraint::Percentage(18),
    ];
    let table = Table::new(view.rows.iter().map(service_row), widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    f.render_widget(table, area);
}

fn draw_resources(f: &mut Frame, area: Rect, resources: Option<&ResourceSummary>) {
    let lines: Vec<Line> = match resources {
        Some(summary) => summary
            .entries()
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{:<14}", label), styles::text_dim()),
                    Span::styled(value, styles::text()),
                ])
            })
            .collect(),
        None => vec![Line::from(Span::styled("-", styles::placeholder()))],
    };
    f.render_widget(Paragraph::new(lines).block(panel("System Resources")), area);
}

fn log_line(line: &ColoredLine) -> Line<'_> {
    let mut spans = vec![Span::styled(
        format!("[{}] ", line.service),
        styles::service(line.color),
    )];
    if line.stream == StreamKind::Stderr {
        spans.push(Span::styled("! ", styles::error()));
    }
    let body = if line.placeholder {
        styles::placeholder()
    } else {
        styles::text()
    };
    spans.push(Span::styled(line.text.as_str(), body));
    Line::from(spans)
}

fn draw_logs(f: &mut Frame, area: Rect, view: &DashboardView, height: usize) {
    let mode = match view.mode {
        ScrollMode::Following => Span::styled(" following ", styles::text_dim()),
        ScrollMode::Pinned => Span::styled(" pinned (f to follow) ", styles::warn()),
    };
    let title = Line::from(vec![Span::styled(" Logs ", styles::title()), mode]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(title);

    // Only the visible window is built into lines.
    let start = view.scroll.min(view.logs.len());
    let end = (start + height).min(view.logs.len());
    let lines: Vec<Line> = view.logs[start..end].iter().map(log_line).collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints = [
        ("q", "quit"),
        ("↑↓/jk", "scroll"),
        ("PgUp/PgDn", "page"),
        ("g", "top"),
        ("f/G", "follow"),
    ];
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), styles::key_hint()));
        spans.push(Span::styled(format!("{} ", label), styles::text_dim()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
