//! UI rendering for the TUI

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::app::App;
use crate::models::{FormField, StageMetric, TimelineSnapshot};

const PRIMARY: Color = Color::Cyan;
const SUCCESS: Color = Color::Green;
const ERROR: Color = Color::Red;
const MUTED: Color = Color::DarkGray;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let timeline_height = if app.timeline.is_some() { 10 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(12),              // Query form
            Constraint::Min(6),                  // Results table
            Constraint::Length(timeline_height), // Timeline panel
            Constraint::Length(1),               // Status bar
        ])
        .split(frame.size());

    draw_form(frame, app, chunks[0]);
    draw_results(frame, app, chunks[1]);
    if let Some(timeline) = &app.timeline {
        draw_timeline(frame, timeline, chunks[2]);
    }
    draw_status_bar(frame, app, chunks[3]);
}

fn field_style(app: &App, field: FormField) -> Style {
    if !app.results_focused && app.focus == field {
        Style::default().fg(PRIMARY).bold()
    } else {
        Style::default()
    }
}

fn text_field_line<'a>(app: &'a App, field: FormField, label: String, value: &'a str) -> Line<'a> {
    let focused = !app.results_focused && app.focus == field;
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(format!("{label:<22}"), field_style(app, field)),
        Span::raw(value),
        Span::styled(cursor, Style::default().fg(PRIMARY)),
    ])
}

fn draw_form(frame: &mut Frame, app: &App, area: Rect) {
    let criteria = &app.criteria;

    let entity_choices = {
        let mark = |selected: bool| if selected { "(•)" } else { "( )" };
        use crate::models::EntityType;
        format!(
            "{} Entitlement  {} Account",
            mark(criteria.entity_type == EntityType::Entitlement),
            mark(criteria.entity_type == EntityType::Account),
        )
    };

    let submit_label = if app.loading { "Loading..." } else { "[ SUBMIT ]" };
    let submit_style = if !app.results_focused && app.focus == FormField::Submit {
        Style::default().fg(Color::Black).bg(PRIMARY).bold()
    } else if app.loading {
        Style::default().fg(MUTED)
    } else {
        Style::default().fg(PRIMARY)
    };

    let mut lines = vec![
        text_field_line(
            app,
            FormField::RequestGroupId,
            "Request Group Id *".to_string(),
            &criteria.request_group_id,
        ),
        text_field_line(
            app,
            FormField::EntityId,
            format!("{} *", criteria.entity_type.id_label()),
            &criteria.entity_id,
        ),
        Line::from(vec![
            Span::styled(
                format!("{:<22}", "Entity Type"),
                field_style(app, FormField::EntityType),
            ),
            Span::raw(entity_choices),
        ]),
        text_field_line(app, FormField::Sku, "SKU (Optional)".to_string(), &criteria.sku_id),
        Line::from(vec![
            Span::styled(
                format!("{:<22}", "Aggregation"),
                field_style(app, FormField::Aggregation),
            ),
            Span::raw(
                criteria
                    .aggregation_type
                    .label(criteria.entity_type),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(submit_label, submit_style)),
    ];

    if let Some(err) = &app.field_error {
        lines.push(Line::from(Span::styled(
            err.message.clone(),
            Style::default().fg(ERROR),
        )));
    } else if let Some(banner) = &app.banner_error {
        lines.push(Line::from(Span::styled(
            banner.clone(),
            Style::default().fg(ERROR).bold(),
        )));
    }

    let form = Paragraph::new(lines).block(
        Block::default()
            .title("Usage Aggregation Query")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(MUTED)),
    );

    frame.render_widget(form, area);
}

fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let rows_data = app.grouped_rows();

    let border_style = if app.results_focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    };
    let block = Block::default()
        .title(format!("Results ({})", rows_data.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    if rows_data.is_empty() {
        let placeholder = Paragraph::new("No results. Fill in the form and submit.")
            .style(Style::default().fg(MUTED))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let columns = app.columns();
    let header = Row::new(columns.clone())
        .style(Style::default().fg(PRIMARY).bold())
        .height(1);

    let show_sku = app.show_sku_column();
    let rows: Vec<Row> = rows_data
        .iter()
        .map(|row| {
            let selected = app.selected_timeline.as_deref() == Some(row.key.as_str());
            let action = if selected { "Hide Timeline" } else { "View Timeline" };

            let mut cells = vec![
                Cell::from(row.request_group_id.clone()),
                Cell::from(row.entity_id.clone()),
            ];
            if show_sku {
                cells.push(Cell::from(
                    row.sku_id.clone().unwrap_or_else(|| "-".to_string()),
                ));
            }
            cells.push(Cell::from(format_amount(row.aggregated_total)));
            cells.push(Cell::from(action).style(if selected {
                Style::default().fg(SUCCESS)
            } else {
                Style::default().fg(PRIMARY)
            }));

            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = match columns.len() {
        5 => vec![
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(14),
            Constraint::Percentage(20),
            Constraint::Percentage(22),
        ],
        _ => vec![
            Constraint::Percentage(28),
            Constraint::Percentage(28),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
        ],
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.table_state.clone());
}

fn draw_timeline(frame: &mut Frame, timeline: &TimelineSnapshot, area: Rect) {
    let outer = Block::default()
        .title("Usage Timeline")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let show_failed = timeline.has_failed_items();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if show_failed {
            vec![Constraint::Length(4), Constraint::Length(4)]
        } else {
            vec![Constraint::Length(4)]
        })
        .split(inner);

    let stages = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(31),
            Constraint::Percentage(3),
            Constraint::Percentage(31),
            Constraint::Percentage(3),
            Constraint::Percentage(32),
        ])
        .split(rows[0]);

    draw_stage(frame, "Usage Items", &timeline.usage_items, stages[0], PRIMARY);
    draw_arrow(frame, stages[1]);
    draw_stage(
        frame,
        "Usage Items Rated",
        &timeline.usage_items_rated,
        stages[2],
        PRIMARY,
    );
    draw_arrow(frame, stages[3]);
    draw_stage(
        frame,
        "Usage Billing Items",
        &timeline.usage_billing_items,
        stages[4],
        SUCCESS,
    );

    if show_failed {
        // Failed items branch off the raw and rated stages.
        let failed_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(17),
                Constraint::Percentage(31),
                Constraint::Percentage(52),
            ])
            .split(rows[1]);

        draw_stage(
            frame,
            "Usage Items Failed",
            &timeline.usage_items_failed,
            failed_row[1],
            ERROR,
        );
    }
}

fn draw_stage(frame: &mut Frame, title: &str, metric: &StageMetric, area: Rect, color: Color) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let content = vec![
        Line::from(vec![
            Span::styled("Quantity    ", Style::default().fg(MUTED)),
            Span::raw(format_amount(metric.quantity)),
        ]),
        Line::from(vec![
            Span::styled("Total Price ", Style::default().fg(MUTED)),
            Span::raw(format_amount(metric.total_price)),
        ]),
    ];

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn draw_arrow(frame: &mut Frame, area: Rect) {
    let arrow = Paragraph::new("\n→").alignment(Alignment::Center);
    frame.render_widget(arrow, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let help = if app.results_focused {
        "↑/↓ Navigate | Enter Toggle timeline | Tab Form | q Quit"
    } else {
        "Tab Next field | Enter Submit | ←/→ Toggle choice | Esc Quit"
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(MUTED)),
        chunks[0],
    );

    let right = if app.loading {
        Span::styled("● Fetching…", Style::default().fg(PRIMARY))
    } else {
        Span::styled("○ Idle", Style::default().fg(MUTED))
    };
    frame.render_widget(
        Paragraph::new(right).alignment(Alignment::Right),
        chunks[1],
    );
}

/// Display values are always rendered with two decimal places.
fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_amount(150.0), "150.00");
        assert_eq!(format_amount(1234.567), "1234.57");
        assert_eq!(format_amount(0.0), "0.00");
    }
}
