use std::time::Instant;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::groups::HighlightMode;
use crate::map_draw;
use crate::state::{Action, App};
use crate::stats::{self, RankedCountry};
use crate::style::stroke_color;

pub fn draw(f: &mut Frame<'_>, app: &mut App, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(f.area());

    // Projections follow the map panel's size.
    let map_inner = Block::default().borders(Borders::ALL).inner(chunks[1]);
    app.update(Action::Resize(map_inner), now);

    draw_left(f, app, chunks[0]);

    // Centre: map
    if app.maps.is_empty() {
        let txt = Paragraph::new("Aucune carte chargée (voir les journaux)")
            .block(Block::default().borders(Borders::ALL).title("Carte"))
            .wrap(Wrap { trim: true });
        f.render_widget(txt, chunks[1]);
    } else {
        let (layers, divider) = app.layers(now);
        map_draw::render(f, chunks[1], app.title(), &layers, app.view.zoom, divider);
    }

    draw_right(f, app, chunks[2]);

    if app.view.show_ranking {
        draw_ranking(f, app, centered(f.area(), 60, 60));
    }
}

fn draw_left(f: &mut Frame<'_>, app: &App, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Length(7), Constraint::Min(4)])
        .split(area);

    // Highlight modes
    let items: Vec<ListItem> = HighlightMode::ALL
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let color = stroke_color(*mode);
            ListItem::new(Line::from(vec![
                Span::raw(format!("{i} ")),
                Span::styled(mode.label(), Style::default().fg(color.into())),
            ]))
        })
        .collect();
    let mut list_state = ListState::default();
    list_state.select(HighlightMode::ALL.iter().position(|m| *m == app.view.highlight));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Mise en évidence"))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_stateful_widget(list, parts[0], &mut list_state);

    // Legend
    let legend: Vec<Line> = app
        .config
        .scale
        .legend()
        .into_iter()
        .map(|(label, color)| {
            Line::from(vec![Span::styled("██", Style::default().fg(color.into())), Span::raw(format!(" {label}"))])
        })
        .collect();
    let legend = Paragraph::new(legend).block(Block::default().borders(Borders::ALL).title("Mentions / 1M hab."));
    f.render_widget(legend, parts[1]);

    // Share and help
    let mut text = String::new();
    if let Some(share) = app.group_share() {
        text.push_str(&format!("{} : {share} % des mentions\n\n", app.view.highlight.label()));
    }
    if let Some(next) = app.maps.get((app.view.map_index + 1) % app.maps.len().max(1)) {
        text.push_str(&format!("Tab : {}\n", next.label));
    }
    text.push_str(app.help_text());
    let info = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Informations"))
        .wrap(Wrap { trim: true });
    f.render_widget(info, parts[2]);
}

fn draw_right(f: &mut Frame<'_>, app: &App, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    // Tooltip
    let text = match app.tooltip() {
        Some(tip) => tip.lines().join("\n"),
        None => "Survolez un pays".to_string(),
    };
    let tooltip = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Pays"))
        .wrap(Wrap { trim: true });
    f.render_widget(tooltip, parts[0]);

    // Monthly chart of the selected country
    let selected = app.view.selected.and_then(|pick| app.properties(pick));
    match selected {
        Some(props) => {
            let series = stats::monthly_series(props);
            let title = format!("{} par mois", props.name().unwrap_or(props.code()));
            let chart = BarChart::default()
                .block(Block::default().borders(Borders::ALL).title(title))
                .data(series.as_slice())
                .bar_width(3)
                .bar_gap(1)
                .bar_style(Style::default().fg(Color::Rgb(0x31, 0x82, 0xbd)))
                .value_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
            f.render_widget(chart, parts[1]);
        }
        None => {
            let hint = Paragraph::new("Cliquez sur un pays pour voir ses mentions mensuelles")
                .block(Block::default().borders(Borders::ALL).title("Évolution"))
                .wrap(Wrap { trim: true });
            f.render_widget(hint, parts[1]);
        }
    }
}

fn draw_ranking(f: &mut Frame<'_>, app: &App, area: Rect) {
    let ranking = app.ranking();
    let rows = |title: &str, countries: &[RankedCountry]| {
        let mut lines = vec![Line::styled(title.to_string(), Style::default().add_modifier(Modifier::BOLD))];
        lines.extend(countries.iter().enumerate().map(|(i, c)| {
            Line::raw(format!("{}. {} – {} mentions ({} / 1M hab.)", i + 1, c.name, c.mentions, c.per_million))
        }));
        lines
    };
    let mut lines = rows("Les plus cités", &ranking.top);
    lines.push(Line::raw(""));
    lines.extend(rows("Les moins cités", &ranking.bottom));

    f.render_widget(Clear, area);
    let popup = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Classement (t pour fermer)"))
        .wrap(Wrap { trim: true });
    f.render_widget(popup, area);
}

/// A rectangle of the given percentages, centred in `area`.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
