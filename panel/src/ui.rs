use crate::app::App;
use crate::layout::{modal_layout, screen_layout};
use chrono::Local;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph},
    Frame,
};
use rtouch::dashboard::controls::{tile_view, ModalKind, OpenModal, TileView};
use rtouch::dashboard::{Phase, Role};

fn accent(role: Role) -> Color {
    match role {
        Role::Light => Color::Yellow,
        Role::Audio => Color::Blue,
        Role::Alarm => Color::Red,
        Role::Climate => Color::Green,
    }
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();
    app.set_screen(area);

    if app.store().is_loading() {
        render_loading(f, area);
        return;
    }

    let layout = screen_layout(area);
    render_header(f, layout.header);

    let order = app.store().tile_order();
    let dragging = app.dragging();
    for (rect, &role) in layout.tiles.iter().zip(order.roles()) {
        let view = tile_view(role, &app.entity_for(role));
        render_tile(f, *rect, &view, dragging == Some(role));
    }

    render_footer(f, layout.footer, app);

    if let Some(modal) = app.modals.current() {
        render_modal(f, area, modal, app);
    }
}

fn render_loading(f: &mut Frame, area: Rect) {
    let y = area.y + area.height / 2;
    let line = Rect::new(area.x, y, area.width, 1);
    let text = Paragraph::new(Span::styled(
        "Loading RTOUCH...",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(text, line);
}

fn render_header(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![Span::styled(
        "RTOUCH",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )]))
    .block(Block::default().borders(Borders::BOTTOM).border_style(Color::DarkGray));
    f.render_widget(title, area);

    let hint = Paragraph::new(Span::styled(
        "Hold to Edit · Drag to Move",
        Style::default().fg(Color::DarkGray),
    ))
    .alignment(Alignment::Right);
    f.render_widget(hint, Rect::new(area.x, area.y, area.width, 1));
}

fn render_tile(f: &mut Frame, area: Rect, view: &TileView, lifted: bool) {
    let color = accent(view.role);
    let (border, label_style, sub_style) = if view.active {
        (
            Style::default().fg(color).add_modifier(Modifier::BOLD),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::Gray),
            Style::default().fg(Color::DarkGray),
        )
    };
    let border = if lifted {
        border.add_modifier(Modifier::REVERSED)
    } else {
        border
    };

    let lines = vec![
        Line::from(Span::raw(view.icon)),
        Line::from(""),
        Line::from(Span::styled(view.label, label_style)),
        Line::from(Span::styled(view.subtext.clone(), sub_style)),
    ];
    let tile = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border),
    );
    f.render_widget(tile, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let status = app.store().status();
    let text = match (&status.last_error, status.last_refresh) {
        (Some(err), _) => Span::styled(format!(" ● {}", err), Style::default().fg(Color::Red)),
        (None, Some(at)) => Span::styled(
            format!(
                " ● {} entities · updated {}",
                status.entity_count,
                at.with_timezone(&Local).format("%H:%M:%S")
            ),
            Style::default().fg(Color::Green),
        ),
        (None, None) => Span::raw(""),
    };
    let hint = if status.phase == Phase::Ready {
        Span::styled("  q quit", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw("")
    };
    f.render_widget(Paragraph::new(Line::from(vec![text, hint])), area);
}

fn render_modal(f: &mut Frame, screen: Rect, modal: &OpenModal, app: &App) {
    let areas = modal_layout(screen);
    f.render_widget(Clear, areas.area);
    f.render_widget(
        Block::default()
            .title(Span::styled(
                format!(" {} ", modal.kind.title()),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Gray)),
        areas.area,
    );
    f.render_widget(
        Paragraph::new(Span::styled("✕", Style::default().fg(Color::Gray))),
        areas.close,
    );

    let heading = Rect::new(areas.slider.x, areas.slider.y.saturating_sub(1), areas.slider.width, 1);
    match modal.kind.slider_label() {
        Some(label) => {
            f.render_widget(Paragraph::new(Span::raw(label)), heading);
            let color = if modal.kind == ModalKind::Lights {
                Color::Yellow
            } else {
                Color::Blue
            };
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL))
                .gauge_style(Style::default().fg(color))
                .percent(u16::from(modal.slider.value()))
                .label(format!("{}%", modal.slider.value()));
            f.render_widget(gauge, areas.slider);
        }
        None => {
            let climate = app.entity_for(Role::Climate);
            let temperature = climate
                .attribute_f64("current_temperature")
                .map(|t| format!("{}°", t))
                .unwrap_or_else(|| "--°".to_string());
            f.render_widget(
                Paragraph::new(Span::styled(
                    temperature,
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center),
                heading,
            );
            render_button(f, areas.cool, "Cool", Color::Blue);
            render_button(f, areas.heat, "Heat", Color::Red);
        }
    }
}

fn render_button(f: &mut Frame, area: Rect, label: &str, color: Color) {
    let button = Paragraph::new(Span::styled(label, Style::default().fg(color)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(button, area);
}
