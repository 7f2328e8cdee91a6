use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};

/// Terminal width at which the grid switches from 2×2 to a single row
pub const WIDE_THRESHOLD: u16 = 100;

pub struct ScreenLayout {
    pub header: Rect,
    /// One rect per tile slot, in tile order
    pub tiles: Vec<Rect>,
    pub footer: Rect,
}

pub fn screen_layout(area: Rect) -> ScreenLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    let grid = rows[1];
    let tiles = if area.width >= WIDE_THRESHOLD {
        split_evenly(grid, Direction::Horizontal, 4)
    } else {
        split_evenly(grid, Direction::Vertical, 2)
            .into_iter()
            .flat_map(|row| split_evenly(row, Direction::Horizontal, 2))
            .collect()
    };

    ScreenLayout {
        header: rows[0],
        tiles,
        footer: rows[2],
    }
}

fn split_evenly(area: Rect, direction: Direction, n: u32) -> Vec<Rect> {
    let constraints = (0..n).map(|_| Constraint::Ratio(1, n));
    Layout::default()
        .direction(direction)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

pub struct ModalLayout {
    pub area: Rect,
    pub close: Rect,
    /// Brightness or volume bar
    pub slider: Rect,
    pub cool: Rect,
    pub heat: Rect,
}

pub fn modal_layout(screen: Rect) -> ModalLayout {
    let width = screen.width.min(44);
    let height = screen.height.min(11);
    let area = Rect::new(
        screen.x + (screen.width - width) / 2,
        screen.y + (screen.height - height) / 2,
        width,
        height,
    );

    let inner = Rect::new(
        area.x + 2,
        area.y + 2,
        area.width.saturating_sub(4),
        area.height.saturating_sub(3),
    );
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(rows[1]);

    ModalLayout {
        area,
        close: Rect::new(area.right().saturating_sub(4), area.y, 3, 1),
        slider: rows[1],
        cool: buttons[0],
        heat: buttons[1],
    }
}

pub fn hit(rect: Rect, column: u16, row: u16) -> bool {
    rect.contains(Position::new(column, row))
}

/// Slider value (0..=100) for a click at `column` inside `slider`
pub fn slider_value(slider: Rect, column: u16) -> u8 {
    if slider.width <= 1 {
        return 0;
    }
    let offset = column.saturating_sub(slider.x).min(slider.width - 1);
    ((u32::from(offset) * 100) / u32::from(slider.width - 1)) as u8
}
