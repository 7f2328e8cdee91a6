use crate::layout::{self, hit, modal_layout, screen_layout};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use rtouch::config::DashboardConfig;
use rtouch::dashboard::controls::{
    self, hvac_action, long_press_modal, slider_action, HvacMode, ModalState,
};
use rtouch::dashboard::gesture::{Gesture, PressGesture};
use rtouch::dashboard::tiles::{DragConstraints, DragOutcome, DragTracker, Point, PointerKind};
use rtouch::dashboard::{PollingStore, Role};
use rtouch::{EntityRecord, ServiceCall};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Mouse travel (in cells) that turns a press into a tile drag
pub const TERMINAL_DRAG_DISTANCE: f64 = 2.0;

/// Panel interaction state on top of the shared store
pub struct App {
    store: Arc<PollingStore>,
    alarm_code: String,
    gesture: PressGesture,
    drag: DragTracker,
    pressed: Option<Role>,
    pub(crate) modals: ModalState,
    screen: Rect,
    should_quit: bool,
}

impl App {
    pub fn new(store: Arc<PollingStore>, config: &DashboardConfig) -> Self {
        let constraints = DragConstraints {
            distance: TERMINAL_DRAG_DISTANCE,
            ..DragConstraints::from_config(config)
        };

        Self {
            store,
            alarm_code: config.alarm_code.clone(),
            gesture: PressGesture::new(config.long_press()),
            drag: DragTracker::new(constraints),
            pressed: None,
            modals: ModalState::default(),
            screen: Rect::default(),
            should_quit: false,
        }
    }

    pub fn store(&self) -> &PollingStore {
        &self.store
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_screen(&mut self, area: Rect) {
        self.screen = area;
    }

    pub fn screen(&self) -> Rect {
        self.screen
    }

    /// Tile currently lifted by a drag
    pub fn dragging(&self) -> Option<Role> {
        self.drag.is_active().then_some(self.pressed).flatten()
    }

    pub fn entity_for(&self, role: Role) -> EntityRecord {
        self.store.get_entity(self.store.role_mapping().get(role))
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => self.modals.close(),
            _ => {}
        }
    }

    /// Long-press timer; opens the tile's modal while the button is still held.
    pub fn on_tick(&mut self, now: Instant) {
        if let (Some(role), Some(Gesture::LongPress)) = (self.pressed, self.gesture.poll(now)) {
            self.long_press(role);
        }
    }

    /// Returns the service call to dispatch, if the event produced one
    pub fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Option<ServiceCall> {
        if self.modals.is_open() {
            return self.on_modal_mouse(mouse);
        }
        if self.store.is_loading() {
            return None;
        }

        let point = Point::new(f64::from(mouse.column), f64::from(mouse.row));
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let role = self.tile_at(mouse.column, mouse.row)?;
                self.pressed = Some(role);
                self.gesture.press(now);
                self.drag.press(role, PointerKind::Mouse, point, now);
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.pressed.is_some() && self.drag.move_to(point, now) {
                    // A drag is never also a tap or long-press
                    self.gesture.cancel();
                }
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let role = self.pressed.take()?;
                match self.drag.release() {
                    DragOutcome::Dropped { source } => {
                        if let Some(target) = self.tile_at(mouse.column, mouse.row) {
                            self.drop_tile(source, target);
                        }
                        None
                    }
                    DragOutcome::NotDragged => match self.gesture.release(now)? {
                        Gesture::Tap => self.tap(role),
                        Gesture::LongPress => {
                            self.long_press(role);
                            None
                        }
                    },
                }
            }
            _ => None,
        }
    }

    fn on_modal_mouse(&mut self, mouse: MouseEvent) -> Option<ServiceCall> {
        let areas = modal_layout(self.screen);
        let kind = self.modals.current()?.kind;
        let entity_id = self
            .store
            .role_mapping()
            .get(kind.role())
            .to_string();

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if hit(areas.close, mouse.column, mouse.row) {
                    self.modals.close();
                    return None;
                }
                if kind.slider_label().is_none() {
                    let mode = if hit(areas.cool, mouse.column, mouse.row) {
                        HvacMode::Cool
                    } else if hit(areas.heat, mouse.column, mouse.row) {
                        HvacMode::Heat
                    } else {
                        return None;
                    };
                    return Some(hvac_action(&entity_id, mode));
                }
                if hit(areas.slider, mouse.column, mouse.row) {
                    let value = layout::slider_value(areas.slider, mouse.column);
                    self.modals.current_mut()?.slider.drag_to(value);
                }
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let slider = &mut self.modals.current_mut()?.slider;
                if slider.is_dragging() {
                    slider.drag_to(layout::slider_value(areas.slider, mouse.column));
                }
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let value = self.modals.current_mut()?.slider.release()?;
                slider_action(kind, &entity_id, value)
            }
            _ => None,
        }
    }

    fn tile_at(&self, column: u16, row: u16) -> Option<Role> {
        let order = self.store.tile_order();
        screen_layout(self.screen)
            .tiles
            .iter()
            .zip(order.roles())
            .find(|(rect, _)| hit(**rect, column, row))
            .map(|(_, role)| *role)
    }

    fn tap(&self, role: Role) -> Option<ServiceCall> {
        let entity = self.entity_for(role);
        let call = controls::tap_action(role, &entity, &self.alarm_code);
        debug!(%role, has_action = call.is_some(), "Tile tapped");
        call
    }

    fn long_press(&mut self, role: Role) {
        self.drag.cancel();
        self.pressed = None;
        if let Some(kind) = long_press_modal(role) {
            let entity = self.entity_for(role);
            self.modals.open(kind, &entity);
            debug!(%role, modal = kind.title(), "Modal opened");
        }
    }

    fn drop_tile(&self, source: Role, target: Role) {
        let mut order = self.store.tile_order();
        if order.reorder(source, target) {
            info!(%source, %target, "Tile moved");
            self.store.set_tile_order(order);
        }
    }
}
