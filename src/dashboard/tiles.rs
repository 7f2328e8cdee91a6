use super::detect::Role;
use crate::config::DashboardConfig;
use std::time::{Duration, Instant};

/// Move one element from `from` to `to`, keeping the relative order of the rest.
///
/// Out-of-range indices or `from == to` return an unchanged copy.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from == to || from >= items.len() || to >= items.len() {
        return moved;
    }
    let item = moved.remove(from);
    moved.insert(to, item);
    moved
}

/// Display order of the four role tiles; always a permutation of [`Role::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileOrder(Vec<Role>);

impl Default for TileOrder {
    fn default() -> Self {
        Self(vec![Role::Light, Role::Climate, Role::Audio, Role::Alarm])
    }
}

impl TileOrder {
    /// Accepts only a permutation of all four roles
    pub fn from_roles(roles: Vec<Role>) -> Option<Self> {
        let complete = roles.len() == Role::ALL.len()
            && Role::ALL.iter().all(|role| roles.contains(role));
        complete.then_some(Self(roles))
    }

    pub fn roles(&self) -> &[Role] {
        &self.0
    }

    pub fn position(&self, role: Role) -> Option<usize> {
        self.0.iter().position(|&r| r == role)
    }

    /// Move `source` to `target`'s slot. Returns whether the order changed.
    pub fn reorder(&mut self, source: Role, target: Role) -> bool {
        if source == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(source), self.position(target)) else {
            return false;
        };
        self.0 = move_item(&self.0, from, to);
        true
    }
}

/// Input device behind a press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Activation thresholds separating a drag from a tap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConstraints {
    /// Mouse travel that starts a drag
    pub distance: f64,
    /// Touch hold time that starts a drag
    pub touch_delay: Duration,
    /// Touch travel tolerated during the hold
    pub touch_tolerance: f64,
}

impl Default for DragConstraints {
    fn default() -> Self {
        Self {
            distance: 10.0,
            touch_delay: Duration::from_millis(250),
            touch_tolerance: 5.0,
        }
    }
}

impl DragConstraints {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            distance: config.drag_distance,
            touch_delay: Duration::from_millis(config.touch_delay_ms),
            touch_tolerance: config.touch_tolerance,
        }
    }
}

/// Result of releasing a tracked press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// A drag was active; the caller resolves the drop target
    Dropped { source: Role },
    /// The press never became a drag
    NotDragged,
}

#[derive(Debug, Clone, Copy)]
struct TrackedPress {
    source: Role,
    kind: PointerKind,
    origin: Point,
    started: Instant,
    active: bool,
    aborted: bool,
}

/// Tracks one press at a time and decides whether it became a drag.
#[derive(Debug, Clone)]
pub struct DragTracker {
    constraints: DragConstraints,
    press: Option<TrackedPress>,
}

impl DragTracker {
    pub fn new(constraints: DragConstraints) -> Self {
        Self {
            constraints,
            press: None,
        }
    }

    pub fn press(&mut self, source: Role, kind: PointerKind, at: Point, now: Instant) {
        self.press = Some(TrackedPress {
            source,
            kind,
            origin: at,
            started: now,
            active: false,
            aborted: false,
        });
    }

    /// Pointer moved. Returns true when this move activated the drag.
    pub fn move_to(&mut self, at: Point, now: Instant) -> bool {
        let constraints = self.constraints;
        let Some(press) = self.press.as_mut() else {
            return false;
        };
        if press.active || press.aborted {
            return false;
        }

        let travel = press.origin.distance_to(at);
        match press.kind {
            PointerKind::Mouse => {
                if travel >= constraints.distance {
                    press.active = true;
                }
            }
            PointerKind::Touch => {
                let held = now.saturating_duration_since(press.started);
                if held >= constraints.touch_delay {
                    press.active = true;
                } else if travel > constraints.touch_tolerance {
                    press.aborted = true;
                }
            }
        }
        press.active
    }

    /// Time passed without movement. Touch drags activate once the hold delay elapses.
    pub fn poll(&mut self, now: Instant) -> bool {
        let delay = self.constraints.touch_delay;
        let Some(press) = self.press.as_mut() else {
            return false;
        };
        if press.kind != PointerKind::Touch || press.active || press.aborted {
            return false;
        }
        if now.saturating_duration_since(press.started) >= delay {
            press.active = true;
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.press.is_some_and(|p| p.active)
    }

    /// Role under the current press, if any
    pub fn source(&self) -> Option<Role> {
        self.press.map(|p| p.source)
    }

    pub fn release(&mut self) -> DragOutcome {
        match self.press.take() {
            Some(press) if press.active => DragOutcome::Dropped {
                source: press.source,
            },
            _ => DragOutcome::NotDragged,
        }
    }

    pub fn cancel(&mut self) {
        self.press = None;
    }
}
