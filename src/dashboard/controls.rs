use super::detect::Role;
use crate::entity::{EntityRecord, ServiceCall};
use serde_json::Value;

/// Render model of one role tile
#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub role: Role,
    pub label: &'static str,
    pub icon: &'static str,
    pub subtext: String,
    pub active: bool,
}

pub fn tile_label(role: Role) -> &'static str {
    match role {
        Role::Light => "Lutron Caseta",
        Role::Audio => "Sony Atmos",
        Role::Alarm => "Security",
        Role::Climate => "Ecobee",
    }
}

fn tile_icon(role: Role) -> &'static str {
    match role {
        Role::Light => "💡",
        Role::Audio => "🔊",
        Role::Alarm => "🛡️",
        Role::Climate => "🌡️",
    }
}

/// Attribute fraction as a rounded percentage; absent or zero is 0
fn percent(value: Option<f64>, scale: f64) -> u8 {
    match value {
        Some(v) if v > 0.0 => (v / scale * 100.0).round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// Light brightness (0..=255) as a percentage
pub fn brightness_percent(light: &EntityRecord) -> u8 {
    percent(light.attribute_f64("brightness"), 255.0)
}

/// Receiver volume (0.0..=1.0) as a percentage
pub fn volume_percent(receiver: &EntityRecord) -> u8 {
    percent(receiver.attribute_f64("volume_level"), 1.0)
}

fn is_armed(alarm: &EntityRecord) -> bool {
    alarm.state != "disarmed"
}

pub fn tile_view(role: Role, entity: &EntityRecord) -> TileView {
    let (active, subtext) = match role {
        Role::Light => {
            let on = entity.state == "on";
            let subtext = if on {
                format!("{}%", brightness_percent(entity))
            } else {
                "Off".to_string()
            };
            (on, subtext)
        }
        Role::Audio => {
            let active = entity.state != "off" && entity.state != crate::entity::UNAVAILABLE;
            let subtext = if entity.state != "off" {
                format!("Vol {}%", volume_percent(entity))
            } else {
                "Standby".to_string()
            };
            (active, subtext)
        }
        Role::Alarm => {
            let armed = is_armed(entity);
            let subtext = if armed {
                entity.state.clone()
            } else {
                "Disarmed".to_string()
            };
            (armed, subtext)
        }
        Role::Climate => {
            // Missing, null, zero and empty readings all render as "--"
            let temperature = match entity.attributes.get("current_temperature") {
                Some(Value::Number(n)) => n.as_f64().filter(|t| *t != 0.0).map(|t| t.to_string()),
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            }
            .unwrap_or_else(|| "--".to_string());
            (entity.state != "off", format!("{}°F", temperature))
        }
    };

    TileView {
        role,
        label: tile_label(role),
        icon: tile_icon(role),
        subtext,
        active,
    }
}

/// Service call issued by tapping a tile; `None` for tiles without a tap action
pub fn tap_action(role: Role, entity: &EntityRecord, alarm_code: &str) -> Option<ServiceCall> {
    let id = entity.entity_id.as_str();
    match role {
        Role::Light => Some(ServiceCall::for_entity("light", "toggle", id)),
        Role::Audio => Some(ServiceCall::for_entity("media_player", "toggle", id)),
        Role::Alarm if is_armed(entity) => Some(
            ServiceCall::for_entity("alarm_control_panel", "alarm_disarm", id)
                .with("code", alarm_code),
        ),
        Role::Alarm => Some(ServiceCall::for_entity(
            "alarm_control_panel",
            "alarm_arm_home",
            id,
        )),
        Role::Climate => None,
    }
}

/// Control modal variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Lights,
    Receiver,
    Thermostat,
}

impl ModalKind {
    pub fn title(self) -> &'static str {
        match self {
            ModalKind::Lights => "Lights",
            ModalKind::Receiver => "Sony Receiver",
            ModalKind::Thermostat => "Thermostat",
        }
    }

    /// Role whose entity the modal controls
    pub fn role(self) -> Role {
        match self {
            ModalKind::Lights => Role::Light,
            ModalKind::Receiver => Role::Audio,
            ModalKind::Thermostat => Role::Climate,
        }
    }

    /// Slider label; thermostat uses buttons instead
    pub fn slider_label(self) -> Option<&'static str> {
        match self {
            ModalKind::Lights => Some("Brightness"),
            ModalKind::Receiver => Some("Volume"),
            ModalKind::Thermostat => None,
        }
    }
}

/// Modal opened by long-pressing a tile; the alarm has none
pub fn long_press_modal(role: Role) -> Option<ModalKind> {
    match role {
        Role::Light => Some(ModalKind::Lights),
        Role::Audio => Some(ModalKind::Receiver),
        Role::Climate => Some(ModalKind::Thermostat),
        Role::Alarm => None,
    }
}

/// 0..=100 slider committing only on release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slider {
    value: u8,
    dragging: bool,
}

impl Slider {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Self {
        Self {
            value: value.min(Self::MAX),
            dragging: false,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Local update only; nothing is committed until [`Slider::release`]
    pub fn drag_to(&mut self, value: u8) {
        self.value = value.min(Self::MAX);
        self.dragging = true;
    }

    /// Ends the drag; returns the value to commit, once per drag
    pub fn release(&mut self) -> Option<u8> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        Some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenModal {
    pub kind: ModalKind,
    pub slider: Slider,
}

/// At most one control modal is open at a time.
#[derive(Debug, Clone, Default)]
pub struct ModalState {
    open: Option<OpenModal>,
}

impl ModalState {
    /// Open `kind` with its slider seeded from the entity. Ignored while another modal is open.
    pub fn open(&mut self, kind: ModalKind, entity: &EntityRecord) -> bool {
        if self.open.is_some() {
            return false;
        }
        let initial = match kind {
            ModalKind::Lights => brightness_percent(entity),
            ModalKind::Receiver => volume_percent(entity),
            ModalKind::Thermostat => 0,
        };
        self.open = Some(OpenModal {
            kind,
            slider: Slider::new(initial),
        });
        true
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn current(&self) -> Option<&OpenModal> {
        self.open.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut OpenModal> {
        self.open.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Tiles ignore input while a modal is up
    pub fn blocks_tiles(&self) -> bool {
        self.is_open()
    }
}

/// Thermostat mode buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Cool,
    Heat,
}

impl HvacMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HvacMode::Cool => "cool",
            HvacMode::Heat => "heat",
        }
    }
}

pub fn brightness_action(entity_id: &str, percent: u8) -> ServiceCall {
    ServiceCall::for_entity("light", "turn_on", entity_id).with("brightness_pct", percent)
}

pub fn volume_action(entity_id: &str, percent: u8) -> ServiceCall {
    ServiceCall::for_entity("media_player", "volume_set", entity_id)
        .with("volume_level", f64::from(percent) / 100.0)
}

pub fn hvac_action(entity_id: &str, mode: HvacMode) -> ServiceCall {
    ServiceCall::for_entity("climate", "set_hvac_mode", entity_id).with("hvac_mode", mode.as_str())
}

/// Service call for a committed slider value in the given modal
pub fn slider_action(kind: ModalKind, entity_id: &str, value: u8) -> Option<ServiceCall> {
    match kind {
        ModalKind::Lights => Some(brightness_action(entity_id, value)),
        ModalKind::Receiver => Some(volume_action(entity_id, value)),
        ModalKind::Thermostat => None,
    }
}
