use crate::entity::EntityRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Device role a dashboard tile is bound to.
///
/// Serialized with the short tile ids used in the persisted tile order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "sony")]
    Audio,
    #[serde(rename = "alarm")]
    Alarm,
    #[serde(rename = "caseta")]
    Light,
    #[serde(rename = "ecobee")]
    Climate,
}

impl Role {
    /// Detection order
    pub const ALL: [Role; 4] = [Role::Audio, Role::Alarm, Role::Light, Role::Climate];

    /// Entity domain a candidate must belong to
    pub fn domain(self) -> &'static str {
        match self {
            Role::Audio => "media_player",
            Role::Alarm => "alarm_control_panel",
            Role::Light => "light",
            Role::Climate => "climate",
        }
    }

    /// Keywords searched in "{entity_id} {friendly_name}"; empty means any entity of the domain
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Role::Audio => &["sony", "str", "avr", "receiver"],
            Role::Alarm => &[],
            Role::Light => &["lutron", "caseta"],
            Role::Climate => &["ecobee"],
        }
    }

    pub fn default_entity_id(self) -> &'static str {
        match self {
            Role::Audio => "media_player.sony_str_dn1080",
            Role::Alarm => "alarm_control_panel.alarm_com",
            Role::Light => "light.lutron_caseta_dimmer",
            Role::Climate => "climate.ecobee_thermostat",
        }
    }

    fn matches(self, record: &EntityRecord) -> bool {
        let in_domain = record
            .entity_id
            .strip_prefix(self.domain())
            .is_some_and(|rest| rest.starts_with('.'));
        if !in_domain {
            return false;
        }

        let keywords = self.keywords();
        if keywords.is_empty() {
            return true;
        }

        let haystack = format!(
            "{} {}",
            record.entity_id,
            record.friendly_name().unwrap_or_default().to_lowercase()
        );
        keywords.iter().any(|k| haystack.contains(k))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Audio => "audio",
            Role::Alarm => "alarm",
            Role::Light => "light",
            Role::Climate => "climate",
        };
        f.write_str(name)
    }
}

/// Role → entity id assignment.
///
/// Persisted as `{"SONY": .., "ALARM": .., "CASETA": .., "ECOBEE": ..}`. Keys
/// missing from a stored value are filled from the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMapping {
    #[serde(rename = "SONY")]
    pub audio: String,
    #[serde(rename = "ALARM")]
    pub alarm: String,
    #[serde(rename = "CASETA")]
    pub light: String,
    #[serde(rename = "ECOBEE")]
    pub climate: String,
}

impl Default for RoleMapping {
    fn default() -> Self {
        Self {
            audio: Role::Audio.default_entity_id().to_string(),
            alarm: Role::Alarm.default_entity_id().to_string(),
            light: Role::Light.default_entity_id().to_string(),
            climate: Role::Climate.default_entity_id().to_string(),
        }
    }
}

impl RoleMapping {
    pub fn get(&self, role: Role) -> &str {
        match role {
            Role::Audio => &self.audio,
            Role::Alarm => &self.alarm,
            Role::Light => &self.light,
            Role::Climate => &self.climate,
        }
    }

    pub fn set(&mut self, role: Role, entity_id: impl Into<String>) {
        let slot = match role {
            Role::Audio => &mut self.audio,
            Role::Alarm => &mut self.alarm,
            Role::Light => &mut self.light,
            Role::Climate => &mut self.climate,
        };
        *slot = entity_id.into();
    }

    /// True if any role is bound to a different entity
    pub fn differs_from(&self, other: &RoleMapping) -> bool {
        Role::ALL.iter().any(|&role| self.get(role) != other.get(role))
    }
}

/// Detect role bindings from a snapshot keyed by entity id.
///
/// Candidates are scanned in entity id order, so the result does not depend on
/// map iteration order.
pub fn detect_entities(
    states: &HashMap<String, EntityRecord>,
    previous: &RoleMapping,
) -> RoleMapping {
    let mut records: Vec<&EntityRecord> = states.values().collect();
    records.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    detect_sorted(&records, previous)
}

/// Detect role bindings from a snapshot list, scanning in input order.
pub fn detect_entities_in(states: &[EntityRecord], previous: &RoleMapping) -> RoleMapping {
    let records: Vec<&EntityRecord> = states.iter().collect();
    detect_sorted(&records, previous)
}

fn detect_sorted(records: &[&EntityRecord], previous: &RoleMapping) -> RoleMapping {
    let mut mapping = previous.clone();
    for role in Role::ALL {
        if let Some(found) = records.iter().find(|r| role.matches(r)) {
            mapping.set(role, found.entity_id.clone());
        }
    }
    mapping
}
