use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};


/// State reported by the dashboard for entities missing from the snapshot
pub const UNAVAILABLE: &str = "unavailable";

/// Snapshot of one upstream entity, as returned by the hub's state listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Namespaced identifier ("domain.object_id")
    pub entity_id: String,

    /// Current state string ("on", "off", "disarmed", ...)
    #[serde(default)]
    pub state: String,

    /// Device attributes (friendly_name, brightness, volume_level, ...)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Map<String, Value>,

    /// Any other upstream fields (last_changed, context, ...), passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
            extra: Map::new(),
        }
    }

    /// Placeholder returned for ids the dashboard has no record for
    pub fn unavailable(entity_id: impl Into<String>) -> Self {
        Self::new(entity_id, UNAVAILABLE)
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(Value::as_str)
    }

    /// Numeric attribute; absent, null and non-numeric values are all `None`
    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }

    /// Domain part of the entity id, if the id is well formed
    pub fn domain(&self) -> Option<String> {
        parse_entity_id(&self.entity_id).ok().map(|p| p.domain)
    }
}

/// Accept an explicit `null` wherever an object is optional
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parsed "domain.object_id" identifier
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntityId {
    pub domain: String,
    pub object_id: String,
}

/// Entity ID parsing errors
#[derive(Debug, PartialEq)]
pub enum ParseError {
    /// Empty entity ID
    Empty,
    /// Missing separator or empty parts
    InvalidFormat(String),
}

/// Parse an entity ID into its domain and object parts
///
/// The domain is everything before the first '.', the object id everything after it.
///
/// # Examples
///
/// ```
/// use rtouch::entity::parse_entity_id;
///
/// let parsed = parse_entity_id("light.lutron_caseta_dimmer").unwrap();
/// assert_eq!(parsed.domain, "light");
/// assert_eq!(parsed.object_id, "lutron_caseta_dimmer");
///
/// assert!(parse_entity_id("no_domain").is_err());
/// ```
pub fn parse_entity_id(entity_id: &str) -> Result<ParsedEntityId, ParseError> {
    if entity_id.is_empty() {
        return Err(ParseError::Empty);
    }

    let Some((domain, object_id)) = entity_id.split_once('.') else {
        return Err(ParseError::InvalidFormat(format!(
            "Entity ID '{}' has no domain separator",
            entity_id
        )));
    };

    if domain.is_empty() {
        return Err(ParseError::InvalidFormat(
            "Domain part cannot be empty".to_string(),
        ));
    }
    if object_id.is_empty() {
        return Err(ParseError::InvalidFormat(
            "Object part cannot be empty".to_string(),
        ));
    }

    Ok(ParsedEntityId {
        domain: domain.to_string(),
        object_id: object_id.to_string(),
    })
}

/// Action descriptor forwarded 1:1 to the hub's service endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    #[serde(rename = "serviceData", default, deserialize_with = "null_as_empty")]
    pub service_data: Map<String, Value>,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data: Map::new(),
        }
    }

    /// Service call targeting a single entity (`{"entity_id": ...}` payload)
    pub fn for_entity(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity_id: &str,
    ) -> Self {
        Self::new(domain, service).with("entity_id", entity_id)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.service_data.insert(key.to_string(), value.into());
        self
    }

    /// Check that domain and service are plain hub identifiers.
    ///
    /// Both end up as URL path segments, so only `[a-z0-9_]` is accepted.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [("domain", &self.domain), ("service", &self.service)] {
            if !is_identifier(value) {
                return Err(format!("Invalid {} '{}'", field, value));
            }
        }
        Ok(())
    }
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
