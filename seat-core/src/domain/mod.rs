use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub mod form;

pub use form::{ErrorState, FormDetails, FormField, RegistrationPayload, TextField};

/// Backend ids arrive as numbers or strings depending on the endpoint; the
/// cascade always compares them as strings.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Integer(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

/// Generic `{id, name}` option as served by the cities/locations endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "appointments")]
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub locations: Vec<Location>,
}

/// Ordered City → Location → Slot tree backing the dropdowns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    cities: Vec<City>,
}

impl Catalog {
    pub fn new(cities: Vec<City>) -> Self {
        Self { cities }
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn city(&self, city_id: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.id == city_id)
    }
}

impl From<Vec<City>> for Catalog {
    fn from(cities: Vec<City>) -> Self {
        Self::new(cities)
    }
}

/// A bookable date for a location, from the slot-dates endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDate {
    pub date: String,
    #[serde(default)]
    pub seats_remaining: u32,
}

/// A concrete appointment from the available-slots endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSlot {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub date: String,
    pub starts_at: String,
    pub ends_at: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub seats_remaining: u32,
}

impl AppointmentSlot {
    /// Flatten into a dropdown slot labelled `DD-MM-YYYY HH:MM-HH:MM`
    pub fn to_slot(&self) -> Slot {
        let day = crate::dates::format_iso_to_ddmmyyyy(&self.date).unwrap_or_else(|_| self.date.clone());
        let name = format!(
            "{} {}-{}",
            day,
            crate::dates::clock_time(&self.starts_at),
            crate::dates::clock_time(&self.ends_at)
        );
        Slot { id: self.id.clone(), name }
    }
}

/// Opaque bearer token issued by OTP verification
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}
