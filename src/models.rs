//! Domain entities managed by the console.
//!
//! Every entity shares the same shape: an identity, two timestamps and a bag of
//! free-form attributes. What differs between classes is only the name and the
//! class-level defaults, so the classes are a closed enum rather than separate types.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp layout used in records and string representations.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Record key holding the class name of a serialized entity.
pub const CLASS_KEY: &str = "__class__";

/// Attribute names backed by dedicated fields; they cannot be overwritten through
/// [`Entity::set_attribute`].
const RESERVED: [&str; 4] = ["id", "created_at", "updated_at", CLASS_KEY];

/// Every class the console knows how to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassName {
    BaseModel,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl ClassName {
    pub const ALL: [ClassName; 7] = [
        ClassName::BaseModel,
        ClassName::User,
        ClassName::State,
        ClassName::City,
        ClassName::Amenity,
        ClassName::Place,
        ClassName::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassName::BaseModel => "BaseModel",
            ClassName::User => "User",
            ClassName::State => "State",
            ClassName::City => "City",
            ClassName::Amenity => "Amenity",
            ClassName::Place => "Place",
            ClassName::Review => "Review",
        }
    }

    /// Class-level attribute defaults. They are visible through
    /// [`Entity::attribute`] but are only stored once explicitly set.
    pub fn default_attribute(&self, name: &str) -> Option<Value> {
        let value = match (self, name) {
            (ClassName::User, "email" | "password" | "first_name" | "last_name") => json!(""),
            (ClassName::State, "name") => json!(""),
            (ClassName::City, "state_id" | "name") => json!(""),
            (ClassName::Amenity, "name") => json!(""),
            (ClassName::Place, "city_id" | "user_id" | "name" | "description") => json!(""),
            (
                ClassName::Place,
                "number_rooms" | "number_bathrooms" | "max_guest" | "price_by_night",
            ) => json!(0),
            (ClassName::Place, "latitude" | "longitude") => json!(0.0),
            (ClassName::Place, "amenity_ids") => json!([]),
            (ClassName::Review, "place_id" | "user_id" | "text") => json!(""),
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown class `{0}`")]
pub struct UnknownClass(pub String);

impl FromStr for ClassName {
    type Err = UnknownClass;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ClassName::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}

/// Builds the store key `<ClassName>.<id>`.
pub fn store_key(class: ClassName, id: &str) -> String {
    format!("{}.{}", class, id)
}

/// A live domain object.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    class: ClassName,
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    attributes: BTreeMap<String, Value>,
}

impl Entity {
    /// Creates a fresh entity with a random id; both timestamps are the same instant.
    pub fn new(class: ClassName) -> Self {
        let now = Utc::now();
        Self {
            class,
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            attributes: BTreeMap::new(),
        }
    }

    pub fn class(&self) -> ClassName {
        self.class
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn key(&self) -> String {
        store_key(self.class, &self.id)
    }

    /// Looks an attribute up: owned fields first, then the bag, then class defaults.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "created_at" => Some(Value::String(format_time(&self.created_at))),
            "updated_at" => Some(Value::String(format_time(&self.updated_at))),
            _ => self
                .attributes
                .get(name)
                .cloned()
                .or_else(|| self.class.default_attribute(name)),
        }
    }

    /// Stores `value` in the attribute bag. Returns `false` for reserved names,
    /// which are left untouched.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if RESERVED.contains(&name.as_str()) {
            return false;
        }
        self.attributes.insert(name, value);
        true
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Marks the entity as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Flattens the entity into the record written to the store file.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        record.insert("id".into(), Value::String(self.id.clone()));
        record.insert("created_at".into(), Value::String(format_time(&self.created_at)));
        record.insert("updated_at".into(), Value::String(format_time(&self.updated_at)));
        record.insert(CLASS_KEY.into(), Value::String(self.class.to_string()));
        record
    }

    /// Rebuilds an entity from a store record, picking the class from `__class__`.
    pub fn from_record(record: &Map<String, Value>) -> Result<Self> {
        let class: ClassName = required_str(record, CLASS_KEY)?.parse()?;
        let id = required_str(record, "id")?;
        if id.is_empty() {
            return Err(anyhow!("record has an empty id"));
        }
        let created_at = parse_time(required_str(record, "created_at")?)?;
        let updated_at = parse_time(required_str(record, "updated_at")?)?;

        let attributes = record
            .iter()
            .filter(|(k, _)| !RESERVED.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            class,
            id: id.to_string(),
            created_at,
            updated_at,
            attributes,
        })
    }
}

impl fmt::Display for Entity {
    /// `[User] (1234) {"created_at": "...", "id": "1234", ...}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: BTreeMap<&str, Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        fields.insert("id", Value::String(self.id.clone()));
        fields.insert("created_at", Value::String(format_time(&self.created_at)));
        fields.insert("updated_at", Value::String(format_time(&self.updated_at)));

        write!(f, "[{}] ({}) {{", self.class, self.id)?;
        for (i, (k, v)) in fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}: {}", k, v)?;
        }
        f.write_str("}")
    }
}

pub fn format_time(t: &DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, TIME_FORMAT)
        .with_context(|| format!("invalid timestamp `{}`", s))?;
    Ok(naive.and_utc())
}

fn required_str<'a>(record: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("record is missing string field `{}`", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_parsing_is_exact() {
        for class in ClassName::ALL {
            assert_eq!(class.as_str().parse::<ClassName>(), Ok(class));
        }
        assert_eq!(
            "user".parse::<ClassName>(),
            Err(UnknownClass("user".to_string()))
        );
        assert!("MyModel".parse::<ClassName>().is_err());
    }

    #[test]
    fn test_new_entity_invariants() {
        let e = Entity::new(ClassName::User);
        assert!(!e.id().is_empty());
        assert_eq!(e.created_at(), e.updated_at());
        assert_eq!(e.key(), format!("User.{}", e.id()));
        assert_ne!(Entity::new(ClassName::User).id(), e.id());
    }

    #[test]
    fn test_user_has_class_defaults() {
        let u = Entity::new(ClassName::User);
        for name in ["email", "password", "first_name", "last_name"] {
            assert_eq!(u.attribute(name), Some(json!("")), "{}", name);
        }
        assert_eq!(u.attribute("id"), Some(json!(u.id())));
        assert!(u.attribute("created_at").is_some());
        assert!(u.attribute("nickname").is_none());
        // Defaults are not stored until set.
        assert!(u.attributes().is_empty());
    }

    #[test]
    fn test_place_numeric_defaults() {
        let p = Entity::new(ClassName::Place);
        assert_eq!(p.attribute("number_rooms"), Some(json!(0)));
        assert_eq!(p.attribute("latitude"), Some(json!(0.0)));
        assert_eq!(p.attribute("amenity_ids"), Some(json!([])));
        assert!(Entity::new(ClassName::BaseModel).attribute("name").is_none());
    }

    #[test]
    fn test_set_attribute_and_reserved_names() {
        let mut e = Entity::new(ClassName::State);
        let id = e.id().to_string();
        assert!(e.set_attribute("name", json!("California")));
        assert!(!e.set_attribute("id", json!("other")));
        assert!(!e.set_attribute(CLASS_KEY, json!("User")));
        assert_eq!(e.attribute("name"), Some(json!("California")));
        assert_eq!(e.id(), id);
    }

    #[test]
    fn test_touch_refreshes_updated_at() {
        let mut e = Entity::new(ClassName::City);
        let before = e.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));
        e.touch();
        assert!(e.updated_at() > before);
        assert_eq!(e.created_at(), before);
    }

    #[test]
    fn test_record_round_trip() {
        let mut e = Entity::new(ClassName::Review);
        e.set_attribute("text", json!("Great stay"));
        e.set_attribute("stars", json!(5));

        let record = e.to_record();
        assert_eq!(record.get(CLASS_KEY), Some(&json!("Review")));
        assert_eq!(record.get("id"), Some(&json!(e.id())));

        let back = Entity::from_record(&record).unwrap();
        assert_eq!(back.class(), ClassName::Review);
        assert_eq!(back.id(), e.id());
        assert_eq!(back.attributes(), e.attributes());
        // Microsecond precision survives the text format.
        assert_eq!(format_time(&back.created_at()), format_time(&e.created_at()));
    }

    #[test]
    fn test_from_record_rejects_bad_records() {
        let mut record = Entity::new(ClassName::User).to_record();
        record.insert(CLASS_KEY.into(), json!("Spaceship"));
        assert!(Entity::from_record(&record).is_err());

        let mut record = Entity::new(ClassName::User).to_record();
        record.remove("created_at");
        assert!(Entity::from_record(&record).is_err());

        let mut record = Entity::new(ClassName::User).to_record();
        record.insert("updated_at".into(), json!("yesterday"));
        assert!(Entity::from_record(&record).is_err());
    }

    #[test]
    fn test_display_format() {
        let mut e = Entity::new(ClassName::Amenity);
        e.set_attribute("name", json!("Wifi"));
        let s = e.to_string();
        assert!(s.starts_with(&format!("[Amenity] ({}) {{", e.id())));
        assert!(s.contains(r#""name": "Wifi""#));
        assert!(s.contains(&format!(r#""id": "{}""#, e.id())));
        assert!(s.ends_with('}'));
    }
}
