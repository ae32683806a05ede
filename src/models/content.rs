use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Kinds of content that can be indexed
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContentType {
    Jobs,
    Events,
    Forums,
    Members,
    Resources,
    Mentors,
    News,
}

impl ContentType {
    /// Every supported content type, in indexing order
    pub const ALL: [ContentType; 7] = [
        ContentType::Jobs,
        ContentType::Events,
        ContentType::Forums,
        ContentType::Members,
        ContentType::Resources,
        ContentType::Mentors,
        ContentType::News,
    ];

    /// Path segment used when building canonical URLs
    pub fn url_segment(&self) -> &'static str {
        match self {
            ContentType::Jobs => "jobs",
            ContentType::Events => "events",
            ContentType::Forums => "forums",
            ContentType::Members => "directory",
            ContentType::Resources => "resources",
            ContentType::Mentors => "mentorship",
            ContentType::News => "news",
        }
    }
}

/// Content language
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    Es,
    En,
}

/// A content record as it comes out of the document store.
///
/// Collections are schemaless, so the record keeps the raw JSON object and
/// exposes typed accessors that accept the field aliases used across
/// collections. The normalizer is the only consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value; only objects are records
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Set a field (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// First non-empty string among `keys`. Numbers are rendered as strings.
    pub fn str_field(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// String list among `keys`: accepts arrays of strings or a comma/semicolon separated string
    pub fn string_list(&self, keys: &[&str]) -> Vec<String> {
        for key in keys {
            match self.0.get(*key) {
                Some(Value::Array(items)) => {
                    return items
                        .iter()
                        .filter_map(|item| item.as_str())
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                Some(Value::String(s)) if !s.trim().is_empty() => {
                    return s
                        .split([',', ';'])
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => continue,
            }
        }
        Vec::new()
    }

    pub fn bool_field(&self, keys: &[&str]) -> Option<bool> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    pub fn f64_field(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Count-like field; arrays count their elements (e.g. `applicants: [...]`)
    pub fn count_field(&self, keys: &[&str]) -> Option<u64> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::Number(n) => n.as_u64(),
            Value::Array(items) => Some(items.len() as u64),
            _ => None,
        })
    }

    /// Timestamp among `keys`: RFC 3339 / `YYYY-MM-DD` strings, epoch numbers,
    /// or `{ "seconds": n }` objects as exported by the document store
    pub fn timestamp(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        keys.iter()
            .find_map(|key| self.0.get(*key).and_then(parse_timestamp))
    }

    /// Nested object accessor
    pub fn object(&self, key: &str) -> Option<RawRecord> {
        match self.0.get(key)? {
            Value::Object(map) => Some(RawRecord(map.clone())),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        Value::Number(n) => {
            let raw = n.as_i64()?;
            // Values past 10^11 cannot be seconds in any realistic range
            if raw.abs() > 100_000_000_000 {
                Utc.timestamp_millis_opt(raw).single()
            } else {
                Utc.timestamp_opt(raw, 0).single()
            }
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            Utc.timestamp_opt(seconds, 0).single()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_content_type_parsing() {
        assert_eq!(ContentType::from_str("jobs").unwrap(), ContentType::Jobs);
        assert_eq!(ContentType::from_str("Events").unwrap(), ContentType::Events);
        assert!(ContentType::from_str("nonexistent-type").is_err());
        assert_eq!(ContentType::Mentors.to_string(), "mentors");
    }

    #[test]
    fn test_str_field_aliases() {
        let record = RawRecord::new()
            .with("companyName", "TechCorp")
            .with("title", "   ");

        assert_eq!(
            record.str_field(&["company", "companyName"]),
            Some("TechCorp".to_string())
        );
        assert_eq!(record.str_field(&["title"]), None);
    }

    #[test]
    fn test_string_list_forms() {
        let record = RawRecord::new()
            .with("tags", json!(["rust", " ", "search"]))
            .with("skills", "Python; SQL, Spark");

        assert_eq!(record.string_list(&["tags"]), vec!["rust", "search"]);
        assert_eq!(
            record.string_list(&["skills"]),
            vec!["Python", "SQL", "Spark"]
        );
        assert!(record.string_list(&["missing"]).is_empty());
    }

    #[test]
    fn test_timestamp_forms() {
        let record = RawRecord::new()
            .with("iso", "2024-03-01T10:00:00Z")
            .with("date", "2024-03-01")
            .with("millis", 1_709_287_200_000_i64)
            .with("store", json!({ "seconds": 1_709_287_200_i64, "nanoseconds": 0 }));

        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(record.timestamp(&["iso"]), Some(expected));
        assert_eq!(record.timestamp(&["millis"]), Some(expected));
        assert_eq!(record.timestamp(&["store"]), Some(expected));
        assert_eq!(
            record.timestamp(&["date"]),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_count_field_counts_arrays() {
        let record = RawRecord::new().with("attendees", json!(["a", "b", "c"]));
        assert_eq!(record.count_field(&["attendees"]), Some(3));
    }
}
