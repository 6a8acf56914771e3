use crate::value::CellValue;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Key stamped on every write; stored structurally, never in the field map.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Internal bookkeeping key some editors attach to a cell.
pub const META_KEY: &str = "_meta";

/// Reserved keys never count as data and never contribute to scoring.
pub fn is_reserved_key(key: &str) -> bool {
    key == TIMESTAMP_KEY || key == META_KEY
}

/// Data held by one timeline cell: an ordered map of named field values plus
/// the time of the last write.
///
/// Records are values. Every mutating method takes `&self` and hands back a
/// new record, leaving the receiver untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellRecord {
    fields: IndexMap<String, CellValue>,
    timestamp: Option<String>,
}

impl CellRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(name, value)` pairs, keeping their order.
    ///
    /// A `timestamp` pair is lifted into the timestamp slot.
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
    {
        let fields: IndexMap<String, CellValue> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_map(fields)
    }

    fn from_map(mut fields: IndexMap<String, CellValue>) -> Self {
        let timestamp = match fields.shift_remove(TIMESTAMP_KEY) {
            Some(CellValue::Text(ts)) => Some(ts),
            Some(other) if other.is_truthy() => Some(other.to_string()),
            _ => None,
        };
        Self { fields, timestamp }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields.get(name)
    }

    /// True when `name` holds a truthy value.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(CellValue::is_truthy)
    }

    /// Raw timestamp string as written (ISO-8601 for anything this crate wrote).
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Parsed timestamp; `None` when missing or not RFC 3339.
    pub fn stamped_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// New record with `name` set to `value` and the timestamp refreshed.
    ///
    /// An existing field keeps its position; a new one is appended.
    pub fn with_field(
        &self,
        name: impl Into<String>,
        value: impl Into<CellValue>,
        now: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let mut fields = self.fields.clone();
        if name != TIMESTAMP_KEY {
            fields.insert(name, value.into());
        }
        Self {
            fields,
            timestamp: Some(format_timestamp(now)),
        }
    }

    /// New record without `name`, timestamp refreshed. Remaining fields keep their order.
    pub fn without_field(&self, name: &str, now: DateTime<Utc>) -> Self {
        let mut fields = self.fields.clone();
        fields.shift_remove(name);
        Self {
            fields,
            timestamp: Some(format_timestamp(now)),
        }
    }

    /// New record with every `(name, value)` pair written and one fresh timestamp.
    /// Reserved keys in `fields` are skipped.
    pub fn with_fields<K, V>(
        &self,
        fields: impl IntoIterator<Item = (K, V)>,
        now: DateTime<Utc>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
    {
        let mut merged = self.fields.clone();
        for (name, value) in fields {
            let name = name.into();
            if !is_reserved_key(&name) {
                merged.insert(name, value.into());
            }
        }
        Self {
            fields: merged,
            timestamp: Some(format_timestamp(now)),
        }
    }

    /// New record without any of `names`, timestamp refreshed.
    pub fn without_fields<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut fields = self.fields.clone();
        for name in names {
            fields.shift_remove(name);
        }
        Self {
            fields,
            timestamp: Some(format_timestamp(now)),
        }
    }

    /// True when the record has key `name`, whatever its value.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of non-reserved keys, whatever their value.
    pub fn field_count(&self) -> usize {
        self.data_entries().count()
    }

    /// True when the record carries at least one non-reserved key.
    pub fn has_data(&self) -> bool {
        self.field_count() > 0
    }

    /// Number of keys that hold real data: non-reserved with a truthy value.
    ///
    /// Every key counts once whatever its value holds, so a `contents` list
    /// from the drag-and-drop editor is one key like any other. Adding a key
    /// can never lower the count.
    pub fn truthy_count(&self) -> usize {
        self.truthy_entries().count()
    }

    /// Non-reserved entries in insertion order.
    pub fn data_entries(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields
            .iter()
            .filter(|(k, _)| !is_reserved_key(k))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Non-reserved entries holding a truthy value, in insertion order.
    pub fn truthy_entries(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.data_entries().filter(|(_, v)| v.is_truthy())
    }
}

/// Millisecond-precision UTC timestamp, e.g. `2025-03-01T08:30:00.000Z`.
fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Serialize for CellRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.fields.len() + usize::from(self.timestamp.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        if let Some(ts) = &self.timestamp {
            map.serialize_entry(TIMESTAMP_KEY, ts)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CellRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Anything that is not an object reads as an empty record.
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(CellRecord::from(raw))
    }
}

impl From<serde_json::Value> for CellRecord {
    fn from(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Object(map) => {
                let fields = map
                    .into_iter()
                    .map(|(k, v)| {
                        let value = serde_json::from_value(v.clone())
                            .unwrap_or(CellValue::Other(v));
                        (k, value)
                    })
                    .collect();
                Self::from_map(fields)
            }
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_with_field_stamps_timestamp_and_preserves_receiver() {
        let empty = CellRecord::new();
        let updated = empty.with_field("temperature", "22", at(8));

        assert!(empty.get("temperature").is_none());
        assert_eq!(updated.get("temperature"), Some(&CellValue::text("22")));
        assert_eq!(updated.timestamp(), Some("2025-03-01T08:30:00.000Z"));
        assert_eq!(updated.stamped_at(), Some(at(8)));
    }

    #[test]
    fn test_existing_field_keeps_position() {
        let record = CellRecord::from_fields([("humidity", "65"), ("ph", "6.2")]);
        let updated = record.with_field("humidity", "70", at(9));

        let keys: Vec<&str> = updated.data_entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["humidity", "ph"]);
    }

    #[test]
    fn test_reserved_keys_are_not_data() {
        let record = CellRecord::from_fields([
            ("timestamp", CellValue::text("2025-03-01T08:30:00.000Z")),
            ("_meta", CellValue::text("drag")),
        ]);

        assert_eq!(record.field_count(), 0);
        assert!(!record.has_data());
        assert_eq!(record.truthy_count(), 0);
        assert_eq!(record.timestamp(), Some("2025-03-01T08:30:00.000Z"));
    }

    #[test]
    fn test_has_data_counts_keys_but_truthy_count_needs_values() {
        let record = CellRecord::from_fields([("notes", ""), ("ph", "6.2")]);
        assert_eq!(record.field_count(), 2);
        assert_eq!(record.truthy_count(), 1);
    }

    #[test]
    fn test_contents_list_counts_as_one_key() {
        let raw = serde_json::json!({
            "contents": [{"id": "temperature"}, {"id": "humidity"}, {"id": "ph"}],
            "temperature": "22"
        });
        let record = CellRecord::from(raw);
        assert_eq!(record.truthy_count(), 2);
    }

    #[test]
    fn test_adding_contents_never_lowers_the_count() {
        let plain = CellRecord::from_fields([("temperature", "24"), ("humidity", "60"), ("ph", "6")]);
        let with_contents = CellRecord::from(serde_json::json!({
            "temperature": "24",
            "humidity": "60",
            "ph": "6",
            "contents": [{"id": "x"}]
        }));

        assert_eq!(plain.truthy_count(), 3);
        assert_eq!(with_contents.truthy_count(), 4);
    }

    #[test]
    fn test_without_field_removes_and_restamps() {
        let record = CellRecord::from_fields([("humidity", "65"), ("ph", "6.2")]);
        let updated = record.without_field("humidity", at(10));

        assert!(record.get("humidity").is_some());
        assert!(updated.get("humidity").is_none());
        assert_eq!(updated.field_count(), 1);
        assert_eq!(updated.stamped_at(), Some(at(10)));
    }

    #[test]
    fn test_with_fields_merges_under_one_stamp() {
        let record = CellRecord::from_fields([("ph", "6.0"), ("ec", "1.2")]);
        let updated = record.with_fields(
            [("ph", "6.4"), ("notes", "rinçage"), ("timestamp", "ignored")],
            at(11),
        );

        let keys: Vec<&str> = updated.data_entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["ph", "ec", "notes"]);
        assert_eq!(updated.get("ph"), Some(&CellValue::text("6.4")));
        assert_eq!(updated.stamped_at(), Some(at(11)));
    }

    #[test]
    fn test_without_fields_ignores_missing_names() {
        let record = CellRecord::from_fields([("ph", "6.0"), ("ec", "1.2"), ("co2", "")]);
        let updated = record.without_fields(["ph", "co2", "brand"], at(12));

        assert!(updated.contains("ec"));
        assert!(!updated.contains("ph"));
        assert!(!updated.contains("co2"));
        assert_eq!(updated.field_count(), 1);
    }

    #[test]
    fn test_serializes_flat_with_timestamp_last() {
        let record = CellRecord::new()
            .with_field("humidity", "65", at(8))
            .with_field("ph", 6.2_f64, at(8));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"humidity":"65","ph":6.2,"timestamp":"2025-03-01T08:30:00.000Z"}"#
        );
    }

    #[test]
    fn test_non_object_reads_as_empty() {
        let record: CellRecord = serde_json::from_str(r#""corrupted""#).unwrap();
        assert_eq!(record, CellRecord::default());

        let record: CellRecord = serde_json::from_str("[1, 2]").unwrap();
        assert!(!record.has_data());
    }

    #[test]
    fn test_malformed_timestamp_is_kept_but_not_parsed() {
        let record: CellRecord =
            serde_json::from_str(r#"{"ph": "6.2", "timestamp": "yesterday"}"#).unwrap();
        assert_eq!(record.timestamp(), Some("yesterday"));
        assert_eq!(record.stamped_at(), None);
    }
}
