//! Template data model — the only persisted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recurring message definition.
///
/// Serialized with camelCase keys and millisecond timestamps so records
/// stay readable by the web UI without translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique id, immutable once created.
    pub id: String,
    /// Display label, not unique.
    pub name: String,
    /// Content body (caption when sent as photo).
    pub message: String,
    /// Magnitude of the repeat interval.
    pub interval_value: u64,
    /// Unit of `interval_value`. Missing means unknown, which the due
    /// check treats as daily.
    #[serde(default = "unknown_unit")]
    pub interval_unit: IntervalUnit,
    /// Gates whether `image_url` is used.
    #[serde(default)]
    pub include_image: bool,
    #[serde(default)]
    pub image_url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Absent means never sent.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_sent_time: Option<DateTime<Utc>>,
}

fn unknown_unit() -> IntervalUnit {
    IntervalUnit::Other(String::new())
}

impl Template {
    /// Whether dispatch should go out as a captioned photo.
    pub fn sends_photo(&self) -> bool {
        self.include_image && !self.image_url.is_empty()
    }
}

/// Unit of a template's repeat interval.
///
/// Unknown strings are kept verbatim in `Other` so a record round-trips
/// unchanged; the due check treats them as a fixed daily interval.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntervalUnit {
    Minutes,
    #[default]
    Hours,
    Days,
    Other(String),
}

impl IntervalUnit {
    pub fn as_str(&self) -> &str {
        match self {
            IntervalUnit::Minutes => "minutes",
            IntervalUnit::Hours => "hours",
            IntervalUnit::Days => "days",
            IntervalUnit::Other(s) => s,
        }
    }
}

impl From<String> for IntervalUnit {
    fn from(s: String) -> Self {
        match s.as_str() {
            "minutes" => IntervalUnit::Minutes,
            "hours" => IntervalUnit::Hours,
            "days" => IntervalUnit::Days,
            _ => IntervalUnit::Other(s),
        }
    }
}

impl From<&str> for IntervalUnit {
    fn from(s: &str) -> Self {
        IntervalUnit::from(s.to_string())
    }
}

impl From<IntervalUnit> for String {
    fn from(unit: IntervalUnit) -> Self {
        match unit {
            IntervalUnit::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Raw fields of a create request, as submitted by the browser form.
///
/// Everything is optional text; the registry applies defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: Option<String>,
    pub message: Option<String>,
    pub interval_value: Option<String>,
    pub interval_unit: Option<String>,
    pub include_image: Option<String>,
    pub image_url: Option<String>,
}

/// Structured result of one delivery attempt, as reported by the gateway.
///
/// Fields the gateway returns beyond the common ones are kept in `extra`
/// so the result can be handed back to callers unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeliveryResult {
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            ok: true,
            description: None,
            error_code: None,
            result: Some(result),
            extra: serde_json::Map::new(),
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            ok: false,
            description: Some(description.into()),
            error_code: None,
            result: None,
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Template {
        Template {
            id: "template_1".into(),
            name: "A".into(),
            message: "hi".into(),
            interval_value: 2,
            interval_unit: IntervalUnit::Hours,
            include_image: false,
            image_url: String::new(),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            last_sent_time: None,
        }
    }

    #[test]
    fn test_template_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["intervalValue"], 2);
        assert_eq!(json["intervalUnit"], "hours");
        assert_eq!(json["includeImage"], false);
        assert_eq!(json["imageUrl"], "");
        assert_eq!(json["createdAt"], 1_700_000_000_000i64);
        assert!(json.get("lastSentTime").is_none());
    }

    #[test]
    fn test_template_reads_legacy_record() {
        let raw = serde_json::json!({
            "id": "template_1700000000000",
            "name": "Daily",
            "message": "gm",
            "intervalValue": 1,
            "intervalUnit": "weeks",
            "includeImage": true,
            "imageUrl": "https://example.com/a.png",
            "createdAt": 1_700_000_000_000i64,
            "lastSentTime": 1_700_000_060_000i64
        });
        let t: Template = serde_json::from_value(raw).unwrap();
        assert_eq!(t.interval_unit, IntervalUnit::Other("weeks".into()));
        assert_eq!(
            t.last_sent_time.unwrap().timestamp_millis(),
            1_700_000_060_000
        );
        assert!(t.sends_photo());
        // unknown unit is written back verbatim
        assert_eq!(serde_json::to_value(&t).unwrap()["intervalUnit"], "weeks");
    }

    #[test]
    fn test_template_without_unit_decodes_as_unknown() {
        let raw = serde_json::json!({
            "id": "t1",
            "name": "Old",
            "message": "hi",
            "intervalValue": 5,
            "createdAt": 1_700_000_000_000i64
        });
        let t: Template = serde_json::from_value(raw).unwrap();
        assert_eq!(t.interval_unit, IntervalUnit::Other(String::new()));
        assert_ne!(t.interval_unit, IntervalUnit::default());
    }

    #[test]
    fn test_sends_photo_requires_url() {
        let mut t = sample();
        t.include_image = true;
        assert!(!t.sends_photo());
        t.image_url = "https://example.com/x.jpg".into();
        assert!(t.sends_photo());
        t.include_image = false;
        assert!(!t.sends_photo());
    }

    #[test]
    fn test_delivery_result_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 5",
            "parameters": {"retry_after": 5}
        });
        let r: DeliveryResult = serde_json::from_value(raw.clone()).unwrap();
        assert!(!r.ok);
        assert_eq!(r.error_code, Some(429));
        assert_eq!(serde_json::to_value(&r).unwrap(), raw);
    }
}
