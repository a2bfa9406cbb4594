// trialgate-core/src/domain/quality/record.rs
//
// A record is one flat SDTM observation. The engine never mutates it:
// corrections happen upstream and arrive as a new record.

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

use super::clinical_domain::ClinicalDomain;

/// A scalar field value. Serializes back to exactly what was read:
/// numbers keep their JSON representation and dates keep their text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Number(Number),
    /// Only strings already written as `YYYY-MM-DD` land here.
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    /// Converts a scalar JSON value. Nested arrays/objects have no SDTM meaning and yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Text(b.to_string())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(date) if date.format("%Y-%m-%d").to_string() == *s => Self::Date(date),
                _ => Self::Text(s.clone()),
            }),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(t) => t.trim().is_empty(),
            Self::Number(_) | Self::Date(_) => false,
        }
    }

    /// Canonical text used for equality checks (uniqueness, allowed values, reference sets).
    /// `45.0` and `45` share the canonical form "45"; integers keep every digit.
    pub fn canonical(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Number(n) => Some(canonical_number(n)),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::Text(t) => Some(t.clone()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(t) => t.trim().parse::<f64>().ok(),
            Self::Null | Self::Date(_) => None,
        }
    }

    /// Text dates are parsed whole, then on their `YYYY-MM-DD` prefix so full
    /// ISO-8601 datetimes are accepted.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(t) => {
                let t = t.trim();
                NaiveDate::parse_from_str(t, "%Y-%m-%d").ok().or_else(|| {
                    t.get(..10)
                        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
                })
            }
            Self::Null | Self::Number(_) => None,
        }
    }
}

fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| D::Error::custom("nested values are not supported"))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    /// NaN and infinities have no JSON number form and are kept as text.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or_else(|| Self::Text(value.to_string()), Self::Number)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mostly for tests and embedding callers.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Present = exists, is not null and is not blank text.
    pub fn present(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn identifier(&self, domain: ClinicalDomain, row: usize) -> RecordIdentifier {
        RecordIdentifier {
            row,
            subject_id: self
                .present(domain.subject_field())
                .and_then(FieldValue::canonical),
            sequence: domain
                .sequence_field()
                .and_then(|f| self.present(f))
                .and_then(FieldValue::canonical),
        }
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Traceability key of a record inside its batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIdentifier {
    pub row: usize,
    pub subject_id: Option<String>,
    pub sequence: Option<String>,
}

impl fmt::Display for RecordIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.subject_id, &self.sequence) {
            (Some(subject), Some(seq)) => write!(f, "{}/{}", subject, seq),
            (Some(subject), None) => write!(f, "{}", subject),
            (None, _) => write!(f, "row {}", self.row),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_not_present() {
        let record = Record::new()
            .with("USUBJID", "  ")
            .with("AGE", 45)
            .with("ARM", FieldValue::Null);
        assert!(record.present("USUBJID").is_none());
        assert!(record.present("ARM").is_none());
        assert!(record.present("MISSING").is_none());
        assert!(record.present("AGE").is_some());
    }

    #[test]
    fn test_canonical_numbers_drop_trailing_zero() {
        assert_eq!(FieldValue::from(45.0).canonical().unwrap(), "45");
        assert_eq!(FieldValue::from(45).canonical().unwrap(), "45");
        assert_eq!(FieldValue::from(36.6).canonical().unwrap(), "36.6");
    }

    #[test]
    fn test_large_integers_stay_distinct() {
        let a = FieldValue::from(9_007_199_254_740_992_i64);
        let b = FieldValue::from(9_007_199_254_740_993_i64);
        assert_ne!(a.canonical(), b.canonical());
        assert_eq!(b.canonical().unwrap(), "9007199254740993");
    }

    #[test]
    fn test_serialization_keeps_input_text() -> anyhow::Result<()> {
        let raw = r#"{"AESEQ":1,"AGE":45,"D":"2024-1-5","RFSTDTC":"2024-01-15","TEMP":36.0}"#;
        let record: Record = serde_json::from_str(raw)?;
        assert_eq!(record.get("D"), Some(&FieldValue::Text("2024-1-5".into())));
        assert_eq!(serde_json::to_string(&record)?, raw);
        Ok(())
    }

    #[test]
    fn test_unpadded_date_text_still_compares_as_date() {
        let d = FieldValue::from("2024-1-5").as_date().unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn test_nested_values_are_rejected() {
        assert!(serde_json::from_str::<Record>(r#"{"A": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_numeric_text_parses() {
        assert_eq!(FieldValue::from(" 120 ").as_number(), Some(120.0));
        assert_eq!(FieldValue::from("abc").as_number(), None);
    }

    #[test]
    fn test_datetime_text_compares_by_date() {
        let d = FieldValue::from("2024-03-01T10:15:00").as_date().unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(FieldValue::from("03/01/2024").as_date().is_none());
    }

    #[test]
    fn test_json_deserialization_maps_dates_and_nulls() -> anyhow::Result<()> {
        let record: Record = serde_json::from_str(
            r#"{"USUBJID": "S1", "AGE": 45, "RFSTDTC": "2024-01-15", "ARM": null}"#,
        )?;
        assert_eq!(record.get("AGE"), Some(&FieldValue::from(45)));
        assert!(matches!(record.get("RFSTDTC"), Some(FieldValue::Date(_))));
        assert_eq!(record.get("ARM"), Some(&FieldValue::Null));
        assert_eq!(record.get("USUBJID"), Some(&FieldValue::Text("S1".into())));
        Ok(())
    }

    #[test]
    fn test_identifier_display() {
        let ae = Record::new().with("USUBJID", "S1").with("AESEQ", 3);
        let id = ae.identifier(ClinicalDomain::AdverseEvent, 7);
        assert_eq!(id.to_string(), "S1/3");

        let anonymous = Record::new().with("AGE", 30);
        let id = anonymous.identifier(ClinicalDomain::Demographics, 2);
        assert_eq!(id.to_string(), "row 2");
    }
}
