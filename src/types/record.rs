//! Input record data structures

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A single raw value entered by the user.
///
/// Numbers stay numeric and are matched to the feature column of the same
/// name; text values are categorical and get one-hot expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, `None` for categorical text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    /// Quoted representation used when a whole record is written to the audit log.
    pub fn repr(&self) -> String {
        match self {
            FieldValue::Text(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => f.write_str(&python_float(*v)),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Float text as Python prints it: `7000.0`, `1e+16`, `1e-05`, `nan`.
///
/// Debug formatting already keeps the trailing `.0` and switches to
/// exponent form at the same magnitudes; only the exponent is padded.
fn python_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }

    let text = format!("{:?}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// One user submission: field name to raw value, in entry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRecord {
    entries: Vec<(String, FieldValue)>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Builder form of [`InputRecord::insert`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders as `{'Company': 'Dell', 'Ram': 8}`, the shape the audit log stores.
impl fmt::Display for InputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{}': {}", name, value.repr())?;
        }
        f.write_str("}")
    }
}

impl Serialize for InputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for InputRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = InputRecord::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop_record() -> InputRecord {
        InputRecord::new()
            .with("Company", "Dell")
            .with("Ram", 8)
            .with("Weight", 1.5)
            .with("Inches", 13.3)
    }

    #[test]
    fn test_record_display_matches_log_shape() {
        assert_eq!(
            laptop_record().to_string(),
            "{'Company': 'Dell', 'Ram': 8, 'Weight': 1.5, 'Inches': 13.3}"
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = laptop_record();
        record.insert("Ram", 16);

        assert_eq!(record.len(), 4);
        assert_eq!(record.get("Ram"), Some(&FieldValue::Integer(16)));
        assert_eq!(record.iter().nth(1).map(|(name, _)| name), Some("Ram"));
    }

    #[test]
    fn test_whole_float_keeps_decimal_point() {
        assert_eq!(FieldValue::Float(7000.0).to_string(), "7000.0");
        assert_eq!(FieldValue::Float(1234.5678).to_string(), "1234.5678");
    }

    #[test]
    fn test_float_exponent_form() {
        assert_eq!(FieldValue::Float(1e16).to_string(), "1e+16");
        assert_eq!(FieldValue::Float(-2.5e17).to_string(), "-2.5e+17");
        assert_eq!(FieldValue::Float(1e300).to_string(), "1e+300");
        assert_eq!(FieldValue::Float(0.00001).to_string(), "1e-05");
        assert_eq!(FieldValue::Float(1.2345e-7).to_string(), "1.2345e-07");
        assert_eq!(FieldValue::Float(0.0001).to_string(), "0.0001");
        assert_eq!(FieldValue::Float(9999999999999998.0).to_string(), "9999999999999998.0");
        assert_eq!(FieldValue::Float(f64::NAN).to_string(), "nan");
        assert_eq!(FieldValue::Float(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn test_field_value_json_shapes() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[8, 1.5, "Dell"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Integer(8),
                FieldValue::Float(1.5),
                FieldValue::Text("Dell".to_string())
            ]
        );
    }

    #[test]
    fn test_record_serializes_as_object() {
        let json = serde_json::to_string(&laptop_record()).unwrap();
        assert_eq!(
            json,
            r#"{"Company":"Dell","Ram":8,"Weight":1.5,"Inches":13.3}"#
        );
    }
}
