//! Form input descriptors and value coercion

use crate::types::record::FieldValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One input widget of a project's form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputField {
    /// Raw field name, as the training data named it
    pub name: String,
    /// Human readable label; falls back to the name
    #[serde(default)]
    pub label: Option<String>,
    pub widget: Widget,
}

/// Widget kind and its constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Widget {
    /// Pick one label out of a fixed list
    Choice {
        options: Vec<String>,
        #[serde(default)]
        default: Option<String>,
    },
    /// Bounded numeric entry
    Number {
        min: f64,
        max: f64,
        default: f64,
        #[serde(default = "default_step")]
        step: f64,
        /// Whole numbers only (RAM, storage sizes)
        #[serde(default)]
        integer: bool,
    },
}

fn default_step() -> f64 {
    1.0
}

/// A submitted value the widget cannot accept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("'{value}' is not a number")]
    NotANumber { field: String, value: String },

    #[error("{value} is not a whole number")]
    NotAnInteger { field: String, value: f64 },

    #[error("{value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("'{value}' is not one of the allowed options")]
    UnknownOption { field: String, value: String },
}

impl InputError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            InputError::NotANumber { field, .. }
            | InputError::NotAnInteger { field, .. }
            | InputError::OutOfRange { field, .. }
            | InputError::UnknownOption { field, .. } => field,
        }
    }

    /// The rejected value as the user typed it
    pub fn raw_value(&self) -> String {
        match self {
            InputError::NotANumber { value, .. } | InputError::UnknownOption { value, .. } => {
                value.clone()
            }
            InputError::NotAnInteger { value, .. } | InputError::OutOfRange { value, .. } => {
                value.to_string()
            }
        }
    }
}

impl InputField {
    pub fn number(name: &str, label: &str, min: f64, max: f64, default: f64, step: f64) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            widget: Widget::Number {
                min,
                max,
                default,
                step,
                integer: false,
            },
        }
    }

    pub fn integer(name: &str, label: &str, min: i64, max: i64, default: i64, step: i64) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            widget: Widget::Number {
                min: min as f64,
                max: max as f64,
                default: default as f64,
                step: step as f64,
                integer: true,
            },
        }
    }

    pub fn choice(name: &str, label: &str, options: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            widget: Widget::Choice {
                options: options.iter().map(|o| o.to_string()).collect(),
                default: None,
            },
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Value used when the submission does not mention this field.
    pub fn default_value(&self) -> FieldValue {
        match &self.widget {
            Widget::Choice { options, default } => FieldValue::Text(
                default
                    .clone()
                    .or_else(|| options.first().cloned())
                    .unwrap_or_default(),
            ),
            Widget::Number {
                default, integer, ..
            } => {
                if *integer {
                    FieldValue::Integer(default.round() as i64)
                } else {
                    FieldValue::Float(*default)
                }
            }
        }
    }

    /// Coerce a submitted value into the type this widget produces.
    pub fn coerce(&self, raw: Option<&FieldValue>) -> Result<FieldValue, InputError> {
        let Some(raw) = raw else {
            return Ok(self.default_value());
        };

        match &self.widget {
            Widget::Choice { options, .. } => {
                let value = raw.to_string();
                if options.iter().any(|o| *o == value) {
                    Ok(FieldValue::Text(value))
                } else {
                    Err(InputError::UnknownOption {
                        field: self.name.clone(),
                        value,
                    })
                }
            }
            Widget::Number {
                min, max, integer, ..
            } => {
                let value = match raw {
                    FieldValue::Text(text) => text
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| InputError::NotANumber {
                            field: self.name.clone(),
                            value: text.clone(),
                        })?,
                    other => other.as_number().unwrap_or_default(),
                };

                if value < *min || value > *max {
                    return Err(InputError::OutOfRange {
                        field: self.name.clone(),
                        value,
                        min: *min,
                        max: *max,
                    });
                }

                if *integer {
                    if value.fract() != 0.0 {
                        return Err(InputError::NotAnInteger {
                            field: self.name.clone(),
                            value,
                        });
                    }
                    Ok(FieldValue::Integer(value as i64))
                } else {
                    Ok(FieldValue::Float(value))
                }
            }
        }
    }
}
