//! Schema alignment for single-row model inference.
//!
//! Turns an [`InputRecord`] into the exact column set and order a model was
//! trained on. Numeric fields map onto the column of the same name;
//! categorical text fields are one-hot expanded into `<field>_<value>`
//! columns, the naming pandas `get_dummies` produces at training time.
//! Schema columns nothing maps onto are zero, everything else is dropped.

use crate::types::record::{FieldValue, InputRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("feature schema is empty")]
    Empty,
    #[error("feature '{0}' appears more than once")]
    DuplicateColumn(String),
}

/// Ordered column names a model was trained against.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if positions.insert(column.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(column.clone()));
            }
        }

        Ok(Self { columns, positions })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Known categories of `field`: every `<field>_<category>` column.
    pub fn categories(&self, field: &str) -> CategoryIndex {
        self.categories_excluding(field, std::iter::empty())
    }

    /// Like [`categories`](Self::categories), but columns belonging to
    /// `others` are left out. `Touch_Screen_Yes` is a `Touch_Screen`
    /// column, not a `Touch` category named `Screen_Yes`.
    pub fn categories_excluding<'f>(
        &self,
        field: &str,
        others: impl IntoIterator<Item = &'f str>,
    ) -> CategoryIndex {
        let prefix = format!("{}_", field);
        let nested: Vec<String> = others
            .into_iter()
            .filter(|other| other.len() > field.len() && other.starts_with(&prefix))
            .map(|other| format!("{}_", other))
            .collect();

        let entries = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !nested.iter().any(|n| column.starts_with(n.as_str())))
            .filter_map(|(i, column)| {
                column
                    .strip_prefix(&prefix)
                    .map(|category| (category.to_string(), i))
            })
            .collect();

        CategoryIndex {
            field: field.to_string(),
            entries,
        }
    }
}

/// Categories a single field was one-hot encoded into, with their columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryIndex {
    field: String,
    entries: Vec<(String, usize)>,
}

impl CategoryIndex {
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether the schema encodes this field at all.
    pub fn is_categorical(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(category, _)| category.as_str())
    }
}

/// Sparse `(column, value)` entries of a one-hot group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseIndicator {
    entries: Vec<(usize, f64)>,
}

impl SparseIndicator {
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// True when the category has no column, i.e. it was never seen in training.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One-hot encode `raw` against the categories the schema knows.
pub fn one_hot(raw: &str, categories: &CategoryIndex) -> SparseIndicator {
    let entries = categories
        .entries
        .iter()
        .filter(|(category, _)| category == raw)
        .map(|&(_, column)| (column, 1.0))
        .collect();

    SparseIndicator { entries }
}

/// A categorical value with no matching schema column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnseenCategory {
    pub field: String,
    pub value: String,
}

/// Numeric row reindexed onto a [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow<'s> {
    schema: &'s FeatureSchema,
    values: Vec<f64>,
    unseen: Vec<UnseenCategory>,
}

impl<'s> AlignedRow<'s> {
    pub fn schema(&self) -> &'s FeatureSchema {
        self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column, `None` if the schema has no such column.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.schema.position(column).map(|i| self.values[i])
    }

    /// Categorical inputs that fell through to an all-zero group.
    pub fn unseen_categories(&self) -> &[UnseenCategory] {
        &self.unseen
    }
}

impl fmt::Display for AlignedRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, value)) in self.schema.columns.iter().zip(&self.values).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", column, value)?;
        }
        Ok(())
    }
}

/// Align a record onto a schema.
///
/// Returns `None` without doing any work when the schema is absent, which
/// is what an upstream load failure leaves behind.
pub fn align<'s>(record: &InputRecord, schema: Option<&'s FeatureSchema>) -> Option<AlignedRow<'s>> {
    let schema = schema?;
    let mut values = vec![0.0; schema.len()];
    let mut unseen = Vec::new();

    for (field, value) in record.iter() {
        match value {
            FieldValue::Text(raw) => {
                let others = record.iter().map(|(name, _)| name);
                let categories = schema.categories_excluding(field, others);
                let indicator = one_hot(raw, &categories);
                if indicator.is_empty() && categories.is_categorical() {
                    unseen.push(UnseenCategory {
                        field: field.to_string(),
                        value: raw.clone(),
                    });
                }
                for &(column, v) in indicator.entries() {
                    values[column] = v;
                }
            }
            numeric => {
                if let (Some(column), Some(v)) = (schema.position(field), numeric.as_number()) {
                    values[column] = v;
                }
            }
        }
    }

    Some(AlignedRow {
        schema,
        values,
        unseen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop_schema() -> FeatureSchema {
        FeatureSchema::new(
            [
                "Ram",
                "SSD",
                "HDD",
                "Weight",
                "Inches",
                "Company_Dell",
                "Company_HP",
                "Company_Lenovo",
                "TypeName_Gaming",
                "TypeName_Notebook",
                "TypeName_Ultrabook",
                "Touch_No",
                "Touch_Yes",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap()
    }

    fn laptop_record() -> InputRecord {
        InputRecord::new()
            .with("Company", "Dell")
            .with("TypeName", "Notebook")
            .with("Ram", 8)
            .with("SSD", 512)
            .with("HDD", 0)
            .with("Weight", 1.5)
            .with("Inches", 13.3)
            .with("Touch", "No")
    }

    #[test]
    fn test_laptop_row_alignment() {
        let schema = laptop_schema();
        let row = align(&laptop_record(), Some(&schema)).unwrap();

        assert_eq!(row.len(), schema.len());
        assert_eq!(
            row.values(),
            &[8.0, 512.0, 0.0, 1.5, 13.3, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(row.get("Company_HP"), Some(0.0));
        assert_eq!(row.get("Company_Lenovo"), Some(0.0));
        assert_eq!(row.get("TypeName_Gaming"), Some(0.0));
        assert_eq!(row.get("TypeName_Ultrabook"), Some(0.0));
        assert!(row.unseen_categories().is_empty());
    }

    #[test]
    fn test_missing_schema_short_circuits() {
        assert!(align(&laptop_record(), None).is_none());
        assert!(align(&InputRecord::new(), None).is_none());
    }

    #[test]
    fn test_shape_follows_schema_not_record() {
        let schema = laptop_schema();

        let sparse = InputRecord::new().with("Ram", 16);
        let row = align(&sparse, Some(&schema)).unwrap();
        assert_eq!(row.len(), schema.len());
        assert_eq!(row.values().iter().filter(|v| **v != 0.0).count(), 1);

        let noisy = laptop_record()
            .with("Gpu", "Nvidia")
            .with("Cpu_GHz", 2.4)
            .with("OpSys", "Linux");
        let row = align(&noisy, Some(&schema)).unwrap();
        assert_eq!(row.len(), schema.len());
        assert_eq!(row.get("Gpu_Nvidia"), None);
        assert!(row.unseen_categories().is_empty());
    }

    #[test]
    fn test_unseen_category_zero_fills_its_group() {
        let schema = laptop_schema();
        let record = laptop_record().with("Company", "Apple");
        let row = align(&record, Some(&schema)).unwrap();

        assert_eq!(row.get("Company_Dell"), Some(0.0));
        assert_eq!(row.get("Company_HP"), Some(0.0));
        assert_eq!(row.get("Company_Lenovo"), Some(0.0));
        assert_eq!(
            row.unseen_categories(),
            &[UnseenCategory {
                field: "Company".to_string(),
                value: "Apple".to_string()
            }]
        );
    }

    #[test]
    fn test_alignment_is_deterministic() {
        let schema = laptop_schema();
        let first = align(&laptop_record(), Some(&schema)).unwrap();
        let second = align(&laptop_record(), Some(&schema)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_one_hot_against_known_categories() {
        let schema = laptop_schema();
        let companies = schema.categories("Company");

        assert_eq!(
            companies.categories().collect::<Vec<_>>(),
            vec!["Dell", "HP", "Lenovo"]
        );
        assert_eq!(one_hot("HP", &companies).entries(), &[(6, 1.0)]);
        assert!(one_hot("Asus", &companies).is_empty());
        assert!(!schema.categories("Ram").is_categorical());
    }

    #[test]
    fn test_longer_field_columns_are_not_shorter_field_categories() {
        let schema = FeatureSchema::new(
            ["Ram", "Touch_Screen_No", "Touch_Screen_Yes"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        let record = InputRecord::new()
            .with("Ram", 8)
            .with("Touch", "No")
            .with("Touch_Screen", "Yes");

        let row = align(&record, Some(&schema)).unwrap();

        assert!(row.unseen_categories().is_empty());
        assert_eq!(row.values(), &[8.0, 0.0, 1.0]);
        assert!(!schema
            .categories_excluding("Touch", ["Touch_Screen"])
            .is_categorical());
        assert_eq!(schema.categories("Touch").categories().count(), 2);
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let err = FeatureSchema::new(vec!["Ram".to_string(), "Ram".to_string()]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateColumn("Ram".to_string()));
        assert_eq!(FeatureSchema::new(Vec::new()).unwrap_err(), SchemaError::Empty);
    }

    #[test]
    fn test_row_display_lists_columns() {
        let schema = FeatureSchema::new(vec!["Ram".to_string(), "Touch_Yes".to_string()]).unwrap();
        let row = align(&InputRecord::new().with("Ram", 8).with("Touch", "Yes"), Some(&schema)).unwrap();
        assert_eq!(row.to_string(), "Ram=8, Touch_Yes=1");
    }
}
