//! Type definitions for inputs and prediction outcomes

pub mod field;
pub mod record;
pub mod report;

pub use field::{InputError, InputField, Widget};
pub use record::{FieldValue, InputRecord};
pub use report::{PredictionReport, PredictionStatus};
