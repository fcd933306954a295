pub mod field;
pub mod form;
pub mod manage;
pub mod validation;

pub use field::{FieldOption, FieldSchema, FieldType};
pub use form::FormDefinition;
pub use validation::ValidationRule;
