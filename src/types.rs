pub mod aggregation;
pub mod frequency;
pub mod value;

// Re-export types for convenience.
pub use crate::types::aggregation::Aggregation;
pub use crate::types::frequency::Frequency;
pub use crate::types::value::Value;
