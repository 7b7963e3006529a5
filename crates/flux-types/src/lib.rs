pub mod config;
pub mod data_value;
pub mod status;
pub mod variant;

pub use config::AggregateConfiguration;
pub use data_value::DataValue;
pub use status::{AggregateBits, Severity, StatusCode};
pub use variant::{Variant, VariantType};
