pub mod attribute_map;
pub mod binary_record;
pub mod config;
pub mod deserialization;
pub mod error;
pub mod serialization;
pub mod types;
pub mod value;
pub mod view;

pub use attribute_map::AttributeMap;
pub use binary_record::{BinaryRecord, SKIP_COLUMN};
pub use config::RecordConfig;
pub use error::RecordError;
pub use value::Value;
pub use view::RecordView;
