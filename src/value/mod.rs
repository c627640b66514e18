mod array_value;
mod json;
mod map_value;
mod value;

pub use array_value::ArrayValue;
pub use json::{fields_from_json, fields_to_json, json_to_value, value_to_json};
pub use map_value::MapValue;
pub use value::{Value, ValueKind};
