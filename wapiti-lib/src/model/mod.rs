//! Data model: caller field values, extracted records and typed outputs.

mod identifier;
mod protection;
mod record;
mod value;

pub use identifier::Identifier;
pub use protection::Expiry;
pub use protection::Protection;
pub use protection::ProtectionInfo;
pub use record::FromFields;
pub use record::Json;
pub use record::Record;
pub(crate) use record::type_name;
pub use value::FieldValue;
pub use value::FieldValues;
