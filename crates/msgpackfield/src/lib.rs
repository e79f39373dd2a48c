//! MessagePack-packed column type for rusqlite-backed models.
//!
//! [`MsgPackField`] stores any structured [`Value`] as MessagePack in a BLOB
//! column and hands it back as a native value on read. Its companion
//! [`JsonTextWidget`] shows the value as formatted JSON for editing and passes
//! submitted text straight back to the field for decoding.
//!
//! Reads are lenient: corrupt or legacy column contents and invalid JSON
//! submissions become `None` with a warning instead of an error. Writes are
//! strict.
//!
//! ```
//! use msgpackfield::{ModelField, ModelStore, MsgPackField};
//! use msgpackfield::types::Value;
//! use serde_json::json;
//!
//! let store = ModelStore::open_in_memory("documents", MsgPackField::new("data"))?;
//! let value = Value::from(json!({"x": [1, 2, "y"]}));
//!
//! let id = store.create(Some(&value))?;
//! assert_eq!(store.get(id)?.unwrap().value, Some(value));
//! assert_eq!(store.field().internal_type(), "BinaryField");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod default;
pub mod error;
pub mod field;
pub mod fixtures;
pub mod form;
pub mod sql;
pub mod store;
pub mod widget;

// Public API
pub use config::{FieldConfig, InvalidJsonPolicy};
pub use default::FieldDefault;
pub use error::{Error, Result};
pub use field::{ModelField, MsgPackField};
pub use form::{FormError, FormField, FormFieldOptions};
pub use sql::{Packed, StoredColumn, Unpacked};
pub use store::{ModelStore, Record};
pub use widget::JsonTextWidget;

pub use msgpackfield_codec as codec;
pub use msgpackfield_types as types;
pub use msgpackfield_types::{RawInput, Value};
