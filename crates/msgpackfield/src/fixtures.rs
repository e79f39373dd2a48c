//! JSON fixture documents for model tables.
//!
//! A fixture is a list of `{"model", "pk", "fields"}` objects. The packed
//! column is written with [`ModelField::value_to_string`] (formatted JSON
//! text) and read back through [`ModelField::to_python`], the same text path
//! form submissions take.

use anyhow::{Context, Result};
use msgpackfield_types::{RawInput, Value};
use serde::{Deserialize, Serialize};

use crate::field::ModelField;
use crate::store::ModelStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureObject {
    pub model: String,
    pub pk: i64,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Serialize every row of `store` as fixture objects labelled `model`.
pub fn dump(store: &ModelStore, model: &str) -> Result<Vec<FixtureObject>> {
    let field = store.field();

    store
        .list()?
        .into_iter()
        .map(|record| {
            let text = field
                .value_to_string(record.value.as_ref())
                .with_context(|| format!("Failed to serialize {} row {}", model, record.id))?;

            let mut fields = serde_json::Map::new();
            fields.insert(field.name().to_string(), serde_json::Value::String(text));

            Ok(FixtureObject {
                model: model.to_string(),
                pk: record.id,
                fields,
            })
        })
        .collect()
}

pub fn dump_to_string(store: &ModelStore, model: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&dump(store, model)?)?)
}

/// Upsert fixture objects for `model` into `store`, returning how many rows
/// were written. Objects for other models are skipped.
///
/// The field value may be the JSON text produced by [`dump`], an inline JSON
/// structure, or null.
pub fn load(store: &ModelStore, model: &str, objects: &[FixtureObject]) -> Result<usize> {
    let field = store.field();
    let mut loaded = 0;

    for object in objects.iter().filter(|o| o.model == model) {
        let value = match object.fields.get(field.name()) {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(text)) => field.to_python(RawInput::Text(text.clone())),
            Some(inline) => Some(Value::from(inline.clone())),
        };

        store.upsert(object.pk, value.as_ref())?;
        loaded += 1;
    }

    Ok(loaded)
}

pub fn load_from_str(store: &ModelStore, model: &str, json: &str) -> Result<usize> {
    let objects: Vec<FixtureObject> =
        serde_json::from_str(json).context("Fixture is not a list of objects")?;
    load(store, model, &objects)
}
