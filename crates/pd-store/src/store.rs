//! File-backed document store.
//!
//! Layout: `<root>/<collection>/<id>.json`, one pretty-printed JSON object per
//! document with its id under `_id`.

use crate::collection::Collection;
use crate::patch::{PatchOp, apply_patch};
use crate::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ID_FIELD: &str = "_id";
const CREATED_FIELD: &str = "createdAt";
const UPDATED_FIELD: &str = "updatedAt";

#[derive(Clone, Debug)]
pub struct JsonStore {
    root_dir: PathBuf,
}

impl JsonStore {
    pub fn new(root_dir: PathBuf) -> StoreResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root_dir.join(collection.dir_name())
    }

    fn document_path(&self, collection: Collection, id: &str) -> StoreResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.collection_dir(collection).join(format!("{id}.json")))
    }

    pub fn contains(&self, collection: Collection, id: &str) -> bool {
        self.document_path(collection, id)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// All documents of a collection, ordered by id.
    pub fn index(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        let dir = self.collection_dir(collection);
        let mut docs = Vec::new();
        if !dir.exists() {
            return Ok(docs);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path)?;
            docs.push(serde_json::from_str(&content)?);
        }
        Ok(docs)
    }

    pub fn show(&self, collection: Collection, id: &str) -> StoreResult<Value> {
        let path = self.document_path(collection, id)?;
        if !path.exists() {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Inserts a new document. A uuid is assigned when the body has no `_id`.
    pub fn create(&self, collection: Collection, body: Value) -> StoreResult<Value> {
        let mut fields = into_object(body)?;
        let id = match fields.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(StoreError::InvalidDocument {
                    reason: format!("_id must be a string, got {other}"),
                });
            }
            None => uuid::Uuid::new_v4().simple().to_string(),
        };

        if self.contains(collection, &id) {
            return Err(StoreError::Conflict { collection, id });
        }

        fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        fields
            .entry(CREATED_FIELD.to_string())
            .or_insert_with(|| Value::String(timestamp()));

        let doc = Value::Object(fields);
        self.write(collection, &id, &doc)?;
        debug!(%collection, %id, "created document");
        Ok(doc)
    }

    /// Sets the body's fields on the document at `id`, creating it if absent.
    ///
    /// Any `_id` in the body is ignored; the path id wins.
    pub fn upsert(&self, collection: Collection, id: &str, body: Value) -> StoreResult<Value> {
        let mut updates = into_object(body)?;
        updates.remove(ID_FIELD);

        let mut fields = match self.show(collection, id) {
            Ok(existing) => into_object(existing)?,
            Err(StoreError::NotFound { .. }) => {
                let mut fresh = Map::new();
                fresh.insert(CREATED_FIELD.to_string(), Value::String(timestamp()));
                fresh
            }
            Err(err) => return Err(err),
        };

        fields.extend(updates);
        fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        fields.insert(UPDATED_FIELD.to_string(), Value::String(timestamp()));

        let doc = Value::Object(fields);
        self.write(collection, id, &doc)?;
        debug!(%collection, %id, "upserted document");
        Ok(doc)
    }

    /// Applies a JSON patch to an existing document.
    pub fn patch(&self, collection: Collection, id: &str, ops: &[PatchOp]) -> StoreResult<Value> {
        let mut doc = self.show(collection, id)?;
        apply_patch(&mut doc, ops)?;
        if let Value::Object(fields) = &mut doc {
            fields.insert(UPDATED_FIELD.to_string(), Value::String(timestamp()));
        }
        self.write(collection, id, &doc)?;
        debug!(%collection, %id, ops = ops.len(), "patched document");
        Ok(doc)
    }

    pub fn destroy(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let path = self.document_path(collection, id)?;
        if !path.exists() {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        fs::remove_file(path)?;
        debug!(%collection, %id, "removed document");
        Ok(())
    }

    /// Decodes every document of a collection into `T`.
    pub fn decode_all<T: DeserializeOwned>(&self, collection: Collection) -> StoreResult<Vec<T>> {
        self.index(collection)?
            .into_iter()
            .map(|doc| decode(collection, doc))
            .collect()
    }

    fn write(&self, collection: Collection, id: &str, doc: &Value) -> StoreResult<()> {
        let path = self.document_path(collection, id)?;
        fs::create_dir_all(self.collection_dir(collection))?;

        // Write then rename so readers never observe a half-written document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(doc)?)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

pub(crate) fn decode<T: DeserializeOwned>(collection: Collection, doc: Value) -> StoreResult<T> {
    let id = doc
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or("<no id>")
        .to_string();
    serde_json::from_value(doc).map_err(|source| StoreError::Decode {
        collection,
        id,
        source,
    })
}

fn into_object(body: Value) -> StoreResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument {
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
