//! JSON-Patch (RFC 6902) subset used for partial document updates.
//!
//! Supported operations: `add`, `remove`, `replace`, `test`. A patch is
//! applied all-or-nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Test { path: String, value: Value },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. }
            | PatchOp::Remove { path }
            | PatchOp::Replace { path, .. }
            | PatchOp::Test { path, .. } => path,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("invalid pointer: {0:?}")]
    InvalidPointer(String),

    #[error("path does not exist: {0}")]
    MissingPath(String),

    #[error("cannot modify the document root or its id")]
    ProtectedPath,

    #[error("test failed at {path}")]
    TestFailed { path: String },
}

/// Applies `ops` in order. On error `doc` is left unchanged.
pub fn apply_patch(doc: &mut Value, ops: &[PatchOp]) -> Result<(), PatchError> {
    let mut working = doc.clone();
    for op in ops {
        apply_one(&mut working, op)?;
    }
    *doc = working;
    Ok(())
}

fn apply_one(doc: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    let tokens = parse_pointer(op.path())?;
    if let PatchOp::Test { path, value } = op {
        return match doc.pointer(path) {
            Some(found) if found == value => Ok(()),
            _ => Err(PatchError::TestFailed { path: path.clone() }),
        };
    }

    let Some((last, parent_tokens)) = tokens.split_last() else {
        return Err(PatchError::ProtectedPath);
    };
    if parent_tokens.is_empty() && last == "_id" {
        return Err(PatchError::ProtectedPath);
    }

    let parent = resolve_mut(doc, parent_tokens)
        .ok_or_else(|| PatchError::MissingPath(op.path().to_string()))?;

    match op {
        PatchOp::Add { value, .. } => add(parent, last, value.clone(), op.path()),
        PatchOp::Remove { .. } => remove(parent, last, op.path()).map(|_| ()),
        PatchOp::Replace { value, .. } => {
            let slot = child_mut(parent, last)
                .ok_or_else(|| PatchError::MissingPath(op.path().to_string()))?;
            *slot = value.clone();
            Ok(())
        }
        PatchOp::Test { .. } => Ok(()),
    }
}

fn parse_pointer(path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer(path.to_string()));
    };
    Ok(rest
        .split('/')
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn resolve_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    tokens
        .iter()
        .try_fold(doc, |node, token| child_mut(node, token))
}

fn child_mut<'a>(node: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

fn add(parent: &mut Value, token: &str, value: Value, path: &str) -> Result<(), PatchError> {
    match parent {
        Value::Object(map) => {
            map.insert(token.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            if token == "-" {
                items.push(value);
                return Ok(());
            }
            match token.parse::<usize>() {
                Ok(i) if i <= items.len() => {
                    items.insert(i, value);
                    Ok(())
                }
                _ => Err(PatchError::MissingPath(path.to_string())),
            }
        }
        _ => Err(PatchError::MissingPath(path.to_string())),
    }
}

fn remove(parent: &mut Value, token: &str, path: &str) -> Result<Value, PatchError> {
    let removed = match parent {
        Value::Object(map) => map.remove(token),
        Value::Array(items) => match token.parse::<usize>() {
            Ok(i) if i < items.len() => Some(items.remove(i)),
            _ => None,
        },
        _ => None,
    };
    removed.ok_or_else(|| PatchError::MissingPath(path.to_string()))
}
