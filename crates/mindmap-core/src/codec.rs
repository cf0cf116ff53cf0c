//! Persistence Codec
//!
//! Serializes a [`Forest`] to the flat, self-contained `.jtree` JSON
//! document and back:
//!
//! ```json
//! {
//!   "nodes": { "<id>": { "id", "name", "parent_id", "color",
//!                        "children", "expanded", "bold" } },
//!   "root_nodes": [ "<id>", ... ]
//! }
//! ```
//!
//! All identifiers are strings on disk. Loading is lenient about ids that
//! a loose producer wrote as JSON numbers — they are coerced to canonical
//! string form — but strict about structure: a wrong top-level shape or a
//! child/parent/root reference that does not resolve fails with
//! [`CodecError::Malformed`]. A failed load never touches the caller's
//! in-memory forest; callers only swap forests in on `Ok`.

use crate::forest::Forest;
use crate::node::{DEFAULT_COLOR, Node, NodeId};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Codec error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The document is not valid JSON or has the wrong shape.
    #[error("malformed document: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct NodeRecord<'a> {
    id: &'a str,
    name: &'a str,
    parent_id: Option<&'a str>,
    color: &'a str,
    children: Vec<&'a str>,
    expanded: bool,
    bold: bool,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    nodes: BTreeMap<&'a str, NodeRecord<'a>>,
    root_nodes: Vec<&'a str>,
}

fn document_of(forest: &Forest) -> Document<'_> {
    let mut nodes = BTreeMap::new();
    for id in forest.node_ids() {
        if let Some(node) = forest.get(id) {
            nodes.insert(
                id.as_str(),
                NodeRecord {
                    id: node.id.as_str(),
                    name: &node.name,
                    parent_id: node.parent.as_ref().map(NodeId::as_str),
                    color: &node.color,
                    children: node.children.iter().map(NodeId::as_str).collect(),
                    expanded: node.expanded,
                    bold: node.bold,
                },
            );
        }
    }
    Document {
        nodes,
        root_nodes: forest.roots().iter().map(NodeId::as_str).collect(),
    }
}

/// Serialize a forest to a JSON value.
pub fn to_value(forest: &Forest) -> Value {
    // A forest holds only strings, bools and vectors; serialization cannot fail.
    serde_json::to_value(document_of(forest)).unwrap_or(Value::Null)
}

/// Serialize a forest to a pretty-printed JSON document string.
pub fn to_json(forest: &Forest) -> String {
    serde_json::to_string_pretty(&document_of(forest)).unwrap_or_default()
}

/// Deserialize a forest from a JSON document string.
pub fn from_json(json: &str) -> Result<Forest, CodecError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| CodecError::Malformed(err.to_string()))?;
    from_value(&value)
}

/// Deserialize a forest from a JSON value.
///
/// Ids are normalized to canonical string form (numeric ids from lenient
/// producers are accepted); every child/parent/root reference must resolve,
/// and the resulting structure must satisfy the forest invariants.
pub fn from_value(value: &Value) -> Result<Forest, CodecError> {
    let top = value
        .as_object()
        .ok_or_else(|| CodecError::Malformed("top level is not an object".to_string()))?;
    let nodes = top
        .get("nodes")
        .and_then(Value::as_object)
        .ok_or_else(|| CodecError::Malformed("missing \"nodes\" object".to_string()))?;
    let root_nodes = top
        .get("root_nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| CodecError::Malformed("missing \"root_nodes\" array".to_string()))?;

    let mut forest = Forest::empty();
    let mut attachments: Vec<(NodeId, Option<NodeId>)> = Vec::new();

    for (key, entry) in nodes {
        let record = entry
            .as_object()
            .ok_or_else(|| CodecError::Malformed(format!("node {key} is not an object")))?;
        let id = NodeId::from(key.clone());
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CodecError::Malformed(format!("node {key} has no string name")))?;
        let parent = match record.get("parent_id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(coerce_id(value).ok_or_else(|| {
                CodecError::Malformed(format!("node {key} has an invalid parent_id"))
            })?),
        };
        let children = record
            .get("children")
            .and_then(Value::as_array)
            .ok_or_else(|| CodecError::Malformed(format!("node {key} has no children array")))?
            .iter()
            .map(|child| {
                coerce_id(child).ok_or_else(|| {
                    CodecError::Malformed(format!("node {key} has an invalid child id"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut node = Node::new(id.clone(), name);
        node.color = field_str(record, "color").unwrap_or(DEFAULT_COLOR).to_string();
        node.expanded = field_bool(record, "expanded").unwrap_or(true);
        node.bold = field_bool(record, "bold").unwrap_or(false);
        node.children = children;
        attachments.push((id.clone(), parent.clone()));
        node.parent = parent;
        forest.insert_detached(node);
    }

    // Resolve references after the whole table is built.
    for (id, parent) in &attachments {
        if let Some(parent_id) = parent
            && !forest.contains(parent_id)
        {
            return Err(CodecError::Malformed(format!(
                "node {id} references missing parent {parent_id}"
            )));
        }
        if let Some(node) = forest.get(id) {
            for child in &node.children {
                if !forest.contains(child) {
                    return Err(CodecError::Malformed(format!(
                        "node {id} references missing child {child}"
                    )));
                }
            }
        }
    }

    for root in root_nodes {
        let root_id = coerce_id(root)
            .ok_or_else(|| CodecError::Malformed("invalid root id".to_string()))?;
        if !forest.contains(&root_id) {
            return Err(CodecError::Malformed(format!(
                "root list references missing node {root_id}"
            )));
        }
        forest.attach(&root_id, None, None);
    }

    forest
        .check_invariants()
        .map_err(CodecError::Malformed)?;
    Ok(forest)
}

fn coerce_id(value: &Value) -> Option<NodeId> {
    match value {
        Value::String(s) => Some(NodeId::from(s.clone())),
        Value::Number(n) => Some(NodeId::from(n.to_string())),
        _ => None,
    }
}

fn field_str<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

fn field_bool(record: &Map<String, Value>, key: &str) -> Option<bool> {
    record.get(key).and_then(Value::as_bool)
}
