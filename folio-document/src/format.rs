//! The persisted document format.
//!
//! A document is a JSON object of named groups, each an array of object
//! records:
//!
//! ```json
//! {
//!   "Header":     [ { "id": "…", "type": "DocumentInfo", "parent": null, "properties": [ … ] } ],
//!   "ObjectTree": [ { "id": "…", "type": "Group", "parent": null, "properties": [ … ] } ]
//! }
//! ```
//!
//! Readers can peek at a record's identity before materializing it.

use crate::error::{DocumentError, DocumentResult};
use folio_types::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// One property value of a persisted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    pub value: Value,
}

/// A persisted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub type_name: String,
    /// `None` for objects directly under the root.
    #[serde(default)]
    pub parent: Option<ObjectId>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

/// The identity part of a record, available before the record is read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectHeader {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub parent: Option<ObjectId>,
}

impl ObjectRecord {
    pub fn header(&self) -> ObjectHeader {
        ObjectHeader {
            id: self.id,
            type_name: self.type_name.clone(),
            parent: self.parent,
        }
    }
}

/// Builds a persisted document group by group.
#[derive(Debug, Default)]
pub struct DocumentWriter {
    groups: Map<String, Value>,
    current: Option<(String, Vec<Value>)>,
}

impl DocumentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_group(&mut self, name: &str) -> DocumentResult<()> {
        if let Some((open, _)) = &self.current {
            return Err(DocumentError::Format(format!(
                "cannot start group {name:?} while {open:?} is open"
            )));
        }
        if self.groups.contains_key(name) {
            return Err(DocumentError::Format(format!("group {name:?} written twice")));
        }
        self.current = Some((name.to_string(), Vec::new()));
        Ok(())
    }

    pub fn write_object(&mut self, record: &ObjectRecord) -> DocumentResult<()> {
        let Some((_, records)) = &mut self.current else {
            return Err(DocumentError::Format("no group is open".to_string()));
        };
        records.push(serde_json::to_value(record)?);
        Ok(())
    }

    pub fn end_group(&mut self) -> DocumentResult<()> {
        let (name, records) = self
            .current
            .take()
            .ok_or_else(|| DocumentError::Format("no group is open".to_string()))?;
        self.groups.insert(name, Value::Array(records));
        Ok(())
    }

    /// Encodes every finished group.
    pub fn finish(self, pretty: bool) -> DocumentResult<Vec<u8>> {
        if let Some((open, _)) = &self.current {
            return Err(DocumentError::Format(format!("group {open:?} was not ended")));
        }
        let document = Value::Object(self.groups);
        let bytes = if pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };
        Ok(bytes)
    }
}

/// Reads a persisted document group by group, one record at a time.
#[derive(Debug)]
pub struct DocumentReader {
    groups: Map<String, Value>,
    cursor: VecDeque<Value>,
}

impl DocumentReader {
    pub fn parse(bytes: &[u8]) -> DocumentResult<Self> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(groups) => Ok(Self {
                groups,
                cursor: VecDeque::new(),
            }),
            other => Err(DocumentError::Format(format!(
                "expected an object of groups, found {}",
                folio_reflect::builtin::json_kind(&other)
            ))),
        }
    }

    /// Positions the reader at the start of a group. Returns false if the
    /// document has no group of that name. A group can be opened once.
    pub fn open_group(&mut self, name: &str) -> DocumentResult<bool> {
        match self.groups.remove(name) {
            Some(Value::Array(records)) => {
                self.cursor = records.into();
                Ok(true)
            }
            Some(other) => Err(DocumentError::Format(format!(
                "group {name:?} is a {}, not an array",
                folio_reflect::builtin::json_kind(&other)
            ))),
            None => Ok(false),
        }
    }

    /// Identity of the next record in the open group.
    pub fn peek_next_object(&self) -> DocumentResult<Option<ObjectHeader>> {
        self.cursor
            .front()
            .map(|value| ObjectHeader::deserialize(value).map_err(DocumentError::from))
            .transpose()
    }

    /// Reads and consumes the next record in the open group.
    pub fn read_object(&mut self) -> DocumentResult<Option<ObjectRecord>> {
        self.cursor
            .pop_front()
            .map(|value| serde_json::from_value(value).map_err(DocumentError::from))
            .transpose()
    }

    /// Consumes the next record without reading it.
    pub fn skip_object(&mut self) -> bool {
        self.cursor.pop_front().is_some()
    }

    /// Records left in the open group.
    pub fn remaining(&self) -> usize {
        self.cursor.len()
    }
}
