// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! JSON wire format for circuit project documents.
//!
//! The document shape is the historical save format of the editor;
//! fields the core does not interpret are carried in `extra` catch-alls
//! and written back out untouched.  Some wire spellings are themselves
//! historical (notably `constructorParamaters`) and must not be "fixed"
//! here, or older documents stop loading.
//!
//! # Example
//! ```no_run
//! use gatework_engine::json;
//!
//! let json_str = r#"{"name": "test", "scopes": [...]}"#;
//! let doc: json::ProjectDoc = serde_json::from_str(json_str)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{Error, ErrorCode, ErrorKind, Result};

// Helper functions for serde skip_serializing_if

fn is_false(val: &bool) -> bool {
    !*val
}

fn is_empty_string(val: &str) -> bool {
    val.is_empty()
}

fn is_empty_vec<T>(val: &[T]) -> bool {
    val.is_empty()
}

fn is_empty_map<V>(val: &BTreeMap<String, V>) -> bool {
    val.is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDoc {
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub name: String,
    #[serde(rename = "projectId", skip_serializing_if = "Option::is_none", default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<ScopeDoc>,
    #[serde(rename = "timePeriod", skip_serializing_if = "Option::is_none", default)]
    pub time_period: Option<u32>,
    #[serde(
        rename = "clockEnabled",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub clock_enabled: Option<bool>,
    #[serde(rename = "orderedTabs", skip_serializing_if = "is_empty_vec", default)]
    pub ordered_tabs: Vec<String>,
    #[serde(
        rename = "focussedCircuit",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub focussed_circuit: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One serialized circuit.  Element records live in `extra`, keyed by
/// their type tag; [`ScopeDoc::elements_of`] pulls them out on demand so
/// unknown keys survive a load/save round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeDoc {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(rename = "allNodes", default)]
    pub all_nodes: Vec<NodeDoc>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub wires: Vec<WireDoc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub layout: Option<LayoutDoc>,
    #[serde(rename = "isMain", skip_serializing_if = "is_false", default)]
    pub is_main: bool,
    #[serde(
        rename = "verilogMetadata",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub verilog_metadata: Option<Value>,
    #[serde(
        rename = "testbenchData",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub testbench_data: Option<Value>,
    #[serde(
        rename = "restrictedCircuitElementsUsed",
        skip_serializing_if = "is_empty_vec",
        default
    )]
    pub restricted_circuit_elements_used: Vec<String>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub folders: Vec<FolderDoc>,
    #[serde(rename = "subcircuitMap", skip_serializing_if = "is_empty_map", default)]
    pub subcircuit_map: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ScopeDoc {
    pub fn new(id: &str) -> ScopeDoc {
        ScopeDoc {
            id: id.to_string(),
            name: None,
            all_nodes: Vec::new(),
            wires: Vec::new(),
            layout: None,
            is_main: false,
            verilog_metadata: None,
            testbench_data: None,
            restricted_circuit_elements_used: Vec::new(),
            folders: Vec::new(),
            subcircuit_map: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Element records stored under `tag`, or an empty list if the
    /// document has none.  A present-but-malformed collection is a
    /// document error, not an empty one.
    pub fn elements_of(&self, tag: &str) -> Result<Vec<ElementDoc>> {
        match self.extra.get(tag) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|err| {
                Error::new(
                    ErrorKind::Document,
                    ErrorCode::JsonDeserialization,
                    Some(format!("{tag}: {err}")),
                )
            }),
        }
    }

    pub fn set_elements(&mut self, tag: &str, elements: Vec<ElementDoc>) {
        if elements.is_empty() {
            self.extra.remove(tag);
        } else {
            // ElementDoc serialization is infallible: every field is a
            // plain value or already a serde_json::Value.
            self.extra
                .insert(tag.to_string(), serde_json::to_value(elements).unwrap());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub connections: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDoc {
    pub node1: usize,
    pub node2: usize,
    #[serde(rename = "type", skip_serializing_if = "is_empty_string", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDoc {
    #[serde(rename = "objectType", skip_serializing_if = "is_empty_string", default)]
    pub object_type: String,
    pub x: i32,
    pub y: i32,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub label: String,
    #[serde(
        rename = "labelDirection",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub label_direction: Option<String>,
    #[serde(
        rename = "propagationDelay",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub propagation_delay: Option<u32>,
    #[serde(rename = "customData", skip_serializing_if = "CustomData::is_empty", default)]
    pub custom_data: CustomData,
    #[serde(
        rename = "subcircuitMetadata",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub subcircuit_metadata: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ElementDoc {
    pub fn new(object_type: &str, x: i32, y: i32) -> ElementDoc {
        ElementDoc {
            object_type: object_type.to_string(),
            x,
            y,
            label: String::new(),
            label_direction: None,
            propagation_delay: None,
            custom_data: CustomData::default(),
            subcircuit_metadata: None,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomData {
    // historical wire spelling; do not correct
    #[serde(
        rename = "constructorParamaters",
        skip_serializing_if = "is_empty_vec",
        default
    )]
    pub constructor_parameters: Vec<Value>,
    #[serde(skip_serializing_if = "is_empty_map", default)]
    pub values: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "is_empty_map", default)]
    pub nodes: BTreeMap<String, NodeSlotDoc>,
}

impl CustomData {
    pub fn is_empty(&self) -> bool {
        self.constructor_parameters.is_empty() && self.values.is_empty() && self.nodes.is_empty()
    }
}

/// Old node identities for one connection-bearing property: a single
/// index for scalar slots, an index list for array slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSlotDoc {
    One(usize),
    Many(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDoc {
    pub width: i32,
    pub height: i32,
    pub title_x: i32,
    pub title_y: i32,
    #[serde(
        rename = "titleEnabled",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub title_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDoc {
    pub id: String,
    pub name: String,
    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_doc_defaults() {
        let doc: ProjectDoc = serde_json::from_str(r#"{"scopes": []}"#).unwrap();
        assert_eq!("", doc.name);
        assert_eq!(None, doc.time_period);
        assert_eq!(None, doc.clock_enabled);
        assert!(doc.ordered_tabs.is_empty());
        assert_eq!(None, doc.focussed_circuit);
    }

    #[test]
    fn test_scope_doc_elements_extraction() {
        let raw = r#"{
            "id": "1",
            "name": "main",
            "allNodes": [],
            "AndGate": [{"x": 10, "y": 20}],
            "weather": "cloudy"
        }"#;
        let doc: ScopeDoc = serde_json::from_str(raw).unwrap();

        let gates = doc.elements_of("AndGate").unwrap();
        assert_eq!(1, gates.len());
        assert_eq!(10, gates[0].x);
        assert_eq!(20, gates[0].y);

        assert!(doc.elements_of("OrGate").unwrap().is_empty());

        // unknown fields pass through untouched
        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!("cloudy", out["weather"]);

        // a present-but-malformed collection is an error
        let bad: ScopeDoc =
            serde_json::from_str(r#"{"id": "1", "allNodes": [], "AndGate": 7}"#).unwrap();
        assert!(bad.elements_of("AndGate").is_err());
    }

    #[test]
    fn test_custom_data_spelling() {
        let raw = r#"{"constructorParamaters": ["RIGHT", 1], "nodes": {"inp": [0, 1], "output1": 2}}"#;
        let data: CustomData = serde_json::from_str(raw).unwrap();
        assert_eq!(2, data.constructor_parameters.len());
        assert_eq!(
            Some(&NodeSlotDoc::Many(vec![0, 1])),
            data.nodes.get("inp")
        );
        assert_eq!(Some(&NodeSlotDoc::One(2)), data.nodes.get("output1"));

        // serialization keeps the historical spelling
        let out = serde_json::to_string(&data).unwrap();
        assert!(out.contains("constructorParamaters"));
    }

    #[test]
    fn test_layout_doc_title_flag_optional() {
        let doc: LayoutDoc =
            serde_json::from_str(r#"{"width": 100, "height": 40, "title_x": 50, "title_y": 13}"#)
                .unwrap();
        assert_eq!(None, doc.title_enabled);

        let doc: LayoutDoc = serde_json::from_str(
            r#"{"width": 100, "height": 40, "title_x": 50, "title_y": 13, "titleEnabled": false}"#,
        )
        .unwrap();
        assert_eq!(Some(false), doc.title_enabled);
    }

    #[test]
    fn test_element_doc_roundtrip() {
        let raw = r#"{
            "objectType": "DflipFlop",
            "x": 100,
            "y": 60,
            "label": "state bit",
            "labelDirection": "LEFT",
            "propagationDelay": 0,
            "customData": {"nodes": {"dInp": 4}}
        }"#;
        let doc: ElementDoc = serde_json::from_str(raw).unwrap();
        assert_eq!("DflipFlop", doc.object_type);
        assert_eq!(Some(0), doc.propagation_delay);

        let out = serde_json::to_string(&doc).unwrap();
        let doc2: ElementDoc = serde_json::from_str(&out).unwrap();
        assert_eq!(doc, doc2);
    }
}
