// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! One editable circuit, and its reconstruction from a serialized
//! scope document.
//!
//! Reconstruction order matters and is fixed: nodes, then adjacency,
//! then elements (which adopt existing nodes), then wire geometry,
//! then cleanup, then metadata and layout.  Each step depends on the
//! previous ones being complete; the whole sequence runs to completion
//! without yielding.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use log::debug;
use serde_json::Value;

use crate::common::Result;
use crate::element::{
    self, Element, ElementKind, InstantiationCtx, OwnedPortSpec, PortCount,
};
use crate::{doc_err, scope_err};
use crate::folders::FolderTree;
use crate::json::{ElementDoc, FolderDoc, LayoutDoc, NodeDoc, ScopeDoc, WireDoc};
use crate::layout::{self, Layout};
use crate::node::{self, Node, NodeKind, NodeRef, NodeRegistry};
use crate::wire::Wire;

pub struct Scope {
    pub id: String,
    pub name: String,
    pub is_hardware_derived: bool,
    pub is_main: bool,
    pub all_nodes: Vec<NodeRef>,
    pub wires: Vec<Wire>,
    pub elements: BTreeMap<ElementKind, Vec<Element>>,
    pub layout: Layout,
    pub folders: FolderTree,
    pub verilog_metadata: Option<Value>,
    pub testbench_data: Option<Value>,
    pub restricted_elements_used: Vec<String>,
}

impl Scope {
    pub fn new(name: &str, id: &str, is_hardware_derived: bool, is_main: bool) -> Scope {
        Scope {
            id: id.to_string(),
            name: name.to_string(),
            is_hardware_derived,
            is_main,
            all_nodes: Vec::new(),
            wires: Vec::new(),
            elements: BTreeMap::new(),
            layout: Layout::default(),
            folders: FolderTree::default(),
            verilog_metadata: None,
            testbench_data: None,
            restricted_elements_used: Vec::new(),
        }
    }

    pub fn elements_of(&self, kind: ElementKind) -> &[Element] {
        self.elements.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn element_count(&self) -> usize {
        self.elements.values().map(Vec::len).sum()
    }

    pub fn input_count(&self) -> usize {
        self.elements_of(ElementKind::Input).len()
    }

    pub fn output_count(&self) -> usize {
        self.elements_of(ElementKind::Output).len()
    }

    /// Rebuild this scope from its serialized document.  `built` holds
    /// the scopes constructed earlier in project order; subcircuit
    /// records may only reference those.
    pub fn reconstruct(&mut self, doc: &ScopeDoc, built: &[Scope]) -> Result<()> {
        // 1. all nodes, in document order
        let registry = NodeRegistry::build(&doc.all_nodes);
        self.all_nodes = registry.nodes().to_vec();

        // 2. node-to-node adjacency, then the wires running over it
        registry.wire_connections(&doc.all_nodes)?;
        for wire in &doc.wires {
            self.wires.push(Wire::new(
                registry.resolve(wire.node1)?,
                registry.resolve(wire.node2)?,
            ));
        }

        // 3. elements, in the fixed kind order; records stored under a
        // retired tag load with their canonical kind
        for kind in ElementKind::ALL {
            for tag in kind.document_tags() {
                let records = doc.elements_of(tag)?;
                for record in records.iter() {
                    let record_tag = if record.object_type.is_empty() {
                        tag
                    } else {
                        record.object_type.as_str()
                    };
                    let el = if kind == ElementKind::SubCircuit {
                        self.load_subcircuit(record_tag, record, &registry, built)?
                    } else {
                        let mut ctx = InstantiationCtx {
                            nodes: &mut self.all_nodes,
                            registry: &registry,
                        };
                        element::instantiate(record_tag, record, &mut ctx)?
                    };
                    self.elements.entry(el.kind).or_default().push(el);
                }
            }
        }

        // 4. endpoints all exist now; refresh derived wire geometry
        for wire in self.wires.iter_mut() {
            wire.refresh();
        }

        // 5. defect compensation for historically malformed documents
        let purged = node::purge_buggy_nodes(&mut self.all_nodes, &mut self.wires);
        if purged > 0 {
            debug!("scope {}: purged {purged} buggy nodes", self.id);
        }

        // 6. opaque pass-through state
        self.verilog_metadata = doc.verilog_metadata.clone();
        self.testbench_data = doc.testbench_data.clone();
        self.restricted_elements_used = doc.restricted_circuit_elements_used.clone();
        self.folders = FolderTree::from_doc(&doc.folders, &doc.subcircuit_map);

        // 7 + 8. layout, synthesized for documents that predate it
        self.resolve_layout(doc.layout.as_ref());

        Ok(())
    }

    /// Subcircuit records do not construct a plain element: the
    /// referenced scope must already exist, and its pin counts shape
    /// this element's ports.  The document is expected to list scopes
    /// in dependency order; a forward reference is a hard error.
    fn load_subcircuit(
        &mut self,
        tag: &str,
        record: &ElementDoc,
        registry: &NodeRegistry,
        built: &[Scope],
    ) -> Result<Element> {
        let kind = element::resolve_kind(tag)?;
        let Some(target) = record
            .custom_data
            .constructor_parameters
            .first()
            .and_then(param_id)
        else {
            return doc_err!(
                BadConstructorParameters,
                format!("scope {:?}: subcircuit record without a target id", self.id)
            );
        };
        let Some(child) = built.iter().find(|s| s.id == target) else {
            return scope_err!(
                UnresolvedSubcircuit,
                format!(
                    "scope {:?} references subcircuit {target:?} before it is constructed",
                    self.id
                )
            );
        };

        let ports = vec![
            OwnedPortSpec {
                name: "inputNodes".to_string(),
                role: NodeKind::Input,
                count: PortCount::Many(child.input_count()),
            },
            OwnedPortSpec {
                name: "outputNodes".to_string(),
                role: NodeKind::Output,
                count: PortCount::Many(child.output_count()),
            },
        ];
        let mut ctx = InstantiationCtx {
            nodes: &mut self.all_nodes,
            registry,
        };
        let mut el = element::instantiate_with_ports(kind, record, ports, &mut ctx)?;
        el.scope_ref = Some(target);
        Ok(el)
    }

    fn resolve_layout(&mut self, doc: Option<&LayoutDoc>) {
        let explicit_title = match doc {
            Some(l) => {
                self.layout = Layout {
                    width: l.width,
                    height: l.height,
                    title_x: l.title_x,
                    title_y: l.title_y,
                    title_enabled: true,
                };
                l.title_enabled
            }
            None => {
                // older documents never stored a layout; synthesize the
                // pinned geometry and place every pin on the face
                let synth = Layout::synthesize(self.input_count(), self.output_count());
                let inputs = layout::port_positions(synth.height, self.input_count(), 0);
                let outputs =
                    layout::port_positions(synth.height, self.output_count(), synth.width);
                if let Some(pins) = self.elements.get_mut(&ElementKind::Input) {
                    for (pin, pos) in pins.iter_mut().zip(inputs) {
                        pin.layout_position = Some(pos);
                    }
                }
                if let Some(pins) = self.elements.get_mut(&ElementKind::Output) {
                    for (pin, pos) in pins.iter_mut().zip(outputs) {
                        pin.layout_position = Some(pos);
                    }
                }
                self.layout = synth;
                None
            }
        };
        // a layout without an explicit title flag shows the title,
        // whichever branch produced it
        self.layout.title_enabled = explicit_title.unwrap_or(true);
    }

    /// Serialize this scope back to its document form.  Node identity
    /// becomes position in `allNodes`, the inverse of what
    /// reconstruction consumes.
    pub fn to_doc(&self) -> ScopeDoc {
        let index_by_ptr: HashMap<*const RefCell<Node>, usize> = self
            .all_nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (Rc::as_ptr(n), i))
            .collect();
        let index_of =
            |node: &NodeRef| -> Option<usize> { index_by_ptr.get(&Rc::as_ptr(node)).copied() };

        let mut doc = ScopeDoc::new(&self.id);
        doc.name = Some(self.name.clone());
        doc.is_main = self.is_main;
        doc.all_nodes = self
            .all_nodes
            .iter()
            .map(|n| {
                let n = n.borrow();
                NodeDoc {
                    x: n.x,
                    y: n.y,
                    kind: n.kind.tag(),
                    label: n.label.clone(),
                    connections: n.connections().iter().filter_map(&index_of).collect(),
                }
            })
            .collect();
        doc.wires = self
            .wires
            .iter()
            .filter_map(|w| {
                Some(WireDoc {
                    node1: index_of(&w.node1)?,
                    node2: index_of(&w.node2)?,
                    kind: w.kind.tag().to_string(),
                })
            })
            .collect();
        for kind in ElementKind::ALL {
            let records: Vec<ElementDoc> = self
                .elements_of(kind)
                .iter()
                .map(|el| el.to_doc(&index_of))
                .collect();
            doc.set_elements(kind.tag(), records);
        }
        doc.layout = Some(self.layout.to_doc());
        doc.verilog_metadata = self.verilog_metadata.clone();
        doc.testbench_data = self.testbench_data.clone();
        doc.restricted_circuit_elements_used = self.restricted_elements_used.clone();
        doc.folders = self
            .folders
            .folders()
            .iter()
            .map(|f| FolderDoc {
                id: f.id.clone(),
                name: f.name.clone(),
                parent_id: f.parent_id.clone(),
            })
            .collect();
        doc.subcircuit_map = self.folders.subcircuit_map().clone();
        doc
    }
}

fn param_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
