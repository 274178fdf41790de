// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Circuit element kinds and the instantiation path that turns a
//! serialized element record into a live, wired element.
//!
//! The kind set is closed: a document tag either resolves to an
//! [`ElementKind`] (possibly after rectification of a retired tag) or
//! reconstruction of that scope fails loudly.  Documents are assumed to
//! have been produced by a compatible save routine; an unknown tag means
//! corruption, not a feature to skip.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use lazy_static::lazy_static;
use log::{debug, warn};
use serde_json::Value;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::json::{ElementDoc, NodeSlotDoc};
use crate::node::{Node, NodeKind, NodeOwner, NodeRef, NodeRegistry};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    Input,
    Output,
    ConstantVal,
    Button,
    Clock,
    AndGate,
    OrGate,
    NotGate,
    NandGate,
    NorGate,
    XorGate,
    XnorGate,
    Buffer,
    TriState,
    Multiplexer,
    Demultiplexer,
    Splitter,
    DflipFlop,
    TflipFlop,
    JkFlipFlop,
    SrFlipFlop,
    Rom,
    Ram,
    SubCircuit,
}

/// Retired type tags and their current equivalents, applied before any
/// kind lookup so documents written against old releases still resolve
/// to a constructible type.
const RECTIFIED_TAGS: &[(&str, &str)] = &[("FlipFlop", "DflipFlop"), ("Ram", "Rom")];

pub fn rectify_tag(tag: &str) -> &str {
    RECTIFIED_TAGS
        .iter()
        .find(|(old, _)| *old == tag)
        .map(|(_, new)| *new)
        .unwrap_or(tag)
}

lazy_static! {
    static ref KIND_BY_TAG: HashMap<&'static str, ElementKind> = ElementKind::ALL
        .iter()
        .map(|kind| (kind.tag(), *kind))
        .collect();
}

impl ElementKind {
    /// Every constructible kind, in the fixed order reconstruction and
    /// serialization iterate in.  Anything that walks "all kinds" walks
    /// this, never a hash map.
    pub const ALL: [ElementKind; 24] = [
        ElementKind::Input,
        ElementKind::Output,
        ElementKind::ConstantVal,
        ElementKind::Button,
        ElementKind::Clock,
        ElementKind::AndGate,
        ElementKind::OrGate,
        ElementKind::NotGate,
        ElementKind::NandGate,
        ElementKind::NorGate,
        ElementKind::XorGate,
        ElementKind::XnorGate,
        ElementKind::Buffer,
        ElementKind::TriState,
        ElementKind::Multiplexer,
        ElementKind::Demultiplexer,
        ElementKind::Splitter,
        ElementKind::DflipFlop,
        ElementKind::TflipFlop,
        ElementKind::JkFlipFlop,
        ElementKind::SrFlipFlop,
        ElementKind::Rom,
        ElementKind::Ram,
        ElementKind::SubCircuit,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Input => "Input",
            ElementKind::Output => "Output",
            ElementKind::ConstantVal => "ConstantVal",
            ElementKind::Button => "Button",
            ElementKind::Clock => "Clock",
            ElementKind::AndGate => "AndGate",
            ElementKind::OrGate => "OrGate",
            ElementKind::NotGate => "NotGate",
            ElementKind::NandGate => "NandGate",
            ElementKind::NorGate => "NorGate",
            ElementKind::XorGate => "XorGate",
            ElementKind::XnorGate => "XnorGate",
            ElementKind::Buffer => "Buffer",
            ElementKind::TriState => "TriState",
            ElementKind::Multiplexer => "Multiplexer",
            ElementKind::Demultiplexer => "Demultiplexer",
            ElementKind::Splitter => "Splitter",
            ElementKind::DflipFlop => "DflipFlop",
            ElementKind::TflipFlop => "TflipFlop",
            ElementKind::JkFlipFlop => "JKflipFlop",
            ElementKind::SrFlipFlop => "SRflipFlop",
            ElementKind::Rom => "Rom",
            ElementKind::Ram => "RAM",
            ElementKind::SubCircuit => "SubCircuit",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ElementKind> {
        KIND_BY_TAG.get(tag).copied()
    }

    /// The tags a document may store records of this kind under: the
    /// canonical tag, plus any retired tags that rectify to it.
    pub(crate) fn document_tags(&self) -> Vec<&'static str> {
        let mut tags = vec![self.tag()];
        tags.extend(
            RECTIFIED_TAGS
                .iter()
                .filter(|(_, new)| *new == self.tag())
                .map(|(old, _)| *old),
        );
        tags
    }
}

/// Resolve a document tag to a constructible kind, rectifying retired
/// tags first.  Failure is a document-corrupt fatal error for the
/// element's scope.
pub fn resolve_kind(tag: &str) -> Result<ElementKind> {
    let rectified = rectify_tag(tag);
    if rectified != tag {
        debug!("rectified element tag {tag:?} -> {rectified:?}");
    }
    ElementKind::from_tag(rectified).ok_or_else(|| {
        Error::new(
            ErrorKind::Document,
            ErrorCode::UnknownElementKind,
            Some(tag.to_string()),
        )
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

impl Direction {
    /// Canonical tokens are uppercase; the lowercase spellings are the
    /// legacy serialization and normalize to the same directions.
    pub fn from_token(token: &str) -> Option<Direction> {
        match token {
            "RIGHT" | "right" => Some(Direction::Right),
            "LEFT" | "left" => Some(Direction::Left),
            "UP" | "up" => Some(Direction::Up),
            "DOWN" | "down" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Direction::Right => "RIGHT",
            Direction::Left => "LEFT",
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum PortCount {
    One,
    Many(usize),
}

pub(crate) struct PortSpec {
    pub name: &'static str,
    pub role: NodeKind,
    pub count: PortCount,
}

pub(crate) struct ElementSpec {
    pub default_delay: u32,
    pub ports: &'static [PortSpec],
    pub overridable: &'static [&'static str],
}

const SOURCE_PORTS: &[PortSpec] = &[PortSpec {
    name: "output1",
    role: NodeKind::Output,
    count: PortCount::One,
}];

const SINK_PORTS: &[PortSpec] = &[PortSpec {
    name: "inp1",
    role: NodeKind::Input,
    count: PortCount::One,
}];

const GATE_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "inp",
        role: NodeKind::Input,
        count: PortCount::Many(2),
    },
    PortSpec {
        name: "output1",
        role: NodeKind::Output,
        count: PortCount::One,
    },
];

const UNARY_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "inp1",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "output1",
        role: NodeKind::Output,
        count: PortCount::One,
    },
];

const TRISTATE_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "inp1",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "state",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "output1",
        role: NodeKind::Output,
        count: PortCount::One,
    },
];

const MUX_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "inp",
        role: NodeKind::Input,
        count: PortCount::Many(2),
    },
    PortSpec {
        name: "controlSignalInput",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "output1",
        role: NodeKind::Output,
        count: PortCount::One,
    },
];

const DEMUX_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "input",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "controlSignalInput",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "output1",
        role: NodeKind::Output,
        count: PortCount::Many(2),
    },
];

const SPLITTER_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "inp1",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "outputs",
        role: NodeKind::Output,
        count: PortCount::Many(2),
    },
];

const DFF_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "clockInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "dInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "qOutput",
        role: NodeKind::Output,
        count: PortCount::One,
    },
    PortSpec {
        name: "qInvOutput",
        role: NodeKind::Output,
        count: PortCount::One,
    },
    PortSpec {
        name: "reset",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "preset",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "en",
        role: NodeKind::Input,
        count: PortCount::One,
    },
];

const TFF_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "clockInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "tInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "qOutput",
        role: NodeKind::Output,
        count: PortCount::One,
    },
    PortSpec {
        name: "qInvOutput",
        role: NodeKind::Output,
        count: PortCount::One,
    },
    PortSpec {
        name: "reset",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "preset",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "en",
        role: NodeKind::Input,
        count: PortCount::One,
    },
];

const JKFF_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "clockInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "jInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "kInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "qOutput",
        role: NodeKind::Output,
        count: PortCount::One,
    },
    PortSpec {
        name: "qInvOutput",
        role: NodeKind::Output,
        count: PortCount::One,
    },
    PortSpec {
        name: "reset",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "preset",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "en",
        role: NodeKind::Input,
        count: PortCount::One,
    },
];

const SRFF_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "sInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "rInp",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "qOutput",
        role: NodeKind::Output,
        count: PortCount::One,
    },
    PortSpec {
        name: "qInvOutput",
        role: NodeKind::Output,
        count: PortCount::One,
    },
    PortSpec {
        name: "en",
        role: NodeKind::Input,
        count: PortCount::One,
    },
];

const ROM_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "memAddr",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "en",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "dataOut",
        role: NodeKind::Output,
        count: PortCount::One,
    },
];

const RAM_PORTS: &[PortSpec] = &[
    PortSpec {
        name: "address",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "dataIn",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "write",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "reset",
        role: NodeKind::Input,
        count: PortCount::One,
    },
    PortSpec {
        name: "dataOut",
        role: NodeKind::Output,
        count: PortCount::One,
    },
];

// SubCircuit ports depend on the referenced scope and are supplied by
// the nested-scope loader.
const NO_PORTS: &[PortSpec] = &[];

const NO_PROPS: &[&str] = &[];
const IO_PIN_PROPS: &[&str] = &["state", "layoutProperties"];
const OUTPUT_PIN_PROPS: &[&str] = &["layoutProperties"];
const CONST_PROPS: &[&str] = &["state"];
const MEM_PROPS: &[&str] = &["data"];
const MUX_PROPS: &[&str] = &["controlSignalSize"];
const SPLITTER_PROPS: &[&str] = &["bitWidthSplit"];

pub(crate) fn spec(kind: ElementKind) -> &'static ElementSpec {
    use ElementKind::*;
    match kind {
        Input => &ElementSpec {
            default_delay: 0,
            ports: SOURCE_PORTS,
            overridable: IO_PIN_PROPS,
        },
        Output => &ElementSpec {
            default_delay: 0,
            ports: SINK_PORTS,
            overridable: OUTPUT_PIN_PROPS,
        },
        ConstantVal => &ElementSpec {
            default_delay: 0,
            ports: SOURCE_PORTS,
            overridable: CONST_PROPS,
        },
        Button => &ElementSpec {
            default_delay: 0,
            ports: SOURCE_PORTS,
            overridable: CONST_PROPS,
        },
        Clock => &ElementSpec {
            default_delay: 0,
            ports: SOURCE_PORTS,
            overridable: NO_PROPS,
        },
        AndGate | OrGate | NandGate | NorGate | XorGate | XnorGate => &ElementSpec {
            default_delay: 10,
            ports: GATE_PORTS,
            overridable: NO_PROPS,
        },
        NotGate | Buffer => &ElementSpec {
            default_delay: 10,
            ports: UNARY_PORTS,
            overridable: NO_PROPS,
        },
        TriState => &ElementSpec {
            default_delay: 10,
            ports: TRISTATE_PORTS,
            overridable: NO_PROPS,
        },
        Multiplexer => &ElementSpec {
            default_delay: 10,
            ports: MUX_PORTS,
            overridable: MUX_PROPS,
        },
        Demultiplexer => &ElementSpec {
            default_delay: 10,
            ports: DEMUX_PORTS,
            overridable: MUX_PROPS,
        },
        Splitter => &ElementSpec {
            default_delay: 10,
            ports: SPLITTER_PORTS,
            overridable: SPLITTER_PROPS,
        },
        DflipFlop => &ElementSpec {
            default_delay: 10,
            ports: DFF_PORTS,
            overridable: NO_PROPS,
        },
        TflipFlop => &ElementSpec {
            default_delay: 10,
            ports: TFF_PORTS,
            overridable: NO_PROPS,
        },
        JkFlipFlop => &ElementSpec {
            default_delay: 10,
            ports: JKFF_PORTS,
            overridable: NO_PROPS,
        },
        SrFlipFlop => &ElementSpec {
            default_delay: 10,
            ports: SRFF_PORTS,
            overridable: NO_PROPS,
        },
        Rom => &ElementSpec {
            default_delay: 100,
            ports: ROM_PORTS,
            overridable: MEM_PROPS,
        },
        Ram => &ElementSpec {
            default_delay: 100,
            ports: RAM_PORTS,
            overridable: MEM_PROPS,
        },
        SubCircuit => &ElementSpec {
            default_delay: 0,
            ports: NO_PORTS,
            overridable: NO_PROPS,
        },
    }
}

/// The live nodes behind one connection-bearing property.
#[derive(Debug)]
pub enum SlotNodes {
    One(NodeRef),
    Many(Vec<NodeRef>),
}

#[derive(Debug)]
pub struct Slot {
    pub name: String,
    pub role: NodeKind,
    pub nodes: SlotNodes,
}

#[derive(Debug)]
pub struct Element {
    pub kind: ElementKind,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub label: String,
    pub label_direction: Direction,
    pub delay: u32,
    pub bit_width: u32,
    pub props: BTreeMap<String, Value>,
    pub slots: Vec<Slot>,
    /// id of the referenced scope, for SubCircuit elements
    pub scope_ref: Option<String>,
    pub subcircuit_metadata: Option<Value>,
    /// placement of this pin on the owning scope's subcircuit face
    /// (Input/Output elements only)
    pub layout_position: Option<(i32, i32)>,
}

impl Element {
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// All live nodes this element holds, slot order, flattened.
    pub fn nodes(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        for slot in &self.slots {
            match &slot.nodes {
                SlotNodes::One(n) => out.push(n.clone()),
                SlotNodes::Many(v) => out.extend(v.iter().cloned()),
            }
        }
        out
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Element-type-specific layout normalization, run once after
    /// geometry and direction are assigned.
    pub(crate) fn fix_direction(&mut self) {
        if self.kind == ElementKind::SubCircuit {
            // subcircuit faces are always drawn upright
            self.direction = Direction::Right;
        }
    }

    pub(crate) fn to_doc(&self, index_of: &impl Fn(&NodeRef) -> Option<usize>) -> ElementDoc {
        let mut doc = ElementDoc::new(self.kind.tag(), self.x, self.y);
        doc.label = self.label.clone();
        doc.label_direction = Some(self.label_direction.tag().to_string());
        doc.propagation_delay = Some(self.delay);
        doc.custom_data.constructor_parameters = match self.kind {
            ElementKind::SubCircuit => self
                .scope_ref
                .iter()
                .map(|id| Value::from(id.as_str()))
                .collect(),
            _ => vec![
                Value::from(self.direction.tag()),
                Value::from(self.bit_width),
            ],
        };
        doc.custom_data.values = self.props.clone();
        if let Some((x, y)) = self.layout_position {
            doc.custom_data
                .values
                .insert("layoutProperties".to_string(), serde_json::json!({"x": x, "y": y}));
        }
        for slot in &self.slots {
            let entry = match &slot.nodes {
                SlotNodes::One(n) => index_of(n).map(NodeSlotDoc::One),
                SlotNodes::Many(v) => {
                    Some(NodeSlotDoc::Many(v.iter().filter_map(index_of).collect()))
                }
            };
            if let Some(entry) = entry {
                doc.custom_data.nodes.insert(slot.name.clone(), entry);
            }
        }
        doc.subcircuit_metadata = self.subcircuit_metadata.clone();
        doc
    }
}

pub(crate) struct OwnedPortSpec {
    pub name: String,
    pub role: NodeKind,
    pub count: PortCount,
}

/// Scope-side state instantiation threads through: the scope's node
/// list (fresh ports are registered here, and discarded again when a
/// record's old node identity replaces them) and the registry that
/// resolves those old identities.
pub(crate) struct InstantiationCtx<'a> {
    pub nodes: &'a mut Vec<NodeRef>,
    pub registry: &'a NodeRegistry,
}

/// Instantiate an element record under `tag`, with the kind's built-in
/// port shape.  SubCircuit records go through the nested-scope loader
/// instead, which supplies ports from the referenced scope.
pub(crate) fn instantiate(
    tag: &str,
    doc: &ElementDoc,
    ctx: &mut InstantiationCtx,
) -> Result<Element> {
    let kind = resolve_kind(tag)?;
    let ports = spec(kind)
        .ports
        .iter()
        .map(|p| OwnedPortSpec {
            name: p.name.to_string(),
            role: p.role,
            count: p.count,
        })
        .collect();
    instantiate_with_ports(kind, doc, ports, ctx)
}

pub(crate) fn instantiate_with_ports(
    kind: ElementKind,
    doc: &ElementDoc,
    ports: Vec<OwnedPortSpec>,
    ctx: &mut InstantiationCtx,
) -> Result<Element> {
    let espec = spec(kind);
    let params = &doc.custom_data.constructor_parameters;

    // the first two constructor parameters of an ordinary element are
    // its orientation token and bit width; a SubCircuit's first
    // parameter is the referenced scope id, consumed by the caller
    let (direction, bit_width) = if kind == ElementKind::SubCircuit {
        (Direction::Right, 1)
    } else {
        let direction = params
            .first()
            .and_then(Value::as_str)
            .and_then(Direction::from_token)
            .unwrap_or(Direction::Right);
        let bit_width = params
            .get(1)
            .and_then(Value::as_u64)
            .map(|w| w as u32)
            .unwrap_or(1);
        (direction, bit_width)
    };

    let mut el = Element {
        kind,
        x: doc.x,
        y: doc.y,
        direction,
        label: doc.label.clone(),
        label_direction: direction.opposite(),
        // an explicit zero is a real zero; only absence falls back to
        // the kind's default
        delay: doc.propagation_delay.unwrap_or(espec.default_delay),
        bit_width,
        props: BTreeMap::new(),
        slots: Vec::new(),
        scope_ref: None,
        subcircuit_metadata: None,
        layout_position: None,
    };

    if let Some(token) = doc.label_direction.as_deref()
        && let Some(dir) = Direction::from_token(token)
    {
        el.label_direction = dir;
    }

    for p in &ports {
        let nodes = match p.count {
            PortCount::One => SlotNodes::One(fresh_port(kind, p.role, doc, ctx)),
            PortCount::Many(n) => {
                SlotNodes::Many((0..n).map(|_| fresh_port(kind, p.role, doc, ctx)).collect())
            }
        };
        el.slots.push(Slot {
            name: p.name.clone(),
            role: p.role,
            nodes,
        });
    }

    el.fix_direction();

    for (name, value) in doc.custom_data.values.iter() {
        if !espec.overridable.contains(&name.as_str()) {
            warn!(
                "{}: ignoring non-overridable property {:?}",
                kind.tag(),
                name
            );
            continue;
        }
        if name == "layoutProperties" {
            el.layout_position = value
                .get("x")
                .and_then(Value::as_i64)
                .zip(value.get("y").and_then(Value::as_i64))
                .map(|(x, y)| (x as i32, y as i32));
        } else {
            el.props.insert(name.clone(), value.clone());
        }
    }

    for (slot_name, slot_doc) in doc.custom_data.nodes.iter() {
        adopt_slot(&mut el, slot_name, slot_doc, ctx)?;
    }

    if let Some(meta) = &doc.subcircuit_metadata {
        el.subcircuit_metadata = Some(meta.clone());
    }

    Ok(el)
}

fn fresh_port(
    kind: ElementKind,
    role: NodeKind,
    doc: &ElementDoc,
    ctx: &mut InstantiationCtx,
) -> NodeRef {
    let node = Node::new(role, doc.x, doc.y);
    node.borrow_mut().owner = NodeOwner::Element(kind);
    ctx.nodes.push(node.clone());
    node
}

/// Re-point one connection-bearing slot at the registry's live nodes
/// for the record's old identities, discarding the freshly constructed
/// stand-ins.  This is what restores shared-wire topology across
/// elements that were serialized independently.
fn adopt_slot(
    el: &mut Element,
    name: &str,
    slot_doc: &NodeSlotDoc,
    ctx: &mut InstantiationCtx,
) -> Result<()> {
    let kind = el.kind;
    let Some(slot) = el.slots.iter_mut().find(|s| s.name == name) else {
        warn!(
            "{}: record names unknown connection slot {:?}",
            kind.tag(),
            name
        );
        return Ok(());
    };
    match (&mut slot.nodes, slot_doc) {
        (SlotNodes::One(current), NodeSlotDoc::One(index)) => {
            let old = ctx.registry.resolve(*index)?;
            adopt(&old, kind);
            discard_fresh(ctx.nodes, current);
            *current = old;
        }
        (SlotNodes::Many(current), NodeSlotDoc::Many(indices)) => {
            for (i, &index) in indices.iter().enumerate() {
                let old = ctx.registry.resolve(index)?;
                adopt(&old, kind);
                if i < current.len() {
                    discard_fresh(ctx.nodes, &current[i]);
                    current[i] = old;
                } else {
                    // older documents may carry more ports than the
                    // default construction; grow to match
                    current.push(old);
                }
            }
        }
        _ => {
            warn!(
                "{}: connection slot {:?} has mismatched shape",
                kind.tag(),
                name
            );
        }
    }
    Ok(())
}

// Claiming ownership exempts the node from the buggy-node purge; its
// serialized kind stays authoritative (a node shared between two
// elements is adopted twice, and the roles need not agree).
fn adopt(node: &NodeRef, kind: ElementKind) {
    node.borrow_mut().owner = NodeOwner::Element(kind);
}

fn discard_fresh(nodes: &mut Vec<NodeRef>, target: &NodeRef) {
    nodes.retain(|n| !Rc::ptr_eq(n, target));
}
