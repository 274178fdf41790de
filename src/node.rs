// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Connection points and the per-scope node registry.
//!
//! A scope's `Vec<NodeRef>` is the single strong owner of its nodes;
//! connection lists hold weak references, so deleting a node never
//! leaves a reference cycle alive.  During reconstruction, all node
//! lookups go through [`NodeRegistry`] so that two element records
//! referencing the same serialized node index end up holding the same
//! live `Rc`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::element::ElementKind;
use crate::json::NodeDoc;
use crate::wire::Wire;

pub type NodeRef = Rc<RefCell<Node>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Input,
    Output,
    Intermediate,
}

impl NodeKind {
    pub fn from_tag(tag: u8) -> NodeKind {
        match tag {
            0 => NodeKind::Input,
            1 => NodeKind::Output,
            _ => NodeKind::Intermediate,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            NodeKind::Input => 0,
            NodeKind::Output => 1,
            NodeKind::Intermediate => 2,
        }
    }
}

/// Who a node belongs to: a typed element that claimed it as a port, or
/// the free junction holder for intermediate wire points.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeOwner {
    Junction,
    Element(ElementKind),
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub owner: NodeOwner,
    pub x: i32,
    pub y: i32,
    pub label: Option<String>,
    pub(crate) connections: SmallVec<[Weak<RefCell<Node>>; 4]>,
}

impl Node {
    pub fn new(kind: NodeKind, x: i32, y: i32) -> NodeRef {
        Rc::new(RefCell::new(Node {
            kind,
            owner: NodeOwner::Junction,
            x,
            y,
            label: None,
            connections: SmallVec::new(),
        }))
    }

    /// Live peers, in insertion order.  Dead weak references (peers
    /// deleted since the connection was made) are skipped.
    pub fn connections(&self) -> Vec<NodeRef> {
        self.connections
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    fn is_connected_to(&self, other: &NodeRef) -> bool {
        self.connections
            .iter()
            .filter_map(Weak::upgrade)
            .any(|peer| Rc::ptr_eq(&peer, other))
    }
}

/// Connect two nodes bidirectionally.  Reconnecting an existing pair is
/// a no-op, so repeated adjacency records never duplicate an edge.
pub fn connect(a: &NodeRef, b: &NodeRef) {
    if Rc::ptr_eq(a, b) {
        return;
    }
    if !a.borrow().is_connected_to(b) {
        a.borrow_mut().connections.push(Rc::downgrade(b));
    }
    if !b.borrow().is_connected_to(a) {
        b.borrow_mut().connections.push(Rc::downgrade(a));
    }
}

/// Resolves serialized node indices to live nodes, handing out the same
/// `Rc` for every lookup of the same index.
pub struct NodeRegistry {
    nodes: Vec<NodeRef>,
}

impl NodeRegistry {
    /// Build live nodes from the document's ordered node records,
    /// preserving array order.  Connections are wired separately so
    /// every index they mention already resolves.
    pub fn build(docs: &[NodeDoc]) -> NodeRegistry {
        let nodes = docs
            .iter()
            .map(|doc| {
                let node = Node::new(NodeKind::from_tag(doc.kind), doc.x, doc.y);
                node.borrow_mut().label = doc.label.clone();
                node
            })
            .collect();
        NodeRegistry { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn resolve(&self, index: usize) -> Result<NodeRef> {
        self.nodes.get(index).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::Document,
                ErrorCode::BadNodeIndex,
                Some(format!("node index {} of {}", index, self.nodes.len())),
            )
        })
    }

    /// Wire the serialized adjacency of every node record.
    pub fn wire_connections(&self, docs: &[NodeDoc]) -> Result<()> {
        for (i, doc) in docs.iter().enumerate() {
            let node = &self.nodes[i];
            for &peer_index in doc.connections.iter() {
                let peer = self.resolve(peer_index)?;
                connect(node, &peer);
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }
}

/// Remove `node` from the scope: detach it from its peers and drop any
/// wire using it as an endpoint.
pub(crate) fn delete_node(index: usize, nodes: &mut Vec<NodeRef>, wires: &mut Vec<Wire>) {
    let node = nodes.remove(index);
    for peer in node.borrow().connections() {
        peer.borrow_mut()
            .connections
            .retain(|w| w.upgrade().is_some_and(|n| !Rc::ptr_eq(&n, &node)));
    }
    wires.retain(|w| !Rc::ptr_eq(&w.node1, &node) && !Rc::ptr_eq(&w.node2, &node));
}

/// Purge nodes still owned by the free junction holder whose kind claims
/// a port role.  Historically malformed documents produce these; finding
/// none is the normal case.  Whenever a deletion changes the node count
/// the scan restarts from the front, since deletions can cascade through
/// wire removal.  Returns the number of nodes purged.
pub fn purge_buggy_nodes(nodes: &mut Vec<NodeRef>, wires: &mut Vec<Wire>) -> usize {
    let mut purged = 0;
    let mut i = 0;
    while i < nodes.len() {
        let buggy = {
            let node = nodes[i].borrow();
            node.owner == NodeOwner::Junction && node.kind != NodeKind::Intermediate
        };
        if buggy {
            delete_node(i, nodes, wires);
            purged += 1;
            i = 0;
        } else {
            i += 1;
        }
    }
    purged
}
