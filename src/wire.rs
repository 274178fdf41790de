// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::node::NodeRef;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WireKind {
    Horizontal,
    Vertical,
    Diagonal,
}

impl WireKind {
    pub fn tag(&self) -> &'static str {
        match self {
            WireKind::Horizontal => "horizontal",
            WireKind::Vertical => "vertical",
            WireKind::Diagonal => "diagonal",
        }
    }
}

/// A wire between two nodes.  Endpoint coordinates and orientation are
/// caches derived from the live endpoints; [`Wire::refresh`] recomputes
/// them once both endpoints have settled.
#[derive(Debug)]
pub struct Wire {
    pub node1: NodeRef,
    pub node2: NodeRef,
    pub kind: WireKind,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Wire {
    pub fn new(node1: NodeRef, node2: NodeRef) -> Wire {
        let mut wire = Wire {
            node1,
            node2,
            kind: WireKind::Diagonal,
            x1: 0,
            y1: 0,
            x2: 0,
            y2: 0,
        };
        wire.refresh();
        wire
    }

    pub fn refresh(&mut self) {
        let (x1, y1) = {
            let n = self.node1.borrow();
            (n.x, n.y)
        };
        let (x2, y2) = {
            let n = self.node2.borrow();
            (n.x, n.y)
        };
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self.kind = if y1 == y2 {
            WireKind::Horizontal
        } else if x1 == x2 {
            WireKind::Vertical
        } else {
            WireKind::Diagonal
        };
    }
}
