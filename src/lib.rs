// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Reconstruction core of the Gatework schematic editor: rebuilds live
//! circuit graphs (elements, shared connection nodes, wires, nested
//! subcircuits) from serialized project documents, including documents
//! written by older versions of the format, and maintains the
//! per-circuit folder tree that organizes subcircuits.

#![forbid(unsafe_code)]

pub mod common;
pub mod element;
pub mod folders;
pub mod json;
pub mod layout;
pub mod node;
pub mod project;
pub mod scope;
pub mod wire;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::element::{Direction, Element, ElementKind};
pub use self::folders::{Destination, Folder, FolderTree, MoveOutcome, TreeNode};
pub use self::layout::Layout;
pub use self::node::{Node, NodeKind, NodeOwner, NodeRef, NodeRegistry};
pub use self::project::{ClockSpecs, Host, NullHost, Project};
pub use self::scope::Scope;
pub use self::wire::{Wire, WireKind};
