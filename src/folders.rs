// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Per-scope folder tree for organizing subcircuits.
//!
//! The tree is storage plus a map: a flat folder collection (each
//! folder naming an optional parent) and a subcircuit-id → folder-id
//! map, where absence from the map means "in the implicit root".  All
//! mutation goes through the operations here, which validate first and
//! mutate second, so a failed operation leaves state untouched.
//! Display traversal is self-healing: a folder whose declared parent is
//! missing (or sits on a cycle) is shown at root rather than dropped,
//! so no subcircuit ever becomes unreachable.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::common::Result;
use crate::folder_err;
use crate::json::FolderDoc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderTree {
    folders: Vec<Folder>,
    subcircuit_map: BTreeMap<String, String>,
    next_id: u64,
}

/// Where a subcircuit is being moved to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Destination<'a> {
    Root,
    Folder(&'a str),
}

/// Whether a move changed anything.  Callers schedule persistence only
/// on `Moved`; a no-op move must not trigger a backup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Unchanged,
}

/// One level of the display tree.  `folder_id` is `None` only at the
/// implicit root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub folder_id: Option<String>,
    pub name: String,
    pub children: Vec<TreeNode>,
    pub subcircuits: Vec<String>,
}

impl FolderTree {
    pub fn from_doc(folders: &[FolderDoc], subcircuit_map: &BTreeMap<String, String>) -> FolderTree {
        FolderTree {
            folders: folders
                .iter()
                .map(|f| Folder {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    parent_id: f.parent_id.clone(),
                })
                .collect(),
            subcircuit_map: subcircuit_map.clone(),
            next_id: 0,
        }
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn subcircuit_map(&self) -> &BTreeMap<String, String> {
        &self.subcircuit_map
    }

    /// Folder the subcircuit lives in, or `None` for root.
    pub fn folder_of(&self, subcircuit_id: &str) -> Option<&str> {
        self.subcircuit_map.get(subcircuit_id).map(String::as_str)
    }

    // Documents carry arbitrary id strings, so a fresh id is probed
    // against the collection rather than assumed unique.
    fn fresh_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("folder-{}", self.next_id);
            if self.folder(&id).is_none() {
                return id;
            }
        }
    }

    /// Create a folder, optionally under `parent_id`, and return the
    /// new folder's id.
    pub fn create(&mut self, name: &str, parent_id: Option<&str>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return folder_err!(EmptyFolderName);
        }
        if let Some(parent) = parent_id
            && self.folder(parent).is_none()
        {
            return folder_err!(MissingFolder, parent.to_string());
        }
        let id = self.fresh_id();
        self.folders.push(Folder {
            id: id.clone(),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        });
        Ok(id)
    }

    pub fn rename(&mut self, folder_id: &str, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return folder_err!(EmptyFolderName);
        }
        match self.folders.iter_mut().find(|f| f.id == folder_id) {
            Some(folder) => {
                folder.name = new_name.to_string();
                Ok(())
            }
            None => folder_err!(MissingFolder, folder_id.to_string()),
        }
    }

    /// Delete a folder.  Subcircuits mapped to it go back to root, and
    /// its child folders are promoted to its parent, in the same
    /// operation; nothing is ever left referencing the deleted id.
    pub fn delete(&mut self, folder_id: &str) -> Result<()> {
        let Some(pos) = self.folders.iter().position(|f| f.id == folder_id) else {
            return folder_err!(MissingFolder, folder_id.to_string());
        };
        let parent_id = self.folders[pos].parent_id.clone();
        self.folders.remove(pos);
        for folder in self.folders.iter_mut() {
            if folder.parent_id.as_deref() == Some(folder_id) {
                folder.parent_id = parent_id.clone();
            }
        }
        self.subcircuit_map.retain(|_, fid| fid != folder_id);
        Ok(())
    }

    /// Move a subcircuit to a folder or back to root.  `loaded` is the
    /// set of subcircuit ids that currently exist; moving anything else
    /// is a validation failure.  A move to the current container is a
    /// no-op and reports `Unchanged` so the caller skips persistence.
    pub fn move_subcircuit(
        &mut self,
        subcircuit_id: &str,
        destination: Destination,
        loaded: &BTreeSet<String>,
    ) -> Result<MoveOutcome> {
        if !loaded.contains(subcircuit_id) {
            return folder_err!(MissingSubcircuit, subcircuit_id.to_string());
        }
        match destination {
            Destination::Root => {
                if self.subcircuit_map.remove(subcircuit_id).is_some() {
                    Ok(MoveOutcome::Moved)
                } else {
                    Ok(MoveOutcome::Unchanged)
                }
            }
            Destination::Folder(folder_id) => {
                if self.folder(folder_id).is_none() {
                    return folder_err!(MissingFolder, folder_id.to_string());
                }
                if self.folder_of(subcircuit_id) == Some(folder_id) {
                    return Ok(MoveOutcome::Unchanged);
                }
                self.subcircuit_map
                    .insert(subcircuit_id.to_string(), folder_id.to_string());
                Ok(MoveOutcome::Moved)
            }
        }
    }

    /// Build the display tree.  `loaded` is the set of subcircuit ids
    /// that currently exist: stale map entries are tolerated in storage
    /// but never rendered, and loaded subcircuits whose map entry
    /// references a missing folder show up at root.
    pub fn tree(&self, loaded: &BTreeSet<String>) -> TreeNode {
        let ids: HashSet<&str> = self.folders.iter().map(|f| f.id.as_str()).collect();

        let mut root_children: Vec<&Folder> = Vec::new();
        let mut by_parent: HashMap<&str, Vec<&Folder>> = HashMap::new();
        for folder in self.folders.iter() {
            match folder.parent_id.as_deref() {
                // a dangling parent heals to root rather than dropping
                // the folder
                None => root_children.push(folder),
                Some(parent) if !ids.contains(parent) => root_children.push(folder),
                Some(parent) => by_parent.entry(parent).or_default().push(folder),
            }
        }

        let subs_of = |folder_id: &str| -> Vec<String> {
            self.subcircuit_map
                .iter()
                .filter(|(sub, fid)| fid.as_str() == folder_id && loaded.contains(*sub))
                .map(|(sub, _)| sub.clone())
                .collect()
        };

        fn build(
            folder: &Folder,
            by_parent: &HashMap<&str, Vec<&Folder>>,
            visited: &mut HashSet<String>,
            subs_of: &dyn Fn(&str) -> Vec<String>,
        ) -> TreeNode {
            visited.insert(folder.id.clone());
            let children = by_parent
                .get(folder.id.as_str())
                .map(|kids| {
                    let mut out = Vec::new();
                    for k in kids.iter() {
                        if !visited.contains(&k.id) {
                            out.push(build(k, by_parent, visited, subs_of));
                        }
                    }
                    out
                })
                .unwrap_or_default();
            TreeNode {
                folder_id: Some(folder.id.clone()),
                name: folder.name.clone(),
                children,
                subcircuits: subs_of(&folder.id),
            }
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut children: Vec<TreeNode> = root_children
            .iter()
            .map(|f| build(f, &by_parent, &mut visited, &subs_of))
            .collect();

        // folders on a parent cycle are reachable from no root child;
        // surface them at root so their contents stay visible
        for folder in self.folders.iter() {
            if !visited.contains(&folder.id) {
                children.push(build(folder, &by_parent, &mut visited, &subs_of));
            }
        }

        let root_subs = loaded
            .iter()
            .filter(|sub| match self.subcircuit_map.get(*sub) {
                None => true,
                Some(fid) => !ids.contains(fid.as_str()),
            })
            .cloned()
            .collect();

        TreeNode {
            folder_id: None,
            name: String::new(),
            children,
            subcircuits: root_subs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;

    fn loaded(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_validates_name_and_parent() {
        let mut tree = FolderTree::default();
        assert_eq!(
            ErrorCode::EmptyFolderName,
            tree.create("   ", None).unwrap_err().code
        );
        assert_eq!(
            ErrorCode::MissingFolder,
            tree.create("alu", Some("nope")).unwrap_err().code
        );
        assert!(tree.folders().is_empty());

        let top = tree.create("datapath", None).unwrap();
        let nested = tree.create("alu", Some(&top)).unwrap();
        assert_ne!(top, nested);
        assert_eq!(Some(top.as_str()), tree.folder(&nested).unwrap().parent_id.as_deref());
    }

    #[test]
    fn test_rename_in_place() {
        let mut tree = FolderTree::default();
        let id = tree.create("datapath", None).unwrap();
        assert_eq!(
            ErrorCode::EmptyFolderName,
            tree.rename(&id, " ").unwrap_err().code
        );
        tree.rename(&id, "control").unwrap();
        assert_eq!("control", tree.folder(&id).unwrap().name);
        assert_eq!(
            ErrorCode::MissingFolder,
            tree.rename("nope", "x").unwrap_err().code
        );
    }

    #[test]
    fn test_delete_reassigns_subcircuits_and_promotes_children() {
        let mut tree = FolderTree::default();
        let top = tree.create("datapath", None).unwrap();
        let mid = tree.create("alu", Some(&top)).unwrap();
        let leaf = tree.create("adders", Some(&mid)).unwrap();

        let subs = loaded(&["sub-a", "sub-b"]);
        tree.move_subcircuit("sub-a", Destination::Folder(&mid), &subs)
            .unwrap();
        tree.move_subcircuit("sub-b", Destination::Folder(&mid), &subs)
            .unwrap();

        tree.delete(&mid).unwrap();

        // both subcircuits are back at root
        assert!(tree.subcircuit_map().is_empty());
        // the child folder was promoted to the deleted folder's parent
        assert_eq!(
            Some(top.as_str()),
            tree.folder(&leaf).unwrap().parent_id.as_deref()
        );
        // nothing still references the deleted id
        assert!(
            tree.folders()
                .iter()
                .all(|f| f.parent_id.as_deref() != Some(mid.as_str()))
        );
    }

    #[test]
    fn test_move_idempotence() {
        let mut tree = FolderTree::default();
        let id = tree.create("datapath", None).unwrap();
        let subs = loaded(&["sub-a"]);

        assert_eq!(
            MoveOutcome::Moved,
            tree.move_subcircuit("sub-a", Destination::Folder(&id), &subs)
                .unwrap()
        );
        let before = tree.subcircuit_map().clone();
        assert_eq!(
            MoveOutcome::Unchanged,
            tree.move_subcircuit("sub-a", Destination::Folder(&id), &subs)
                .unwrap()
        );
        assert_eq!(before, *tree.subcircuit_map());

        // root -> root is likewise a no-op
        assert_eq!(
            MoveOutcome::Moved,
            tree.move_subcircuit("sub-a", Destination::Root, &subs).unwrap()
        );
        assert_eq!(
            MoveOutcome::Unchanged,
            tree.move_subcircuit("sub-a", Destination::Root, &subs).unwrap()
        );
    }

    #[test]
    fn test_move_failures_leave_state_unchanged() {
        let mut tree = FolderTree::default();
        let id = tree.create("datapath", None).unwrap();
        let subs = loaded(&["sub-a"]);
        tree.move_subcircuit("sub-a", Destination::Folder(&id), &subs)
            .unwrap();
        let before = tree.clone();

        assert_eq!(
            ErrorCode::MissingSubcircuit,
            tree.move_subcircuit("ghost", Destination::Root, &subs)
                .unwrap_err()
                .code
        );
        assert_eq!(
            ErrorCode::MissingFolder,
            tree.move_subcircuit("sub-a", Destination::Folder("nope"), &subs)
                .unwrap_err()
                .code
        );
        assert_eq!(before, tree);
    }

    #[test]
    fn test_tree_self_heals_dangling_parent() {
        let docs = vec![
            FolderDoc {
                id: "f1".to_string(),
                name: "orphaned".to_string(),
                parent_id: Some("gone".to_string()),
            },
            FolderDoc {
                id: "f2".to_string(),
                name: "ok".to_string(),
                parent_id: None,
            },
        ];
        let mut map = BTreeMap::new();
        map.insert("sub-a".to_string(), "f1".to_string());
        let tree = FolderTree::from_doc(&docs, &map);

        let display = tree.tree(&loaded(&["sub-a"]));
        let names: Vec<&str> = display.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(vec!["orphaned", "ok"], names);
        // the subcircuit inside the healed folder is still reachable
        assert_eq!(vec!["sub-a".to_string()], display.children[0].subcircuits);
    }

    #[test]
    fn test_tree_self_heals_cycles() {
        let docs = vec![
            FolderDoc {
                id: "a".to_string(),
                name: "a".to_string(),
                parent_id: Some("b".to_string()),
            },
            FolderDoc {
                id: "b".to_string(),
                name: "b".to_string(),
                parent_id: Some("a".to_string()),
            },
        ];
        let tree = FolderTree::from_doc(&docs, &BTreeMap::new());
        let display = tree.tree(&BTreeSet::new());

        // both folders appear exactly once
        fn count(node: &TreeNode, id: &str) -> usize {
            let here = usize::from(node.folder_id.as_deref() == Some(id));
            here + node.children.iter().map(|c| count(c, id)).sum::<usize>()
        }
        assert_eq!(1, count(&display, "a"));
        assert_eq!(1, count(&display, "b"));
    }

    #[test]
    fn test_tree_filters_stale_map_entries() {
        let mut tree = FolderTree::default();
        let id = tree.create("datapath", None).unwrap();
        let subs = loaded(&["sub-a", "sub-b"]);
        tree.move_subcircuit("sub-a", Destination::Folder(&id), &subs)
            .unwrap();
        tree.move_subcircuit("sub-b", Destination::Folder(&id), &subs)
            .unwrap();

        // sub-b no longer exists; its stale entry stays in storage but
        // is not rendered
        let display = tree.tree(&loaded(&["sub-a"]));
        assert_eq!(vec!["sub-a".to_string()], display.children[0].subcircuits);
        assert_eq!(2, tree.subcircuit_map().len());
    }

    #[test]
    fn test_fresh_ids_skip_document_ids() {
        let docs = vec![FolderDoc {
            id: "folder-1".to_string(),
            name: "taken".to_string(),
            parent_id: None,
        }];
        let mut tree = FolderTree::from_doc(&docs, &BTreeMap::new());
        let id = tree.create("new", None).unwrap();
        assert_ne!("folder-1", id);
    }
}
