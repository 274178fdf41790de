// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Project-level loading and cross-scope state.
//!
//! Scopes reconstruct strictly in document order; a subcircuit may only
//! reference a scope that appears earlier in the list.  The "currently
//! active scope" lives here as an owned field, never as a global: the
//! loader updates it as scopes come up, and explicit focus switches
//! update it afterwards.

use std::collections::BTreeSet;

use log::debug;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::element::ElementKind;
use crate::folders::{Destination, MoveOutcome};
use crate::json::ProjectDoc;
use crate::scope::Scope;

pub const DEFAULT_PROJECT_NAME: &str = "Untitled";
pub const DEFAULT_CLOCK_PERIOD: u32 = 500;

/// Collaborators the core drives but does not implement: the numeric
/// simulation pass, persistence scheduling, and the transient-status
/// surface of the UI.
pub trait Host {
    fn run_simulation(&mut self, scope: &Scope);
    fn schedule_backup(&mut self);
    fn show_message(&mut self, message: &str);
}

/// Host that does nothing, for tests and headless loads.
#[derive(Default)]
pub struct NullHost;

impl Host for NullHost {
    fn run_simulation(&mut self, _scope: &Scope) {}
    fn schedule_backup(&mut self) {}
    fn show_message(&mut self, _message: &str) {}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockSpecs {
    pub time_period: u32,
    pub clock_enabled: bool,
}

impl Default for ClockSpecs {
    fn default() -> Self {
        ClockSpecs {
            time_period: DEFAULT_CLOCK_PERIOD,
            clock_enabled: true,
        }
    }
}

pub struct Project {
    pub name: String,
    pub project_id: Option<String>,
    pub scopes: Vec<Scope>,
    pub clock: ClockSpecs,
    /// scope ids in UI tab order
    pub tab_order: Vec<String>,
    /// element tags whose use is flagged per scope after load
    pub restricted_elements: BTreeSet<String>,
    active_scope: Option<String>,
}

impl Project {
    pub fn new(name: &str) -> Project {
        Project {
            name: name.to_string(),
            project_id: None,
            scopes: Vec::new(),
            clock: ClockSpecs::default(),
            tab_order: Vec::new(),
            restricted_elements: BTreeSet::new(),
            active_scope: None,
        }
    }

    pub fn scope(&self, id: &str) -> Option<&Scope> {
        self.scopes.iter().find(|s| s.id == id)
    }

    fn scope_index(&self, id: &str) -> Result<usize> {
        self.scopes.iter().position(|s| s.id == id).ok_or_else(|| {
            Error::new(
                ErrorKind::Scope,
                ErrorCode::DoesNotExist,
                Some(id.to_string()),
            )
        })
    }

    pub fn active_scope_id(&self) -> Option<&str> {
        self.active_scope.as_deref()
    }

    pub fn active_scope(&self) -> Option<&Scope> {
        self.active_scope.as_deref().and_then(|id| self.scope(id))
    }

    pub fn focus(&mut self, id: &str) -> Result<()> {
        self.scope_index(id)?;
        self.active_scope = Some(id.to_string());
        Ok(())
    }

    /// Load a project document, replacing whatever scopes exist.  An
    /// absent document is the "new project" path: the name resets and
    /// nothing is constructed.  A corrupt document is surfaced through
    /// `host.show_message` and returned as an error; a partially-built
    /// project is never left behind silently.
    pub fn load(&mut self, doc: Option<&ProjectDoc>, host: &mut dyn Host) -> Result<()> {
        self.scopes.clear();
        self.tab_order.clear();
        self.active_scope = None;

        let Some(doc) = doc else {
            self.name = DEFAULT_PROJECT_NAME.to_string();
            return Ok(());
        };

        self.name = if doc.name.is_empty() {
            DEFAULT_PROJECT_NAME.to_string()
        } else {
            doc.name.clone()
        };
        self.project_id = doc.project_id.clone();

        for scope_doc in doc.scopes.iter() {
            let name = scope_doc
                .name
                .clone()
                .unwrap_or_else(|| "Untitled-Circuit".to_string());
            let is_hardware_derived = scope_doc.verilog_metadata.is_some();
            let mut scope = Scope::new(&name, &scope_doc.id, is_hardware_derived, scope_doc.is_main);

            if let Err(err) = scope.reconstruct(scope_doc, &self.scopes) {
                host.show_message(&format!("failed to load circuit {name:?}: {err}"));
                return Err(err);
            }

            self.active_scope = Some(scope.id.clone());
            host.run_simulation(&scope);
            host.schedule_backup();
            self.refresh_restricted(&mut scope);

            self.tab_order.push(scope.id.clone());
            self.scopes.push(scope);
        }

        self.clock = ClockSpecs {
            time_period: doc.time_period.unwrap_or(DEFAULT_CLOCK_PERIOD),
            clock_enabled: doc.clock_enabled.unwrap_or(true),
        };

        if !doc.ordered_tabs.is_empty() {
            self.reorder_tabs(&doc.ordered_tabs);
        }

        // explicit focus wins; otherwise the last-created scope keeps it
        if let Some(focus) = doc.focussed_circuit.as_deref()
            && self.scope(focus).is_some()
        {
            self.active_scope = Some(focus.to_string());
        }

        debug!("loaded project {:?}: {} scopes", self.name, self.scopes.len());
        Ok(())
    }

    /// Serialize the project back to its document form.
    pub fn to_doc(&self) -> ProjectDoc {
        ProjectDoc {
            name: self.name.clone(),
            project_id: self.project_id.clone(),
            scopes: self.scopes.iter().map(Scope::to_doc).collect(),
            time_period: Some(self.clock.time_period),
            clock_enabled: Some(self.clock.clock_enabled),
            ordered_tabs: self.tab_order.clone(),
            focussed_circuit: self.active_scope.clone(),
            extra: Default::default(),
        }
    }

    /// Recompute which flagged element tags a scope actually uses.
    fn refresh_restricted(&self, scope: &mut Scope) {
        scope.restricted_elements_used = ElementKind::ALL
            .iter()
            .filter(|kind| !scope.elements_of(**kind).is_empty())
            .map(|kind| kind.tag())
            .filter(|tag| self.restricted_elements.contains(*tag))
            .map(str::to_string)
            .collect();
    }

    // Known ids take the given order; scopes the list does not mention
    // keep their creation order after them.  Unknown ids are ignored.
    fn reorder_tabs(&mut self, ordered: &[String]) {
        let mut tabs: Vec<String> = ordered
            .iter()
            .filter(|id| self.scope(id).is_some())
            .cloned()
            .collect();
        for scope in self.scopes.iter() {
            if !tabs.contains(&scope.id) {
                tabs.push(scope.id.clone());
            }
        }
        self.tab_order = tabs;
    }

    fn loaded_subcircuit_ids(&self) -> BTreeSet<String> {
        self.scopes.iter().map(|s| s.id.clone()).collect()
    }

    /// Create a folder in `scope_id`'s tree.  Persistence is scheduled
    /// on success; validation failures surface as a transient message
    /// and leave state untouched.
    pub fn create_folder(
        &mut self,
        scope_id: &str,
        name: &str,
        parent_id: Option<&str>,
        host: &mut dyn Host,
    ) -> Result<String> {
        let index = self.scope_index(scope_id)?;
        match self.scopes[index].folders.create(name, parent_id) {
            Ok(id) => {
                host.schedule_backup();
                Ok(id)
            }
            Err(err) => {
                host.show_message(&format!("could not create folder: {err}"));
                Err(err)
            }
        }
    }

    pub fn rename_folder(
        &mut self,
        scope_id: &str,
        folder_id: &str,
        new_name: &str,
        host: &mut dyn Host,
    ) -> Result<()> {
        let index = self.scope_index(scope_id)?;
        match self.scopes[index].folders.rename(folder_id, new_name) {
            Ok(()) => {
                host.schedule_backup();
                Ok(())
            }
            Err(err) => {
                host.show_message(&format!("could not rename folder: {err}"));
                Err(err)
            }
        }
    }

    pub fn delete_folder(
        &mut self,
        scope_id: &str,
        folder_id: &str,
        host: &mut dyn Host,
    ) -> Result<()> {
        let index = self.scope_index(scope_id)?;
        match self.scopes[index].folders.delete(folder_id) {
            Ok(()) => {
                host.schedule_backup();
                Ok(())
            }
            Err(err) => {
                host.show_message(&format!("could not delete folder: {err}"));
                Err(err)
            }
        }
    }

    /// Move a subcircuit within `scope_id`'s folder tree.  A move that
    /// changes nothing schedules no backup.
    pub fn move_subcircuit(
        &mut self,
        scope_id: &str,
        subcircuit_id: &str,
        destination: Destination,
        host: &mut dyn Host,
    ) -> Result<MoveOutcome> {
        let loaded = self.loaded_subcircuit_ids();
        let index = self.scope_index(scope_id)?;
        match self.scopes[index]
            .folders
            .move_subcircuit(subcircuit_id, destination, &loaded)
        {
            Ok(MoveOutcome::Moved) => {
                host.schedule_backup();
                Ok(MoveOutcome::Moved)
            }
            Ok(MoveOutcome::Unchanged) => Ok(MoveOutcome::Unchanged),
            Err(err) => {
                host.show_message(&format!("could not move subcircuit: {err}"));
                Err(err)
            }
        }
    }
}
