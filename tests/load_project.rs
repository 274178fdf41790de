// Copyright 2026 The Gatework Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! End-to-end loads of project documents through the public API.

use std::rc::Rc;

use gatework_engine::element::SlotNodes;
use gatework_engine::folders::Destination;
use gatework_engine::json::ProjectDoc;
use gatework_engine::{ElementKind, ErrorCode, Host, MoveOutcome, NullHost, Project, Scope};

#[derive(Default)]
struct CountingHost {
    simulations: usize,
    backups: usize,
    messages: Vec<String>,
}

impl Host for CountingHost {
    fn run_simulation(&mut self, _scope: &Scope) {
        self.simulations += 1;
    }

    fn schedule_backup(&mut self) {
        self.backups += 1;
    }

    fn show_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

fn parse(raw: &str) -> ProjectDoc {
    serde_json::from_str(raw).unwrap()
}

fn scalar_node(scope: &Scope, kind: ElementKind, slot: &str) -> gatework_engine::NodeRef {
    match &scope.elements_of(kind)[0].slot(slot).unwrap().nodes {
        SlotNodes::One(n) => n.clone(),
        SlotNodes::Many(_) => panic!("scalar slot expected"),
    }
}

const INVERTER_PROJECT: &str = r#"{
    "name": "inverter",
    "timePeriod": 250,
    "scopes": [
        {
            "id": "main",
            "name": "main",
            "allNodes": [
                {"x": 100, "y": 100, "type": 2, "connections": [1]},
                {"x": 200, "y": 100, "type": 2, "connections": [0]},
                {"x": 300, "y": 100, "type": 2, "connections": []}
            ],
            "wires": [{"node1": 0, "node2": 1}],
            "Input": [
                {"x": 80, "y": 100, "label": "in",
                 "customData": {"constructorParamaters": ["RIGHT", 1],
                                "nodes": {"output1": 0}}}
            ],
            "NotGate": [
                {"x": 150, "y": 100, "propagationDelay": 0,
                 "customData": {"constructorParamaters": ["RIGHT", 1],
                                "nodes": {"inp1": 0, "output1": 2}}}
            ],
            "Output": [
                {"x": 320, "y": 100,
                 "customData": {"nodes": {"inp1": 2}}}
            ]
        }
    ]
}"#;

#[test]
fn node_identity_survives_document_load() {
    let doc = parse(INVERTER_PROJECT);
    let mut project = Project::new("");
    project.load(Some(&doc), &mut NullHost).unwrap();

    let scope = project.active_scope().unwrap();
    // the Input's output and the NotGate's input were serialized with
    // the same old node identity; they are the same live object now
    let pin = scalar_node(scope, ElementKind::Input, "output1");
    let gate_in = scalar_node(scope, ElementKind::NotGate, "inp1");
    assert!(Rc::ptr_eq(&pin, &gate_in));

    // and the document's three nodes are all that remain
    assert_eq!(3, scope.all_nodes.len());
}

#[test]
fn zero_propagation_delay_survives_document_load() {
    let doc = parse(INVERTER_PROJECT);
    let mut project = Project::new("");
    project.load(Some(&doc), &mut NullHost).unwrap();

    let scope = project.active_scope().unwrap();
    assert_eq!(0, scope.elements_of(ElementKind::NotGate)[0].delay);
    // absent delay falls back to the kind's default of zero for pins
    assert_eq!(0, scope.elements_of(ElementKind::Input)[0].delay);
}

#[test]
fn clock_settings_restore_with_defaults() {
    let doc = parse(INVERTER_PROJECT);
    let mut project = Project::new("");
    project.load(Some(&doc), &mut NullHost).unwrap();
    assert_eq!(250, project.clock.time_period);
    assert!(project.clock.clock_enabled);
}

#[test]
fn retired_tags_reconstruct_as_current_kinds() {
    let doc = parse(
        r#"{
        "name": "legacy",
        "scopes": [
            {
                "id": "main",
                "allNodes": [],
                "FlipFlop": [{"x": 50, "y": 50}],
                "Ram": [{"x": 150, "y": 50}]
            }
        ]
    }"#,
    );
    let mut project = Project::new("");
    project.load(Some(&doc), &mut NullHost).unwrap();

    let scope = project.active_scope().unwrap();
    assert_eq!(1, scope.elements_of(ElementKind::DflipFlop).len());
    assert_eq!(1, scope.elements_of(ElementKind::Rom).len());
    assert!(scope.elements_of(ElementKind::Ram).is_empty());
}

const DEPENDENT_SCOPES: &str = r#"{
    "name": "nested",
    "scopes": [
        {
            "id": "a",
            "name": "half",
            "allNodes": [],
            "Input": [{"x": 0, "y": 0}],
            "Output": [{"x": 100, "y": 0}]
        },
        {
            "id": "b",
            "name": "top",
            "allNodes": [],
            "SubCircuit": [
                {"x": 200, "y": 200,
                 "customData": {"constructorParamaters": ["a"]}}
            ]
        }
    ]
}"#;

#[test]
fn dependency_order_load_succeeds() {
    let doc = parse(DEPENDENT_SCOPES);
    let mut project = Project::new("");
    project.load(Some(&doc), &mut NullHost).unwrap();

    assert_eq!(2, project.scopes.len());
    let top = project.scope("b").unwrap();
    let sub = &top.elements_of(ElementKind::SubCircuit)[0];
    assert_eq!(Some("a"), sub.scope_ref.as_deref());
    // one pin in, one pin out, shaped by the referenced scope
    assert_eq!(2, sub.nodes().len());
}

#[test]
fn forward_reference_fails_deterministically() {
    let mut doc = parse(DEPENDENT_SCOPES);
    doc.scopes.reverse();

    let mut host = CountingHost::default();
    let mut project = Project::new("");
    let err = project.load(Some(&doc), &mut host).unwrap_err();
    assert_eq!(ErrorCode::UnresolvedSubcircuit, err.code);
    // corrupt documents produce a visible, actionable message
    assert_eq!(1, host.messages.len());
    assert!(host.messages[0].contains("unresolved_subcircuit"));
}

#[test]
fn loader_drives_host_once_per_scope() {
    let doc = parse(DEPENDENT_SCOPES);
    let mut host = CountingHost::default();
    let mut project = Project::new("");
    project.load(Some(&doc), &mut host).unwrap();

    assert_eq!(2, host.simulations);
    assert_eq!(2, host.backups);
    assert!(host.messages.is_empty());
}

#[test]
fn folder_move_persists_only_on_change() {
    let doc = parse(DEPENDENT_SCOPES);
    let mut project = Project::new("");
    project.load(Some(&doc), &mut NullHost).unwrap();

    let mut host = CountingHost::default();
    let folder = project
        .create_folder("b", "arithmetic", None, &mut host)
        .unwrap();
    assert_eq!(1, host.backups);

    let outcome = project
        .move_subcircuit("b", "a", Destination::Folder(&folder), &mut host)
        .unwrap();
    assert_eq!(MoveOutcome::Moved, outcome);
    assert_eq!(2, host.backups);

    // moving to the folder it already occupies changes nothing and
    // schedules nothing
    let before = project.scope("b").unwrap().folders.subcircuit_map().clone();
    let outcome = project
        .move_subcircuit("b", "a", Destination::Folder(&folder), &mut host)
        .unwrap();
    assert_eq!(MoveOutcome::Unchanged, outcome);
    assert_eq!(2, host.backups);
    assert_eq!(before, *project.scope("b").unwrap().folders.subcircuit_map());

    // a failed move reports, mutates nothing, schedules nothing
    let err = project
        .move_subcircuit("b", "a", Destination::Folder("ghost"), &mut host)
        .unwrap_err();
    assert_eq!(ErrorCode::MissingFolder, err.code);
    assert_eq!(2, host.backups);
    assert_eq!(1, host.messages.len());
    assert_eq!(before, *project.scope("b").unwrap().folders.subcircuit_map());
}

#[test]
fn save_then_load_preserves_topology() {
    let doc = parse(INVERTER_PROJECT);
    let mut project = Project::new("");
    project.load(Some(&doc), &mut NullHost).unwrap();

    let saved = project.to_doc();
    // the save half emits real JSON the load half accepts
    let raw = serde_json::to_string(&saved).unwrap();
    let reparsed: ProjectDoc = serde_json::from_str(&raw).unwrap();

    let mut reloaded = Project::new("");
    reloaded.load(Some(&reparsed), &mut NullHost).unwrap();

    assert_eq!(project.name, reloaded.name);
    assert_eq!(project.clock, reloaded.clock);

    let scope = reloaded.active_scope().unwrap();
    assert_eq!(3, scope.all_nodes.len());
    let pin = scalar_node(scope, ElementKind::Input, "output1");
    let gate_in = scalar_node(scope, ElementKind::NotGate, "inp1");
    assert!(Rc::ptr_eq(&pin, &gate_in));
    assert_eq!(0, scope.elements_of(ElementKind::NotGate)[0].delay);
}

#[test]
fn layout_synthesis_matches_pinned_geometry() {
    let doc = parse(INVERTER_PROJECT);
    let mut project = Project::new("");
    project.load(Some(&doc), &mut NullHost).unwrap();

    // no layout was stored: one input, one output, so
    // height = max(1, 1) * 20 + 20 = 40, title at (50, 13)
    let layout = &project.active_scope().unwrap().layout;
    assert_eq!(100, layout.width);
    assert_eq!(40, layout.height);
    assert_eq!((50, 13), (layout.title_x, layout.title_y));
    assert!(layout.title_enabled);
}
