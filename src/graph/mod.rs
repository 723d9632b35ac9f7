//! Read-only export of a machine's transition graph.
//!
//! Nodes are state kinds and edges are transitions labelled with their
//! condition. States of a nested machine are named `Machine.State`; an edge
//! into a nested machine lands on its initial state and an edge out of one
//! leaves from its FINAL node. All FAILED targets share one node.

mod dot;

use crate::core::StateKind;
use crate::machine::{MachineDefinition, Target};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Node ids that belong to one machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphCluster {
    pub machine: String,
    pub nodes: Vec<String>,
}

/// Transition graph of a machine and every machine nested in it.
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::{timeout_transition, MachineBuilder};
/// use hsm_engine::core::{Final, State};
/// use hsm_engine::graph::TransitionGraph;
/// use hsm_engine::leaf_state;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Warmup;
/// impl State for Warmup {}
/// leaf_state!(Warmup);
///
/// let definition = MachineBuilder::<()>::new("Boot")
///     .initial::<Warmup>()
///     .transition(timeout_transition::<Warmup, Final, ()>(Duration::from_secs(2)))
///     .build()
///     .unwrap();
///
/// let graph = TransitionGraph::from_definition(&definition);
/// assert_eq!(graph.edges[0].label, "timeout: 2s");
/// assert!(graph.to_dot().contains("\"Warmup\" -> \"Final\""));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransitionGraph {
    pub name: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub clusters: Vec<GraphCluster>,
}

impl TransitionGraph {
    pub fn from_definition<C>(definition: &MachineDefinition<C>) -> Self {
        let mut walker = Walker {
            graph: TransitionGraph {
                name: definition.name().to_string(),
                ..Self::default()
            },
            seen_nodes: HashSet::new(),
            seen_machines: HashSet::new(),
        };
        walker.walk(definition, None);
        walker.graph
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving `id`, in declaration order.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

struct Walker {
    graph: TransitionGraph,
    seen_nodes: HashSet<String>,
    seen_machines: HashSet<StateKind>,
}

impl Walker {
    fn walk<C>(&mut self, definition: &MachineDefinition<C>, group: Option<&'static str>) {
        let mut cluster = Vec::new();

        let entry = self.target_node(definition.initial(), group);
        self.add_node(&entry, &mut cluster);

        for transition in definition.transitions() {
            let from = if transition.from.is_machine() {
                node_id(Some(transition.from.name()), StateKind::final_state())
            } else {
                node_id(group, transition.from)
            };
            self.add_node(&from, &mut cluster);

            let to = self.target_node(&transition.to, group);
            if !transition.to.kind().is_failed() {
                self.add_node(&to, &mut cluster);
            }

            self.graph.edges.push(GraphEdge {
                from,
                to,
                label: transition.condition.label(),
            });
        }

        self.graph.clusters.push(GraphCluster {
            machine: group.unwrap_or(definition.name()).to_string(),
            nodes: cluster,
        });
    }

    // Node an edge into `target` lands on, loading nested machines on the way.
    fn target_node<C>(&mut self, target: &Target<C>, group: Option<&'static str>) -> String {
        let kind = target.kind();
        if kind.is_failed() {
            let id = kind.name().to_string();
            if self.seen_nodes.insert(id.clone()) {
                self.graph.nodes.push(GraphNode {
                    id: id.clone(),
                    label: id.clone(),
                });
            }
            return id;
        }

        match target.nested_definition() {
            Some(nested) => {
                if self.seen_machines.insert(nested.kind()) {
                    self.walk(nested.as_ref(), Some(nested.name()));
                }
                self.entry_node(nested.as_ref())
            }
            None => node_id(group, kind),
        }
    }

    fn entry_node<C>(&self, definition: &MachineDefinition<C>) -> String {
        let initial = definition.initial();
        match initial.nested_definition() {
            Some(nested) => self.entry_node(nested.as_ref()),
            None => node_id(Some(definition.name()), initial.kind()),
        }
    }

    fn add_node(&mut self, id: &str, cluster: &mut Vec<String>) {
        if self.seen_nodes.insert(id.to_string()) {
            let label = id.rsplit('.').next().unwrap_or(id).to_string();
            self.graph.nodes.push(GraphNode {
                id: id.to_string(),
                label,
            });
            cluster.push(id.to_string());
        }
    }
}

fn node_id(group: Option<&str>, kind: StateKind) -> String {
    match group {
        Some(group) => format!("{group}.{}", kind.name()),
        None => kind.name().to_string(),
    }
}
