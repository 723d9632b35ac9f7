//! Graphviz DOT rendering.

use super::TransitionGraph;
use std::fmt::Write;

impl TransitionGraph {
    /// Render as a directed DOT graph with one dotted cluster per machine.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_dot(&mut out);
        out
    }

    fn write_dot(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "digraph {} {{", quote(&self.name))?;

        for cluster in &self.clusters {
            writeln!(out, "  subgraph {} {{", quote(&format!("cluster_{}", cluster.machine)))?;
            writeln!(out, "    label={};", quote(&cluster.machine))?;
            writeln!(out, "    style=dotted;")?;
            for id in &cluster.nodes {
                if let Some(node) = self.node(id) {
                    writeln!(out, "    {} [label={}];", quote(&node.id), quote(&node.label))?;
                }
            }
            writeln!(out, "  }}")?;
        }

        for node in self
            .nodes
            .iter()
            .filter(|n| !self.clusters.iter().any(|c| c.nodes.contains(&n.id)))
        {
            writeln!(out, "  {} [label={}];", quote(&node.id), quote(&node.label))?;
        }

        for edge in &self.edges {
            writeln!(
                out,
                "  {} -> {} [label={}];",
                quote(&edge.from),
                quote(&edge.to),
                quote(&edge.label)
            )?;
        }

        writeln!(out, "}}")
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(ch);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphCluster, GraphEdge, GraphNode};

    fn node(id: &str, label: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn renders_clusters_loose_nodes_and_edges() {
        let graph = TransitionGraph {
            name: "Lamp".to_string(),
            nodes: vec![node("Off", "Off"), node("On", "On"), node("Failed", "Failed")],
            edges: vec![
                GraphEdge {
                    from: "Off".to_string(),
                    to: "On".to_string(),
                    label: "event: flip".to_string(),
                },
                GraphEdge {
                    from: "On".to_string(),
                    to: "Failed".to_string(),
                    label: "overheated".to_string(),
                },
            ],
            clusters: vec![GraphCluster {
                machine: "Lamp".to_string(),
                nodes: vec!["Off".to_string(), "On".to_string()],
            }],
        };

        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph \"Lamp\" {\n"));
        assert!(dot.contains("  subgraph \"cluster_Lamp\" {\n    label=\"Lamp\";\n    style=dotted;\n"));
        assert!(dot.contains("    \"Off\" [label=\"Off\"];\n"));
        assert!(dot.contains("  \"Failed\" [label=\"Failed\"];\n"));
        assert!(dot.contains("  \"Off\" -> \"On\" [label=\"event: flip\"];\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote("a\\b"), r#""a\\b""#);
    }
}
