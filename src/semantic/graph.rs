//! Join path planning: BFS shortest join-path over the model's declared
//! relationships.

use std::collections::{HashMap, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::model::{Relationship, SemanticModel};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown table in join graph: {0}")]
    UnknownTable(String),

    #[error("no join path from {from} to {to}")]
    NoPath { from: String, to: String },
}

/// One hop in a join plan: join `table_key` into the query using
/// `relationship`, traversed from `via_table`.
#[derive(Debug, Clone)]
pub struct JoinStep<'a> {
    pub table_key: &'a str,
    pub via_table: &'a str,
    pub relationship: &'a Relationship,
    /// `true` if this hop traverses the relationship in the direction
    /// declared (`from_table` -> `to_table`); `false` if reversed.
    pub forward: bool,
}

/// A directed multigraph over table_keys with relationships as edges,
/// built with a deterministic (declaration-order) adjacency list so BFS
/// ties always break the same way regardless of `petgraph`'s internal
/// iteration order.
pub struct JoinGraph<'a> {
    model: &'a SemanticModel,
    graph: DiGraph<&'a str, &'a Relationship>,
    index: HashMap<&'a str, NodeIndex>,
    /// table_key -> ordered list of (neighbor, relationship, forward)
    adjacency: HashMap<&'a str, Vec<(&'a str, &'a Relationship, bool)>>,
}

impl<'a> JoinGraph<'a> {
    pub fn new(model: &'a SemanticModel) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for table_key in model.tables.keys() {
            let idx = graph.add_node(table_key.as_str());
            index.insert(table_key.as_str(), idx);
        }

        let mut adjacency: HashMap<&str, Vec<(&str, &Relationship, bool)>> = HashMap::new();
        for rel in &model.relationships {
            if let (Some(&from_idx), Some(&to_idx)) =
                (index.get(rel.from_table.as_str()), index.get(rel.to_table.as_str()))
            {
                graph.add_edge(from_idx, to_idx, rel);
                adjacency
                    .entry(rel.from_table.as_str())
                    .or_default()
                    .push((rel.to_table.as_str(), rel, true));
                adjacency
                    .entry(rel.to_table.as_str())
                    .or_default()
                    .push((rel.from_table.as_str(), rel, false));
            }
        }

        Self {
            model,
            graph,
            index,
            adjacency,
        }
    }

    /// BFS shortest path of join steps from `from` to `to`. Ties are broken
    /// by relationship declaration order (the adjacency list's insertion
    /// order).
    pub fn shortest_path(&self, from: &str, to: &str) -> Result<Vec<JoinStep<'a>>, GraphError> {
        if !self.index.contains_key(from) {
            return Err(GraphError::UnknownTable(from.to_string()));
        }
        if !self.index.contains_key(to) {
            return Err(GraphError::UnknownTable(to.to_string()));
        }
        if from == to {
            return Ok(Vec::new());
        }

        let mut visited: HashMap<&str, (&str, &Relationship, bool)> = HashMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(from);
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        seen.insert(from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                break;
            }
            if let Some(edges) = self.adjacency.get(current) {
                for (neighbor, rel, forward) in edges {
                    if seen.insert(neighbor) {
                        visited.insert(neighbor, (current, rel, *forward));
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        if !visited.contains_key(to) && to != from {
            return Err(GraphError::NoPath {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let mut steps = Vec::new();
        let mut node = to;
        while node != from {
            let (prev, rel, forward) = visited[node];
            steps.push(JoinStep {
                table_key: node,
                via_table: prev,
                relationship: rel,
                forward,
            });
            node = prev;
        }
        steps.reverse();
        Ok(steps)
    }

    /// Plan the full set of joins needed to connect `required` tables to
    /// `base`, visiting new tables in `required`'s order and skipping any
    /// already reached by an earlier path.
    pub fn plan(&self, base: &'a str, required: &[&'a str]) -> Result<Vec<JoinStep<'a>>, GraphError> {
        let mut reached: std::collections::HashSet<&str> = std::collections::HashSet::new();
        reached.insert(base);
        let mut plan = Vec::new();

        for &target in required {
            if reached.contains(target) {
                continue;
            }
            let path = self.shortest_path(base, target)?;
            for step in path {
                if reached.insert(step.table_key) {
                    plan.push(step);
                }
            }
        }

        Ok(plan)
    }

    pub fn contains_table(&self, table_key: &str) -> bool {
        self.index.contains_key(table_key)
    }

    pub fn model(&self) -> &'a SemanticModel {
        self.model
    }
}
