//! Graph builder
//!
//! Structural mistakes (duplicate nodes, dangling edges, missing entry) are
//! collected while building and reported by `compile()`.

use std::collections::HashMap;
use std::sync::Arc;

use super::compiled::{CompiledGraph, Transition};
use super::node::{Node, Router};
use super::{GraphError, END};
use crate::constants;

pub struct StateGraph<S: Send + 'static> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Declaration order, kept for deterministic validation errors
    order: Vec<String>,
    transitions: Vec<(String, Transition<S>)>,
    entry: Option<String>,
    max_steps: usize,
    errors: Vec<GraphError>,
}

impl<S: Send + 'static> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + 'static> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            transitions: Vec::new(),
            entry: None,
            max_steps: constants::graph::DEFAULT_MAX_STEPS,
            errors: Vec::new(),
        }
    }

    pub fn add_node(&mut self, name: impl Into<String>, node: impl Node<S> + 'static) -> &mut Self {
        let name = name.into();
        if name == END {
            self.errors.push(GraphError::ReservedNodeName(name));
        } else if self.nodes.contains_key(&name) {
            self.errors.push(GraphError::DuplicateNode(name));
        } else {
            self.order.push(name.clone());
            self.nodes.insert(name, Arc::new(node));
        }
        self
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.transitions
            .push((from.into(), Transition::Direct(to.into())));
        self
    }

    /// Route out of `from` by label. Every label the router can return must
    /// appear in `targets`; an unknown label fails the invocation.
    pub fn add_conditional_edges<R, L, T>(
        &mut self,
        from: impl Into<String>,
        router: R,
        targets: impl IntoIterator<Item = (L, T)>,
    ) -> &mut Self
    where
        R: Fn(&S) -> String + Send + Sync + 'static,
        L: Into<String>,
        T: Into<String>,
    {
        let router: Router<S> = Box::new(router);
        let targets = targets
            .into_iter()
            .map(|(label, target)| (label.into(), target.into()))
            .collect();
        self.transitions
            .push((from.into(), Transition::Conditional { router, targets }));
        self
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    /// Maximum node executions per invocation
    pub fn set_max_steps(&mut self, max_steps: usize) -> &mut Self {
        self.max_steps = max_steps;
        self
    }

    /// Validate the structure and freeze it into a runnable graph
    pub fn compile(self) -> Result<CompiledGraph<S>, GraphError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let entry = self.entry.ok_or(GraphError::MissingEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::UnknownEntryPoint(entry));
        }

        let is_target = |name: &str| name == END || self.nodes.contains_key(name);
        let mut outgoing: HashMap<String, Transition<S>> = HashMap::new();

        for (from, transition) in self.transitions {
            if !self.nodes.contains_key(&from) {
                return Err(GraphError::UnknownNode {
                    from: from.clone(),
                    node: from,
                });
            }
            let targets: Vec<&String> = match &transition {
                Transition::Direct(to) => vec![to],
                Transition::Conditional { targets, .. } => targets.values().collect(),
            };
            if let Some(bad) = targets.into_iter().find(|t| !is_target(t)) {
                return Err(GraphError::UnknownNode {
                    from: from.clone(),
                    node: bad.clone(),
                });
            }
            if outgoing.contains_key(&from) {
                return Err(GraphError::DuplicateEdge(from));
            }
            outgoing.insert(from, transition);
        }

        if let Some(name) = self.order.iter().find(|n| !outgoing.contains_key(*n)) {
            return Err(GraphError::MissingEdge(name.clone()));
        }

        Ok(CompiledGraph::new(
            self.nodes,
            outgoing,
            entry,
            self.max_steps,
        ))
    }
}
