//! Compiled graph execution

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::node::{Node, Router};
use super::{GraphError, END};
use crate::error::WorkflowError;

pub(crate) enum Transition<S> {
    Direct(String),
    Conditional {
        router: Router<S>,
        targets: HashMap<String, String>,
    },
}

/// A validated graph. Holds no per-invocation state, so one compiled graph
/// can serve any number of concurrent invocations.
pub struct CompiledGraph<S: Send + 'static> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    transitions: HashMap<String, Transition<S>>,
    entry: String,
    max_steps: usize,
}

impl<S: Send + 'static> CompiledGraph<S> {
    pub(crate) fn new(
        nodes: HashMap<String, Arc<dyn Node<S>>>,
        transitions: HashMap<String, Transition<S>>,
        entry: String,
        max_steps: usize,
    ) -> Self {
        Self {
            nodes,
            transitions,
            entry,
            max_steps,
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Run from the entry point until a transition resolves to `END`.
    pub async fn invoke(&self, initial: S) -> Result<S, WorkflowError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, entry = %self.entry, "Graph invocation started");

        let mut state = initial;
        let mut current = self.entry.clone();
        let mut step = 0usize;

        loop {
            if step >= self.max_steps {
                return Err(GraphError::StepLimitExceeded {
                    limit: self.max_steps,
                }
                .into());
            }

            // compile() guarantees every reachable name is a declared node
            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| GraphError::UnknownEntryPoint(current.clone()))?;
            debug!(%run_id, step, node = %current, "Running node");
            state = node.run(state).await?;
            step += 1;

            let next = match self.transitions.get(&current) {
                Some(Transition::Direct(to)) => to.clone(),
                Some(Transition::Conditional { router, targets }) => {
                    let label = router(&state);
                    match targets.get(&label) {
                        Some(target) => {
                            debug!(%run_id, node = %current, %label, %target, "Routed");
                            target.clone()
                        }
                        None => {
                            return Err(GraphError::UndeclaredLabel {
                                node: current,
                                label,
                            }
                            .into())
                        }
                    }
                }
                None => return Err(GraphError::MissingEdge(current).into()),
            };

            if next == END {
                info!(%run_id, steps = step, "Graph invocation finished");
                return Ok(state);
            }
            current = next;
        }
    }
}
