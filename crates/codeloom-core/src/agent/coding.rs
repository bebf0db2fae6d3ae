//! Agent graph construction and the two node implementations

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::completion::{completion_tool, AgentOutcome};
use super::state::AgentState;
use super::{AgentConfig, ToolFailurePolicy};
use crate::ai::client::{CompletionRequest, CompletionService};
use crate::ai::types::{AiTool, Message};
use crate::error::WorkflowError;
use crate::graph::{CompiledGraph, GraphError, Node, StateGraph, END};
use crate::tools::implementations::execute_command::run_in_workspace;
use crate::tools::{ToolContext, ToolRegistry, TERMINAL_TOOL};

pub const MODEL_NODE: &str = "coding_llm";
pub const TOOLS_NODE: &str = "tools_invocation";

const CONTINUE: &str = "continue";
const FINISH: &str = "end";

/// Router after the model step
pub fn route_after_model(state: &AgentState) -> String {
    let label = match state.last_assistant() {
        Some(turn) if turn.has_tool_calls() && state.terminal_call().is_none() => CONTINUE,
        _ => FINISH,
    };
    label.to_string()
}

struct ModelStep {
    service: Arc<dyn CompletionService>,
    system_prompt: String,
    tools: Vec<AiTool>,
}

#[async_trait]
impl Node<AgentState> for ModelStep {
    async fn run(&self, mut state: AgentState) -> Result<AgentState, WorkflowError> {
        let request = CompletionRequest::new(state.history.clone())
            .with_system(self.system_prompt.clone())
            .with_tools(self.tools.clone());

        let reply = self.service.complete(request).await?;
        info!(
            tool_calls = reply.tool_calls.len(),
            history = state.history.len() + 1,
            "Model turn received"
        );
        state.history.push(reply);
        Ok(state)
    }
}

struct ToolStep {
    registry: Arc<ToolRegistry>,
    policy: ToolFailurePolicy,
    command_timeout: std::time::Duration,
}

#[async_trait]
impl Node<AgentState> for ToolStep {
    async fn run(&self, mut state: AgentState) -> Result<AgentState, WorkflowError> {
        let calls = state
            .last_assistant()
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default();

        let ctx = ToolContext::new(state.workspace_root.clone())
            .with_command_timeout(self.command_timeout);

        for call in calls {
            let result = self
                .registry
                .execute(&call.name, call.arguments.clone(), &ctx)
                .await;

            let content = match result {
                Ok(output) => output,
                Err(e) => match self.policy {
                    ToolFailurePolicy::Abort => return Err(e.into()),
                    ToolFailurePolicy::Report => {
                        warn!(tool = %call.name, error = %e, "Reporting tool failure to model");
                        format!("Error: {}", e)
                    }
                },
            };
            state.history.push(Message::tool_result(call.id, content));
        }

        Ok(state)
    }
}

/// The coding agent: a completion service, a closed tool registry, and the
/// compiled two-node graph that drives them
pub struct CodingAgent {
    graph: CompiledGraph<AgentState>,
    config: AgentConfig,
}

impl CodingAgent {
    pub fn new(
        service: Arc<dyn CompletionService>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Result<Self, GraphError> {
        let mut tools = registry.signatures();
        tools.push(completion_tool());

        let mut graph = StateGraph::new();
        graph
            .add_node(
                MODEL_NODE,
                ModelStep {
                    service,
                    system_prompt: config.system_prompt.clone(),
                    tools,
                },
            )
            .add_node(
                TOOLS_NODE,
                ToolStep {
                    registry,
                    policy: config.tool_failure,
                    command_timeout: config.command_timeout,
                },
            )
            .set_entry_point(MODEL_NODE)
            .add_conditional_edges(
                MODEL_NODE,
                route_after_model,
                [(CONTINUE, TOOLS_NODE), (FINISH, END)],
            )
            .add_edge(TOOLS_NODE, MODEL_NODE)
            .set_max_steps(config.max_steps);

        Ok(Self {
            graph: graph.compile()?,
            config,
        })
    }

    /// Run the loop on `task` inside `workspace_root`
    pub async fn run(
        &self,
        task: impl Into<String>,
        workspace_root: impl Into<PathBuf>,
    ) -> Result<AgentOutcome, WorkflowError> {
        let initial = AgentState::new(task, workspace_root);
        self.run_from(initial).await
    }

    /// Run the loop from an existing state
    pub async fn run_from(&self, initial: AgentState) -> Result<AgentOutcome, WorkflowError> {
        info!(workspace = %initial.workspace_root.display(), "Agent run started");
        let state = self.graph.invoke(initial).await?;

        if let Some(turn) = state.last_assistant() {
            let ignored = turn
                .tool_calls
                .iter()
                .filter(|c| c.name != TERMINAL_TOOL)
                .count();
            if ignored > 0 && state.terminal_call().is_some() {
                warn!(ignored, "Ignoring tool calls issued alongside attempt_completion");
            }
        }

        let mut outcome = AgentOutcome::from_state(state);
        if self.config.run_completion_command {
            if let Some(command) = outcome.command.clone() {
                let ctx = ToolContext::new(outcome.state.workspace_root.clone())
                    .with_command_timeout(self.config.command_timeout);
                let (output, _) = run_in_workspace(&command, &ctx).await?;
                outcome.command_output = Some(output);
            }
        }

        info!(
            tool_calls = outcome.tool_calls_executed,
            history = outcome.state.history.len(),
            "Agent run finished"
        );
        Ok(outcome)
    }
}
