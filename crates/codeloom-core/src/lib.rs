//! codeloom core library
//!
//! A workflow graph engine for LLM-assisted tasks, plus the two workflows
//! built on it: an iterative coding agent and a Mermaid-to-SQL schema
//! pipeline with statement-level apply and correction.

pub mod agent;
pub mod ai;
pub mod config;
pub mod constants;
pub mod error;
pub mod graph;
pub mod paths;
pub mod schema;
pub mod tools;

pub use agent::{AgentConfig, AgentOutcome, AgentState, CodingAgent, ToolFailurePolicy};
pub use ai::{AiClient, AiClientConfig, CompletionService};
pub use config::AppConfig;
pub use error::WorkflowError;
pub use graph::{CompiledGraph, GraphError, StateGraph, END};
pub use schema::{SchemaApplier, SchemaConfig, SchemaPipeline, SchemaResult};
pub use tools::{coding_tools, ToolRegistry};
