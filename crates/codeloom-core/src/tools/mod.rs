//! Tools the agent loop can dispatch to

pub mod answers;
pub mod implementations;
pub mod path_utils;
pub mod registry;

pub use answers::{answer_channel, AnswerHandle, AnswerSource, ChannelAnswers, PendingQuestion, StdinAnswers};
pub use implementations::coding_tools;
pub use registry::{parse_params, Tool, ToolContext, ToolError, ToolRegistry, TERMINAL_TOOL};
