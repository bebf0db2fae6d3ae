//! Application-wide constants

/// Provider defaults
pub mod ai {
    pub const DEFAULT_MODEL: &str = "gpt-4o-2024-11-20";
    pub const MAX_OUTPUT_TOKENS: usize = 16_000;
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;
    pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
}

/// Agent loop defaults
pub mod agent {
    /// Graph steps allowed per invocation (model step and tool step each count)
    pub const MAX_STEPS: usize = 100;
    pub const COMMAND_TIMEOUT_SECS: u64 = 600;
    pub const MAX_COMMAND_OUTPUT_BYTES: usize = 100 * 1024;
}

/// Schema pipeline defaults
pub mod schema {
    pub const MAX_FIX_ATTEMPTS: u32 = 6;
}

pub mod graph {
    pub const DEFAULT_MAX_STEPS: usize = 100;
}

pub mod paths {
    pub const CONFIG_DIR_NAME: &str = ".codeloom";
    pub const CONFIG_FILE_NAME: &str = "config.toml";
    pub const LOG_FILE_NAME: &str = "codeloom.log";
}
