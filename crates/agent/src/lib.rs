//! StockPicker agent orchestration
//!
//! Drives a hosted agent through thread, run and tool-call handling to
//! produce a Markdown stock analysis report.

use thiserror::Error;

use stockpicker_chaos::ChaosError;
use stockpicker_provider::ProviderError;

pub mod picker;
pub mod prompt;
pub mod tools;

pub use picker::StockPicker;
pub use prompt::{analysis_tool_properties, ToolProperty, STOCK_PICKER_SYSTEM_PROMPT};
pub use tools::{ToolRegistry, ToolTrait, VectorSearchTool};

/// Orchestration errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("◆ AGENT SERVICE ERROR: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Chaos(#[from] ChaosError),

    #[error("◆ AGENT RUN FAILED: {0}")]
    RunFailed(String),

    #[error("◆ NO RESPONSE FROM AGENT")]
    EmptyResponse,

    #[error("◆ RUN STILL PENDING AFTER {0} POLLS")]
    PollLimitExceeded(u32),
}

impl AgentError {
    /// True when the failure was injected on purpose
    pub fn is_simulated(&self) -> bool {
        matches!(self, AgentError::Chaos(err) if err.is_simulated())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
