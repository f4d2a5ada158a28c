//! Stock analysis run: agent, thread, polling loop, tool callbacks

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use stockpicker_config::Config;
use stockpicker_provider::{AgentService, CreateAgent, Run, RunStatus, RunToolCall, ToolOutput};

use crate::prompt::{AGENT_DESCRIPTION, AGENT_NAME, DEFAULT_QUERY, STOCK_PICKER_SYSTEM_PROMPT};
use crate::tools::{ToolRegistry, VectorSearchTool};
use crate::{AgentError, Result};

const HISTORY_PREVIEW_CHARS: usize = 200;

/// Generates stock analysis reports through a hosted agent
pub struct StockPicker<S: AgentService> {
    service: Arc<S>,
    tools: ToolRegistry,
    model: String,
    agent_name: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl<S: AgentService> StockPicker<S> {
    /// Create with no tools registered
    pub fn new(service: S, model: impl Into<String>) -> Self {
        Self {
            service: Arc::new(service),
            tools: ToolRegistry::new(),
            model: model.into(),
            agent_name: AGENT_NAME.to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: 600,
        }
    }

    /// Create with the `vector_search` tool and run settings from config
    pub fn from_config(service: S, config: &Config) -> Self {
        let search = VectorSearchTool::from_config(config);
        if !search.is_configured() {
            warn!("◆ VECTOR SEARCH ENDPOINT NOT SET, vector_search calls will report an error");
        }
        let mut tools = ToolRegistry::new();
        tools.register(search);

        Self::new(service, config.agent.model.clone())
            .with_tools(tools)
            .with_agent_name(config.agent.name.clone())
            .with_poll_interval(config.poll_interval())
            .with_max_polls(config.agent.max_polls)
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Zero means the run is never polled
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Produce a Markdown stock analysis.
    ///
    /// Chat history, when present, is posted to the thread ahead of the query.
    /// Every failure, including an injected chaos fault, is logged and
    /// returned unchanged.
    pub async fn generate_stock_analysis(
        &self,
        chat_history: &str,
        user_query: &str,
    ) -> Result<String> {
        match self.generate(chat_history, user_query).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("◆ STOCK ANALYSIS FAILED: {}", e);
                Err(e)
            }
        }
    }

    async fn generate(&self, chat_history: &str, user_query: &str) -> Result<String> {
        info!("◆ STARTING STOCK ANALYSIS");
        info!("Chat history length: {} characters", chat_history.len());
        if !chat_history.is_empty() {
            info!("Chat history preview: {}", preview(chat_history));
        }
        info!("User query: {}", user_query);
        debug!("System prompt:\n{}", STOCK_PICKER_SYSTEM_PROMPT);

        stockpicker_chaos::inject_chaos_if_enabled().await?;

        info!("◆ CREATING {} AGENT WITH MODEL {}", self.agent_name, self.model);
        let agent = self
            .service
            .create_agent(CreateAgent {
                name: self.agent_name.clone(),
                description: AGENT_DESCRIPTION.to_string(),
                instructions: STOCK_PICKER_SYSTEM_PROMPT.to_string(),
                tools: self.tools.definitions(),
                model: self.model.clone(),
            })
            .await?;
        info!("Created agent {} with tools: {:?}", agent.id, self.tools.names());

        let result = self.run_on_agent(&agent.id, chat_history, user_query).await;

        if let Err(e) = self.service.delete_agent(&agent.id).await {
            warn!("Failed to delete agent {}: {}", agent.id, e);
        }

        result
    }

    async fn run_on_agent(
        &self,
        agent_id: &str,
        chat_history: &str,
        user_query: &str,
    ) -> Result<String> {
        let thread = self.service.create_thread().await?;
        debug!("Created thread {}", thread.id);

        if !chat_history.is_empty() {
            info!("Adding chat history to thread");
            self.service
                .create_message(&thread.id, "user", chat_history)
                .await?;
        }

        let query = if user_query.trim().is_empty() {
            DEFAULT_QUERY
        } else {
            user_query
        };
        info!("Adding user query to thread: {}", query);
        self.service.create_message(&thread.id, "user", query).await?;

        info!("◆ STARTING AGENT RUN");
        let run = self.service.create_run(&thread.id, agent_id).await?;
        let tool_call_count = self.wait_for_completion(&thread.id, run).await?;

        info!("Retrieving final response from agent");
        let messages = self.service.list_messages(&thread.id).await?;
        let report = messages
            .iter()
            .find(|m| m.role == "assistant")
            .and_then(|m| m.text())
            .ok_or(AgentError::EmptyResponse)?
            .to_string();

        info!(
            "◆ STOCK ANALYSIS GENERATED BY {} ({} tool calls, {} chars)",
            self.agent_name,
            tool_call_count,
            report.len()
        );
        Ok(report)
    }

    /// Poll until the run completes, answering tool calls on the way.
    /// Returns the number of tool calls served.
    async fn wait_for_completion(&self, thread_id: &str, mut run: Run) -> Result<usize> {
        let mut tool_call_count = 0;
        let mut polls = 0;

        loop {
            if polls >= self.max_polls {
                error!("◆ RUN {} STILL {} AFTER {} POLLS", run.id, run.status, polls);
                return Err(AgentError::PollLimitExceeded(self.max_polls));
            }
            polls += 1;

            let run_id = run.id.clone();
            run = self.service.get_run(thread_id, &run_id).await?;
            info!("Agent run status: {}", run.status);

            match run.status {
                RunStatus::Completed => {
                    info!("Agent run completed successfully");
                    return Ok(tool_call_count);
                }
                RunStatus::RequiresAction => {
                    let calls = run.tool_calls();
                    info!("Agent requires action with {} tool calls", calls.len());
                    let outputs = self.execute_tool_calls(calls).await;
                    tool_call_count += outputs.len();
                    self.service
                        .submit_tool_outputs(thread_id, &run.id, outputs)
                        .await?;
                }
                ref status if status.is_failure() => {
                    error!("Agent run failed with: {:?}", run);
                    let reason = match &run.last_error {
                        Some(e) if !e.message.is_empty() => format!("{}: {}", status, e.message),
                        _ => status.to_string(),
                    };
                    return Err(AgentError::RunFailed(reason));
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    async fn execute_tool_calls(&self, calls: &[RunToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls {
            info!(
                "Agent {} calling tool: {} with arguments: {}",
                self.agent_name, call.function.name, call.function.arguments
            );

            let output = match call.function.parsed_arguments() {
                Ok(args) => self
                    .tools
                    .execute(&call.function.name, args)
                    .await
                    .unwrap_or_else(|e| format!("Error: {}", e)),
                Err(e) => format!("Error: invalid arguments: {}", e),
            };

            info!("Tool call completed with output length: {}", output.len());
            outputs.push(ToolOutput::new(&call.id, output));
        }

        outputs
    }
}

/// First characters of the history, char-boundary safe
fn preview(text: &str) -> String {
    match text.char_indices().nth(HISTORY_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
