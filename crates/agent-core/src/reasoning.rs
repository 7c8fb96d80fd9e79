//! Agent Loop
//!
//! Drives a conversation through repeated completion calls. Whenever the
//! completion service stops to request tools, every tool call in that
//! assistant turn is dispatched, the results are folded into one
//! `tool_result` turn, and the service is asked again. The loop ends on any
//! other stop signal.
//!
//! ```text
//!   AwaitingCompletion ──(stop = tool_use)──▶ DispatchingTools
//!          ▲                                        │
//!          └────────────(tool_result turn)──────────┘
//!          │
//!          └──(any other stop)──▶ Done
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::error::{AgentError, Result, ToolError};
use crate::message::{Conversation, ToolCall, ToolOutcome, ToolResultBlock, Turn};
use crate::provider::{validate_request, GenerationOptions, LlmProvider, StopReason, TokenUsage};
use crate::tool::{ToolHandler, ToolRegistry};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Maximum completion calls per run before giving up
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Per-invocation limit for tool handlers
    pub tool_timeout: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            generation: GenerationOptions::default(),
            tool_timeout: None,
        }
    }
}

/// Loop states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    AwaitingCompletion,
    DispatchingTools,
    Done,
}

/// Summary of a finished run
#[derive(Clone, Debug)]
pub struct AgentRun {
    /// Text of the final assistant turn
    pub final_text: String,

    /// Completion calls made
    pub iterations: usize,

    /// Stop signal that ended the run
    pub stop_reason: StopReason,

    /// Usage summed over all completion calls
    pub usage: TokenUsage,
}

/// A run together with the conversation it produced
#[derive(Clone, Debug)]
pub struct Transcript {
    pub conversation: Conversation,
    pub run: AgentRun,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Run the loop until the completion service stops without requesting tools
    pub async fn run(&self, conversation: &mut Conversation) -> Result<AgentRun> {
        self.run_with_cancel(conversation, CancellationToken::new()).await
    }

    /// Like [`Agent::run`], aborting at the next suspend point once `cancel`
    /// fires. A cancelled run never appends a partial turn.
    pub async fn run_with_cancel(
        &self,
        conversation: &mut Conversation,
        cancel: CancellationToken,
    ) -> Result<AgentRun> {
        let contracts = self.tools.contracts();
        let mut state = LoopState::AwaitingCompletion;
        let mut iterations = 0;
        let mut usage = TokenUsage::default();
        let mut stop_reason = StopReason::EndTurn;

        loop {
            match state {
                LoopState::AwaitingCompletion => {
                    if iterations >= self.config.max_iterations {
                        return Err(AgentError::IterationLimitExceeded(self.config.max_iterations));
                    }
                    iterations += 1;

                    validate_request(conversation.turns())?;

                    tracing::debug!(
                        provider = self.provider.name(),
                        iteration = iterations,
                        turns = conversation.len(),
                        "Requesting completion"
                    );

                    let completion = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                        result = self.provider.complete(
                            conversation.turns(),
                            &contracts,
                            &self.config.generation,
                        ) => result?,
                    };

                    if let Some(u) = &completion.usage {
                        usage.input_tokens += u.input_tokens;
                        usage.output_tokens += u.output_tokens;
                    }

                    let calls = completion.turn.tool_calls().count();
                    tracing::info!(
                        model = %completion.model,
                        stop_reason = ?completion.stop_reason,
                        tool_calls = calls,
                        "Completion received"
                    );

                    if completion.stop_reason.requests_tools() && calls == 0 {
                        return Err(AgentError::InconsistentStop(
                            "tool_use stop signal without any tool calls".into(),
                        ));
                    }
                    if completion.stop_reason.requests_tools()
                        && iterations >= self.config.max_iterations
                    {
                        // No completion call is left to consume the results
                        return Err(AgentError::IterationLimitExceeded(self.config.max_iterations));
                    }
                    if !completion.stop_reason.requests_tools() && calls > 0 {
                        tracing::warn!(
                            tool_calls = calls,
                            "Ignoring tool calls on a turn that did not stop for tool use"
                        );
                    }

                    state = if completion.stop_reason.requests_tools() {
                        LoopState::DispatchingTools
                    } else {
                        LoopState::Done
                    };
                    stop_reason = completion.stop_reason;
                    conversation.push(completion.turn);
                }

                LoopState::DispatchingTools => {
                    let results = match conversation.last() {
                        Some(turn) => self.dispatch_tools(turn, &cancel).await?,
                        None => {
                            return Err(AgentError::InvalidConversation(
                                "nothing to dispatch".into(),
                            ))
                        }
                    };
                    conversation.check_tool_results(&results)?;
                    conversation.push(results);
                    state = LoopState::AwaitingCompletion;
                }

                LoopState::Done => {
                    return Ok(AgentRun {
                        final_text: conversation.final_text().unwrap_or_default(),
                        iterations,
                        stop_reason,
                        usage,
                    });
                }
            }
        }
    }

    /// Run with a simple string input (creates a fresh conversation)
    pub async fn ask(&self, question: &str) -> Result<Transcript> {
        self.ask_with_cancel(question, CancellationToken::new()).await
    }

    pub async fn ask_with_cancel(
        &self,
        question: &str,
        cancel: CancellationToken,
    ) -> Result<Transcript> {
        let mut conversation = Conversation::new(question);
        let run = self.run_with_cancel(&mut conversation, cancel).await?;
        Ok(Transcript { conversation, run })
    }

    /// Service every tool call of an assistant turn.
    ///
    /// All names are resolved before anything runs, so an unknown tool
    /// halts the loop without side effects. Handlers then run concurrently
    /// and their results keep the original call order.
    async fn dispatch_tools(&self, turn: &Turn, cancel: &CancellationToken) -> Result<Turn> {
        let resolved = turn
            .tool_calls()
            .map(|call| {
                self.tools
                    .resolve(&call.name)
                    .map(|handler| (call, handler))
                    .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let invocations = resolved
            .into_iter()
            .map(|(call, handler)| self.execute_tool(call, handler));

        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            results = join_all(invocations) => results,
        };

        Ok(Turn::tool_results(results))
    }

    /// Execute a tool call; failures become an error outcome
    async fn execute_tool(&self, call: &ToolCall, handler: Arc<dyn ToolHandler>) -> ToolResultBlock {
        tracing::debug!(tool = %call.name, call_id = %call.id, "Executing tool");

        let result = match self.config.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, handler.invoke(&call.input))
                .await
                .unwrap_or_else(|_| {
                    Err(ToolError::Execution(format!("timed out after {:?}", limit)))
                }),
            None => handler.invoke(&call.input).await,
        };

        let outcome = match result {
            Ok(value) => ToolOutcome::Success(value),
            Err(e) => {
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool failed");
                ToolOutcome::Error(e.to_string())
            }
        };

        ToolResultBlock {
            call_id: call.id.clone(),
            outcome,
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Option<Arc<ToolRegistry>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: None,
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.generation.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn tool_timeout(mut self, limit: Duration) -> Self {
        self.config.tool_timeout = Some(limit);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }
        let tools = self.tools.unwrap_or_default();

        Ok(Agent::new(provider, tools, self.config))
    }
}
