//! Agent loop - transcript ownership and the bounded step state machine

use tracing::{debug, error, info};

use crate::memory::{CoreMemory, MemoryBlock};
use crate::tools::dispatch::{self, OutputSink};
use crate::tools::{self, ToolDefinition, SEND_MESSAGE};

use super::llm::ChatProvider;
use super::message::Message;

/// Hard ceiling on provider calls per step, against runaway tool chains.
pub const DEFAULT_MAX_STEPS: usize = 5;

/// The agent owns the canonical transcript and the core memory, and drives
/// the provider/dispatcher loop for each user turn.
pub struct Agent {
    provider: Box<dyn ChatProvider>,
    sink: Box<dyn OutputSink>,
    memory: CoreMemory,
    tools: Vec<ToolDefinition>,
    transcript: Vec<Message>,
    max_steps: usize,
}

impl Agent {
    pub fn new(provider: Box<dyn ChatProvider>, sink: Box<dyn OutputSink>) -> Self {
        Self::with_max_steps(provider, sink, DEFAULT_MAX_STEPS)
    }

    pub fn with_max_steps(
        provider: Box<dyn ChatProvider>,
        sink: Box<dyn OutputSink>,
        max_steps: usize,
    ) -> Self {
        let mut memory = CoreMemory::new();
        memory.initialize_default();

        let mut agent = Self {
            provider,
            sink,
            memory,
            tools: tools::catalog(),
            transcript: Vec::new(),
            max_steps,
        };
        agent.rebuild_system_prompt();
        agent
    }

    /// Process one user message, looping through provider calls and tool
    /// execution until a yield point, a plain-text reply, a provider error,
    /// or the step ceiling.
    pub async fn step(&mut self, user_message: &str) {
        self.transcript.push(Message::user(user_message));

        for iteration in 0..self.max_steps {
            debug!("Step iteration {}/{}", iteration + 1, self.max_steps);

            let response = match self.provider.complete(&self.transcript, &self.tools).await {
                Ok(response) => response,
                Err(e) => {
                    // The failed call leaves no trace in the transcript.
                    error!("Provider error: {}", e);
                    return;
                }
            };

            self.transcript.push(response.clone());

            let Message::Assistant {
                content,
                tool_calls,
            } = response
            else {
                error!("Provider returned a non-assistant message; ending step");
                return;
            };

            if tool_calls.is_empty() {
                // No tool calls: treat remaining text as a direct reply.
                if let Some(text) = content.filter(|t| !t.is_empty()) {
                    info!("Raw assistant reply ({} chars)", text.len());
                    self.sink.deliver(&text);
                }
                return;
            }

            for tool_call in tool_calls {
                let outcome = dispatch::execute(
                    &mut self.memory,
                    self.sink.as_ref(),
                    &tool_call.name,
                    &tool_call.arguments,
                );

                self.transcript.push(Message::tool_result(
                    &tool_call.id,
                    &tool_call.name,
                    outcome.to_json(),
                ));

                if outcome.is_ok() && dispatch::mutates_memory(&tool_call.name) {
                    self.rebuild_system_prompt();
                }

                // A send is a yield point: wait for new user input before
                // continuing, even if the model queued further calls.
                if tool_call.name == SEND_MESSAGE {
                    return;
                }
            }
        }

        debug!("Step ceiling of {} iterations reached", self.max_steps);
    }

    /// Recompile memory into the transcript's leading system message.
    fn rebuild_system_prompt(&mut self) {
        let system = Message::system(self.memory.compile());

        match self.transcript.first_mut() {
            None => self.transcript.push(system),
            Some(first) if first.is_system() => *first = system,
            Some(_) => self.transcript.insert(0, system),
        }
    }

    /// Add a memory block and refresh the system prompt.
    pub fn add_memory_block(
        &mut self,
        label: impl Into<String>,
        value: impl Into<String>,
        limit: usize,
        read_only: bool,
    ) {
        let label = label.into();
        self.memory
            .add_block(MemoryBlock::new(label.clone(), value, limit, read_only));
        self.rebuild_system_prompt();
        info!("Added memory block '{}'", label);
    }

    /// Remove a memory block and refresh the system prompt.
    pub fn remove_memory_block(&mut self, label: &str) {
        self.memory.remove_block(label);
        self.rebuild_system_prompt();
        info!("Removed memory block '{}'", label);
    }

    /// Compiled memory state, for observation without mutation.
    pub fn memory_dump(&self) -> String {
        self.memory.compile()
    }

    #[cfg(test)]
    pub(crate) fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    #[cfg(test)]
    pub(crate) fn memory(&self) -> &CoreMemory {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::FakeProvider;
    use crate::agent::message::ToolCallRequest;
    use crate::tools::dispatch::test_support::RecordingSink;
    use crate::tools::CORE_MEMORY_APPEND;
    use std::sync::Arc;

    struct SharedSink(Arc<RecordingSink>);

    impl OutputSink for SharedSink {
        fn deliver(&self, message: &str) {
            self.0.deliver(message);
        }
    }

    struct SharedProvider(Arc<FakeProvider>);

    #[async_trait::async_trait]
    impl ChatProvider for SharedProvider {
        async fn complete(
            &self,
            transcript: &[Message],
            tools: &[ToolDefinition],
        ) -> crate::Result<Message> {
            self.0.complete(transcript, tools).await
        }
    }

    fn agent_with(provider: FakeProvider) -> (Agent, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let agent = Agent::new(Box::new(provider), Box::new(SharedSink(sink.clone())));
        (agent, sink)
    }

    fn send_call(message: &str) -> ToolCallRequest {
        ToolCallRequest::new(
            "call_send_message",
            SEND_MESSAGE,
            format!(r#"{{"message":"{message}"}}"#),
        )
    }

    fn append_call(label: &str, content: &str) -> ToolCallRequest {
        ToolCallRequest::new(
            "call_core_memory_append",
            CORE_MEMORY_APPEND,
            format!(r#"{{"label":"{label}","content":"{content}"}}"#),
        )
    }

    #[test]
    fn test_new_agent_has_system_prompt_from_memory() {
        let (agent, _) = agent_with(FakeProvider::new(vec![]));

        let transcript = agent.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0], Message::system(agent.memory_dump()));

        let dump = agent.memory_dump();
        assert!(dump.contains("human"));
        assert!(dump.contains("persona"));
    }

    #[tokio::test]
    async fn test_plain_text_reply_ends_step() {
        let provider = FakeProvider::new(vec![Message::assistant("Hello, human!")]);
        let (mut agent, sink) = agent_with(provider);

        agent.step("Hi there").await;

        assert_eq!(sink.delivered(), vec!["Hello, human!".to_string()]);
        // system + user + assistant
        assert_eq!(agent.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_send_message_yields_immediately() {
        // send_message first, then a memory edit the agent must NOT execute.
        let provider = FakeProvider::new(vec![Message::assistant_with_tools(
            None,
            vec![send_call("Done!"), append_call("human", "should not land")],
        )]);
        let (mut agent, sink) = agent_with(provider);

        agent.step("hello").await;

        assert_eq!(sink.delivered(), vec!["Done!".to_string()]);
        assert!(!agent
            .memory()
            .get_block("human")
            .unwrap()
            .value
            .contains("should not land"));

        // system + user + assistant + one tool result; the trailing call
        // never produced a result.
        let transcript = agent.transcript();
        assert_eq!(transcript.len(), 4);
        match &transcript[3] {
            Message::ToolResult {
                call_id, tool_name, ..
            } => {
                assert_eq!(call_id, "call_send_message");
                assert_eq!(tool_name, SEND_MESSAGE);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_memory_tool_then_send() {
        let provider = FakeProvider::new(vec![
            Message::assistant_with_tools(None, vec![append_call("human", "Likes tests")]),
            Message::assistant_with_tools(None, vec![send_call("Noted!")]),
        ]);
        let (mut agent, sink) = agent_with(provider);

        agent.step("remember that I like tests").await;

        assert!(agent
            .memory()
            .get_block("human")
            .unwrap()
            .value
            .contains("Likes tests"));
        assert_eq!(sink.delivered(), vec!["Noted!".to_string()]);

        // The system prompt was recompiled after the mutation.
        assert_eq!(agent.transcript()[0], Message::system(agent.memory_dump()));
        assert!(agent.memory_dump().contains("Likes tests"));
    }

    #[tokio::test]
    async fn test_step_ceiling_is_exactly_five_calls() {
        let provider = Arc::new(FakeProvider::repeating(Message::assistant_with_tools(
            None,
            vec![append_call("human", "more")],
        )));
        let sink = Arc::new(RecordingSink::new());
        let mut agent = Agent::new(
            Box::new(SharedProvider(provider.clone())),
            Box::new(SharedSink(sink)),
        );

        agent.step("go").await;

        assert_eq!(provider.calls(), DEFAULT_MAX_STEPS);
    }

    #[tokio::test]
    async fn test_provider_error_ends_step_without_corruption() {
        // Empty script: the first call errors.
        let provider = FakeProvider::new(vec![]);
        let (mut agent, sink) = agent_with(provider);

        agent.step("hello").await;

        assert!(sink.delivered().is_empty());
        // system + user; no assistant message was appended.
        assert_eq!(agent.transcript().len(), 2);
        assert_eq!(agent.transcript()[1], Message::user("hello"));
    }

    #[tokio::test]
    async fn test_tool_error_is_fed_back_to_model() {
        let provider = FakeProvider::new(vec![
            Message::assistant_with_tools(None, vec![append_call("no_such_block", "x")]),
            Message::assistant_with_tools(None, vec![send_call("Sorry, no such block.")]),
        ]);
        let (mut agent, _) = agent_with(provider);

        agent.step("hello").await;

        let error_result = agent
            .transcript()
            .iter()
            .find_map(|m| match m {
                Message::ToolResult { content, .. } if content.contains("ERROR") => Some(content),
                _ => None,
            })
            .expect("error tool result in transcript");
        assert!(error_result.contains("Block not found"));
    }

    #[test]
    fn test_memory_block_round_trip_syncs_system_prompt() {
        let (mut agent, _) = agent_with(FakeProvider::new(vec![]));

        agent.add_memory_block("x", "v", 100, false);
        let dump = agent.memory_dump();
        assert!(dump.contains("x"));
        assert!(dump.contains("v"));
        assert_eq!(agent.transcript()[0], Message::system(dump));

        agent.remove_memory_block("x");
        let dump = agent.memory_dump();
        assert!(!dump.contains("Block 'x'"));
        assert_eq!(agent.transcript()[0], Message::system(dump));
    }
}
