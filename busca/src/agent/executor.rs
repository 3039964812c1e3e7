//! The built-in reason-act executor.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::chat::{ChatRequest, SharedChatProvider};
use crate::error::Result;
use crate::prompts::PromptTemplate;
use crate::tool::ToolBox;

use super::parser::{AgentAction, AgentDecision, ReActOutputParser};
use super::{AgentInput, AgentOutput, AgentRuntime, AgentStep};

/// Completions are cut before the model invents its own observation.
pub const STOP_SEQUENCE: &str = "\nObservação:";

/// Answer given when the iteration limit is reached without a final answer.
pub const STOPPED_EARLY: &str = "O agente parou por atingir o limite de iterações ou de tempo.";

/// Pseudo tool name recorded for completions that failed to parse.
const INVALID_FORMAT_TOOL: &str = "_formato_invalido";

/// Runs the reason-act loop against a chat provider and a toolbox.
pub struct AgentExecutor {
    provider: SharedChatProvider,
    tools: ToolBox,
    template: PromptTemplate,
    model: Option<String>,
    temperature: Option<f32>,
    max_iterations: usize,
    handle_parsing_errors: bool,
    verbose: bool,
}

impl fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.model_name())
            .field("tools", &self.tools)
            .field("max_iterations", &self.max_iterations)
            .field("handle_parsing_errors", &self.handle_parsing_errors)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl AgentExecutor {
    /// Default iteration limit per turn.
    pub const DEFAULT_MAX_ITERATIONS: usize = 15;

    /// Create an executor with the built-in template and default settings.
    #[must_use]
    pub fn new(provider: SharedChatProvider, tools: ToolBox) -> Self {
        Self {
            provider,
            tools,
            template: PromptTemplate::react(),
            model: None,
            temperature: None,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            handle_parsing_errors: true,
            verbose: false,
        }
    }

    /// Use a custom prompt template.
    #[must_use]
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Override the provider's default model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sampling temperature sent with every request.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Maximum model calls per turn.
    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Feed malformed completions back to the model instead of failing.
    #[must_use]
    pub const fn handle_parsing_errors(mut self, handle: bool) -> Self {
        self.handle_parsing_errors = handle;
        self
    }

    /// Log every step at `info` instead of `debug`.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Model used for requests.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Render the prompt for the next iteration.
    fn render_prompt(&self, input: &AgentInput, steps: &[AgentStep]) -> Result<String> {
        let values = HashMap::from([
            ("tools", self.tools.render_descriptions()),
            ("tool_names", self.tools.names().join(", ")),
            ("chat_history", input.chat_history.clone()),
            ("input", input.input.clone()),
            ("agent_scratchpad", scratchpad(steps)),
        ]);
        Ok(self.template.format(&values)?)
    }

    fn build_request(&self, prompt: String) -> ChatRequest {
        let request = ChatRequest::new(self.model_name())
            .user(prompt)
            .stop(vec![STOP_SEQUENCE.to_owned()]);
        match self.temperature {
            Some(t) => request.temperature(t),
            None => request,
        }
    }

    /// Run the requested tool; every failure becomes an observation.
    async fn run_tool(&self, action: &AgentAction) -> String {
        if !self.tools.contains(&action.tool) {
            return format!(
                "{} não é uma ferramenta válida, tente uma de [{}].",
                action.tool,
                self.tools.names().join(", ")
            );
        }
        match self.tools.call_text(&action.tool, &action.tool_input).await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(tool = %action.tool, error = %e, "tool failed");
                format!("Erro ao executar a ferramenta {}: {e}", action.tool)
            }
        }
    }

    fn log_step(&self, iteration: usize, step: &AgentStep) {
        if self.verbose {
            info!(
                iteration,
                tool = %step.action.tool,
                input = %step.action.tool_input,
                observation = %step.observation,
                "agent step"
            );
        } else {
            debug!(
                iteration,
                tool = %step.action.tool,
                input = %step.action.tool_input,
                observation = %step.observation,
                "agent step"
            );
        }
    }

    fn log_finish(&self, iteration: usize, output: &str) {
        if self.verbose {
            info!(iteration, %output, "final answer");
        } else {
            debug!(iteration, %output, "final answer");
        }
    }
}

/// Previous steps in the form the model continues from.
fn scratchpad(steps: &[AgentStep]) -> String {
    let mut pad = String::new();
    for step in steps {
        pad.push_str(&step.action.log);
        pad.push_str("\nObservação: ");
        pad.push_str(&step.observation);
        pad.push_str("\nRaciocínio: ");
    }
    pad
}

#[async_trait]
impl AgentRuntime for AgentExecutor {
    async fn invoke(&self, input: &AgentInput) -> Result<AgentOutput> {
        let mut steps: Vec<AgentStep> = Vec::new();

        for iteration in 1..=self.max_iterations {
            let prompt = self.render_prompt(input, &steps)?;
            let response = self.provider.chat(&self.build_request(prompt)).await?;
            debug!(iteration, model = ?response.model, "completion received");
            if response.truncated {
                warn!(iteration, "completion cut off by the model's length limit");
            }
            let text = response.text();

            let step = match ReActOutputParser::parse(text) {
                Ok(AgentDecision::Finish(finish)) => {
                    self.log_finish(iteration, &finish.output);
                    return Ok(AgentOutput {
                        output: finish.output,
                        intermediate_steps: steps,
                    });
                }
                Ok(AgentDecision::Action(action)) => {
                    let observation = self.run_tool(&action).await;
                    AgentStep {
                        action,
                        observation,
                    }
                }
                Err(e) if self.handle_parsing_errors => {
                    warn!(iteration, error = %e, "invalid model output, asking again");
                    let observation = e.observation().to_owned();
                    AgentStep {
                        action: AgentAction::new(INVALID_FORMAT_TOOL, observation.clone(), text),
                        observation,
                    }
                }
                Err(e) => return Err(e.into()),
            };

            self.log_step(iteration, &step);
            steps.push(step);
        }

        warn!(
            max_iterations = self.max_iterations,
            "no final answer, stopping early"
        );
        Ok(AgentOutput {
            output: STOPPED_EARLY.to_owned(),
            intermediate_steps: steps,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use serde::Deserialize;
    use serde_json::Value;

    use super::*;
    use crate::agent::OutputParserError;
    use crate::chat::{ChatProvider, ChatResponse};
    use crate::error::{Error, LlmError, ToolError};
    use crate::tool::Tool;

    /// Replays canned completions and records every prompt.
    #[derive(Debug, Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String>>>,
        prompts: Mutex<Vec<ChatRequest>>,
        truncated: bool,
    }

    impl ScriptedProvider {
        fn new(replies: impl IntoIterator<Item = &'static str>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_owned())).collect()),
                prompts: Mutex::default(),
                truncated: false,
            })
        }

        fn truncating(replies: impl IntoIterator<Item = &'static str>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_owned())).collect()),
                prompts: Mutex::default(),
                truncated: true,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(VecDeque::from([Err(LlmError::network(
                    "connection refused",
                )
                .into())])),
                prompts: Mutex::default(),
                truncated: false,
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
            self.prompts.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("sem resposta".to_owned()))?;
            let mut response = ChatResponse::from_text(reply);
            response.truncated = self.truncated;
            Ok(response)
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted-model"
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct Echo;

    #[derive(Debug, Deserialize)]
    struct EchoArgs {
        query: String,
    }

    #[async_trait]
    impl Tool for Echo {
        const NAME: &'static str = "echo";
        type Args = EchoArgs;
        type Output = String;
        type Error = ToolError;

        fn description(&self) -> String {
            "Repete a consulta.".to_owned()
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            })
        }

        async fn call(&self, args: Self::Args) -> std::result::Result<String, ToolError> {
            if args.query == "falha" {
                return Err(ToolError::execution("sem rede"));
            }
            Ok(format!("eco: {}", args.query))
        }
    }

    fn executor(provider: &Arc<ScriptedProvider>) -> AgentExecutor {
        let shared: SharedChatProvider = provider.clone();
        AgentExecutor::new(shared, ToolBox::new().with(Echo))
    }

    fn input() -> AgentInput {
        AgentInput::new("Qual a capital da França?", "Nenhuma interação anterior.")
    }

    fn user_prompt(request: &ChatRequest) -> &str {
        &request.messages[0].content
    }

    mod final_answer {
        use super::*;

        #[tokio::test]
        async fn direct_answer_takes_one_call() {
            let provider = ScriptedProvider::new([" eu já sei\nResposta Final: Paris"]);
            let output = executor(&provider).invoke(&input()).await.unwrap();

            assert_eq!(output.output, "Paris");
            assert!(output.intermediate_steps.is_empty());
            assert_eq!(provider.requests().len(), 1);
        }

        #[tokio::test]
        async fn request_carries_prompt_model_and_stop() {
            let provider = ScriptedProvider::new(["Resposta Final: Paris"]);
            executor(&provider).invoke(&input()).await.unwrap();

            let request = &provider.requests()[0];
            assert_eq!(request.model, "scripted-model");
            assert_eq!(request.stop.as_deref(), Some(&["\nObservação:".to_owned()][..]));
            let prompt = user_prompt(request);
            assert!(prompt.contains("echo: Repete a consulta."));
            assert!(prompt.contains("deve ser uma de [echo]"));
            assert!(prompt.contains("Histórico da Conversa:\nNenhuma interação anterior."));
            assert!(prompt.ends_with("Pergunta: Qual a capital da França?\nRaciocínio:"));
        }

        #[tokio::test]
        async fn truncated_completion_is_still_parsed() {
            let provider = ScriptedProvider::truncating(["Resposta Final: Paris, a capital"]);
            let output = executor(&provider).invoke(&input()).await.unwrap();
            assert_eq!(output.output, "Paris, a capital");
        }

        #[tokio::test]
        async fn model_override_and_temperature() {
            let provider = ScriptedProvider::new(["Resposta Final: ok"]);
            executor(&provider)
                .model("gemma:4b")
                .temperature(0.0)
                .invoke(&input())
                .await
                .unwrap();

            let request = &provider.requests()[0];
            assert_eq!(request.model, "gemma:4b");
            assert_eq!(request.temperature, Some(0.0));
        }
    }

    mod tools {
        use super::*;

        #[tokio::test]
        async fn observation_is_fed_back_through_scratchpad() {
            let provider = ScriptedProvider::new([
                " preciso buscar\nFerramenta: echo\nEntrada da Ferramenta: capital da França",
                " agora eu sei a resposta final\nResposta Final: A capital da França é Paris.",
            ]);
            let output = executor(&provider).invoke(&input()).await.unwrap();

            assert_eq!(output.output, "A capital da França é Paris.");
            assert_eq!(output.intermediate_steps.len(), 1);
            assert_eq!(output.intermediate_steps[0].observation, "eco: capital da França");

            let second = user_prompt(&provider.requests()[1]).to_owned();
            assert!(second.ends_with(
                "Raciocínio: preciso buscar\nFerramenta: echo\nEntrada da Ferramenta: capital da França\
                 \nObservação: eco: capital da França\nRaciocínio: "
            ));
        }

        #[tokio::test]
        async fn unknown_tool_becomes_observation() {
            let provider = ScriptedProvider::new([
                "Ferramenta: google\nEntrada da Ferramenta: x",
                "Resposta Final: desisto",
            ]);
            let output = executor(&provider).invoke(&input()).await.unwrap();

            assert_eq!(
                output.intermediate_steps[0].observation,
                "google não é uma ferramenta válida, tente uma de [echo]."
            );
            assert_eq!(output.output, "desisto");
        }

        #[tokio::test]
        async fn tool_error_becomes_observation() {
            let provider = ScriptedProvider::new([
                "Ferramenta: echo\nEntrada da Ferramenta: falha",
                "Resposta Final: não consegui buscar",
            ]);
            let output = executor(&provider).invoke(&input()).await.unwrap();

            let observation = &output.intermediate_steps[0].observation;
            assert!(observation.starts_with("Erro ao executar a ferramenta echo:"));
            assert!(observation.contains("sem rede"));
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn parse_errors_are_retried_when_handled() {
            let provider = ScriptedProvider::new(["Olá!", "Resposta Final: Oi"]);
            let output = executor(&provider).invoke(&input()).await.unwrap();

            assert_eq!(output.output, "Oi");
            let step = &output.intermediate_steps[0];
            assert!(step.observation.starts_with("Formato inválido:"));
            assert_eq!(step.action.log, "Olá!");
        }

        #[tokio::test]
        async fn parse_errors_fail_the_turn_when_not_handled() {
            let provider = ScriptedProvider::new(["Olá!"]);
            let err = executor(&provider)
                .handle_parsing_errors(false)
                .invoke(&input())
                .await
                .unwrap_err();

            assert!(matches!(
                err,
                Error::OutputParse(OutputParserError::MissingAction(ref text)) if text == "Olá!"
            ));
        }

        #[tokio::test]
        async fn iteration_limit_stops_with_fixed_answer() {
            let provider = ScriptedProvider::new([
                "Ferramenta: echo\nEntrada da Ferramenta: a",
                "Ferramenta: echo\nEntrada da Ferramenta: b",
                "Resposta Final: tarde demais",
            ]);
            let output = executor(&provider)
                .max_iterations(2)
                .invoke(&input())
                .await
                .unwrap();

            assert_eq!(output.output, STOPPED_EARLY);
            assert_eq!(output.intermediate_steps.len(), 2);
            assert_eq!(output.intermediate_steps[1].observation, "eco: b");
            assert_eq!(provider.requests().len(), 2);
        }

        #[tokio::test]
        async fn zero_iterations_never_calls_the_model() {
            let provider = ScriptedProvider::new(["Resposta Final: x"]);
            let output = executor(&provider)
                .max_iterations(0)
                .invoke(&input())
                .await
                .unwrap();

            assert_eq!(output.output, STOPPED_EARLY);
            assert!(provider.requests().is_empty());
        }

        #[tokio::test]
        async fn provider_error_propagates() {
            let provider = ScriptedProvider::failing();
            let err = executor(&provider).invoke(&input()).await.unwrap_err();
            assert!(matches!(err, Error::Llm(LlmError::Network(_))));
        }

        #[tokio::test]
        async fn template_without_value_is_prompt_error() {
            let provider = ScriptedProvider::new(["Resposta Final: x"]);
            let template = PromptTemplate::new("{{ input }} {{ agent_scratchpad }} {{ idioma }}").unwrap();
            let err = executor(&provider)
                .template(template)
                .invoke(&input())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Prompt(_)));
            assert!(provider.requests().is_empty());
        }
    }

    #[test]
    fn scratchpad_format() {
        let steps = vec![AgentStep {
            action: AgentAction::new("echo", "x", " pensando\nFerramenta: echo\nEntrada da Ferramenta: x"),
            observation: "eco: x".to_owned(),
        }];
        assert_eq!(
            scratchpad(&steps),
            " pensando\nFerramenta: echo\nEntrada da Ferramenta: x\nObservação: eco: x\nRaciocínio: "
        );
        assert_eq!(scratchpad(&[]), "");
    }

    #[test]
    fn debug_hides_provider_internals() {
        let provider = ScriptedProvider::new(["Resposta Final: x"]);
        let rendered = format!("{:?}", executor(&provider));
        assert!(rendered.contains("scripted"));
        assert!(rendered.contains("max_iterations: 15"));
    }
}
