use crate::config::EngineConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Rounds of tool execution allowed per `generate` call before the loop is
/// declared runaway.
pub const MAX_TOOL_ROUNDS: usize = 3;

/// A function the model may invoke while producing an answer.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the accepted arguments.
    fn parameters(&self) -> Value;
    async fn call(&self, args: &Value) -> Result<String, GenerationError>;
}

/// Black-box text generator. Tool calls, if any, are resolved internally;
/// callers receive final answer text only.
#[async_trait]
pub trait GenerativeModel {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclaration {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Candidate {
    pub content: Content,
}

/// First pending function call in the top candidate, if any.
pub(crate) fn pending_function_call(response: &GenerateResponse) -> Option<&FunctionCall> {
    response
        .candidates
        .first()?
        .content
        .parts
        .iter()
        .find_map(|part| part.function_call.as_ref())
}

/// Concatenated text parts of the top candidate.
pub(crate) fn response_text(response: &GenerateResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let text: String = candidate
        .content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Gemini `generateContent` client with an explicit, bounded tool-calling
/// loop: send, execute at most [`MAX_TOOL_ROUNDS`] requested tool calls
/// (appending each call and its result to the conversation), and return the
/// final text. Exceeding the cap is an error, not an infinite loop.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    tools: Vec<Box<dyn Tool>>,
    max_tool_rounds: usize,
}

impl GeminiGenerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: GEMINI_API_BASE.to_string(),
            api_key: config.api_key.clone(),
            model: config.generation_model.clone(),
            tools: Vec::new(),
            max_tool_rounds: MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    fn tool_declarations(&self) -> Vec<ToolDeclaration> {
        if self.tools.is_empty() {
            return Vec::new();
        }

        vec![ToolDeclaration {
            function_declarations: self
                .tools
                .iter()
                .map(|tool| FunctionDeclaration {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters(),
                })
                .collect(),
        }]
    }

    async fn send(&self, request: &GenerateRequest) -> Result<GenerateResponse, GenerationError> {
        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.api_base, self.model, self.api_key
            ))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.to_string(),
                details,
            });
        }

        Ok(response.json().await?)
    }

    async fn dispatch_tool(&self, call: &FunctionCall) -> Result<String, GenerationError> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.name() == call.name)
            .ok_or_else(|| GenerationError::UnknownTool(call.name.clone()))?;

        tool.call(&call.args).await
    }
}

#[async_trait]
impl GenerativeModel for GeminiGenerator {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let mut contents = vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part::text(prompt)],
        }];

        let mut rounds = 0;
        loop {
            let request = GenerateRequest {
                system_instruction: Content {
                    role: None,
                    parts: vec![Part::text(system_instruction)],
                },
                contents: contents.clone(),
                tools: self.tool_declarations(),
            };

            let response = self.send(&request).await?;

            if let Some(call) = pending_function_call(&response) {
                if rounds == self.max_tool_rounds {
                    return Err(GenerationError::ToolLoopExceeded {
                        rounds: self.max_tool_rounds,
                    });
                }
                rounds += 1;

                let call = call.clone();
                let result = self.dispatch_tool(&call).await?;

                let model_turn = response
                    .candidates
                    .first()
                    .map(|candidate| candidate.content.clone())
                    .ok_or(GenerationError::EmptyResponse)?;

                contents.push(Content {
                    role: Some("model".to_string()),
                    ..model_turn
                });
                contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![Part {
                        text: None,
                        function_call: None,
                        function_response: Some(FunctionResponse {
                            name: call.name,
                            response: serde_json::json!({ "content": result }),
                        }),
                    }],
                });
                continue;
            }

            return response_text(&response).ok_or(GenerationError::EmptyResponse);
        }
    }
}
