//! `Completer`: the LLM text-completion capability.

use async_trait::async_trait;

#[async_trait]
pub trait Completer: Send + Sync {
    /// Complete `prompt`, returning the model's raw text output.
    async fn complete(
        &self,
        prompt: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String, ToolProviderError>;
}

#[derive(Debug, thiserror::Error)]
#[error("tool provider error: {0}")]
pub struct ToolProviderError(pub String);

/// A deterministic stub used in this crate's own tests: echoes a canned
/// response regardless of prompt, never reaches a network.
#[derive(Debug, Default)]
pub struct StubCompleter {
    pub canned_response: String,
}

impl StubCompleter {
    pub fn new(canned_response: impl Into<String>) -> Self {
        Self {
            canned_response: canned_response.into(),
        }
    }
}

#[async_trait]
impl Completer for StubCompleter {
    async fn complete(
        &self,
        _prompt: &str,
        _temperature: Option<f32>,
        _max_tokens: Option<u32>,
    ) -> Result<String, ToolProviderError> {
        Ok(self.canned_response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_completer_echoes_canned_response() {
        let completer = StubCompleter::new("```sql\nSELECT 1\n```");
        let out = completer.complete("anything", None, None).await.unwrap();
        assert_eq!(out, "```sql\nSELECT 1\n```");
    }
}
