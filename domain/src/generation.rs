use shared::types::Result;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// Hosted chat model: rendered prompt in, generated text out.
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;

    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> impl Future<Output = Result<String>> + Send;
}
