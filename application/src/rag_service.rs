use crate::retriever::Retriever;
use domain::embedding::TextEmbedder;
use domain::error::RagError;
use domain::generation::{GenerationParams, LanguageModel};
use domain::models::{QueryOutcome, ScoredChunk};
use domain::prompt::{build_context, render_prompt};
use domain::query_log::QueryLogRecord;
use infrastructure::query_logger::QueryLogger;
use shared::telemetry::Telemetry;
use shared::types::Result;

/// Answers questions from retrieved course passages.
pub struct RagService<E, L> {
    retriever: Retriever<E>,
    model: L,
    params: GenerationParams,
    logger: QueryLogger,
}

impl<E: TextEmbedder, L: LanguageModel> RagService<E, L> {
    pub fn new(
        retriever: Retriever<E>,
        model: L,
        params: GenerationParams,
        logger: QueryLogger,
    ) -> Self {
        Self {
            retriever,
            model,
            params,
            logger,
        }
    }

    pub fn retriever(&self) -> &Retriever<E> {
        &self.retriever
    }

    pub fn model(&self) -> &L {
        &self.model
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Ask one question. Retrieval and generation failures become
    /// `QueryOutcome::Failure`; only a failed query-log write is an `Err`.
    pub async fn ask(&self, question: &str) -> Result<QueryOutcome> {
        tracing::info!("Question: {question}");
        let timer = Telemetry::new();

        match self.answer(question).await {
            Ok((text, sources)) => {
                let elapsed = timer.elapsed_secs();
                tracing::info!(
                    sources = sources.len(),
                    "Answered in {elapsed:.2}s ({} chars)",
                    text.chars().count()
                );
                self.logger.append(&QueryLogRecord::success(
                    question,
                    self.model.model_id(),
                    &text,
                    &sources,
                    elapsed,
                ))?;
                Ok(QueryOutcome::Answer { text, sources })
            }
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::error!(question, "Error during query: {reason}");
                self.logger.append(&QueryLogRecord::failure(
                    question,
                    self.model.model_id(),
                    &reason,
                    timer.elapsed_secs(),
                ))?;
                Ok(QueryOutcome::Failure { reason })
            }
        }
    }

    async fn answer(&self, question: &str) -> Result<(String, Vec<ScoredChunk>)> {
        let sources = self.retriever.retrieve(question).await?;
        let context = build_context(&sources);
        let prompt = render_prompt(&context, question);
        let text = self.model.generate(&prompt, &self.params).await?;
        if text.trim().is_empty() {
            return Err(RagError::Generation("model returned an empty answer".into()).into());
        }
        Ok((text, sources))
    }
}
