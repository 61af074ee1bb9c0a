use crate::error::GenerationError;
use crate::models::RetrievedChunk;
use crate::traits::ChatModel;
use std::sync::Arc;

/// Instruction block prepended to every completion call. The "say you don't
/// know" behavior for empty or unhelpful context lives here, not in code.
pub const SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences max and keep it concise.";

/// Substituted when the model call succeeds but the response carries no
/// answer text. Data-shape fallback, not error recovery.
pub const FALLBACK_ANSWER: &str = "Sorry, I don't have the answer to that.";

pub fn build_context(retrieved: &[RetrievedChunk]) -> String {
    retrieved
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Combines a query and its retrieved set into one prompt and invokes the
/// language model. An empty retrieved set still triggers a model call.
pub struct AnswerComposer {
    model: Arc<dyn ChatModel>,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn compose(
        &self,
        query: &str,
        retrieved: &[RetrievedChunk],
    ) -> Result<String, GenerationError> {
        let context = build_context(retrieved);
        let system = format!("{SYSTEM_PROMPT}\n\n{context}");

        match self.model.complete(&system, query).await? {
            Some(answer) => Ok(answer),
            None => Ok(FALLBACK_ANSWER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_context, AnswerComposer, FALLBACK_ANSWER};
    use crate::error::GenerationError;
    use crate::models::RetrievedChunk;
    use crate::traits::ChatModel;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct CannedModel {
        answer: Option<String>,
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
        ) -> Result<Option<String>, GenerationError> {
            Ok(self.answer.clone())
        }
    }

    fn hit(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: "chunk".to_string(),
            document_id: "doc".to_string(),
            source_path: "/tmp/kb.pdf".to_string(),
            page: 1,
            text: text.to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn context_joins_chunk_texts() {
        let context = build_context(&[hit("first"), hit("second")]);
        assert_eq!(context, "first\n\nsecond");
        assert_eq!(build_context(&[]), "");
    }

    #[tokio::test]
    async fn answerless_response_falls_back_to_fixed_message() {
        let composer = AnswerComposer::new(Arc::new(CannedModel { answer: None }));
        let answer = composer.compose("question?", &[]).await.expect("compose");
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn model_answer_is_returned_verbatim() {
        let composer = AnswerComposer::new(Arc::new(CannedModel {
            answer: Some("Paris.".to_string()),
        }));
        let answer = composer
            .compose("capital?", &[hit("The capital of France is Paris.")])
            .await
            .expect("compose");
        assert_eq!(answer, "Paris.");
    }
}
