use crate::composer::AnswerComposer;
use crate::error::{EmbeddingServiceError, PipelineError};
use crate::ingest::ingest_document_chunks;
use crate::models::{ChunkingOptions, IndexRecord, TtsOptions, VoiceAnswer, WORKING_LANGUAGE};
use crate::retriever::Retriever;
use crate::traits::{ChatModel, Embedder, SpeechSynthesizer, Translator, VectorIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Wires the write path (ingest -> embed -> append) and the read path
/// (retrieve -> compose). Service handles are injected at construction and
/// live for the process lifetime; there is no caching and no background
/// execution, every call runs synchronously to completion.
pub struct QaPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    retriever: Retriever,
    composer: AnswerComposer,
    chunking: ChunkingOptions,
}

impl QaPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        let retriever = Retriever::new(embedder.clone(), index.clone());
        Self {
            embedder,
            index,
            retriever,
            composer: AnswerComposer::new(model),
            chunking: ChunkingOptions::default(),
        }
    }

    pub fn with_chunking(mut self, options: ChunkingOptions) -> Self {
        self.chunking = options;
        self
    }

    /// Write path. Blocks until every chunk of the document is embedded and
    /// appended, and returns how many records were added. Not idempotent:
    /// re-ingesting the same document duplicates its chunks. A failure
    /// partway through performs no rollback.
    pub async fn ingest_document(&self, path: &Path) -> Result<usize, PipelineError> {
        let chunks = ingest_document_chunks(path, &self.chunking)?;
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();

        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(EmbeddingServiceError::BackendResponse {
                backend: "embedder".to_string(),
                details: format!("{} embeddings for {} chunks", vectors.len(), chunks.len()),
            }
            .into());
        }

        let records: Vec<IndexRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexRecord::from_chunk(chunk, vector))
            .collect();
        let appended = records.len();

        self.index.append(records).await?;
        info!(path = %path.display(), chunks = appended, "document ingested");
        Ok(appended)
    }

    /// Read path: retrieve top-k context, compose one prompt, generate.
    pub async fn ask(&self, query: &str) -> Result<String, PipelineError> {
        let retrieved = self.retriever.retrieve(query).await?;
        debug!(hits = retrieved.len(), "context retrieved");
        Ok(self.composer.compose(query, &retrieved).await?)
    }

    pub async fn index_size(&self) -> Result<usize, PipelineError> {
        Ok(self.index.count().await?)
    }
}

/// Voice path as an explicit stage chain: translate the query into the
/// working language, answer, translate the answer back (skipped when the
/// target already is the working language), synthesize audio. Any failing
/// stage aborts the whole request.
pub struct VoicePipeline {
    qa: Arc<QaPipeline>,
    translator: Arc<dyn Translator>,
    speech: Arc<dyn SpeechSynthesizer>,
    working_language: String,
}

impl VoicePipeline {
    pub fn new(
        qa: Arc<QaPipeline>,
        translator: Arc<dyn Translator>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            qa,
            translator,
            speech,
            working_language: WORKING_LANGUAGE.to_string(),
        }
    }

    pub async fn voice_ask(
        &self,
        query: &str,
        target_language_code: &str,
        tts: &TtsOptions,
    ) -> Result<VoiceAnswer, PipelineError> {
        let working_query = self
            .translator
            .translate(query, "auto", &self.working_language)
            .await?;

        let answer = self.qa.ask(&working_query).await?;

        let localized = if target_language_code == self.working_language {
            answer
        } else {
            self.translator
                .translate(&answer, &self.working_language, target_language_code)
                .await?
        };

        let audio_wav = self
            .speech
            .synthesize(&localized, target_language_code, tts)
            .await?;

        info!(
            language = target_language_code,
            bytes = audio_wav.len(),
            "voice answer synthesized"
        );
        Ok(VoiceAnswer {
            answer: localized,
            audio_wav,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{QaPipeline, VoicePipeline};
    use crate::composer::FALLBACK_ANSWER;
    use crate::error::{GenerationError, SpeechServiceError, TranslationServiceError};
    use crate::models::TtsOptions;
    use crate::store::DiskVectorStore;
    use crate::test_util::{write_test_pdf, HashingEmbedder};
    use crate::traits::{ChatModel, SpeechSynthesizer, Translator};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Answers from the context block the way the instruction template
    /// expects the real model to.
    struct ContextBoundModel;

    #[async_trait]
    impl ChatModel for ContextBoundModel {
        async fn complete(
            &self,
            system: &str,
            _user: &str,
        ) -> Result<Option<String>, GenerationError> {
            if system.contains("Paris") {
                Ok(Some("The capital of France is Paris.".to_string()))
            } else {
                Ok(Some("I don't know the answer to that.".to_string()))
            }
        }
    }

    struct AnswerlessModel;

    #[async_trait]
    impl ChatModel for AnswerlessModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
        ) -> Result<Option<String>, GenerationError> {
            Ok(None)
        }
    }

    struct CountingTranslator {
        calls: AtomicUsize,
    }

    impl CountingTranslator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        async fn translate(
            &self,
            input: &str,
            _source: &str,
            target: &str,
        ) -> Result<String, TranslationServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("[{target}] {input}"))
        }
    }

    struct FakeSpeech;

    #[async_trait]
    impl SpeechSynthesizer for FakeSpeech {
        async fn synthesize(
            &self,
            _text: &str,
            _target_language_code: &str,
            _options: &TtsOptions,
        ) -> Result<Vec<u8>, SpeechServiceError> {
            Ok(b"RIFFfake-wav".to_vec())
        }
    }

    fn pipeline(dir: &std::path::Path, model: Arc<dyn ChatModel>) -> QaPipeline {
        QaPipeline::new(
            Arc::new(HashingEmbedder::default()),
            Arc::new(DiskVectorStore::open(dir.join("index"))),
            model,
        )
    }

    #[tokio::test]
    async fn ingest_then_ask_answers_from_the_document() {
        let dir = tempdir().expect("tempdir");
        let pdf = dir.path().join("kb.pdf");
        write_test_pdf(&pdf, "The capital of France is Paris.");

        let pipeline = pipeline(dir.path(), Arc::new(ContextBoundModel));
        let appended = pipeline.ingest_document(&pdf).await.expect("ingest");
        assert!(appended > 0);
        assert_eq!(pipeline.index_size().await.expect("size"), appended);

        let answer = pipeline
            .ask("What is the capital of France?")
            .await
            .expect("ask");
        assert!(answer.contains("Paris"));
    }

    #[tokio::test]
    async fn asking_an_empty_index_admits_ignorance() {
        let dir = tempdir().expect("tempdir");
        let pipeline = pipeline(dir.path(), Arc::new(ContextBoundModel));

        let answer = pipeline
            .ask("What is the capital of France?")
            .await
            .expect("ask");
        assert!(answer.contains("don't know"));
    }

    #[tokio::test]
    async fn re_ingesting_doubles_the_index() {
        let dir = tempdir().expect("tempdir");
        let pdf = dir.path().join("kb.pdf");
        write_test_pdf(&pdf, "The capital of France is Paris.");

        let pipeline = pipeline(dir.path(), Arc::new(ContextBoundModel));
        let first = pipeline.ingest_document(&pdf).await.expect("first ingest");
        let second = pipeline.ingest_document(&pdf).await.expect("second ingest");

        assert_eq!(first, second);
        assert_eq!(pipeline.index_size().await.expect("size"), first * 2);
    }

    #[tokio::test]
    async fn answerless_model_response_yields_the_fallback() {
        let dir = tempdir().expect("tempdir");
        let pipeline = pipeline(dir.path(), Arc::new(AnswerlessModel));

        let answer = pipeline.ask("anything?").await.expect("ask");
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn voice_ask_translates_twice_and_returns_audio() {
        let dir = tempdir().expect("tempdir");
        let qa = Arc::new(pipeline(dir.path(), Arc::new(ContextBoundModel)));
        let translator = Arc::new(CountingTranslator::new());
        let voice = VoicePipeline::new(qa, translator.clone(), Arc::new(FakeSpeech));

        let result = voice
            .voice_ask("Quelle est la capitale ?", "fr-FR", &TtsOptions::default())
            .await
            .expect("voice ask");

        assert_eq!(translator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.audio_wav, b"RIFFfake-wav".to_vec());
        assert!(result.answer.starts_with("[fr-FR]"));
    }

    #[tokio::test]
    async fn voice_ask_in_the_working_language_translates_once() {
        let dir = tempdir().expect("tempdir");
        let qa = Arc::new(pipeline(dir.path(), Arc::new(ContextBoundModel)));
        let translator = Arc::new(CountingTranslator::new());
        let voice = VoicePipeline::new(qa, translator.clone(), Arc::new(FakeSpeech));

        let result = voice
            .voice_ask("What is the capital?", "en-IN", &TtsOptions::default())
            .await
            .expect("voice ask");

        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
        assert!(!result.audio_wav.is_empty());
    }
}
