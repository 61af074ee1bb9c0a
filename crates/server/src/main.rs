mod api;

use anyhow::Context;
use api::AppState;
use chrono::Utc;
use clap::Parser;
use pdf_qa_core::{
    DiskVectorStore, GeminiChatModel, GeminiEmbedder, QaPipeline, SarvamSpeech, SarvamTranslator,
    SpeechSynthesizer, Translator, VoicePipeline,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa-server", version)]
struct Cli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "PDF_QA_BIND", default_value = "127.0.0.1:5000")]
    bind: String,

    /// Directory holding the persisted similarity index.
    #[arg(long, env = "PDF_QA_INDEX_DIR", default_value = "kb_index")]
    index_dir: PathBuf,

    /// Bundled default knowledge-base PDF.
    #[arg(long, env = "PDF_QA_DEFAULT_KB", default_value = "KnowledgeBase.pdf")]
    default_kb_file: PathBuf,

    /// Directory where uploaded documents are stored before ingestion.
    #[arg(long, env = "PDF_QA_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Google Generative Language API key.
    #[arg(long, env = "GOOGLE_API_KEY")]
    google_api_key: String,

    /// Base URL for the Google Generative Language API.
    #[arg(
        long,
        env = "PDF_QA_GEMINI_BASE",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    gemini_base_url: String,

    /// Embedding model identifier.
    #[arg(long, env = "PDF_QA_EMBEDDING_MODEL", default_value = "embedding-001")]
    embedding_model: String,

    /// Chat model identifier.
    #[arg(long, env = "PDF_QA_CHAT_MODEL", default_value = "gemini-2.0-flash")]
    chat_model: String,

    /// Sarvam API subscription key (translation and speech).
    #[arg(long, env = "SARVAM_API_KEY")]
    sarvam_api_key: String,

    /// Base URL for the Sarvam API.
    #[arg(long, env = "PDF_QA_SARVAM_BASE", default_value = "https://api.sarvam.ai")]
    sarvam_base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let embedder = Arc::new(GeminiEmbedder::with_endpoint(
        &cli.gemini_base_url,
        &cli.google_api_key,
        &cli.embedding_model,
    ));
    let index = Arc::new(DiskVectorStore::open(&cli.index_dir));
    let model = Arc::new(GeminiChatModel::with_endpoint(
        &cli.gemini_base_url,
        &cli.google_api_key,
        &cli.chat_model,
    ));
    let translator: Arc<dyn Translator> = Arc::new(SarvamTranslator::with_endpoint(
        &cli.sarvam_base_url,
        &cli.sarvam_api_key,
    ));
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(SarvamSpeech::with_endpoint(
        &cli.sarvam_base_url,
        &cli.sarvam_api_key,
    ));

    let qa = Arc::new(QaPipeline::new(embedder, index, model));
    let voice = Arc::new(VoicePipeline::new(
        qa.clone(),
        translator.clone(),
        speech.clone(),
    ));

    let state = AppState {
        qa,
        voice,
        translator,
        speech,
        default_kb_file: cli.default_kb_file,
        upload_dir: cli.upload_dir,
    };

    let app = api::router(state).layer(CorsLayer::permissive());

    info!(
        version = app_version,
        bind = %cli.bind,
        index_dir = %cli.index_dir.display(),
        started_at = %Utc::now().to_rfc3339(),
        "pdf-qa-server boot"
    );

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    axum::serve(listener, app)
        .await
        .context("server shutdown")?;
    Ok(())
}
