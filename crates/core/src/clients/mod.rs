pub mod gemini;
pub mod sarvam;

pub use gemini::{GeminiChatModel, GeminiEmbedder};
pub use sarvam::{SarvamSpeech, SarvamTranslator};
