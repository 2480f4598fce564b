mod gemini;
mod generator;
mod types;

pub use gemini::GeminiClient;
pub use generator::TextGenerator;
pub use types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
