pub mod gemini;
pub mod provider;
pub mod types;

pub use gemini::GeminiGenerator;
pub use provider::Generator;
pub use types::{ChatMessage, GenerationRequest};
