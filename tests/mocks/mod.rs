pub mod loader;
pub mod summarizer;
pub mod transcript;
