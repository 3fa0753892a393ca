pub mod generate;
pub mod types;

pub use generate::GeminiGenerateClient;
