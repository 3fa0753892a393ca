//! PromptCodeGen backend - turns requirement documents into generated projects
//!
//! Uploaded documents are combined with prompt snippets and best practices
//! into a generation prompt. The generative backend's reply is interpreted
//! into file records and instructions, packaged as a ZIP archive and served
//! over HTTP.

pub mod ai;
pub mod app;
pub mod documents;
pub mod error;
pub mod models;
pub mod package;
pub mod practices;
pub mod prompts;
pub mod response;
pub mod server;
pub mod snippets;
pub mod store;

pub use error::{Error, Result};
