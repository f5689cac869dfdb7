pub mod completion_client;

pub use completion_client::{extract_question, Complete, CompletionClient};
