pub mod model;
pub mod openai;
pub mod retry;
pub mod scripted;

pub use model::{
    CompletionClient, CompletionRequest, Message, MessageRole, ModelConfig,
    DETERMINISTIC_TEMPERATURE, SUMMARY_TEMPERATURE,
};
pub use openai::OpenAiClient;
pub use retry::complete_with_retry;
pub use scripted::ScriptedClient;
