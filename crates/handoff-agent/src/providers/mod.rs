// ABOUTME: Provider module aggregating the LLM client adapters.
// ABOUTME: Each sub-module implements LlmClient for a specific completion API.

pub mod openai;

pub use openai::OpenAIClient;
