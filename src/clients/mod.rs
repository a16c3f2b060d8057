pub mod evaluator_client;
pub mod github_client;
pub mod llm_client;

pub use evaluator_client::EvaluatorClient;
pub use github_client::{GithubClient, TreeEntry};
pub use llm_client::{ChatOptions, LlmClient};
