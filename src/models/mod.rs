pub mod advisory;
pub mod answer;
pub mod artifact;
pub mod request;
pub mod submission;
pub mod task;

pub use advisory::Advisory;
pub use answer::Answer;
pub use artifact::Artifact;
pub use request::SolveRequest;
pub use submission::{SubmissionPayload, SubmissionResult};
pub use task::Task;
