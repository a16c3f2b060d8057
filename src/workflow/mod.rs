pub mod task_ctx;
pub mod task_flow;
pub mod toolkit;

pub use task_ctx::TaskCtx;
pub use task_flow::{resolve_submit_endpoint, Evidence};
pub use toolkit::{Collaborators, Toolkit};
