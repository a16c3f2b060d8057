pub mod http;
pub mod js_executor;

pub use http::{HttpClient, HttpResponse};
pub use js_executor::JsExecutor;
