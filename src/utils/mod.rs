pub mod http;
pub mod lenient;

pub use http::{request_with_retry, RetryPolicy};
