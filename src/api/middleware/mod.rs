pub mod auth;
pub mod request_log;

pub use auth::{Principal, UserAuth};
pub use request_log::{RequestId, RequestLog};
