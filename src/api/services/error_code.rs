//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::GuardlinkError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 链接错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    TokenInvalid = 2002,
    RateLimitExceeded = 2004,

    // 链接错误 3000-3099
    LinkNotFound = 3000,
    LinkPasswordHashError = 3004,
    LinkDatabaseError = 3005,
    LinkDisabled = 3007,
    LinkInvalidPassword = 3008,
}

impl From<&GuardlinkError> for ErrorCode {
    fn from(err: &GuardlinkError) -> Self {
        match err {
            GuardlinkError::BadRequest(_) => ErrorCode::BadRequest,
            GuardlinkError::Unauthorized(_) => ErrorCode::Unauthorized,
            GuardlinkError::NotFound(_) => ErrorCode::LinkNotFound,
            GuardlinkError::Forbidden(_) => ErrorCode::LinkDisabled,
            GuardlinkError::InvalidPassword { .. } => ErrorCode::LinkInvalidPassword,
            GuardlinkError::DatabaseConfig(_)
            | GuardlinkError::DatabaseConnection(_)
            | GuardlinkError::DatabaseOperation(_) => ErrorCode::LinkDatabaseError,
            GuardlinkError::PasswordHash(_) => ErrorCode::LinkPasswordHashError,
            GuardlinkError::Internal(_)
            | GuardlinkError::Serialization(_)
            | GuardlinkError::FileOperation(_) => ErrorCode::InternalServerError,
        }
    }
}
