use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardlinkError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Forbidden(String),
    /// 密码错误，携带当前累计失败次数与是否已被自动禁用
    InvalidPassword {
        attempts: i32,
        disabled: bool,
    },
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    PasswordHash(String),
    Internal(String),
    Serialization(String),
    FileOperation(String),
}

impl GuardlinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GuardlinkError::BadRequest(_) => "E001",
            GuardlinkError::Unauthorized(_) => "E002",
            GuardlinkError::NotFound(_) => "E003",
            GuardlinkError::Forbidden(_) => "E004",
            GuardlinkError::InvalidPassword { .. } => "E005",
            GuardlinkError::DatabaseConfig(_) => "E006",
            GuardlinkError::DatabaseConnection(_) => "E007",
            GuardlinkError::DatabaseOperation(_) => "E008",
            GuardlinkError::PasswordHash(_) => "E009",
            GuardlinkError::Internal(_) => "E010",
            GuardlinkError::Serialization(_) => "E011",
            GuardlinkError::FileOperation(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GuardlinkError::BadRequest(_) => "Bad Request",
            GuardlinkError::Unauthorized(_) => "Unauthorized",
            GuardlinkError::NotFound(_) => "Resource Not Found",
            GuardlinkError::Forbidden(_) => "Forbidden",
            GuardlinkError::InvalidPassword { .. } => "Invalid Password",
            GuardlinkError::DatabaseConfig(_) => "Database Configuration Error",
            GuardlinkError::DatabaseConnection(_) => "Database Connection Error",
            GuardlinkError::DatabaseOperation(_) => "Database Operation Error",
            GuardlinkError::PasswordHash(_) => "Password Hash Error",
            GuardlinkError::Internal(_) => "Internal Error",
            GuardlinkError::Serialization(_) => "Serialization Error",
            GuardlinkError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GuardlinkError::BadRequest(msg)
            | GuardlinkError::Unauthorized(msg)
            | GuardlinkError::NotFound(msg)
            | GuardlinkError::Forbidden(msg)
            | GuardlinkError::DatabaseConfig(msg)
            | GuardlinkError::DatabaseConnection(msg)
            | GuardlinkError::DatabaseOperation(msg)
            | GuardlinkError::PasswordHash(msg)
            | GuardlinkError::Internal(msg)
            | GuardlinkError::Serialization(msg)
            | GuardlinkError::FileOperation(msg) => msg,
            GuardlinkError::InvalidPassword { .. } => "Invalid password",
        }
    }

    /// 映射到 HTTP 状态码
    ///
    /// 存储层与内部错误统一映射为 500，细节只进日志，不返回给调用方。
    pub fn http_status(&self) -> StatusCode {
        match self {
            GuardlinkError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GuardlinkError::Unauthorized(_) | GuardlinkError::InvalidPassword { .. } => {
                StatusCode::UNAUTHORIZED
            }
            GuardlinkError::NotFound(_) => StatusCode::NOT_FOUND,
            GuardlinkError::Forbidden(_) => StatusCode::FORBIDDEN,
            GuardlinkError::DatabaseConfig(_)
            | GuardlinkError::DatabaseConnection(_)
            | GuardlinkError::DatabaseOperation(_)
            | GuardlinkError::PasswordHash(_)
            | GuardlinkError::Internal(_)
            | GuardlinkError::Serialization(_)
            | GuardlinkError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为服务端内部错误（消息不应暴露给客户端）
    pub fn is_internal(&self) -> bool {
        self.http_status() == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// 格式化为彩色输出（用于 Server 启动失败）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GuardlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GuardlinkError {}

// 便捷的构造函数
impl GuardlinkError {
    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::BadRequest(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::Unauthorized(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::NotFound(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::Forbidden(msg.into())
    }

    pub fn invalid_password(attempts: i32, disabled: bool) -> Self {
        GuardlinkError::InvalidPassword { attempts, disabled }
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::DatabaseOperation(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::PasswordHash(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::Internal(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        GuardlinkError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for GuardlinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        GuardlinkError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for GuardlinkError {
    fn from(err: std::io::Error) -> Self {
        GuardlinkError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GuardlinkError {
    fn from(err: serde_json::Error) -> Self {
        GuardlinkError::Serialization(err.to_string())
    }
}

impl From<crate::utils::password::PasswordError> for GuardlinkError {
    fn from(err: crate::utils::password::PasswordError) -> Self {
        GuardlinkError::PasswordHash(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GuardlinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            GuardlinkError::bad_request("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GuardlinkError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GuardlinkError::forbidden("x").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GuardlinkError::invalid_password(1, false).http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GuardlinkError::database_operation("x").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_password_message_has_no_secret() {
        let err = GuardlinkError::invalid_password(3, false);
        assert_eq!(err.message(), "Invalid password");
        assert_eq!(err.code(), "E005");
    }

    #[test]
    fn test_is_internal() {
        assert!(GuardlinkError::internal("boom").is_internal());
        assert!(GuardlinkError::password_hash("boom").is_internal());
        assert!(!GuardlinkError::not_found("nope").is_internal());
    }

    #[test]
    fn test_from_db_err() {
        let err: GuardlinkError = sea_orm::DbErr::Custom("broken".to_string()).into();
        assert!(matches!(err, GuardlinkError::DatabaseOperation(_)));
        assert!(err.message().contains("broken"));
    }

    #[test]
    fn test_format_simple() {
        let err = GuardlinkError::not_found("URL not found");
        assert_eq!(err.format_simple(), "Resource Not Found: URL not found");
    }
}
