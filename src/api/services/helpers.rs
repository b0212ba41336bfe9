//! API 响应帮助函数

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use tracing::{debug, error};

use crate::errors::GuardlinkError;

use super::error_code::ErrorCode;

/// 错误响应体
///
/// `attempts` / `disabled` 只在密码错误时出现。
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: ErrorCode,
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// 构建错误响应
pub fn error_response(status: StatusCode, code: ErrorCode, message: &str) -> HttpResponse {
    json_response(
        status,
        &ErrorBody {
            code,
            error: message,
            attempts: None,
            disabled: None,
        },
    )
}

/// 从 GuardlinkError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 内部错误的细节只写日志，客户端只看到通用消息。
pub fn error_from_guardlink(err: &GuardlinkError) -> HttpResponse {
    let status = err.http_status();
    let code = ErrorCode::from(err);

    if err.is_internal() {
        error!("Request failed: {}", err);
        return error_response(status, code, "Internal server error");
    }

    debug!("Request rejected: {}", err);
    let (attempts, disabled) = match err {
        GuardlinkError::InvalidPassword { attempts, disabled } => {
            (Some(*attempts), Some(*disabled))
        }
        _ => (None, None),
    };

    json_response(
        status,
        &ErrorBody {
            code,
            error: err.message(),
            attempts,
            disabled,
        },
    )
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + JSON 数据，失败时自动映射 GuardlinkError。
pub fn api_result<T: Serialize>(result: Result<T, GuardlinkError>) -> HttpResponse {
    match result {
        Ok(data) => json_response(StatusCode::OK, &data),
        Err(e) => error_from_guardlink(&e),
    }
}

/// 请求体不是合法 JSON 时返回 400，而不是 actix 默认的纯文本
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            let message = format!("Invalid request body: {}", err);
            let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
            InternalError::from_response(err, response).into()
        })
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    async fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_rt::test]
    async fn test_invalid_password_body_has_counters() {
        let resp = error_from_guardlink(&GuardlinkError::invalid_password(3, false));
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "Invalid password");
        assert_eq!(json["attempts"], 3);
        assert_eq!(json["disabled"], false);
        assert_eq!(json["code"], ErrorCode::LinkInvalidPassword as i32);
    }

    #[actix_rt::test]
    async fn test_plain_error_body_omits_counters() {
        let json = body_json(error_from_guardlink(&GuardlinkError::not_found(
            "URL not found",
        )))
        .await;

        assert_eq!(json["error"], "URL not found");
        assert!(json.get("attempts").is_none());
        assert!(json.get("disabled").is_none());
    }

    #[actix_rt::test]
    async fn test_internal_details_are_hidden() {
        let resp = error_from_guardlink(&GuardlinkError::database_operation(
            "UNIQUE constraint failed: links.alias",
        ));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "Internal server error");
    }

    #[actix_rt::test]
    async fn test_api_result_success() {
        let resp = api_result(Ok::<_, GuardlinkError>(serde_json::json!({"ok": true})));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["ok"], true);
    }
}
