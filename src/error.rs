use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 口令不匹配
    #[error("禁止访问: {0}")]
    Forbidden(String),

    /// 缺少必需参数
    #[error("缺少参数: {0}")]
    MissingInput(String),

    /// 玩家资料获取/解析失败
    #[error("玩家资料获取失败: {0}")]
    UpstreamData(String),

    /// 背景图获取失败
    #[error("背景图获取失败: {0}")]
    UpstreamImage(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 上游请求错误（资料接口与图片接口共用）
#[derive(Error, Debug)]
pub enum FetchError {
    /// 请求超时
    #[error("请求超时")]
    Timeout,

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 非 2xx 状态码
    #[error("上游返回状态码 {0}")]
    Status(u16),

    /// 响应体无法解码（图片/JSON）
    #[error("解码失败: {0}")]
    Decode(String),

    /// 图片字节数过小，视为无效图片
    #[error("图片过小: {0} 字节")]
    TooSmall(usize),

    /// 没有任何可用的候选 ID
    #[error("没有可用的候选图片")]
    NoCandidate,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::MissingInput(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamData(_) | AppError::UpstreamImage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "请求失败: {}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "请求被拒绝: {}", self);
        }

        let mut res = (status, self.to_string()).into_response();
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<image::ImageError> for FetchError {
    fn from(err: image::ImageError) -> Self {
        FetchError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, FetchError};
    use axum::{
        http::{StatusCode, header},
        response::IntoResponse,
    };
    use std::time::Duration;

    async fn start_hanging_http_server() -> std::net::SocketAddr {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind tcp listener");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            loop {
                let (socket, _) = match listener.accept().await {
                    Ok(v) => v,
                    Err(_) => break,
                };
                tokio::spawn(async move {
                    // 不返回任何 HTTP 响应，触发客户端 read timeout。
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    drop(socket);
                });
            }
        });

        addr
    }

    #[tokio::test]
    async fn fetch_error_from_reqwest_timeout_is_timeout() {
        let addr = start_hanging_http_server().await;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("build reqwest client");

        let err = client
            .get(format!("http://{addr}/"))
            .send()
            .await
            .expect_err("expected timeout");

        let fe: FetchError = err.into();
        assert!(
            matches!(fe, FetchError::Timeout),
            "expected FetchError::Timeout, got: {fe:?}"
        );
    }

    #[tokio::test]
    async fn error_kinds_map_to_plain_text_statuses() {
        let cases = [
            (AppError::Forbidden("key".into()), StatusCode::FORBIDDEN),
            (AppError::MissingInput("uid".into()), StatusCode::BAD_REQUEST),
            (
                AppError::UpstreamData("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::UpstreamImage("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let resp = err.into_response();
            assert_eq!(resp.status(), status);
            let ct = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            assert!(ct.starts_with("text/plain"), "unexpected content-type {ct}");
            let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .expect("read body");
            assert!(!body.is_empty());
        }
    }
}
