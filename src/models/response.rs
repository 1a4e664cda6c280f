use serde::{Deserialize, Serialize};

/// 统一响应体：`{ status, msg, data? }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(msg: impl Into<String>, data: T) -> Self {
        ApiResponse { status: true, msg: msg.into(), data: Some(data) }
    }

    pub fn ok_msg(msg: impl Into<String>) -> Self {
        ApiResponse { status: true, msg: msg.into(), data: None }
    }

    pub fn fail(msg: impl Into<String>) -> Self {
        ApiResponse { status: false, msg: msg.into(), data: None }
    }
}
