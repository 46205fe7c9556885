//! # 协作方错误模型
//!
//! 存储与生成两个外部协作方共用的错误类型。
//! 存储失败对流程是非致命的，生成失败则原样呈现给用户。

/// 外部协作方错误。
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// 缺少凭据（API Key / Token）。
    #[error("{0} 未配置")]
    MissingCredential(&'static str),

    /// 请求参数不完整。
    #[error("缺少必要参数：{0}")]
    InvalidRequest(String),

    /// 网络或传输层错误。
    #[error("请求失败：{0}")]
    Transport(String),

    /// 服务端返回非成功状态码。
    #[error("服务端返回 {status}：{body}")]
    Status { status: u16, body: String },

    /// 响应无法解析。
    #[error("响应格式错误：{0}")]
    InvalidResponse(String),

    /// 生成服务没有返回图片，携带服务端的文字说明。
    #[error("{0}")]
    NoImage(String),

    /// 本地文件读写失败。
    #[error("文件写入失败：{0}")]
    Io(#[from] std::io::Error),
}

impl CollaboratorError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential(_) => "missing_credential",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Transport(_) => "transport_error",
            Self::Status { .. } => "http_status",
            Self::InvalidResponse(_) => "invalid_response",
            Self::NoImage(_) => "no_image",
            Self::Io(_) => "io_error",
        }
    }
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}
