//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各模块各自定义细粒度错误（`ImageError` / `CameraError` / `CollaboratorError` /
//! `SettingsError` / `FlowError`），在应用边界统一汇聚为 `AppError`，
//! 替代分散的 `.map_err(|e| e.to_string())` 与 `expect()`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息，`#[from]` 免去手动转换。
//! - `code()` 给出稳定的机器可读编码，`remediation()` 给出面向用户的补救提示。
//! - 实现 `Serialize` 将错误序列化为字符串，便于直接写入 JSON 输出。

use serde::Serialize;

use crate::camera::CameraError;
use crate::collaborators::CollaboratorError;
use crate::flow::FlowError;
use crate::image_handler::ImageError;
use crate::settings::SettingsError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片校验与归一化
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 摄像头获取与拍摄
    #[error("{0}")]
    Camera(#[from] CameraError),

    /// 存储与生成协作方
    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    /// 设置加载
    #[error("{0}")]
    Settings(#[from] SettingsError),

    /// 屏幕流转
    #[error("{0}")]
    Flow(FlowError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 命令行参数错误
    #[error("参数错误: {0}")]
    Usage(String),
}

impl From<FlowError> for AppError {
    /// 展开编排层包裹的底层错误，保持错误分类扁平。
    fn from(error: FlowError) -> Self {
        match error {
            FlowError::Camera(e) => Self::Camera(e),
            FlowError::Image(e) => Self::Image(e),
            FlowError::Collaborator(e) => Self::Collaborator(e),
            other => Self::Flow(other),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Image(e) => e.code(),
            Self::Camera(e) => e.code(),
            Self::Collaborator(e) => e.code(),
            Self::Settings(_) => "settings_error",
            Self::Flow(e) => e.code(),
            Self::Io(_) => "io_error",
            Self::Usage(_) => "usage_error",
        }
    }

    /// 面向用户的补救提示。
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::Image(e) => Some(e.remediation()),
            Self::Camera(e) => Some(e.user_message()),
            Self::Collaborator(CollaboratorError::MissingCredential(_)) => {
                Some("请在环境变量或 .env 中配置对应的密钥。")
            }
            Self::Collaborator(_) => Some("生成失败，请稍后重试。"),
            _ => None,
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
