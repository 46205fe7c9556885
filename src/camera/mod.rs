//! # 摄像头模块（camera）
//!
//! ## 设计思路
//!
//! 管理前置摄像头从“请求权限 → 实时预览 → 抓取静帧 → 释放”的完整生命周期。
//! 平台差异全部收敛在 `device` 中的 trait 后面，状态机本身可用桩实现完整测试。
//!
//! - `device`：平台媒体接口 trait 与视频流 RAII 守卫
//! - `session`：`CaptureSession` 状态机
//! - `error`：平台错误分类与面向用户的错误提示

mod device;
mod error;
mod session;

use serde::Serialize;

pub use device::{
    DeviceKind, FacingMode, MediaDeviceInfo, MediaDevices, MediaStream, NoCamera, NoStream,
    VideoConstraints,
};
pub use error::{CameraError, MediaAccessError};
pub use session::CaptureSession;

/// 摄像头状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraStatus {
    Idle,
    Requesting,
    Active,
    Denied,
    NotFound,
    Error,
}

impl CameraStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Active => "active",
            Self::Denied => "denied",
            Self::NotFound => "not-found",
            Self::Error => "error",
        }
    }

    /// 是否处于获取失败的终态（可通过再次 start 重试）。
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Denied | Self::NotFound | Self::Error)
    }
}
