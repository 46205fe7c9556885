//! # 摄像头错误模型
//!
//! 平台层返回 `MediaAccessError`（对应浏览器 `DOMException` 的分类），
//! 状态机将其归一为 `CameraError`。设备缺失与权限拒绝必须区分：
//! 前者应引导用户改为上传照片，后者应引导用户去设置里授权。

use super::CameraStatus;

/// 平台媒体接口返回的原始错误分类。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaAccessError {
    /// 用户或策略拒绝授权（`NotAllowedError` / `PermissionDeniedError`）。
    #[error("permission denied")]
    NotAllowed,
    /// 没有可用设备（`NotFoundError` / `DevicesNotFoundError`）。
    #[error("device not found")]
    NotFound,
    /// 设备被占用或硬件故障（`NotReadableError` 等）。
    #[error("device not readable: {0}")]
    NotReadable(String),
    /// 其他已分类的平台错误。
    #[error("media error: {0}")]
    Other(String),
    /// 平台抛出的未分类异常。
    #[error("unexpected: {0}")]
    Unknown(String),
}

/// 摄像头链路统一错误类型。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("摄像头权限被拒绝")]
    PermissionDenied,

    #[error("未检测到摄像头")]
    DeviceNotFound,

    #[error("当前环境不支持摄像头")]
    Unsupported,

    #[error("摄像头获取失败：{0}")]
    Acquisition(String),

    #[error("摄像头发生意外错误：{0}")]
    Unexpected(String),

    #[error("摄像头未处于拍摄状态")]
    NotActive,

    #[error("没有可用的视频帧")]
    NoFrame,
}

impl From<MediaAccessError> for CameraError {
    fn from(error: MediaAccessError) -> Self {
        match error {
            MediaAccessError::NotAllowed => Self::PermissionDenied,
            MediaAccessError::NotFound => Self::DeviceNotFound,
            MediaAccessError::NotReadable(msg) | MediaAccessError::Other(msg) => {
                Self::Acquisition(msg)
            }
            MediaAccessError::Unknown(msg) => Self::Unexpected(msg),
        }
    }
}

impl CameraError {
    /// 获取失败后状态机应进入的状态；拍摄类错误不改变状态。
    pub fn status(&self) -> Option<CameraStatus> {
        match self {
            Self::PermissionDenied => Some(CameraStatus::Denied),
            Self::DeviceNotFound | Self::Unsupported => Some(CameraStatus::NotFound),
            Self::Acquisition(_) | Self::Unexpected(_) => Some(CameraStatus::Error),
            Self::NotActive | Self::NoFrame => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::DeviceNotFound | Self::Unsupported => "device_not_found",
            Self::Acquisition(_) | Self::Unexpected(_) => "acquisition_error",
            Self::NotActive => "camera_not_active",
            Self::NoFrame => "no_frame",
        }
    }

    /// 面向用户的提示，附带补救方式。
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "摄像头访问被阻止。请在设备设置中开启权限，或改用“上传照片”。"
            }
            Self::DeviceNotFound => "未在此设备上检测到摄像头。请改用上传照片。",
            Self::Unsupported => "当前浏览器不支持摄像头。请改用上传照片。",
            Self::Acquisition(_) => "无法访问摄像头。请检查浏览器权限，或改用“上传照片”。",
            Self::Unexpected(_) => "发生意外错误。请重试或上传照片。",
            Self::NotActive | Self::NoFrame => "摄像头尚未就绪，请稍后再拍。",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_errors_map_to_distinct_statuses() {
        assert_eq!(
            CameraError::from(MediaAccessError::NotAllowed).status(),
            Some(CameraStatus::Denied)
        );
        assert_eq!(
            CameraError::from(MediaAccessError::NotFound).status(),
            Some(CameraStatus::NotFound)
        );
        assert_eq!(
            CameraError::from(MediaAccessError::NotReadable("busy".into())).status(),
            Some(CameraStatus::Error)
        );
        assert_eq!(
            CameraError::from(MediaAccessError::Unknown("boom".into())),
            CameraError::Unexpected("boom".into())
        );
    }

    #[test]
    fn remediation_differs_between_permission_and_missing_device() {
        let denied = CameraError::PermissionDenied.user_message();
        let missing = CameraError::DeviceNotFound.user_message();

        assert!(denied.contains("设置"));
        assert!(!missing.contains("设置"));
        assert!(missing.contains("上传照片"));
        assert!(CameraError::Unsupported.user_message().contains("上传照片"));
    }
}
