//! # 平台媒体接口抽象
//!
//! ## 设计思路
//!
//! 把“枚举设备 → 请求权限并打开视频流 → 绑定到预览 → 抓帧 → 停止轨道”
//! 抽象成两个 trait，状态机只依赖 trait，不依赖具体平台。
//! 挂起点只有两处：请求权限（`get_user_media`）与启动预览（`attach_to_sink`）。
//!
//! ## 实现思路
//!
//! - `MediaDevices`：平台能力入口，负责设备枚举与打开视频流。
//! - `MediaStream`：独占的视频流，`stop_all_tracks` 必须幂等。
//! - `StreamGuard`：RAII 守卫，`Drop` 时自动停止所有轨道，
//!   覆盖取消、报错、视图销毁等所有退出路径。

use std::future::Future;

use image::RgbaImage;

use super::MediaAccessError;

/// 设备类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// 枚举得到的设备信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    pub label: String,
}

impl MediaDeviceInfo {
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind: DeviceKind::VideoInput,
            label: label.into(),
        }
    }
}

/// 摄像头朝向偏好。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// 前置摄像头（自拍）。
    User,
    Environment,
}

/// 打开视频流时的约束。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            ideal_width: 1024,
            ideal_height: 1024,
        }
    }
}

/// 平台媒体能力。
pub trait MediaDevices {
    type Stream: MediaStream;

    /// 平台是否提供摄像头 API。
    fn is_supported(&self) -> bool;

    fn enumerate_devices(
        &self,
    ) -> impl Future<Output = Result<Vec<MediaDeviceInfo>, MediaAccessError>> + Send;

    /// 请求权限并打开视频流。
    fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> impl Future<Output = Result<Self::Stream, MediaAccessError>> + Send;
}

/// 独占的实时视频流。
pub trait MediaStream: Send {
    /// 绑定到预览并开始播放。
    fn attach_to_sink(&mut self) -> impl Future<Output = Result<(), MediaAccessError>> + Send;

    /// 以原始分辨率抓取当前帧（未镜像）；未绑定预览时返回 `None`。
    fn grab_frame(&self) -> Option<RgbaImage>;

    /// 停止所有轨道并解除预览绑定。
    fn stop_all_tracks(&mut self);
}

/// 没有摄像头 API 的环境（命令行、服务端）。
///
/// `is_supported` 恒为 `false`，状态机会直接进入 `NotFound`。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

/// `NoCamera` 的视频流类型，不可能被构造。
pub enum NoStream {}

impl MediaStream for NoStream {
    async fn attach_to_sink(&mut self) -> Result<(), MediaAccessError> {
        match *self {}
    }

    fn grab_frame(&self) -> Option<RgbaImage> {
        match *self {}
    }

    fn stop_all_tracks(&mut self) {
        match *self {}
    }
}

impl MediaDevices for NoCamera {
    type Stream = NoStream;

    fn is_supported(&self) -> bool {
        false
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaAccessError> {
        Ok(Vec::new())
    }

    async fn get_user_media(
        &self,
        _constraints: &VideoConstraints,
    ) -> Result<NoStream, MediaAccessError> {
        Err(MediaAccessError::NotFound)
    }
}

/// 视频流 RAII 守卫。
///
/// 构造即持有，`release` 或 `Drop` 时停止所有轨道，且只停止一次。
pub(crate) struct StreamGuard<S: MediaStream> {
    stream: Option<S>,
}

impl<S: MediaStream> StreamGuard<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub(crate) fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    pub(crate) async fn attach(&mut self) -> Result<(), MediaAccessError> {
        match self.stream.as_mut() {
            Some(stream) => stream.attach_to_sink().await,
            None => Err(MediaAccessError::Other("stream already released".to_string())),
        }
    }

    /// 停止所有轨道；返回本次调用是否真正执行了释放。
    pub(crate) fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop_all_tracks();
                log::debug!("📷 视频流已释放");
                true
            }
            None => false,
        }
    }
}

impl<S: MediaStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}
