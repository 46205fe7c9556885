//! # 拍摄会话（摄像头状态机）
//!
//! ## 设计思路
//!
//! 一次摄像头交互对应一个 `CaptureSession`，它独占视频流并维护 `CameraStatus`：
//!
//! ```text
//!            start                 成功
//!   idle ───────────▶ requesting ────────▶ active
//!    ▲                   │                  │
//!    │                   ├─▶ not-found      │ stop / 重拍 / Drop
//!    │                   ├─▶ denied         │（无条件释放视频流）
//!    │                   └─▶ error          │
//!    └──────────────────────────────────────┘
//!   失败态只能通过再次 start 回到 requesting，状态机自身从不重试。
//! ```
//!
//! ## 实现思路
//!
//! - `start` / `stop` 都需要 `&mut self`，由借用规则保证不会并发发起第二次请求。
//! - 视频流包在 `StreamGuard` 中；获取途中失败、future 被丢弃、会话被销毁时都会停止轨道。
//! - 在 `active` 状态再次 `start`（重拍）会先释放旧流，保证任何时刻至多一条实时流。
//! - 预览是镜像显示的，抓取的静帧同样做水平翻转，使保存结果与用户所见一致。

use image::RgbaImage;
use image::imageops::flip_horizontal;

use super::device::{DeviceKind, MediaDevices, MediaStream, StreamGuard, VideoConstraints};
use super::{CameraError, CameraStatus};

/// 摄像头拍摄会话。
pub struct CaptureSession<D: MediaDevices> {
    devices: D,
    constraints: VideoConstraints,
    status: CameraStatus,
    stream: Option<StreamGuard<D::Stream>>,
    last_error: Option<CameraError>,
}

impl<D: MediaDevices> CaptureSession<D> {
    pub fn new(devices: D) -> Self {
        Self::with_constraints(devices, VideoConstraints::default())
    }

    pub fn with_constraints(devices: D, constraints: VideoConstraints) -> Self {
        Self {
            devices,
            constraints,
            status: CameraStatus::Idle,
            stream: None,
            last_error: None,
        }
    }

    pub fn status(&self) -> CameraStatus {
        self.status
    }

    /// 最近一次获取失败的原因。
    pub fn last_error(&self) -> Option<&CameraError> {
        self.last_error.as_ref()
    }

    /// 最近一次获取失败的用户提示。
    pub fn error_message(&self) -> Option<&'static str> {
        self.last_error.as_ref().map(CameraError::user_message)
    }

    pub fn has_live_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// 请求摄像头并开始预览。
    ///
    /// 失败时状态进入 `denied` / `not-found` / `error` 之一并返回错误，不会自动重试。
    pub async fn start(&mut self) -> Result<(), CameraError> {
        if self.release_stream() {
            log::info!("🔁 重新打开摄像头，已释放上一条视频流");
        }

        self.last_error = None;
        self.transition(CameraStatus::Requesting);

        match self.acquire().await {
            Ok(guard) => {
                self.stream = Some(guard);
                self.transition(CameraStatus::Active);
                Ok(())
            }
            Err(err) => {
                let next = err.status().unwrap_or(CameraStatus::Error);
                log::warn!("⚠️ 摄像头获取失败 - {}（status={}）", err, next.as_str());
                self.transition(next);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn acquire(&self) -> Result<StreamGuard<D::Stream>, CameraError> {
        if !self.devices.is_supported() {
            return Err(CameraError::Unsupported);
        }

        let devices = self.devices.enumerate_devices().await?;
        let video_inputs = devices
            .iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .count();
        if video_inputs == 0 {
            return Err(CameraError::DeviceNotFound);
        }
        log::debug!("📷 检测到 {} 个视频输入设备", video_inputs);

        let stream = self.devices.get_user_media(&self.constraints).await?;
        let mut guard = StreamGuard::new(stream);
        guard.attach().await?;

        Ok(guard)
    }

    /// 停止预览并释放全部硬件资源，状态回到 `idle`。
    pub fn stop(&mut self) {
        self.release_stream();
        self.transition(CameraStatus::Idle);
    }

    /// 抓取当前帧并水平镜像。
    ///
    /// 仅在 `active` 状态可用；未绑定预览或尚无画面时返回 `NoFrame`。
    pub fn capture(&self) -> Result<RgbaImage, CameraError> {
        if self.status != CameraStatus::Active {
            return Err(CameraError::NotActive);
        }

        let stream = self
            .stream
            .as_ref()
            .and_then(StreamGuard::stream)
            .ok_or(CameraError::NotActive)?;
        let frame = stream.grab_frame().ok_or(CameraError::NoFrame)?;

        log::info!("📸 已抓取静帧 - {}x{}", frame.width(), frame.height());

        Ok(flip_horizontal(&frame))
    }

    fn release_stream(&mut self) -> bool {
        self.stream
            .take()
            .map(|mut guard| guard.release())
            .unwrap_or(false)
    }

    fn transition(&mut self, next: CameraStatus) {
        if self.status != next {
            log::debug!("📷 摄像头状态：{} -> {}", self.status.as_str(), next.as_str());
        }
        self.status = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{MediaAccessError, MediaDeviceInfo, MediaStream};
    use image::Rgba;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct Counters {
        opened: Arc<AtomicUsize>,
        stopped: Arc<AtomicUsize>,
    }

    impl Counters {
        fn live(&self) -> usize {
            self.opened.load(Ordering::SeqCst) - self.stopped.load(Ordering::SeqCst)
        }
    }

    struct FakeStream {
        counters: Counters,
        attach_result: Result<(), MediaAccessError>,
        frame: Option<RgbaImage>,
    }

    impl MediaStream for FakeStream {
        async fn attach_to_sink(&mut self) -> Result<(), MediaAccessError> {
            self.attach_result.clone()
        }

        fn grab_frame(&self) -> Option<RgbaImage> {
            self.frame.clone()
        }

        fn stop_all_tracks(&mut self) {
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeDevices {
        supported: bool,
        devices: Vec<MediaDeviceInfo>,
        open_result: Result<(), MediaAccessError>,
        attach_result: Result<(), MediaAccessError>,
        frame: Option<RgbaImage>,
        counters: Counters,
    }

    impl FakeDevices {
        fn with_camera(counters: &Counters) -> Self {
            Self {
                supported: true,
                devices: vec![MediaDeviceInfo::video_input("cam-0", "Front Camera")],
                open_result: Ok(()),
                attach_result: Ok(()),
                frame: Some(asymmetric_frame()),
                counters: counters.clone(),
            }
        }
    }

    impl MediaDevices for FakeDevices {
        type Stream = FakeStream;

        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaAccessError> {
            Ok(self.devices.clone())
        }

        async fn get_user_media(
            &self,
            _constraints: &VideoConstraints,
        ) -> Result<FakeStream, MediaAccessError> {
            self.open_result.clone()?;
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(FakeStream {
                counters: self.counters.clone(),
                attach_result: self.attach_result.clone(),
                frame: self.frame.clone(),
            })
        }
    }

    /// 左半红、右半蓝的 4x2 帧。
    fn asymmetric_frame() -> RgbaImage {
        RgbaImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[tokio::test]
    async fn zero_video_devices_yields_not_found() {
        let counters = Counters::default();
        let mut devices = FakeDevices::with_camera(&counters);
        devices.devices = vec![MediaDeviceInfo {
            device_id: "mic".into(),
            kind: DeviceKind::AudioInput,
            label: "Mic".into(),
        }];
        let mut session = CaptureSession::new(devices);

        let result = session.start().await;

        assert_eq!(result, Err(CameraError::DeviceNotFound));
        assert_eq!(session.status(), CameraStatus::NotFound);
        assert!(session.error_message().is_some_and(|m| m.contains("上传照片")));
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_platform_yields_not_found() {
        let counters = Counters::default();
        let mut devices = FakeDevices::with_camera(&counters);
        devices.supported = false;
        let mut session = CaptureSession::new(devices);

        assert_eq!(session.start().await, Err(CameraError::Unsupported));
        assert_eq!(session.status(), CameraStatus::NotFound);
    }

    #[tokio::test]
    async fn permission_refusal_yields_denied() {
        let counters = Counters::default();
        let mut devices = FakeDevices::with_camera(&counters);
        devices.open_result = Err(MediaAccessError::NotAllowed);
        let mut session = CaptureSession::new(devices);

        assert_eq!(session.start().await, Err(CameraError::PermissionDenied));
        assert_eq!(session.status(), CameraStatus::Denied);
        assert!(session.error_message().is_some_and(|m| m.contains("设置")));
    }

    #[tokio::test]
    async fn busy_hardware_yields_error() {
        let counters = Counters::default();
        let mut devices = FakeDevices::with_camera(&counters);
        devices.open_result = Err(MediaAccessError::NotReadable("in use".into()));
        let mut session = CaptureSession::new(devices);

        assert!(matches!(session.start().await, Err(CameraError::Acquisition(_))));
        assert_eq!(session.status(), CameraStatus::Error);
    }

    #[tokio::test]
    async fn attach_failure_releases_acquired_stream() {
        let counters = Counters::default();
        let mut devices = FakeDevices::with_camera(&counters);
        devices.attach_result = Err(MediaAccessError::Other("play() rejected".into()));
        let mut session = CaptureSession::new(devices);

        assert!(session.start().await.is_err());
        assert_eq!(session.status(), CameraStatus::Error);
        assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 1);
        assert!(!session.has_live_stream());
    }

    #[tokio::test]
    async fn cancel_releases_stream_and_returns_to_idle() {
        let counters = Counters::default();
        let mut session = CaptureSession::new(FakeDevices::with_camera(&counters));

        session.start().await.expect("camera should start");
        assert_eq!(session.status(), CameraStatus::Active);
        assert_eq!(counters.live(), 1);

        session.stop();

        assert_eq!(session.status(), CameraStatus::Idle);
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 1);
        assert_eq!(counters.live(), 0);
    }

    #[tokio::test]
    async fn retake_never_holds_two_streams() {
        let counters = Counters::default();
        let mut session = CaptureSession::new(FakeDevices::with_camera(&counters));

        session.start().await.expect("camera should start");
        session.start().await.expect("camera should restart");

        assert_eq!(counters.opened.load(Ordering::SeqCst), 2);
        assert_eq!(counters.live(), 1);
    }

    #[tokio::test]
    async fn dropping_session_releases_stream() {
        let counters = Counters::default();
        {
            let mut session = CaptureSession::new(FakeDevices::with_camera(&counters));
            session.start().await.expect("camera should start");
            assert_eq!(counters.live(), 1);
        }
        assert_eq!(counters.live(), 0);
    }

    #[tokio::test]
    async fn failed_state_retries_only_on_explicit_start() {
        let counters = Counters::default();
        let mut devices = FakeDevices::with_camera(&counters);
        devices.open_result = Err(MediaAccessError::NotAllowed);
        let mut session = CaptureSession::new(devices);

        assert!(session.start().await.is_err());
        assert_eq!(session.status(), CameraStatus::Denied);
        assert_eq!(session.status(), CameraStatus::Denied);

        session.devices.open_result = Ok(());
        session.start().await.expect("explicit retry should succeed");
        assert_eq!(session.status(), CameraStatus::Active);
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn capture_is_mirrored_and_native_resolution() {
        let counters = Counters::default();
        let mut session = CaptureSession::new(FakeDevices::with_camera(&counters));
        session.start().await.expect("camera should start");

        let still = session.capture().expect("capture should succeed");

        assert_eq!(still.dimensions(), (4, 2));
        assert_eq!(still.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(still.get_pixel(3, 1), &Rgba([255, 0, 0, 255]));
    }

    #[tokio::test]
    async fn capture_outside_active_fails() {
        let counters = Counters::default();
        let mut session = CaptureSession::new(FakeDevices::with_camera(&counters));

        assert_eq!(session.capture(), Err(CameraError::NotActive));

        session.start().await.expect("camera should start");
        session.stop();
        assert_eq!(session.capture(), Err(CameraError::NotActive));
    }

    #[tokio::test]
    async fn capture_without_frame_sink_fails() {
        let counters = Counters::default();
        let mut devices = FakeDevices::with_camera(&counters);
        devices.frame = None;
        let mut session = CaptureSession::new(devices);
        session.start().await.expect("camera should start");

        assert_eq!(session.capture(), Err(CameraError::NoFrame));
    }
}
