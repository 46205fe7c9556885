//! # 采集编排（flow）
//!
//! ## 设计思路
//!
//! 把“首页 → 拍照 / 上传 → 选择人物 → 生成结果”串成一个显式的屏幕状态机。
//! 编排层独占摄像头会话与当前照片，所有转换都经由 `&mut self` 串行执行。
//!
//! ```text
//! Home ──open_camera──▶ Camera ──capture_preview / confirm_capture──┐
//!   │                     │ open_upload                             │
//!   └──open_upload──▶ Upload ◀┘ ──submit_upload─────────────────────┤
//!                                                                   ▼
//!           Result ◀──select_persona── SelectPersona ◀──上传照片（非致命）
//!             │ start_over
//!             ▼
//!            Home
//! ```
//!
//! ## 实现思路
//!
//! - 离开 `Camera` 的每条路径都会停止摄像头（`cancel` / `open_upload` / 拍摄完成）。
//! - 归一化通过 `ImageHandler::process` 在阻塞线程池执行，交互线程只等待结果。
//! - 交接阶段先把照片交给存储协作方；失败只记录 `warn`，流程照常进入人物选择。
//! - 生成失败保留在 `Result` 屏幕，可再次调用 `generate` 重试。
//! - 人物既可从目录中选择，也可直接给出展示名（`select_custom_persona`）。

use crate::camera::{CameraError, CameraStatus, CaptureSession, MediaDevices};
use crate::collaborators::{CollaboratorError, GenerationClient, GenerationOutcome, StorageClient};
use crate::image_handler::{
    BrightnessReport, ImageError, ImageHandler, ImageSource, ProcessedImage, UploadedFile,
};
use crate::persona::{self, Persona};

use bytes::Bytes;
use image::RgbaImage;
use serde::Serialize;

/// 当前屏幕。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    Home,
    Camera,
    Upload,
    SelectPersona,
    Result,
}

impl Screen {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Camera => "camera",
            Self::Upload => "upload",
            Self::SelectPersona => "select-persona",
            Self::Result => "result",
        }
    }
}

/// 拍摄后的预览：已镜像的静帧与亮度评估。
#[derive(Debug, Clone)]
pub struct CapturePreview {
    pub frame: RgbaImage,
    pub brightness: BrightnessReport,
}

impl CapturePreview {
    /// 偏暗时的提示，仅作建议，不阻止确认。
    pub fn warning(&self) -> Option<&'static str> {
        self.brightness.warning()
    }
}

/// 编排层错误。
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("当前屏幕 {screen} 不支持操作 {operation}")]
    InvalidTransition {
        operation: &'static str,
        screen: &'static str,
    },

    #[error("还没有拍摄预览")]
    NoPreview,

    #[error("还没有可用的照片")]
    NoUserImage,

    #[error("还没有选择人物")]
    NoPersona,

    #[error("未知人物：{0}")]
    UnknownPersona(String),

    #[error("人物名称不能为空")]
    EmptyPersonaName,

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl FlowError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::NoPreview => "no_preview",
            Self::NoUserImage => "no_user_image",
            Self::NoPersona => "no_persona",
            Self::UnknownPersona(_) => "unknown_persona",
            Self::EmptyPersonaName => "empty_persona_name",
            Self::Camera(e) => e.code(),
            Self::Image(e) => e.code(),
            Self::Collaborator(e) => e.code(),
        }
    }
}

/// 存储时使用的文件名：`selfie-<unix 毫秒>.jpg`。
pub fn upload_filename() -> String {
    format!("selfie-{}.jpg", chrono::Utc::now().timestamp_millis())
}

/// 采集编排器。
pub struct AcquisitionFlow<D: MediaDevices, S, G> {
    handler: ImageHandler,
    camera: CaptureSession<D>,
    storage: S,
    generator: G,
    screen: Screen,
    preview: Option<CapturePreview>,
    user_image: Option<ProcessedImage>,
    persona: Option<Persona>,
    result: Option<GenerationOutcome>,
}

impl<D, S, G> AcquisitionFlow<D, S, G>
where
    D: MediaDevices,
    S: StorageClient,
    G: GenerationClient,
{
    pub fn new(handler: ImageHandler, camera: CaptureSession<D>, storage: S, generator: G) -> Self {
        Self {
            handler,
            camera,
            storage,
            generator,
            screen: Screen::Home,
            preview: None,
            user_image: None,
            persona: None,
            result: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn camera_status(&self) -> CameraStatus {
        self.camera.status()
    }

    /// 摄像头失败时面向用户的提示。
    pub fn camera_message(&self) -> Option<&'static str> {
        self.camera.error_message()
    }

    pub fn preview(&self) -> Option<&CapturePreview> {
        self.preview.as_ref()
    }

    pub fn user_image(&self) -> Option<&ProcessedImage> {
        self.user_image.as_ref()
    }

    pub fn persona(&self) -> Option<&Persona> {
        self.persona.as_ref()
    }

    pub fn result(&self) -> Option<&GenerationOutcome> {
        self.result.as_ref()
    }

    fn expect_screen(&self, operation: &'static str, allowed: &[Screen]) -> Result<(), FlowError> {
        if allowed.contains(&self.screen) {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition {
                operation,
                screen: self.screen.as_str(),
            })
        }
    }

    fn go(&mut self, next: Screen) {
        if self.screen != next {
            log::debug!("🧭 屏幕切换：{} -> {}", self.screen.as_str(), next.as_str());
            self.screen = next;
        }
    }

    /// 进入拍照屏幕并打开摄像头。
    ///
    /// 摄像头获取失败时仍停留在 `Camera`，错误返回给调用方用于提示；
    /// 用户可以再次调用本方法重试，或转去上传。
    pub async fn open_camera(&mut self) -> Result<(), FlowError> {
        self.expect_screen("open_camera", &[Screen::Home, Screen::Camera])?;
        self.go(Screen::Camera);
        self.preview = None;
        self.camera.start().await?;
        Ok(())
    }

    /// 进入上传屏幕；从拍照屏幕过来时先释放摄像头。
    pub fn open_upload(&mut self) -> Result<(), FlowError> {
        self.expect_screen("open_upload", &[Screen::Home, Screen::Camera])?;
        self.release_camera();
        self.go(Screen::Upload);
        Ok(())
    }

    /// 返回首页。
    pub fn cancel(&mut self) {
        self.release_camera();
        self.go(Screen::Home);
    }

    fn release_camera(&mut self) {
        self.preview = None;
        if self.camera.has_live_stream() || self.camera.status() != CameraStatus::Idle {
            self.camera.stop();
        }
    }

    /// 抓取静帧、评估亮度并停止摄像头。
    pub fn capture_preview(&mut self) -> Result<&CapturePreview, FlowError> {
        self.expect_screen("capture_preview", &[Screen::Camera])?;

        let frame = self.camera.capture()?;
        let brightness = self.handler.check_brightness(&frame)?;
        if brightness.is_dark {
            log::info!("🌑 预览偏暗（mean={:.1}）", brightness.mean_luminance);
        }
        self.camera.stop();

        Ok(self.preview.insert(CapturePreview { frame, brightness }))
    }

    /// 丢弃预览并重新打开摄像头。
    pub async fn retake(&mut self) -> Result<(), FlowError> {
        self.expect_screen("retake", &[Screen::Camera])?;
        self.preview = None;
        self.camera.start().await?;
        Ok(())
    }

    /// 确认预览：归一化后交接。
    pub async fn confirm_capture(&mut self) -> Result<&ProcessedImage, FlowError> {
        self.expect_screen("confirm_capture", &[Screen::Camera])?;
        let preview = self.preview.take().ok_or(FlowError::NoPreview)?;

        let processed = match self.handler.process(ImageSource::Captured(preview.frame.clone())).await {
            Ok(processed) => processed,
            Err(err) => {
                log::warn!("⚠️ 拍摄照片处理失败（阶段 {}）- {}", err.stage(), err);
                self.preview = Some(preview);
                return Err(err.into());
            }
        };

        Ok(self.handoff(processed).await)
    }

    /// 校验并归一化上传文件，然后交接。
    ///
    /// 校验失败时停留在 `Upload`，错误携带面向用户的补救提示。
    pub async fn submit_upload(&mut self, file: UploadedFile) -> Result<&ProcessedImage, FlowError> {
        self.expect_screen("submit_upload", &[Screen::Upload])?;
        let processed = self
            .handler
            .process(ImageSource::Upload(file))
            .await
            .inspect_err(|err| log::warn!("⚠️ 上传照片处理失败（阶段 {}）- {}", err.stage(), err))?;
        Ok(self.handoff(processed).await)
    }

    /// 把照片交给存储协作方；失败不阻断流程。
    async fn handoff(&mut self, mut processed: ProcessedImage) -> &ProcessedImage {
        let encoded = processed.encoded_image();
        let content_type = encoded.mime_type().to_string();
        let filename = upload_filename();

        match encoded.decode_bytes() {
            Ok(bytes) => match self.storage.store(Bytes::from(bytes), &filename, &content_type).await {
                Ok(url) => {
                    log::info!("✅ 照片已存储：{}", url);
                    processed.attach_remote_url(url);
                }
                Err(err) => log::warn!("⚠️ 照片存储失败，继续流程 - {}", err),
            },
            Err(err) => log::warn!("⚠️ 照片存储跳过，载荷无法解码 - {}", err),
        }

        self.result = None;
        self.persona = None;
        self.go(Screen::SelectPersona);
        self.user_image.insert(processed)
    }

    /// 按目录 id 选择人物并进入结果屏幕。
    pub fn select_persona(&mut self, id: &str) -> Result<&Persona, FlowError> {
        self.expect_screen("select_persona", &[Screen::SelectPersona])?;
        if self.user_image.is_none() {
            return Err(FlowError::NoUserImage);
        }

        let persona = persona::find(id).ok_or_else(|| FlowError::UnknownPersona(id.to_string()))?;
        Ok(self.choose(persona.clone()))
    }

    /// 按展示名选择目录之外的人物，参考图使用占位图。
    pub fn select_custom_persona(&mut self, name: &str) -> Result<&Persona, FlowError> {
        self.expect_screen("select_custom_persona", &[Screen::SelectPersona])?;
        if self.user_image.is_none() {
            return Err(FlowError::NoUserImage);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(FlowError::EmptyPersonaName);
        }
        Ok(self.choose(Persona::from_name(name, persona::PLACEHOLDER_IMAGE_URL)))
    }

    fn choose(&mut self, persona: Persona) -> &Persona {
        log::info!("🎭 选择人物：{}（{}）", persona.name, persona.id);
        self.result = None;
        self.go(Screen::Result);
        self.persona.insert(persona)
    }

    /// 调用生成协作方；失败后可再次调用重试。
    pub async fn generate(&mut self) -> Result<&GenerationOutcome, FlowError> {
        self.expect_screen("generate", &[Screen::Result])?;
        let persona = self.persona.as_ref().ok_or(FlowError::NoPersona)?;
        let image = self.user_image.as_ref().ok_or(FlowError::NoUserImage)?;

        let outcome = self
            .generator
            .generate(image.encoded_image(), &persona.name)
            .await
            .inspect_err(|err| log::warn!("⚠️ 合影生成失败 - {}", err))?;

        Ok(self.result.insert(outcome))
    }

    /// 清空全部状态并回到首页。
    pub fn start_over(&mut self) {
        self.release_camera();
        self.user_image = None;
        self.persona = None;
        self.result = None;
        self.go(Screen::Home);
    }
}
