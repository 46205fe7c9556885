//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageHandler` 只负责流程编排与配置管理，不与任何界面绑定。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 上传文件：校验声明类型与体积 → 解码；摄像头帧：直接使用像素
//! 3. 归一化（限定尺寸 + JPEG 编码）
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ImageConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 解码与归一化是 CPU 密集操作，放到 `spawn_blocking` 中执行，调用方以 future 等待。
//! - 记录 `load/normalize/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use image::{DynamicImage, RgbaImage};

use super::brightness::{BrightnessReport, analyze_brightness};
use super::source::{ImageSource, ProcessedImage};
use super::{ImageConfig, ImageError, ImagePerformanceProfile};

/// 图片处理器。
///
/// 封装了配置状态，并编排各子模块实现完整流程。
#[derive(Clone)]
pub struct ImageHandler {
    pub(super) config: Arc<RwLock<ImageConfig>>,
}

impl ImageHandler {
    /// 根据初始配置创建处理器。
    ///
    /// # 示例
    /// ```rust
    /// use celebrity_selfie::image_handler::{ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// # Ok::<(), celebrity_selfie::image_handler::ImageError>(())
    /// ```
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ImageConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::InvalidConfig("配置读取锁已中毒".to_string()))
    }

    /// 设置性能档位。
    pub fn set_performance_profile(&self, profile: ImagePerformanceProfile) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::InvalidConfig("配置写入锁已中毒".to_string()))?;
        config.apply_performance_profile(profile);

        log::info!(
            "⚙️ 已切换图片性能档位：{:?}（filter={:?}）",
            profile,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_performance_profile(&self) -> Result<ImagePerformanceProfile, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::InvalidConfig("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_performance_profile())
    }

    /// 对摄像头静帧做亮度分析（仅摄像头链路使用）。
    pub fn check_brightness(&self, frame: &RgbaImage) -> Result<BrightnessReport, ImageError> {
        let config = self.config_snapshot()?;
        Ok(analyze_brightness(frame, config.dark_threshold))
    }

    /// 同步处理入口：校验（仅上传）→ 解码 → 归一化。
    ///
    /// 失败时不产生任何中间成品。
    pub fn process_blocking(&self, source: ImageSource) -> Result<ProcessedImage, ImageError> {
        let config = self.config_snapshot()?;
        self.run_pipeline(source, &config)
    }

    /// 异步处理入口：在阻塞线程池中执行，避免占用交互线程。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use celebrity_selfie::image_handler::{ImageConfig, ImageHandler, ImageSource, UploadedFile};
    ///
    /// # async fn demo() -> Result<(), celebrity_selfie::image_handler::ImageError> {
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// let bytes = std::fs::read("selfie.png").unwrap_or_default();
    /// let processed = handler
    ///     .process(ImageSource::Upload(UploadedFile::new("selfie.png", "image/png", bytes)))
    ///     .await?;
    /// assert!(processed.width() <= 1024);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn process(&self, source: ImageSource) -> Result<ProcessedImage, ImageError> {
        let handler = self.clone();
        tokio::task::spawn_blocking(move || handler.process_blocking(source))
            .await
            .map_err(|e| ImageError::Surface(format!("归一化任务异常终止：{}", e)))?
    }

    fn run_pipeline(
        &self,
        source: ImageSource,
        config: &ImageConfig,
    ) -> Result<ProcessedImage, ImageError> {
        let total_start = Instant::now();

        let load_start = Instant::now();
        let (image, source_hint) = match source {
            ImageSource::Upload(file) => {
                let raw = self.load_from_upload(file, config)?;
                let hint = raw.source_hint;
                (Self::decode_upload(raw, config)?, hint)
            }
            ImageSource::Captured(frame) => (DynamicImage::ImageRgba8(frame), "camera"),
        };
        let load_elapsed = load_start.elapsed();

        let normalize_start = Instant::now();
        let processed = Self::normalize_image(image, config)?;
        let normalize_elapsed = normalize_start.elapsed();

        log::info!(
            "✅ 图片处理完成 - 来源: {} load={}ms normalize={}ms total={}ms",
            source_hint,
            load_elapsed.as_millis(),
            normalize_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(processed)
    }
}
