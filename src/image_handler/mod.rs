//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“上传校验 → 解码 → 限定尺寸 → JPEG 编码 → 亮度提示”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线（含阻塞线程池调度）
//! - `validator`：上传文件的声明类型与体积前置过滤
//! - `pipeline`：解码、像素限制、降采样与编码
//! - `brightness`：摄像头静帧的亮度分析
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 上传文件                        摄像头静帧
//!    ↓                               ↓
//! validator.rs（类型/体积）     brightness.rs（偏暗提示，不阻断）
//!    ↓                               ↓
//! pipeline.rs（解码 + 像素限制）     │
//!    └──────────────┬────────────────┘
//!                   ↓
//!        pipeline.rs（≤1024 降采样 + JPEG 0.85）
//!                   ↓
//!            ProcessedImage（Data URL）
//! ```
//!
//! ## 分层职责建议
//!
//! - 配置与策略变更优先改 `config.rs`
//! - 业务流程顺序变更优先改 `handler.rs`
//! - 单阶段行为优化分别改 `validator/pipeline/brightness`

mod brightness;
mod config;
mod error;
mod handler;
mod pipeline;
mod source;
mod validator;

pub use brightness::{BrightnessReport, DARK_PHOTO_WARNING, analyze_brightness};
pub use config::{
    ACCEPTED_TYPES, DARK_THRESHOLD, ImageConfig, ImagePerformanceProfile, JPEG_QUALITY,
    MAX_DECODED_PIXELS, MAX_FILE_SIZE, TARGET_SIZE,
};
pub use error::ImageError;
pub use handler::ImageHandler;
pub use pipeline::compute_target_dimensions;
pub use source::{DEFAULT_MIME_TYPE, EncodedImage, ImageSource, ProcessedImage, UploadedFile};
pub use validator::validate_image_file;
