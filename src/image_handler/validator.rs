//! # 上传校验模块
//!
//! ## 设计思路
//!
//! 在任何解码之前执行廉价的前置过滤，尽早失败，减少不必要内存与 CPU 消耗。
//! 只看调用方声明的类型与体积，不做内容嗅探：这里不是安全边界。
//!
//! ## 实现思路
//!
//! 1. 声明类型必须在 `accepted_types` 内（先判断，大小无关）
//! 2. 体积不超过 `max_file_size`（恰好等于上限时放行）

use super::source::{RawImageData, UploadedFile};
use super::{ImageConfig, ImageError, ImageHandler};

/// 校验声明类型与体积。
///
/// # 示例
/// ```rust
/// use celebrity_selfie::image_handler::{validate_image_file, ImageConfig, ImageError};
///
/// let config = ImageConfig::default();
/// assert!(validate_image_file("image/png", 1024, &config).is_ok());
/// assert!(matches!(
///     validate_image_file("image/gif", 1, &config),
///     Err(ImageError::UnsupportedType(_))
/// ));
/// ```
pub fn validate_image_file(
    declared_type: &str,
    size: u64,
    config: &ImageConfig,
) -> Result<(), ImageError> {
    let normalized = declared_type.trim().to_ascii_lowercase();
    if !config.accepted_types.iter().any(|t| *t == normalized) {
        return Err(ImageError::UnsupportedType(declared_type.to_string()));
    }

    if size > config.max_file_size {
        return Err(ImageError::TooLarge {
            size,
            limit: config.max_file_size,
        });
    }

    Ok(())
}

impl ImageHandler {
    /// 校验上传文件并取出原始字节。
    pub(super) fn load_from_upload(
        &self,
        file: UploadedFile,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!(
            "📁 开始校验上传图片 - 文件: {} 类型: {} 大小: {:.2} MB",
            file.name,
            file.declared_type,
            file.size() as f64 / 1024.0 / 1024.0
        );

        if let Err(err) = validate_image_file(&file.declared_type, file.size(), config) {
            log::warn!("⚠️ 上传图片未通过校验 - {}", err);
            return Err(err);
        }

        Ok(RawImageData {
            bytes: file.bytes,
            source_hint: "upload",
        })
    }
}
