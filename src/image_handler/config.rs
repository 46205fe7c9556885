//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ImageConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中性能档位（quality / balanced / speed）作为高层语义，映射到底层缩放滤镜。
//!
//! ## 实现思路
//!
//! - `Default` 提供与产品约定一致的配置：边长上限 1024、JPEG 质量 85、上传上限 10MB。
//! - `ImagePerformanceProfile` 负责档位字符串解析与反向输出。
//! - 任何档位都不会落到最近邻插值：送入生成模型的图片需要平滑降采样。

use image::imageops::FilterType;

use super::ImageError;

/// 归一化后单边最大像素。
pub const TARGET_SIZE: u32 = 1024;
/// 上传文件体积上限（字节）。
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
/// JPEG 重新编码质量（对应 0.85）。
pub const JPEG_QUALITY: u8 = 85;
/// 平均亮度低于该值视为偏暗（0~255）。
pub const DARK_THRESHOLD: f64 = 60.0;
/// 解码后的像素上限，与浏览器画布的面积上限一致（16384 x 16384）。
pub const MAX_DECODED_PIXELS: u64 = 268_435_456;
/// 允许上传的声明类型。
pub const ACCEPTED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// 图片处理配置。
#[derive(Debug, Clone, PartialEq)]
pub struct ImageConfig {
    /// 归一化后宽/高单边最大值。
    pub target_size: u32,
    /// 极端宽高比时短边的最小像素。
    pub min_dimension: u32,
    /// JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
    /// 上传文件允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 允许的声明 MIME 类型。
    pub accepted_types: Vec<String>,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 降采样滤镜策略。
    pub resize_filter: FilterType,
    /// 偏暗判定阈值。
    pub dark_threshold: f64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            target_size: TARGET_SIZE,
            min_dimension: 1,
            jpeg_quality: JPEG_QUALITY,
            max_file_size: MAX_FILE_SIZE,
            accepted_types: ACCEPTED_TYPES.iter().map(|t| t.to_string()).collect(),
            max_decoded_pixels: MAX_DECODED_PIXELS,
            resize_filter: FilterType::Triangle,
            dark_threshold: DARK_THRESHOLD,
        }
    }
}

/// 图片性能档位（面向产品/用户语义）。
///
/// - `Quality`：Lanczos3，尽量保真
/// - `Balanced`：Catmull-Rom
/// - `Speed`：双线性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePerformanceProfile {
    Quality,
    Balanced,
    Speed,
}

impl ImagePerformanceProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use celebrity_selfie::image_handler::ImagePerformanceProfile;
    ///
    /// let p = ImagePerformanceProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), celebrity_selfie::image_handler::ImageError>(())
    /// ```
    pub fn from_str(profile: &str) -> Result<Self, ImageError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ImageError::InvalidConfig(format!(
                "未知性能档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl ImageConfig {
    /// 基于当前滤镜反推性能档位。
    pub(crate) fn infer_performance_profile(&self) -> ImagePerformanceProfile {
        match self.resize_filter {
            FilterType::Lanczos3 | FilterType::Gaussian => ImagePerformanceProfile::Quality,
            FilterType::CatmullRom => ImagePerformanceProfile::Balanced,
            FilterType::Triangle | FilterType::Nearest => ImagePerformanceProfile::Speed,
        }
    }

    /// 应用指定性能档位到实际参数。
    pub(crate) fn apply_performance_profile(&mut self, profile: ImagePerformanceProfile) {
        self.resize_filter = match profile {
            ImagePerformanceProfile::Quality => FilterType::Lanczos3,
            ImagePerformanceProfile::Balanced => FilterType::CatmullRom,
            ImagePerformanceProfile::Speed => FilterType::Triangle,
        };
    }

    /// 校验配置自洽性。
    ///
    /// 处理链路在读取配置快照后立即调用，避免带着无效参数进入解码。
    pub(crate) fn validate(&self) -> Result<(), ImageError> {
        if self.target_size == 0 {
            return Err(ImageError::InvalidConfig("target_size 不能为 0".to_string()));
        }
        if self.min_dimension > self.target_size {
            return Err(ImageError::InvalidConfig(
                "min_dimension 不能大于 target_size".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ImageError::InvalidConfig(
                "jpeg_quality 必须在 1~100 之间".to_string(),
            ));
        }
        if self.resize_filter == FilterType::Nearest {
            return Err(ImageError::InvalidConfig(
                "不允许使用最近邻插值进行降采样".to_string(),
            ));
        }
        if self.accepted_types.is_empty() {
            return Err(ImageError::InvalidConfig("accepted_types 不能为空".to_string()));
        }
        Ok(())
    }
}
