//! # 亮度分析模块
//!
//! 仅用于摄像头链路：在预览阶段给出“照片可能偏暗”的提示，不阻断确认。
//! 亮度按 `0.299R + 0.587G + 0.114B` 逐像素计算后取平均。

use image::RgbaImage;
use serde::Serialize;

/// 偏暗时展示给用户的提示文案。
pub const DARK_PHOTO_WARNING: &str =
    "照片看起来有点暗。为获得最佳效果，请换到光线更好的地方重拍，或上传一张更清晰的照片。";

/// 空帧时返回的中性亮度。
const NEUTRAL_LUMINANCE: f64 = 128.0;

/// 亮度分析结果，按需计算，不持久化。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrightnessReport {
    pub is_dark: bool,
    pub mean_luminance: f64,
}

impl BrightnessReport {
    /// 偏暗时返回提示文案。
    pub fn warning(&self) -> Option<&'static str> {
        self.is_dark.then_some(DARK_PHOTO_WARNING)
    }
}

/// 计算整帧平均亮度。
pub fn analyze_brightness(frame: &RgbaImage, dark_threshold: f64) -> BrightnessReport {
    let pixel_count = u64::from(frame.width()) * u64::from(frame.height());
    if pixel_count == 0 {
        return BrightnessReport {
            is_dark: false,
            mean_luminance: NEUTRAL_LUMINANCE,
        };
    }

    let total: f64 = frame
        .pixels()
        .map(|p| 0.299 * f64::from(p[0]) + 0.587 * f64::from(p[1]) + 0.114 * f64::from(p[2]))
        .sum();
    let mean_luminance = total / pixel_count as f64;

    log::debug!(
        "🔆 亮度分析 - {}x{} mean={:.2}",
        frame.width(),
        frame.height(),
        mean_luminance
    );

    BrightnessReport {
        is_dark: mean_luminance < dark_threshold,
        mean_luminance,
    }
}
