//! # 归一化流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 限定尺寸 → JPEG → Data URL”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低异常输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸，按像素上限快速拒绝
//! 2. 完整解码
//! 3. 按 `target_size` 等比缩放，长边对齐上限；已在范围内则不缩放（不放大）
//! 4. 单次卷积降采样（`fast_image_resize`，失败回退 `image::imageops`）
//! 5. JPEG 重新编码并包装为 Data URL

use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use std::io::Cursor;
use std::time::Instant;

use super::source::{EncodedImage, ProcessedImage, RawImageData};
use super::{ImageConfig, ImageError, ImageHandler};

/// 计算归一化后的尺寸。
///
/// - 宽高都不超过 `target` 时原样返回
/// - 否则长边变为 `target`，短边按 `round(short / long * target)` 计算（四舍五入）
/// - 短边不小于 `min_dimension`，防止极端宽高比被舍入为 0
///
/// # 示例
/// ```rust
/// use celebrity_selfie::image_handler::compute_target_dimensions;
///
/// assert_eq!(compute_target_dimensions(2000, 1000, 1024, 1), (1024, 512));
/// assert_eq!(compute_target_dimensions(500, 500, 1024, 1), (500, 500));
/// ```
pub fn compute_target_dimensions(
    width: u32,
    height: u32,
    target: u32,
    min_dimension: u32,
) -> (u32, u32) {
    if width <= target && height <= target {
        return (width, height);
    }

    let scale_side = |short: u32, long: u32| -> u32 {
        let scaled = (f64::from(short) / f64::from(long) * f64::from(target)).round() as u32;
        scaled.max(min_dimension).min(target)
    };

    if width > height {
        (target, scale_side(height, width))
    } else {
        (scale_side(width, height), target)
    }
}

impl ImageHandler {
    /// 将上传字节解码为图像。
    pub(crate) fn decode_upload(
        raw: RawImageData,
        config: &ImageConfig,
    ) -> Result<DynamicImage, ImageError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        Self::validate_pixel_limits(config, width, height)?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(decoded)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Decode("图片内容为空".to_string()));
        }

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ImageError::Decode(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| ImageError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    ///
    /// 超限意味着无法为其分配绘制表面，归入 `Surface` 错误。
    fn validate_pixel_limits(
        config: &ImageConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ImageError> {
        let pixels = u64::from(width) * u64::from(height);

        if pixels > config.max_decoded_pixels {
            return Err(ImageError::Surface(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    /// 归一化：限定尺寸后重新编码为 JPEG Data URL。
    pub(crate) fn normalize_image(
        image: DynamicImage,
        config: &ImageConfig,
    ) -> Result<ProcessedImage, ImageError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Surface(format!(
                "无法创建 {}x{} 的绘制表面",
                width, height
            )));
        }
        Self::validate_pixel_limits(config, width, height)?;

        let (target_width, target_height) =
            compute_target_dimensions(width, height, config.target_size, config.min_dimension);

        let resize_start = Instant::now();
        let rgb = image.to_rgb8();
        let rgb = if (target_width, target_height) == (width, height) {
            rgb
        } else {
            log::info!(
                "🧩 降采样：{}x{} -> {}x{}（filter={:?}）",
                width,
                height,
                target_width,
                target_height,
                config.resize_filter
            );
            Self::resize_rgb(rgb, target_width, target_height, config.resize_filter)?
        };
        let resize_elapsed = resize_start.elapsed();

        let encode_start = Instant::now();
        let jpeg = Self::encode_jpeg(&rgb, config.jpeg_quality)?;
        let encoded = EncodedImage::from_bytes("image/jpeg", &jpeg);
        let encode_elapsed = encode_start.elapsed();

        let processed = ProcessedImage::new(encoded, rgb.width(), rgb.height());

        log::info!(
            "✅ 归一化完成 - 输出: {}x{} 约 {}KB resize={}ms encode={}ms",
            processed.width(),
            processed.height(),
            processed.byte_size() / 1024,
            resize_elapsed.as_millis(),
            encode_elapsed.as_millis()
        );

        Ok(processed)
    }

    fn resize_rgb(
        rgb: RgbImage,
        target_width: u32,
        target_height: u32,
        filter: FilterType,
    ) -> Result<RgbImage, ImageError> {
        if target_width == 0 || target_height == 0 {
            return Err(ImageError::Surface(format!(
                "无法创建 {}x{} 的绘制表面",
                target_width, target_height
            )));
        }

        match Self::resize_with_fast_image_resize(&rgb, target_width, target_height, filter) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 降采样失败，回退 image::imageops::resize：{}",
                    err
                );
                Ok(image::imageops::resize(&rgb, target_width, target_height, filter))
            }
        }
    }

    fn resize_with_fast_image_resize(
        rgb: &RgbImage,
        target_width: u32,
        target_height: u32,
        filter: FilterType,
    ) -> Result<RgbImage, ImageError> {
        let (src_width, src_height) = rgb.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            rgb.as_raw().clone(),
            fr::PixelType::U8x3,
        )
        .map_err(|e| ImageError::Surface(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x3);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(Self::to_fast_filter(filter)));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| ImageError::Surface(format!("fast_image_resize 执行失败：{}", e)))?;

        RgbImage::from_raw(target_width, target_height, dst_image.into_vec())
            .ok_or_else(|| ImageError::Surface("fast_image_resize 输出缓冲长度异常".to_string()))
    }

    fn to_fast_filter(filter: FilterType) -> fr::FilterType {
        match filter {
            FilterType::Nearest | FilterType::Triangle => fr::FilterType::Bilinear,
            FilterType::CatmullRom => fr::FilterType::CatmullRom,
            FilterType::Gaussian => fr::FilterType::Mitchell,
            FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }

    fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
        let mut buffer = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
            .map_err(|e| ImageError::Encode(format!("JPEG 编码失败：{}", e)))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x % 255) as u8;
            let g = (y % 255) as u8;
            let b = ((x + y) % 255) as u8;
            Rgba([r, g, b, 255])
        });

        let dyn_img = DynamicImage::ImageRgba8(img);
        let mut cursor = Cursor::new(Vec::new());
        dyn_img
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn decode_output(processed: &ProcessedImage) -> DynamicImage {
        let bytes = processed
            .encoded_image()
            .decode_bytes()
            .expect("payload should be valid base64");
        image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .expect("payload should be a jpeg")
    }

    #[test]
    fn target_dimensions_clamp_larger_side() {
        assert_eq!(compute_target_dimensions(2000, 1000, 1024, 1), (1024, 512));
        assert_eq!(compute_target_dimensions(1000, 2000, 1024, 1), (512, 1024));
        assert_eq!(compute_target_dimensions(3000, 3000, 1024, 1), (1024, 1024));
        assert_eq!(compute_target_dimensions(1025, 1, 1024, 1), (1024, 1));
    }

    #[test]
    fn target_dimensions_round_half_up() {
        // 1500 / 2048 * 1024 = 750.0；1501 / 2048 * 1024 = 750.5 -> 751
        assert_eq!(compute_target_dimensions(2048, 1500, 1024, 1), (1024, 750));
        assert_eq!(compute_target_dimensions(2048, 1501, 1024, 1), (1024, 751));
    }

    #[test]
    fn target_dimensions_never_upscale() {
        assert_eq!(compute_target_dimensions(500, 500, 1024, 1), (500, 500));
        assert_eq!(compute_target_dimensions(1024, 1024, 1024, 1), (1024, 1024));
        assert_eq!(compute_target_dimensions(1, 1024, 1024, 1), (1, 1024));
    }

    #[test]
    fn degenerate_aspect_ratio_keeps_minimum_dimension() {
        assert_eq!(compute_target_dimensions(10_000, 1, 1024, 1), (1024, 1));
        assert_eq!(compute_target_dimensions(10_000, 1, 1024, 0), (1024, 0));
    }

    #[test]
    fn normalize_downscales_wide_source() {
        let config = ImageConfig::default();
        let raw = RawImageData {
            bytes: create_png_bytes(2000, 1000),
            source_hint: "test",
        };

        let decoded = ImageHandler::decode_upload(raw, &config).expect("decode should succeed");
        let processed = ImageHandler::normalize_image(decoded, &config).expect("normalize should succeed");

        assert_eq!((processed.width(), processed.height()), (1024, 512));
        assert_eq!(processed.encoded_image().mime_type(), "image/jpeg");
        assert!(processed.encoded_image().as_str().starts_with("data:image/jpeg;base64,"));
        assert_eq!(decode_output(&processed).dimensions(), (1024, 512));
    }

    #[test]
    fn normalize_keeps_bounded_source() {
        let config = ImageConfig::default();
        let raw = RawImageData {
            bytes: create_png_bytes(500, 500),
            source_hint: "test",
        };

        let decoded = ImageHandler::decode_upload(raw, &config).expect("decode should succeed");
        let processed = ImageHandler::normalize_image(decoded, &config).expect("normalize should succeed");

        assert_eq!((processed.width(), processed.height()), (500, 500));
        assert_eq!(decode_output(&processed).dimensions(), (500, 500));
    }

    #[test]
    fn byte_size_is_floor_of_three_quarters() {
        let config = ImageConfig::default();
        let image = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(32, 16, Rgba([10, 20, 30, 255])));

        let processed = ImageHandler::normalize_image(image, &config).expect("normalize should succeed");
        let text_len = processed.encoded_image().as_str().len() as u64;

        assert_eq!(processed.byte_size(), text_len * 3 / 4);
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let config = ImageConfig::default();
        let raw = RawImageData {
            bytes: b"definitely not an image".to_vec(),
            source_hint: "test",
        };

        assert!(matches!(
            ImageHandler::decode_upload(raw, &config),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn pixel_budget_overflow_is_surface_error() {
        let mut config = ImageConfig::default();
        config.max_decoded_pixels = 1_000;
        let raw = RawImageData {
            bytes: create_png_bytes(100, 100),
            source_hint: "test",
        };

        assert!(matches!(
            ImageHandler::decode_upload(raw, &config),
            Err(ImageError::Surface(_))
        ));
    }

    #[test]
    fn zero_sized_source_is_surface_error() {
        let config = ImageConfig::default();
        let image = DynamicImage::ImageRgba8(ImageBuffer::new(0, 0));

        assert!(matches!(
            ImageHandler::normalize_image(image, &config),
            Err(ImageError::Surface(_))
        ));
    }

    #[test]
    fn every_profile_filter_produces_bounded_output() {
        for filter in [FilterType::Triangle, FilterType::CatmullRom, FilterType::Lanczos3] {
            let mut config = ImageConfig::default();
            config.resize_filter = filter;
            let image = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(1300, 900, Rgba([200, 100, 50, 255])));

            let processed = ImageHandler::normalize_image(image, &config).expect("normalize should succeed");

            assert_eq!((processed.width(), processed.height()), (1024, 709));
        }
    }
}
