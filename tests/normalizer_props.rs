use celebrity_selfie::image_handler::{
    ImageConfig, ImageError, ImageHandler, ImageSource, MAX_FILE_SIZE, TARGET_SIZE, UploadedFile,
    compute_target_dimensions, validate_image_file,
};
use image::{Rgba, RgbaImage};
use proptest::prelude::*;

proptest! {
    #[test]
    fn output_is_bounded_and_keeps_major_side(w in 1u32..20_000, h in 1u32..20_000) {
        let (ow, oh) = compute_target_dimensions(w, h, TARGET_SIZE, 1);

        prop_assert!(ow <= TARGET_SIZE && oh <= TARGET_SIZE);
        prop_assert!(ow >= 1 && oh >= 1);
        prop_assert_eq!(ow.max(oh), w.max(h).min(TARGET_SIZE));
    }

    #[test]
    fn aspect_ratio_is_preserved_within_rounding(w in 1u32..20_000, h in 1u32..20_000) {
        prop_assume!(w.max(h) > TARGET_SIZE);
        let (ow, oh) = compute_target_dimensions(w, h, TARGET_SIZE, 1);

        // 短边只允许 0.5px 的取整误差（被 1px 下限抬高的情况除外）
        let (long, short, out_short) = if w > h { (w, h, oh) } else { (h, w, ow) };
        let exact = f64::from(short) / f64::from(long) * f64::from(TARGET_SIZE);
        if exact >= 1.0 {
            prop_assert!((f64::from(out_short) - exact).abs() <= 0.5 + 1e-9);
        } else {
            prop_assert_eq!(out_short, 1);
        }
    }

    #[test]
    fn bounded_images_are_left_unchanged(w in 1u32..=1024, h in 1u32..=1024) {
        prop_assert_eq!(compute_target_dimensions(w, h, TARGET_SIZE, 1), (w, h));
    }

    #[test]
    fn gif_is_rejected_regardless_of_size(size in 0u64..=2 * MAX_FILE_SIZE) {
        let result = validate_image_file("image/gif", size, &ImageConfig::default());
        prop_assert!(matches!(result, Err(ImageError::UnsupportedType(_))));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn captured_frames_normalize_to_bounded_jpeg(w in 1u32..200, h in 1u32..200) {
        let config = ImageConfig {
            target_size: 64,
            ..ImageConfig::default()
        };
        let handler = ImageHandler::new(config).expect("handler init failed");
        let frame = RgbaImage::from_pixel(w, h, Rgba([90, 120, 150, 255]));

        let processed = handler
            .process_blocking(ImageSource::Captured(frame))
            .expect("normalize failed");

        prop_assert_eq!(
            (processed.width(), processed.height()),
            compute_target_dimensions(w, h, 64, 1)
        );
        prop_assert_eq!(processed.encoded_image().mime_type(), "image/jpeg");
        prop_assert!(processed.byte_size() > 0);
    }
}

#[test]
fn degenerate_aspect_ratio_keeps_one_pixel_minor_side() {
    assert_eq!(compute_target_dimensions(10_000, 1, TARGET_SIZE, 1), (1024, 1));
    assert_eq!(compute_target_dimensions(1, 10_000, TARGET_SIZE, 1), (1, 1024));
}

#[test]
fn file_size_limit_is_inclusive() {
    let config = ImageConfig::default();
    assert!(validate_image_file("image/jpeg", 10_485_760, &config).is_ok());
    assert!(matches!(
        validate_image_file("image/jpeg", 10_485_761, &config),
        Err(ImageError::TooLarge { .. })
    ));
}

#[test]
fn undecodable_upload_reports_decode_error() {
    let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");
    let file = UploadedFile::new("broken.jpg", "image/jpeg", b"definitely not a jpeg".to_vec());

    let result = handler.process_blocking(ImageSource::Upload(file));

    match result {
        Err(err) => {
            assert_eq!(err.code(), "decode_error");
            assert!(!err.is_validation());
        }
        Ok(_) => panic!("garbage bytes should not decode"),
    }
}
