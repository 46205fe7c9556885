//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载“校验 → 解码 → 缩放 → 编码”整条链路的错误来源，
//! 避免字符串拼接式错误处理。通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! ## 实现思路
//!
//! - 校验阶段：`UnsupportedType` / `TooLarge`，属于“用户需换一张图”的阻断错误。
//! - 归一化阶段：`Decode` / `Surface`，不在内部重试，直接上报。
//! - `code()` / `stage()` / `remediation()` 提供稳定的机器可读字段与用户提示。

/// 图片处理统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("不支持的图片类型：{0}（仅支持 JPEG / PNG / WebP）")]
    UnsupportedType(String),

    #[error("图片过大：{size} 字节（限制：{limit} 字节）")]
    TooLarge { size: u64, limit: u64 },

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("绘制表面错误：{0}")]
    Surface(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),
}

impl ImageError {
    /// 稳定错误码，供前端或日志聚合检索。
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedType(_) => "unsupported_type",
            Self::TooLarge { .. } => "too_large",
            Self::Decode(_) => "decode_error",
            Self::Surface(_) => "surface_error",
            Self::Encode(_) => "encode_error",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    /// 出错阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedType(_) | Self::TooLarge { .. } => "validate",
            Self::Decode(_) => "decode",
            Self::Surface(_) => "resize",
            Self::Encode(_) => "encode",
            Self::InvalidConfig(_) => "config",
        }
    }

    /// 面向用户的补救提示。
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::UnsupportedType(_) => "请上传 JPEG、PNG 或 WebP 格式的图片。",
            Self::TooLarge { .. } => "图片过大，请上传 10MB 以内的图片。",
            Self::Decode(_) | Self::Surface(_) | Self::Encode(_) => {
                "图片处理失败，请换一张照片再试。"
            }
            Self::InvalidConfig(_) => "图片处理配置无效，请检查设置。",
        }
    }

    /// 校验类错误需要用户重新选择文件，属于阻断错误。
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnsupportedType(_) | Self::TooLarge { .. })
    }
}

impl From<ImageError> for String {
    fn from(error: ImageError) -> Self {
        error.to_string()
    }
}
