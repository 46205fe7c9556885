//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义（上传文件 / 摄像头帧）
//! - `RawImageData` 表示已通过校验但未解码的字节
//! - `EncodedImage` 表示自描述的编码载荷（Data URL）
//! - `ProcessedImage` 表示归一化完成、可交给上传与生成协作方的成品

use base64::{Engine as _, engine::general_purpose};
use image::RgbaImage;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::ImageError;

static DATA_URL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(image/\w+);base64,").expect("data url pattern is valid")
});

/// 未能从载荷中识别类型时的默认 MIME。
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// 用户选择的本地文件（浏览器 `File` 的等价物）。
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// 文件名（仅用于展示与日志）。
    pub name: String,
    /// 调用方声明的 MIME 类型，不做内容嗅探。
    pub declared_type: String,
    /// 文件原始字节。
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            bytes,
        }
    }

    /// 文件体积（字节）。
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// 图片输入来源。
pub enum ImageSource {
    /// 用户上传的文件，需要先校验再解码。
    Upload(UploadedFile),
    /// 摄像头抓取的静帧，已是像素数据。
    Captured(RgbaImage),
}

/// 校验阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 自描述的编码图片：`data:<mime>;base64,<payload>`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EncodedImage {
    data_url: String,
}

impl EncodedImage {
    /// 由 MIME 与原始字节构造。
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            data_url: format!(
                "data:{};base64,{}",
                mime_type,
                general_purpose::STANDARD.encode(bytes)
            ),
        }
    }

    /// 包装已有的 Data URL 或纯 Base64 文本。
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.data_url
    }

    /// 载荷中声明的媒体类型，缺失时回退为 `image/jpeg`。
    pub fn mime_type(&self) -> &str {
        DATA_URL_PREFIX
            .captures(&self.data_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// 去掉 `data:image/...;base64,` 前缀后的 Base64 文本。
    pub fn payload(&self) -> &str {
        match DATA_URL_PREFIX.find(&self.data_url) {
            Some(prefix) => &self.data_url[prefix.end()..],
            None => &self.data_url,
        }
    }

    /// 解码为原始字节（交给存储协作方）。
    pub fn decode_bytes(&self) -> Result<Vec<u8>, ImageError> {
        general_purpose::STANDARD
            .decode(self.payload().trim())
            .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 近似字节数：`floor(len * 3 / 4)`，按整段 Data URL 文本计算。
    ///
    /// 这是估算值，包含前缀长度，也不扣除补位。
    pub fn approx_byte_size(&self) -> u64 {
        (self.data_url.len() as u64).saturating_mul(3) / 4
    }

    /// 精确的解码后字节数，不实际解码。
    pub fn decoded_len(&self) -> u64 {
        let payload = self.payload().trim();
        let padding = payload.bytes().rev().take_while(|b| *b == b'=').count() as u64;
        ((payload.len() as u64) / 4 * 3).saturating_sub(padding)
    }
}

/// 归一化成品。
///
/// 创建后不可变，唯一例外是存储成功后附加的 `remote_url`。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImage {
    pub(crate) encoded_image: EncodedImage,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) byte_size: u64,
    pub(crate) remote_url: Option<String>,
}

impl ProcessedImage {
    pub(crate) fn new(encoded_image: EncodedImage, width: u32, height: u32) -> Self {
        let byte_size = encoded_image.approx_byte_size();
        Self {
            encoded_image,
            width,
            height,
            byte_size,
            remote_url: None,
        }
    }

    pub fn encoded_image(&self) -> &EncodedImage {
        &self.encoded_image
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// 存储协作方成功后附加远程地址。
    pub fn attach_remote_url(&mut self, url: impl Into<String>) {
        self.remote_url = Some(url.into());
    }
}
