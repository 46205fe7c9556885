//! 合影生成模块
//!
//! # 设计思路
//!
//! 生成协作方接收“用户照片 + 人物展示名”，返回一张合成图片与可选的文字说明。
//! 单次调用，不做自动重试；失败信息原样交给界面呈现。
//!
//! # 实现思路
//!
//! - `GenerationClient` trait 隔离具体模型服务，编排层只依赖 trait。
//! - `GeminiClient` 调用 `models/<model>:generateContent`：
//!   照片以 `inlineData` 传入，提示词固定模板，`responseModalities = [IMAGE, TEXT]`，
//!   `imageConfig.imageSize = "1K"`。
//! - 解析时遍历全部候选的 `parts`：最后一张内联图片胜出，文字片段依次拼接。
//!   没有图片时，以拼接的文字（或默认提示）作为错误信息。

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::json;

use super::CollaboratorError;
use crate::image_handler::EncodedImage;

/// 默认模型。
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-image-preview";
/// 默认 API 入口。
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const NO_IMAGE_MESSAGE: &str = "No image was returned";
const RESULT_FALLBACK_MIME: &str = "image/png";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// 生成结果。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GenerationOutcome {
    /// 合成图片（Data URL）。
    pub image: EncodedImage,
    /// 模型附带的文字说明。
    pub message: Option<String>,
}

/// 生成协作方。
pub trait GenerationClient {
    fn generate(
        &self,
        user_image: &EncodedImage,
        persona_name: &str,
    ) -> impl Future<Output = Result<GenerationOutcome, CollaboratorError>> + Send;
}

/// 提示词模板。
pub fn build_prompt(persona_name: &str) -> String {
    format!(
        "Using the uploaded photo, generate a selfie with {name}. The uploaded photo should be the person taking the selfie with {name}.",
        name = persona_name
    )
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Text {
        text: String,
    },
    /// 其他类型的片段（如 `thought`），忽略。
    Other {},
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: Option<String>,
    data: String,
}

/// Gemini 图片生成客户端。
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, CollaboratorError> {
        Self::with_endpoint(DEFAULT_GEMINI_ENDPOINT, api_key, model)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CollaboratorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CollaboratorError::MissingCredential("GEMINI_API_KEY"));
        }

        let model = model.into();
        let model = if model.trim().is_empty() {
            DEFAULT_GEMINI_MODEL.to_string()
        } else {
            model.trim().to_string()
        };

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CollaboratorError::Transport(format!("创建 HTTP 客户端失败：{}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_payload(user_image: &EncodedImage, persona_name: &str) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": user_image.mime_type(),
                            "data": user_image.payload(),
                        }
                    },
                    { "text": build_prompt(persona_name) },
                ],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE", "TEXT"],
                "imageConfig": { "imageSize": "1K" },
            },
        })
    }

    fn redact(&self, text: &str) -> String {
        text.replace(self.api_key.trim(), "[redacted]")
    }
}

/// 从首个候选中提取结果：最后一张图片胜出，文字依次拼接。
fn extract_outcome(response: GeminiResponse) -> Result<GenerationOutcome, CollaboratorError> {
    let mut image: Option<EncodedImage> = None;
    let mut text = String::new();

    let parts = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .unwrap_or_default();

    for part in parts {
        match part {
            GeminiPart::InlineData { inline_data } => {
                let mime_type = inline_data
                    .mime_type
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| RESULT_FALLBACK_MIME.to_string());
                image = Some(EncodedImage::from_data_url(format!(
                    "data:{};base64,{}",
                    mime_type, inline_data.data
                )));
            }
            GeminiPart::Text { text: fragment } => text.push_str(&fragment),
            GeminiPart::Other {} => {}
        }
    }

    match image {
        Some(image) => Ok(GenerationOutcome {
            image,
            message: if text.is_empty() { None } else { Some(text) },
        }),
        None if text.is_empty() => Err(CollaboratorError::NoImage(NO_IMAGE_MESSAGE.to_string())),
        None => Err(CollaboratorError::NoImage(text)),
    }
}

impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        user_image: &EncodedImage,
        persona_name: &str,
    ) -> Result<GenerationOutcome, CollaboratorError> {
        let persona_name = persona_name.trim();
        if persona_name.is_empty() {
            return Err(CollaboratorError::InvalidRequest("persona_name".to_string()));
        }
        if user_image.payload().trim().is_empty() {
            return Err(CollaboratorError::InvalidRequest("user_image".to_string()));
        }

        let started = Instant::now();
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        log::info!("🎨 开始生成合影：model={} persona={}", self.model, persona_name);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_payload(user_image, persona_name))
            .send()
            .await
            .map_err(|e| CollaboratorError::Transport(self.redact(&e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("⚠️ 生成服务返回 {}：{}", status, self.redact(&body));
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body: self.redact(&body),
            });
        }

        let parsed: GeminiResponse = response.json().await?;
        let outcome = extract_outcome(parsed);
        log::info!(
            "🎨 生成结束：ok={} 耗时 {}ms",
            outcome.is_ok(),
            started.elapsed().as_millis()
        );
        outcome
    }
}
