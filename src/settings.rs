//! 应用设置模块
//!
//! # 设计思路
//!
//! 进程级设置来自两处：可选的 JSON 设置文件，以及环境变量（含 `.env`）。
//! 环境变量优先，便于部署时覆盖密钥而不改动文件。
//!
//! # 实现思路
//!
//! - 设置文件缺失时视为空设置；字段缺失时使用默认值（`#[serde(default)]`）。
//! - 环境变量读取通过可注入的查找函数完成，测试不需要修改进程环境。
//! - 图片档位在这里解析为 `ImageConfig`，非法档位直接报错而不是静默回退。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::collaborators::DEFAULT_GEMINI_MODEL;
use crate::image_handler::{ImageConfig, ImageError, ImagePerformanceProfile};

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_BLOB_TOKEN: &str = "BLOB_READ_WRITE_TOKEN";
pub const ENV_IMAGE_PROFILE: &str = "SELFIE_IMAGE_PROFILE";
pub const ENV_OUTPUT_DIR: &str = "SELFIE_OUTPUT_DIR";

/// 设置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("读取设置文件 '{path}' 失败: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("解析设置文件失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("写入设置文件失败: {0}")]
    Write(#[from] std::io::Error),

    #[error("图片设置无效: {0}")]
    Image(#[from] ImageError),
}

/// 进程级设置。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub blob_read_write_token: Option<String>,
    /// `quality` / `balanced` / `speed`。
    pub image_profile: Option<String>,
    /// 未配置远程存储时，照片写入的本地目录。
    pub output_dir: Option<PathBuf>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppSettings {
    /// 读取设置文件；文件不存在时返回默认设置。
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!("设置文件不存在，使用默认设置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 读取设置文件（可选），再用进程环境覆盖。
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// 用环境变量覆盖已有字段；空值不覆盖。
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = non_empty(lookup(ENV_GEMINI_API_KEY)) {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = non_empty(lookup(ENV_GEMINI_MODEL)) {
            self.gemini_model = Some(v);
        }
        if let Some(v) = non_empty(lookup(ENV_BLOB_TOKEN)) {
            self.blob_read_write_token = Some(v);
        }
        if let Some(v) = non_empty(lookup(ENV_IMAGE_PROFILE)) {
            self.image_profile = Some(v);
        }
        if let Some(v) = non_empty(lookup(ENV_OUTPUT_DIR)) {
            self.output_dir = Some(PathBuf::from(v));
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn gemini_model(&self) -> &str {
        self.gemini_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    /// 按档位生成流水线配置。
    pub fn image_config(&self) -> Result<ImageConfig, SettingsError> {
        let mut config = ImageConfig::default();
        if let Some(profile) = self.image_profile.as_deref() {
            config.apply_performance_profile(ImagePerformanceProfile::from_str(profile)?);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("selfies"))
    }
}
