//! 用户照片存储模块
//!
//! # 设计思路
//!
//! 归一化后的照片交给存储协作方换取一个公开地址。
//! 上传失败不阻断流程，因此这里只负责如实返回结果，由编排层决定如何处理。
//!
//! # 实现思路
//!
//! - `StorageClient` trait 只有一个操作：`(字节, 文件名, 类型) → 公开地址`。
//! - `BlobStorageClient`：以 `PUT <endpoint>/<filename>` 写入对象存储，
//!   `Authorization: Bearer <token>`，响应 JSON 中的 `url` 即公开地址。
//! - `LocalDirStorage`：写入本地目录（不存在时自动 `create_dir_all`），
//!   返回 `file://` 地址，供离线运行与测试使用。

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;

use super::CollaboratorError;

/// 默认对象存储入口。
pub const DEFAULT_BLOB_ENDPOINT: &str = "https://blob.vercel-storage.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 存储协作方。
pub trait StorageClient {
    /// 保存字节并返回可公开访问的地址。
    fn store(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> impl Future<Output = Result<String, CollaboratorError>> + Send;
}

fn check_filename(filename: &str) -> Result<&str, CollaboratorError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(CollaboratorError::InvalidRequest("filename".to_string()));
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(CollaboratorError::InvalidRequest(format!(
            "非法文件名 '{}'",
            trimmed
        )));
    }
    Ok(trimmed)
}

#[derive(Debug, Deserialize)]
struct BlobPutResponse {
    url: String,
}

/// 远程对象存储客户端。
#[derive(Debug, Clone)]
pub struct BlobStorageClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl BlobStorageClient {
    pub fn new(token: impl Into<String>) -> Result<Self, CollaboratorError> {
        Self::with_endpoint(DEFAULT_BLOB_ENDPOINT, token)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, CollaboratorError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(CollaboratorError::MissingCredential("BLOB_READ_WRITE_TOKEN"));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CollaboratorError::Transport(format!("创建 HTTP 客户端失败：{}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

impl StorageClient for BlobStorageClient {
    async fn store(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<String, CollaboratorError> {
        let filename = check_filename(filename)?;
        let url = format!("{}/{}", self.endpoint, filename);
        let size = bytes.len();

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "1")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: BlobPutResponse = response.json().await?;
        log::info!("☁️ 照片已上传：{} ({} bytes)", filename, size);
        Ok(payload.url)
    }
}

/// 本地目录存储。
#[derive(Debug, Clone)]
pub struct LocalDirStorage {
    dir: PathBuf,
}

impl LocalDirStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_file(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, CollaboratorError> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        let path = dir.join(filename);
        std::fs::write(&path, bytes)?;
        Ok(std::fs::canonicalize(&path).unwrap_or(path))
    }
}

impl StorageClient for LocalDirStorage {
    async fn store(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<String, CollaboratorError> {
        let filename = check_filename(filename)?.to_string();
        let dir = self.dir.clone();

        let path = tokio::task::spawn_blocking(move || Self::write_file(&dir, &filename, &bytes))
            .await
            .map_err(|e| CollaboratorError::Transport(format!("写入任务异常退出：{}", e)))??;

        log::info!("💾 照片已保存：{} ({})", path.display(), content_type);
        Ok(format!("file://{}", path.display()))
    }
}
