//! # 外部协作方（collaborators）
//!
//! ## 设计思路
//!
//! 照片存储与合影生成都是外部服务，编排层只通过 trait 与其交互：
//!
//! - `storage`：`StorageClient`，远程对象存储与本地目录两种实现
//! - `generation`：`GenerationClient`，基于 Gemini 的合影生成
//! - `error`：两者共用的 `CollaboratorError`

mod error;
mod generation;
mod storage;

pub use error::CollaboratorError;
pub use generation::{
    DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, GeminiClient, GenerationClient,
    GenerationOutcome, build_prompt,
};
pub use storage::{BlobStorageClient, DEFAULT_BLOB_ENDPOINT, LocalDirStorage, StorageClient};
