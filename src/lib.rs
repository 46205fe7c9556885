//! # 名人合影自拍 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  flow ── AcquisitionFlow (屏幕状态机 + 交接)             │
//! │    │                                                     │
//! │    ├─ camera ──────── CaptureSession + StreamGuard (RAII)│
//! │    │                    └─ MediaDevices / MediaStream    │
//! │    ├─ image_handler ── 校验 · 解码 · 缩放 · JPEG 编码    │
//! │    │                    └─ 亮度分析                      │
//! │    ├─ collaborators ── StorageClient / GenerationClient  │
//! │    └─ persona ──────── 静态人物目录                      │
//! │                                                          │
//! │  settings ── AppSettings (JSON 文件 + 环境变量)          │
//! │  error ───── AppError (统一错误类型)                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，应用边界的返回类型 |
//! | [`camera`] | 前置摄像头生命周期：请求 → 预览 → 抓帧 → 释放 |
//! | [`image_handler`] | 上传校验、归一化（≤1024px JPEG）、亮度分析 |
//! | [`collaborators`] | 照片存储与合影生成的外部服务客户端 |
//! | [`persona`] | 可选人物目录 |
//! | [`flow`] | 首页 → 采集 → 选人 → 结果 的编排 |
//! | [`settings`] | 设置文件与环境变量 |

pub mod camera;
pub mod collaborators;
pub mod error;
pub mod flow;
pub mod image_handler;
pub mod persona;
pub mod settings;

pub use error::AppError;
