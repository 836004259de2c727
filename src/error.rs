//! # 统一错误处理模块
//!
//! 定义 Gautility 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use std::path::PathBuf;
use thiserror::Error;

/// Gautility 统一错误类型
#[derive(Error, Debug)]
pub enum GautilityError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {}", path.display())]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {}", path.display())]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    /// 输入完全无法识别为计算输出（空文件、二进制内容、非 Gaussian 输出）。
    /// 仅对单个文件致命；不完整的输出不属于此类。
    #[error("Failed to parse '{source_id}' at byte {byte_offset}: {reason}")]
    ParseError {
        source_id: String,
        reason: String,
        byte_offset: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 排序错误
    // ─────────────────────────────────────────────────────────────
    /// 记录缺少选定的能量项，无法参与排序（逐条报告，批处理继续）
    #[error("Record '{source_id}' has no '{energy_key}' energy term")]
    RankingKeyMissing {
        source_id: String,
        energy_key: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 谱合成配置错误
    // ─────────────────────────────────────────────────────────────
    /// 展宽/网格参数非法，在任何计算开始前拒绝
    #[error("Invalid spectrum grid configuration: {0}")]
    GridConfiguration(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 配置文件错误
    // ─────────────────────────────────────────────────────────────
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found under: {path}")]
    NoFilesFound { path: String },

    #[error("{0}")]
    Other(String),
}

impl GautilityError {
    /// 错误类别标签，用于批处理失败统计
    pub fn kind_label(&self) -> &'static str {
        match self {
            GautilityError::FileReadError { .. } => "file_read",
            GautilityError::FileWriteError { .. } => "file_write",
            GautilityError::DirectoryNotFound { .. } => "directory_not_found",
            GautilityError::ParseError { .. } => "parse",
            GautilityError::RankingKeyMissing { .. } => "ranking_key_missing",
            GautilityError::GridConfiguration(_) => "grid_configuration",
            GautilityError::InvalidArgument(_) => "invalid_argument",
            GautilityError::ConfigError(_) => "config",
            GautilityError::NoFilesFound { .. } => "no_files",
            GautilityError::Other(_) => "other",
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, GautilityError>;
