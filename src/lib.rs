//! # Gautility - Gaussian 输出统一分析工具箱
//!
//! 将分散的量子化学后处理脚本用 Rust 重构，统一成单一工具：
//! 解析 Gaussian 日志与格式化检查点文件、判定任务终态、
//! 按化学身份排序异构体、把轨道能级合成为展宽谱。
//!
//! ## 模块结构
//! ```text
//! lib.rs
//!   ├── models/     (数据模型：结构、记录、能级、状态)
//!   ├── parsers/    (.log / .fchk 解析器)
//!   ├── classify/   (任务状态判定)
//!   ├── ranking/    (异构体分组排序与结构去重)
//!   ├── spectra/    (谱合成：核函数、网格、归一化)
//!   ├── batch/      (并行批量摄取)
//!   ├── config.rs   (JSON 配置)
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   ├── utils/      (终端输出与进度条)
//!   └── error.rs    (统一错误处理)
//! ```

pub mod batch;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod ranking;
pub mod spectra;
pub mod utils;

pub use batch::{
    run_batch, BatchAggregate, BatchOperation, BatchReport, BatchResult, BatchRunner,
    FileCollector, VdeAssignment,
};
pub use classify::classify;
pub use error::{GautilityError, Result};
pub use models::{CalculationRecord, EnergyKey, JobStatus, JobType, Level, StatusKind};
pub use parsers::{parse, parse_fchk};
pub use ranking::rank_isomers;
pub use spectra::{synthesize, synthesize_combined, LevelSet, SynthesisConfig};
