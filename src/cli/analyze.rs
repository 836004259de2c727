//! # analyze 子命令 CLI 定义
//!
//! 批量解析 + 状态判定 + 异构体排序的参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/analyze.rs`

use crate::models::{EnergyKey, JobType, StatusKind};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 任务类型（auto 为按文件内容检测）
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum JobTypeArg {
    /// Detect from route line and output content
    #[default]
    Auto,
    /// Geometry optimization
    Opt,
    /// Single point
    Sp,
}

impl JobTypeArg {
    pub fn to_hint(self) -> Option<JobType> {
        match self {
            JobTypeArg::Auto => None,
            JobTypeArg::Opt => Some(JobType::Optimization),
            JobTypeArg::Sp => Some(JobType::SinglePoint),
        }
    }
}

/// 排序所用能量项
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum EnergyKeyArg {
    /// Electronic energy (HF=... archive field)
    #[default]
    Electronic,
    /// Zero-point correction
    Zpe,
    /// Electronic + zero-point energy
    ElectronicZpe,
    /// Electronic + thermal energy
    ElectronicThermal,
}

impl EnergyKeyArg {
    pub fn to_key(self) -> EnergyKey {
        match self {
            EnergyKeyArg::Electronic => EnergyKey::Electronic,
            EnergyKeyArg::Zpe => EnergyKey::ZeroPointCorrection,
            EnergyKeyArg::ElectronicZpe => EnergyKey::ElectronicPlusZpe,
            EnergyKeyArg::ElectronicThermal => EnergyKey::ElectronicPlusThermal,
        }
    }
}

/// 允许参与排序的状态类别
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StatusArg {
    Converged,
    NotConverged,
    ErrorTerminated,
    Unstable,
    Incomplete,
}

impl StatusArg {
    pub fn to_kind(self) -> StatusKind {
        match self {
            StatusArg::Converged => StatusKind::Converged,
            StatusArg::NotConverged => StatusKind::NotConverged,
            StatusArg::ErrorTerminated => StatusKind::ErrorTerminated,
            StatusArg::Unstable => StatusKind::Unstable,
            StatusArg::Incomplete => StatusKind::Incomplete,
        }
    }
}

/// analyze 子命令参数
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input: a Gaussian log file or a directory containing log files
    pub input: PathBuf,

    /// Glob pattern for input files (comma separated, directory mode)
    #[arg(long, default_value = "*.log,*.out")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Job type of the inputs
    #[arg(long, value_enum, default_value = "auto")]
    pub job_type: JobTypeArg,

    /// Energy term used for ranking
    #[arg(long, value_enum, default_value = "electronic")]
    pub energy_key: EnergyKeyArg,

    /// Status kinds allowed into the ranking (comma separated)
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_value = "converged"
    )]
    pub include: Vec<StatusArg>,

    /// Duplicate-structure threshold in Å (aligned max distance); omit to disable
    #[arg(long)]
    pub dedup_tolerance: Option<f64>,

    /// Number of top members to print per isomer group
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,

    /// Path to a JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
