//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `analyze`: 批量解析 Gaussian 输出，状态判定与异构体能量排序
//! - `spectra`: 由 .fchk 轨道能级合成 DOS / PES 谱
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: analyze, spectra

pub mod analyze;
pub mod spectra;

use clap::{Parser, Subcommand};

/// Gautility - Gaussian 输出统一分析工具箱
#[derive(Parser)]
#[command(name = "gautility")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "A unified Gaussian output analysis and spectral synthesis toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Parse Gaussian logs, classify outcomes and rank isomers by energy
    Analyze(analyze::AnalyzeArgs),

    /// Synthesize broadened spectra from formatted checkpoint orbital levels
    Spectra(spectra::SpectraArgs),
}
