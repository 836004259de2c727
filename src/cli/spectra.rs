//! # spectra 子命令 CLI 定义
//!
//! 由 .fchk 占据轨道能级合成展宽谱的参数。
//! 宽度按光谱惯例以 FWHM 给出，内部换算为核的自然宽度。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/spectra.rs`

use crate::spectra::{Kernel, Normalization};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 展宽核类型
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum KernelArg {
    /// Gaussian broadening
    #[default]
    Gaussian,
    /// Lorentzian broadening
    Lorentzian,
}

impl KernelArg {
    pub fn to_kernel(self) -> Kernel {
        match self {
            KernelArg::Gaussian => Kernel::Gaussian,
            KernelArg::Lorentzian => Kernel::Lorentzian,
        }
    }
}

/// 归一化方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum NormalizationArg {
    /// Keep absolute kernel density
    #[default]
    None,
    /// Scale maximum to 1
    Peak,
    /// Scale integrated area to 1
    Area,
}

impl NormalizationArg {
    pub fn to_normalization(self) -> Normalization {
        match self {
            NormalizationArg::None => Normalization::None,
            NormalizationArg::Peak => Normalization::Peak,
            NormalizationArg::Area => Normalization::Area,
        }
    }
}

/// spectra 子命令参数
#[derive(Args, Debug)]
pub struct SpectraArgs {
    /// Input: a .fchk file or a directory containing .fchk files
    pub input: PathBuf,

    /// Glob pattern for input files (comma separated, directory mode)
    #[arg(long, default_value = "*.fchk")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Experimental VDE in eV; maps orbital levels onto the binding energy
    /// axis. Repeat to give one value per file (sorted order), give once to
    /// apply to all, omit for a plain orbital density of states.
    #[arg(long)]
    pub vde: Vec<f64>,

    /// Broadening kernel
    #[arg(long, value_enum, default_value = "gaussian")]
    pub kernel: KernelArg,

    /// Full width at half maximum in eV
    #[arg(long, default_value_t = 0.2)]
    pub fwhm: f64,

    /// Grid lower bound in eV (omit both bounds to auto-fit the levels)
    #[arg(long)]
    pub grid_min: Option<f64>,

    /// Grid upper bound in eV
    #[arg(long)]
    pub grid_max: Option<f64>,

    /// Number of grid points
    #[arg(long, default_value_t = 5000)]
    pub points: usize,

    /// Output normalization
    #[arg(long, value_enum, default_value = "none")]
    pub normalize: NormalizationArg,

    /// Also write the summed overlay curve of all inputs
    #[arg(long, default_value_t = false)]
    pub combined: bool,

    /// Output directory for curve data files
    #[arg(short, long, default_value = "spectra_out")]
    pub output: PathBuf,

    /// Path to a JSON config file; when given, spectral parameters are
    /// taken from the file instead of the flags above
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
