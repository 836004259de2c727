//! # spectra 子命令实现
//!
//! 由 .fchk 占据轨道能级合成展宽谱曲线并写出两列数据文件。
//!
//! ## 功能
//! - 收集并解析 .fchk 文件，单文件失败不影响其余文件
//! - 给定 VDE 时把轨道能级映射到结合能轴（PES 模拟）
//! - 所有曲线共享同一网格，可选输出叠加总曲线
//! - 输出为 "能量  强度" 两列文本，可直接交给绘图工具
//!
//! ## 依赖关系
//! - 使用 `cli/spectra.rs` 定义的参数
//! - 使用 `batch/`, `spectra/`
//! - 使用 `utils/output.rs`

use crate::batch::{self, BatchAggregate, BatchOperation, BatchRunner, FileCollector, VdeAssignment};
use crate::cli::spectra::SpectraArgs;
use crate::config::{AppConfig, SpectraSettings};
use crate::error::{GautilityError, Result};
use crate::spectra::SpectrumCurve;
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};

/// 执行谱合成
pub fn execute(args: SpectraArgs) -> Result<()> {
    output::print_header("Synthesizing Spectra");

    if !args.input.exists() {
        return Err(GautilityError::DirectoryNotFound {
            path: args.input.display().to_string(),
        });
    }

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive)
        .collect();
    if files.is_empty() {
        return Err(GautilityError::NoFilesFound {
            path: args.input.display().to_string(),
        });
    }
    output::print_info(&format!("Found {} checkpoint files", files.len()));

    let settings = spectra_settings(&args)?;
    let synth_config = settings.to_synthesis_config()?;
    let vdes = match args.vde.len() {
        0 => VdeAssignment::None,
        1 => VdeAssignment::Uniform(args.vde[0]),
        _ => VdeAssignment::PerFile(args.vde.clone()),
    };

    let runner = BatchRunner::new(0);
    let result = batch::run_batch(
        files,
        BatchOperation::SynthesizeSpectra {
            vdes,
            config: synth_config,
            combined: args.combined,
        },
        &runner,
    )?;

    for failure in &result.failures {
        output::print_warning(&format!("{}: {}", failure.source_id, failure.message));
    }
    output::print_info(&format!(
        "Parsed {} of {} files ({} failed)",
        result.succeeded,
        result.total(),
        result.failures.len()
    ));
    for (kind, count) in &result.status_counts {
        output::print_info(&format!("  {kind}: {count}"));
    }
    if result.succeeded == 0 {
        output::print_warning("No checkpoint files could be parsed.");
        return Ok(());
    }

    let BatchAggregate::Spectra { curves, combined } = result.aggregate else {
        return Err(GautilityError::Other(
            "spectra batch produced a non-spectra aggregate".to_string(),
        ));
    };

    fs::create_dir_all(&args.output).map_err(|e| GautilityError::FileWriteError {
        path: args.output.clone(),
        source: e,
    })?;

    for curve in &curves {
        let path = args.output.join(format!("{}.dat", curve.label));
        write_curve(curve, &path)?;
        output::print_success(&format!(
            "Curve '{}' ({} levels) written to '{}'",
            curve.label,
            curve.level_count,
            path.display()
        ));
    }

    if let Some(combined) = &combined {
        let path = args.output.join("combined.dat");
        write_curve(combined, &path)?;
        output::print_success(&format!("Overlay curve written to '{}'", path.display()));
    }

    Ok(())
}

/// 谱参数来源：给定配置文件则整组取自配置，否则取命令行标志
fn spectra_settings(args: &SpectraArgs) -> Result<SpectraSettings> {
    if let Some(path) = &args.config {
        let config = AppConfig::load(path)?;
        return Ok(config.spectra);
    }
    Ok(SpectraSettings {
        kernel: args.kernel.to_kernel(),
        fwhm: args.fwhm,
        grid_min: args.grid_min,
        grid_max: args.grid_max,
        points: args.points,
        normalization: args.normalize.to_normalization(),
    })
}

/// 两列文本输出："能量  强度"，每行一个网格点
fn write_curve(curve: &SpectrumCurve, path: &Path) -> Result<()> {
    let mut body = String::with_capacity(curve.x.len() * 24);
    for (x, y) in curve.points() {
        body.push_str(&format!("{x:.6}  {y:.8e}\n"));
    }
    fs::write(path, body).map_err(|e| GautilityError::FileWriteError {
        path: PathBuf::from(path),
        source: e,
    })
}
