//! # analyze 子命令实现
//!
//! 批量解析 Gaussian 输出、判定任务状态、按化学身份分组排序异构体。
//!
//! ## 功能
//! - 收集并并行解析 .log/.out 文件
//! - 状态统计（收敛/未收敛/错误终止/不稳定/不完整）
//! - 每组异构体按选定能量项排序，输出终端表格
//! - 可选结构去重（对齐后最大最近邻距离阈值）
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 使用 `batch/`, `ranking/`
//! - 使用 `utils/output.rs`

use crate::batch::{self, BatchAggregate, BatchOperation, BatchRunner, FileCollector};
use crate::cli::analyze::AnalyzeArgs;
use crate::config::AppConfig;
use crate::error::{GautilityError, Result};
use crate::models::StatusKind;
use crate::ranking::IsomerGroup;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 排序表格行
#[derive(Debug, Clone, Tabled)]
struct RankRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Sym")]
    symmetry: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "E (Hartree)")]
    energy: String,
    #[tabled(rename = "ΔE (eV)")]
    delta_e: String,
    #[tabled(rename = "NImag")]
    nimag: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// 执行批量分析
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    output::print_header("Analyzing Gaussian Outputs");

    if !args.input.exists() {
        return Err(GautilityError::DirectoryNotFound {
            path: args.input.display().to_string(),
        });
    }

    let config = AppConfig::load_or_default(args.config.as_deref())?;
    // 哨兵默认值（jobs = 0 / 无阈值）时由配置补齐
    let jobs = if args.jobs == 0 {
        config.analysis.threads
    } else {
        args.jobs
    };
    let dedup_tolerance = args.dedup_tolerance.or(config.analysis.dedup_tolerance);

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive)
        .collect();
    if files.is_empty() {
        return Err(GautilityError::NoFilesFound {
            path: args.input.display().to_string(),
        });
    }
    output::print_info(&format!("Found {} output files", files.len()));

    let include: Vec<StatusKind> = args.include.iter().map(|s| s.to_kind()).collect();
    let runner = BatchRunner::new(jobs).with_job_type(args.job_type.to_hint());
    let result = batch::run_batch(
        files,
        BatchOperation::RankIsomers {
            energy_key: args.energy_key.to_key(),
            outcome_filter: include,
            dedup_tolerance,
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

    let BatchAggregate::Isomers(ranking) = result.aggregate else {
        return Err(GautilityError::Other(
            "ranking batch produced a non-ranking aggregate".to_string(),
        ));
    };

    for err in &ranking.missing_energy {
        output::print_warning(&err.to_string());
    }
    if ranking.filtered_out > 0 {
        output::print_info(&format!(
            "{} records excluded by status filter",
            ranking.filtered_out
        ));
    }

    if ranking.groups.is_empty() {
        output::print_warning("No records left to rank.");
        return Ok(());
    }

    for group in &ranking.groups {
        print_group(group, args.top_n);
    }

    Ok(())
}

/// 打印单个异构体组的排序表格
fn print_group(group: &IsomerGroup, top_n: usize) {
    output::print_header(&format!(
        "Isomers [{}] ({} ranked)",
        group.identity_key,
        group.members.len()
    ));

    let rows: Vec<RankRow> = group
        .members
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(i, m)| RankRow {
            rank: i + 1,
            source: m.record.source_id.clone(),
            symmetry: m.record.symmetry_label.clone().unwrap_or_default(),
            state: m.record.state_label.clone().unwrap_or_default(),
            energy: format!("{:.7}", m.energy),
            delta_e: format!("{:.4}", m.relative_energy_ev()),
            nimag: m
                .record
                .imaginary_mode_count
                .map(|n| n.to_string())
                .unwrap_or_default(),
            status: m
                .record
                .status
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows);
    println!("{table}");

    if !group.deduplicated.is_empty() {
        output::print_info(&format!(
            "{} near-duplicate structures merged: {}",
            group.deduplicated.len(),
            group.deduplicated.join(", ")
        ));
    }
}
