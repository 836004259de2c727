//! # 批量处理模块
//!
//! 多文件并行摄取与聚合：收集、解析、判定、排序/谱合成。
//!
//! ## 功能
//! - 自动检测输入类型（文件/目录）并收集匹配文件
//! - rayon 并行解析，单文件失败不影响其余文件
//! - 协作式取消：收到取消信号后停止派发，已完成的结果保留
//! - 按状态类别与失败类别统计
//! - 聚合产物（异构体排序 / 谱曲线）只由成功记录构建
//!
//! ## 依赖关系
//! - 被各命令模块使用
//! - 使用 `parsers/`, `classify/`, `ranking/`, `spectra/`
//! - 使用 `rayon` 并行、`indicatif` 进度反馈

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchFailure, BatchReport, BatchRunner, BatchSummary};

use crate::error::{GautilityError, Result};
use crate::models::{EnergyKey, StatusKind};
use crate::ranking::{self, RankingReport};
use crate::spectra::{self, LevelSet, SpectrumCurve, SynthesisConfig};

use std::collections::BTreeMap;
use std::path::PathBuf;

/// VDE 的分配方式：统一值、按文件（排序序）一一对应、或不做结合能变换
#[derive(Debug, Clone)]
pub enum VdeAssignment {
    None,
    Uniform(f64),
    PerFile(Vec<f64>),
}

impl VdeAssignment {
    /// 展开为与排序后文件一一对应的列表
    fn resolve(&self, files: &[PathBuf]) -> Result<BTreeMap<String, Option<f64>>> {
        let ids = files.iter().map(|f| f.to_string_lossy().to_string());
        match self {
            VdeAssignment::None => Ok(ids.map(|id| (id, None)).collect()),
            VdeAssignment::Uniform(vde) => Ok(ids.map(|id| (id, Some(*vde))).collect()),
            VdeAssignment::PerFile(vdes) => {
                if vdes.len() != files.len() {
                    return Err(GautilityError::InvalidArgument(format!(
                        "{} VDE values given for {} input files",
                        vdes.len(),
                        files.len()
                    )));
                }
                let mut sorted = files.to_vec();
                sorted.sort();
                Ok(sorted
                    .iter()
                    .map(|f| f.to_string_lossy().to_string())
                    .zip(vdes.iter().copied().map(Some))
                    .collect())
            }
        }
    }
}

/// 批次要执行的聚合操作
#[derive(Debug, Clone)]
pub enum BatchOperation {
    /// 解析 .log，按化学身份分组并排序异构体
    RankIsomers {
        energy_key: EnergyKey,
        outcome_filter: Vec<StatusKind>,
        dedup_tolerance: Option<f64>,
    },
    /// 解析 .fchk，把占据轨道能级合成为展宽谱
    SynthesizeSpectra {
        vdes: VdeAssignment,
        config: SynthesisConfig,
        /// 同时给出全部输入叠加的总曲线
        combined: bool,
    },
}

/// 聚合产物，只由成功解析的文件构建
#[derive(Debug)]
pub enum BatchAggregate {
    Isomers(RankingReport),
    Spectra {
        curves: Vec<SpectrumCurve>,
        combined: Option<SpectrumCurve>,
    },
}

/// 一次批量运行的完整结果
#[derive(Debug)]
pub struct BatchResult {
    /// 成功解析的文件数
    pub succeeded: usize,
    /// 失败详情，按 source_id 排序
    pub failures: Vec<BatchFailure>,
    /// 因取消而未处理的文件数
    pub cancelled: usize,
    /// 状态类别计数
    pub status_counts: BTreeMap<StatusKind, usize>,
    /// 失败类别计数
    pub failure_kinds: BTreeMap<&'static str, usize>,
    pub aggregate: BatchAggregate,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len() + self.cancelled
    }
}

/// 驱动整条流水线：摄取 -> 判定 -> 聚合。
/// 配置错误（网格参数、VDE 数目不符）在任何文件被处理前拒绝。
pub fn run_batch(
    files: Vec<PathBuf>,
    operation: BatchOperation,
    runner: &BatchRunner,
) -> Result<BatchResult> {
    match operation {
        BatchOperation::RankIsomers {
            energy_key,
            outcome_filter,
            dedup_tolerance,
        } => {
            let report = runner.ingest(files);
            let summary = report.summary();
            let ranking = ranking::rank_isomers(
                &report.records,
                energy_key,
                &outcome_filter,
                dedup_tolerance,
            );
            Ok(BatchResult {
                succeeded: report.records.len(),
                failures: report.failures,
                cancelled: report.cancelled,
                status_counts: summary.status_counts,
                failure_kinds: summary.failure_kinds,
                aggregate: BatchAggregate::Isomers(ranking),
            })
        }
        BatchOperation::SynthesizeSpectra {
            vdes,
            config,
            combined,
        } => {
            // 先失败：参数校验在摄取之前
            config.validate()?;
            let vde_by_source = vdes.resolve(&files)?;

            let mut report = runner.ingest_orbitals(files);
            // 给定 VDE 的记录把占据能级映射到结合能轴
            for record in &mut report.records {
                if let Some(vde) = vde_by_source.get(&record.source_id).copied().flatten() {
                    if let Some(levels) = &record.orbital_levels {
                        record.vde_levels = Some(spectra::binding_levels(levels, vde));
                    }
                }
            }

            let summary = report.summary();
            let level_sets: Vec<LevelSet> = report
                .records
                .iter()
                .filter_map(LevelSet::from_record)
                .collect();

            let curves = spectra::synthesize(&level_sets, &config)?;
            let combined = if combined {
                Some(spectra::synthesize_combined(&level_sets, &config, "combined")?)
            } else {
                None
            };

            Ok(BatchResult {
                succeeded: report.records.len(),
                failures: report.failures,
                cancelled: report.cancelled,
                status_counts: summary.status_counts,
                failure_kinds: summary.failure_kinds,
                aggregate: BatchAggregate::Spectra { curves, combined },
            })
        }
    }
}
