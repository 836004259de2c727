//! # 批量执行器
//!
//! 并行摄取输出文件：读取、解析、状态判定。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代，文件间完全隔离
//! - 进度条显示
//! - 协作式取消：信号置位后剩余文件不再处理，已有结果保留
//! - 按状态类别与错误类别统计
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `parsers/`, `classify/`
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::classify;
use crate::error::GautilityError;
use crate::models::{CalculationRecord, JobType, StatusKind};
use crate::parsers;
use crate::utils::progress;

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 单个文件的失败详情
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub source_id: String,
    /// 错误类别标签（用于统计）
    pub kind: &'static str,
    pub message: String,
}

/// 单个文件的处理结果
enum IngestOutcome {
    Parsed(Box<CalculationRecord>),
    Failed(BatchFailure),
    Cancelled,
}

/// 一次批量摄取的全部结果
#[derive(Debug, Default)]
pub struct BatchReport {
    /// 成功解析并判定的记录，按 source_id 排序
    pub records: Vec<CalculationRecord>,
    /// 失败详情，按 source_id 排序
    pub failures: Vec<BatchFailure>,
    /// 因取消而未处理的文件数
    pub cancelled: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.records.len() + self.failures.len() + self.cancelled
    }

    /// 汇总统计
    pub fn summary(&self) -> BatchSummary {
        let mut status_counts = BTreeMap::new();
        for record in &self.records {
            if let Some(status) = &record.status {
                *status_counts.entry(status.kind()).or_insert(0) += 1;
            }
        }
        let mut failure_kinds = BTreeMap::new();
        for failure in &self.failures {
            *failure_kinds.entry(failure.kind).or_insert(0) += 1;
        }
        BatchSummary {
            total: self.total(),
            parsed: self.records.len(),
            failed: self.failures.len(),
            cancelled: self.cancelled,
            status_counts,
            failure_kinds,
        }
    }
}

/// 批次统计：状态类别计数与失败类别计数
#[derive(Debug)]
pub struct BatchSummary {
    pub total: usize,
    pub parsed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub status_counts: BTreeMap<StatusKind, usize>,
    pub failure_kinds: BTreeMap<&'static str, usize>,
}

/// 汇集并行结果，按 source_id 排序保证输出确定
fn collect_report(outcomes: Vec<IngestOutcome>) -> BatchReport {
    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            IngestOutcome::Parsed(record) => report.records.push(*record),
            IngestOutcome::Failed(failure) => report.failures.push(failure),
            IngestOutcome::Cancelled => report.cancelled += 1,
        }
    }
    report.records.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    report
        .failures
        .sort_by(|a, b| a.source_id.cmp(&b.source_id));
    report
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    /// 任务类型提示，None 时自动检测
    job_type_hint: Option<JobType>,
    /// 是否显示进度条
    show_progress: bool,
    /// 取消信号
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    /// 创建新的批量执行器，jobs = 0 表示使用全部 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            jobs,
            job_type_hint: None,
            show_progress: true,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_job_type(mut self, hint: Option<JobType>) -> Self {
        self.job_type_hint = hint;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// 取消句柄，可交给信号处理线程
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// 并行摄取 .log 文件列表。
    /// 每个文件独立读取/解析/判定，单文件失败只记入失败表；
    /// 取消信号置位后剩余文件标记为 cancelled，已完成结果原样返回。
    pub fn ingest(&self, files: Vec<PathBuf>) -> BatchReport {
        let outcomes = self.run_parallel(files, "Parsing", |file| self.ingest_one(file));
        collect_report(outcomes)
    }

    /// 并行摄取 .fchk 文件列表，隔离与取消语义与 `ingest` 相同。
    /// 每个文件产出带占据轨道能级的记录，判定同样走 `classify/`。
    pub fn ingest_orbitals(&self, files: Vec<PathBuf>) -> BatchReport {
        let outcomes = self.run_parallel(files, "Reading orbitals", |file| {
            let source_id = file.to_string_lossy().to_string();
            let text = match self.read_text(file) {
                Ok(t) => t,
                Err(failure) => return IngestOutcome::Failed(failure),
            };
            match parsers::fchk::parse_fchk_record(&source_id, &text) {
                Ok(mut record) => {
                    record.status = Some(classify::classify(&record));
                    IngestOutcome::Parsed(Box::new(record))
                }
                Err(err) => IngestOutcome::Failed(BatchFailure {
                    source_id,
                    kind: err.kind_label(),
                    message: err.to_string(),
                }),
            }
        });
        collect_report(outcomes)
    }

    /// 并行驱动：线程池、进度条与取消检查
    fn run_parallel<F>(&self, files: Vec<PathBuf>, message: &str, work: F) -> Vec<IngestOutcome>
    where
        F: Fn(&PathBuf) -> IngestOutcome + Sync,
    {
        let pb = if self.show_progress {
            Some(progress::create_progress_bar(files.len() as u64, message))
        } else {
            None
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build();

        let process = |file: &PathBuf| {
            if self.cancel.load(Ordering::Relaxed) {
                return IngestOutcome::Cancelled;
            }
            let outcome = work(file);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            outcome
        };

        let outcomes: Vec<IngestOutcome> = match pool {
            Ok(pool) => pool.install(|| files.par_iter().map(&process).collect()),
            // 线程池创建失败时退化为当前线程串行
            Err(_) => files.iter().map(&process).collect(),
        };

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        outcomes
    }

    fn read_text(&self, file: &PathBuf) -> std::result::Result<String, BatchFailure> {
        fs::read_to_string(file).map_err(|e| {
            let err = GautilityError::FileReadError {
                path: file.clone(),
                source: e,
            };
            BatchFailure {
                source_id: file.to_string_lossy().to_string(),
                kind: err.kind_label(),
                message: err.to_string(),
            }
        })
    }

    /// 读取 + 解析 + 判定单个 .log 文件
    fn ingest_one(&self, file: &PathBuf) -> IngestOutcome {
        let source_id = file.to_string_lossy().to_string();

        let text = match self.read_text(file) {
            Ok(t) => t,
            Err(failure) => return IngestOutcome::Failed(failure),
        };

        match parsers::parse(&source_id, &text, self.job_type_hint) {
            Ok(mut record) => {
                record.status = Some(classify::classify(&record));
                IngestOutcome::Parsed(Box::new(record))
            }
            Err(err) => IngestOutcome::Failed(BatchFailure {
                source_id,
                kind: err.kind_label(),
                message: err.to_string(),
            }),
        }
    }
}
