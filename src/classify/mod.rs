//! # 任务状态判定模块
//!
//! 对已解析的 `CalculationRecord` 赋予终态 `JobStatus`。
//!
//! 判定为纯函数，按固定优先级求值（首个命中生效）：
//! 1. 错误代码命中致命错误注册表 -> `ErrorTerminated(code)`
//! 2. 任务类型所需的能量/结构字段缺失 -> `Incomplete`
//! 3. 优化任务无显式收敛标志 -> `NotConverged`
//! 4. 波函数不稳定标志存在 -> `Unstable`（可与收敛并存，优先警示）
//! 5. 其余 -> `Converged`
//!
//! 固定优先级保证下游过滤（如"只排序收敛且稳定的异构体"）可复现，
//! 与文件内文本出现顺序无关。
//!
//! ## 依赖关系
//! - 被 `batch/`, `ranking/`, `commands/` 使用
//! - 使用 `models/record.rs`

use crate::models::{CalculationRecord, EnergyKey, JobStatus, JobType};

/// 已知致命错误代码注册表：Gaussian link 代码 -> 简述。
/// 精确代码查表，不做子串启发式，避免描述性文字误报。
const FATAL_ERROR_REGISTRY: &[(&str, &str)] = &[
    ("l1", "initial setup failure"),
    ("l101", "input syntax error"),
    ("l103", "geometry optimization failure"),
    ("l123", "IRC step failure"),
    ("l202", "atoms too close"),
    ("l301", "basis set input error"),
    ("l401", "initial guess failure"),
    ("l502", "SCF convergence failure"),
    ("l508", "quadratic SCF failure"),
    ("l601", "population analysis failure"),
    ("l716", "frequency analysis failure"),
    ("l906", "MP2 failure"),
    ("l913", "CCSD(T) failure"),
    ("l9999", "maximum cycles exceeded"),
];

/// 查注册表，返回该代码的简述
pub fn fatal_error_description(code: &str) -> Option<&'static str> {
    FATAL_ERROR_REGISTRY
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, desc)| *desc)
}

/// 判定单条记录的终态状态（纯函数，无副作用）
pub fn classify(record: &CalculationRecord) -> JobStatus {
    // 1. 致命错误：取最后出现的已注册代码（终止所在 link）。
    //    未注册的错误代码不得静默放行为 Converged，按 unknown 处理。
    if !record.raw_errors.is_empty() {
        let known = record
            .raw_errors
            .iter()
            .rev()
            .find(|code| fatal_error_description(code).is_some());
        return match known {
            Some(code) => JobStatus::ErrorTerminated(code.clone()),
            None => JobStatus::ErrorTerminated("unknown".to_string()),
        };
    }

    // 2. 必需字段缺失
    if !has_required_fields(record) {
        return JobStatus::Incomplete;
    }

    // 3. 优化任务必须有显式收敛标志
    if record.job_type == JobType::Optimization && !record.convergence_marker {
        return JobStatus::NotConverged;
    }

    // 4. 不稳定警示优先于收敛
    if record.instability_marker {
        return JobStatus::Unstable;
    }

    JobStatus::Converged
}

/// 任务类型所需的最小字段集：
/// - sp: 主能量项
/// - opt: 主能量项 + 最终结构
fn has_required_fields(record: &CalculationRecord) -> bool {
    if record.energy(EnergyKey::Electronic).is_none() {
        return false;
    }
    match record.job_type {
        JobType::SinglePoint => true,
        JobType::Optimization => record.final_structure().is_some(),
    }
}
