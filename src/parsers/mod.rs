//! # 解析器模块
//!
//! 提供 Gaussian 计算输出的解析器：.log 任务输出与 .fchk 轨道数据。
//!
//! 解析策略为锚点识别而非固定行号：每个字段对应一个或多个文本标记，
//! 对版本间格式漂移保持容错。输出不完整表现为字段缺失而非解析失败；
//! 只有完全无法识别的输入（空文件、二进制内容、非 Gaussian 输出）
//! 才返回 `ParseError`。
//!
//! ## 依赖关系
//! - 被 `batch/` 和 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: gaussian_log, fchk

pub mod fchk;
pub mod gaussian_log;

pub use fchk::{parse_fchk, parse_fchk_record, OrbitalData};

use crate::error::Result;
use crate::models::{CalculationRecord, JobType};

/// 解析单个 .log 输出文本为归一化记录
///
/// `hint` 给定任务类型；为 None 时依据路由行与结构块数目自动判别。
pub fn parse(source_id: &str, raw_text: &str, hint: Option<JobType>) -> Result<CalculationRecord> {
    gaussian_log::parse_log(source_id, raw_text, hint)
}
