//! # 数据模型模块
//!
//! 定义计算记录、分子结构与能级的统一数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `classify/`, `ranking/`, `spectra/`, `batch/` 使用
//! - 子模块: geometry, record

pub mod geometry;
pub mod record;

pub use geometry::{AtomSite, Geometry};
pub use record::{CalculationRecord, EnergyKey, JobStatus, JobType, Level, StatusKind};
