//! # 计算记录数据模型
//!
//! 存储单个量子化学计算任务的归一化解析结果。所有能量项统一为 Hartree，
//! 轨道/VDE 能级统一为 eV。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `classify/`, `ranking/`, `spectra/`, `batch/` 使用
//! - 使用 `models/geometry.rs`

use crate::models::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hartree -> eV 换算系数
pub const HARTREE_TO_EV: f64 = 27.21138;

/// 计算任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    /// 几何优化
    Optimization,
    /// 单点能
    SinglePoint,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Optimization => write!(f, "opt"),
            JobType::SinglePoint => write!(f, "sp"),
        }
    }
}

/// 能量项类别
///
/// 全部以 Hartree 存储；来源单位与换算系数见 `parsers/`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnergyKey {
    /// 总电子能量 (HF=)，主能量项
    Electronic,
    /// 零点振动校正 (Zero-point correction=)
    ZeroPointCorrection,
    /// 电子能量 + 零点校正 (Sum of electronic and zero-point Energies=)
    ElectronicPlusZpe,
    /// 电子能量 + 热校正 (Sum of electronic and thermal Energies=)
    ElectronicPlusThermal,
}

impl EnergyKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyKey::Electronic => "electronic",
            EnergyKey::ZeroPointCorrection => "zpe-correction",
            EnergyKey::ElectronicPlusZpe => "electronic+zpe",
            EnergyKey::ElectronicPlusThermal => "electronic+thermal",
        }
    }
}

impl std::fmt::Display for EnergyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 离散能级：能量 (eV) + 可选强度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub energy: f64,
    pub intensity: Option<f64>,
}

impl Level {
    pub fn new(energy: f64) -> Self {
        Level {
            energy,
            intensity: None,
        }
    }

    pub fn with_intensity(energy: f64, intensity: f64) -> Self {
        Level {
            energy,
            intensity: Some(intensity),
        }
    }

    /// 未显式给出强度时取 1.0
    pub fn weight(&self) -> f64 {
        self.intensity.unwrap_or(1.0)
    }
}

/// 终态任务状态，由 `classify/` 按固定优先级赋予
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// 正常收敛
    Converged,
    /// 优化任务未找到驻点
    NotConverged,
    /// 以已知错误代码终止
    ErrorTerminated(String),
    /// 波函数不稳定（可与收敛并存，优先显示此警示）
    Unstable,
    /// 输出不完整，必需字段缺失
    Incomplete,
}

impl JobStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            JobStatus::Converged => StatusKind::Converged,
            JobStatus::NotConverged => StatusKind::NotConverged,
            JobStatus::ErrorTerminated(_) => StatusKind::ErrorTerminated,
            JobStatus::Unstable => StatusKind::Unstable,
            JobStatus::Incomplete => StatusKind::Incomplete,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Converged => write!(f, "Converged"),
            JobStatus::NotConverged => write!(f, "NotConverged"),
            JobStatus::ErrorTerminated(code) => write!(f, "ErrorTerminated({})", code),
            JobStatus::Unstable => write!(f, "Unstable"),
            JobStatus::Incomplete => write!(f, "Incomplete"),
        }
    }
}

/// 状态类别（不携带错误代码），用于结果过滤与计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusKind {
    Converged,
    NotConverged,
    ErrorTerminated,
    Unstable,
    Incomplete,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKind::Converged => write!(f, "converged"),
            StatusKind::NotConverged => write!(f, "not-converged"),
            StatusKind::ErrorTerminated => write!(f, "error-terminated"),
            StatusKind::Unstable => write!(f, "unstable"),
            StatusKind::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// 单个计算任务的归一化记录
///
/// 由 `parsers/` 构建，经 `classify/` 赋予 `status` 后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRecord {
    /// 来源标识（文件路径或标签）
    pub source_id: String,

    /// 任务类型
    pub job_type: JobType,

    /// 能量项 (Hartree)，逐项可缺失
    pub energy_terms: BTreeMap<EnergyKey, f64>,

    /// 电子态标签（如 "1-A1"），大小写已归一化
    pub state_label: Option<String>,

    /// 点群符号（如 "C2v"）
    pub symmetry_label: Option<String>,

    /// 净电荷
    pub charge: Option<i32>,

    /// 自旋多重度
    pub multiplicity: Option<u32>,

    /// 虚频数目，未知为 None
    pub imaginary_mode_count: Option<u32>,

    /// 有序结构序列；优化任务至少含初始与最终结构
    pub structures: Vec<Geometry>,

    /// 初始结构块损坏而缺失（仅最终结构可恢复时置位）
    pub initial_structure_degraded: bool,

    /// 最终结构块损坏而缺失（仅初始结构可恢复时置位）
    pub final_structure_degraded: bool,

    /// 占据轨道能级 (eV，升序)，仅轨道数据存在时填充
    pub orbital_levels: Option<Vec<Level>>,

    /// 垂直脱附能级 (eV，升序)，仅 PES 数据存在时填充
    pub vde_levels: Option<Vec<Level>>,

    /// 识别到的错误代码（按首次出现顺序去重）
    pub raw_errors: Vec<String>,

    /// 是否出现正常终止标志
    pub normal_termination: bool,

    /// 是否出现显式收敛标志（优化任务）
    pub convergence_marker: bool,

    /// 是否出现波函数不稳定标志
    pub instability_marker: bool,

    /// 终态状态，由 `classify/` 赋予
    pub status: Option<JobStatus>,
}

impl CalculationRecord {
    pub fn new(source_id: impl Into<String>, job_type: JobType) -> Self {
        CalculationRecord {
            source_id: source_id.into(),
            job_type,
            energy_terms: BTreeMap::new(),
            state_label: None,
            symmetry_label: None,
            charge: None,
            multiplicity: None,
            imaginary_mode_count: None,
            structures: Vec::new(),
            initial_structure_degraded: false,
            final_structure_degraded: false,
            orbital_levels: None,
            vde_levels: None,
            raw_errors: Vec::new(),
            normal_termination: false,
            convergence_marker: false,
            instability_marker: false,
            status: None,
        }
    }

    /// 取指定能量项 (Hartree)
    pub fn energy(&self, key: EnergyKey) -> Option<f64> {
        self.energy_terms.get(&key).copied()
    }

    /// 初始结构（第一个）。对应结构块损坏时为 None，
    /// 不以最终结构顶替。
    pub fn initial_structure(&self) -> Option<&Geometry> {
        if self.initial_structure_degraded {
            return None;
        }
        self.structures.first()
    }

    /// 最终结构（最后一个）。对应结构块损坏时为 None，
    /// 不以初始结构顶替。
    pub fn final_structure(&self) -> Option<&Geometry> {
        if self.final_structure_degraded {
            return None;
        }
        self.structures.last()
    }

    /// 化学身份键 "formula,charge,multiplicity"，用于异构体分组。
    /// 电荷/多重度缺失时按中性单重态处理。
    pub fn identity_key(&self) -> Option<String> {
        let formula = self.final_structure().map(|g| g.formula())?;
        Some(format!(
            "{},{},{}",
            formula,
            self.charge.unwrap_or(0),
            self.multiplicity.unwrap_or(1)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AtomSite;

    fn h2_record() -> CalculationRecord {
        let mut rec = CalculationRecord::new("h2.log", JobType::Optimization);
        rec.structures.push(Geometry::new(vec![
            AtomSite::new("H", [0.0, 0.0, 0.0]),
            AtomSite::new("H", [0.74, 0.0, 0.0]),
        ]));
        rec
    }

    #[test]
    fn test_energy_lookup() {
        let mut rec = h2_record();
        rec.energy_terms.insert(EnergyKey::Electronic, -1.17);
        assert_eq!(rec.energy(EnergyKey::Electronic), Some(-1.17));
        assert_eq!(rec.energy(EnergyKey::ElectronicPlusZpe), None);
    }

    #[test]
    fn test_identity_key_defaults() {
        let rec = h2_record();
        assert_eq!(rec.identity_key(), Some("H2,0,1".to_string()));
    }

    #[test]
    fn test_identity_key_charged() {
        let mut rec = h2_record();
        rec.charge = Some(-1);
        rec.multiplicity = Some(2);
        assert_eq!(rec.identity_key(), Some("H2,-1,2".to_string()));
    }

    #[test]
    fn test_identity_key_without_structure() {
        let rec = CalculationRecord::new("empty.log", JobType::SinglePoint);
        assert_eq!(rec.identity_key(), None);
    }

    #[test]
    fn test_level_weight() {
        assert_eq!(Level::new(-5.0).weight(), 1.0);
        assert_eq!(Level::with_intensity(-5.0, 0.5).weight(), 0.5);
    }

    #[test]
    fn test_status_kind() {
        assert_eq!(
            JobStatus::ErrorTerminated("l9999".into()).kind(),
            StatusKind::ErrorTerminated
        );
        assert_eq!(JobStatus::Converged.kind(), StatusKind::Converged);
    }
}
