//! # 异构体排序模块
//!
//! 将一批已分类的计算记录按化学身份（化学式、电荷、多重度）分组，
//! 可选地对近似重复结构去重，并在组内按选定能量项升序排序，
//! 计算相对于组内最低能量的相对能量。
//!
//! ## 依赖关系
//! - 被 `batch/` 和 `commands/` 使用
//! - 使用 `models/`, `classify/`, `ranking/align.rs`

pub mod align;

use crate::classify;
use crate::error::GautilityError;
use crate::models::record::HARTREE_TO_EV;
use crate::models::{CalculationRecord, EnergyKey, JobStatus, StatusKind};
use std::collections::BTreeMap;

/// 组内单个成员：记录 + 排序用能量与相对能量
#[derive(Debug, Clone)]
pub struct IsomerMember {
    pub record: CalculationRecord,
    /// 选定能量项 (Hartree)
    pub energy: f64,
    /// 相对组内最低能量 (Hartree)，最低能成员恒为 0
    pub relative_energy: f64,
}

impl IsomerMember {
    /// 相对能量换算为 eV
    pub fn relative_energy_ev(&self) -> f64 {
        self.relative_energy * HARTREE_TO_EV
    }
}

/// 一组化学身份相同的竞争结构，按能量升序
#[derive(Debug, Clone)]
pub struct IsomerGroup {
    /// 身份键 "formula,charge,multiplicity"
    pub identity_key: String,
    /// 成员，升序排列；首个成员相对能量为 0
    pub members: Vec<IsomerMember>,
    /// 因结构近似重复而被并除的来源标识
    pub deduplicated: Vec<String>,
}

/// 排序结果：分组 + 被排除记录的报告
#[derive(Debug)]
pub struct RankingReport {
    /// 按身份键字典序排列的分组
    pub groups: Vec<IsomerGroup>,
    /// 缺少选定能量项而被排除的记录（报告而非静默丢弃）
    pub missing_energy: Vec<GautilityError>,
    /// 被状态过滤器排除的记录数
    pub filtered_out: usize,
}

impl RankingReport {
    /// 参与排序的记录总数
    pub fn ranked_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }
}

/// 结构无法确定化学式时的身份键回退
fn identity_key_of(record: &CalculationRecord) -> String {
    record.identity_key().unwrap_or_else(|| {
        format!(
            "?,{},{}",
            record.charge.unwrap_or(0),
            record.multiplicity.unwrap_or(1)
        )
    })
}

/// 按化学身份分组并排序异构体。
///
/// - `energy_key`: 排序所用能量项
/// - `outcome_filter`: 允许参与的状态类别（如 Converged + Unstable）
/// - `dedup_tolerance`: 对齐后最大最近邻距离阈值 (Å)；None 关闭去重。
///   发现重复时仅保留能量最低的代表。
pub fn rank_isomers(
    records: &[CalculationRecord],
    energy_key: EnergyKey,
    outcome_filter: &[StatusKind],
    dedup_tolerance: Option<f64>,
) -> RankingReport {
    let mut partitions: BTreeMap<String, Vec<IsomerMember>> = BTreeMap::new();
    let mut missing_energy = Vec::new();
    let mut filtered_out = 0usize;

    for record in records {
        // 未分类的记录按同一纯函数即时判定，保证过滤一致
        let status: JobStatus = record
            .status
            .clone()
            .unwrap_or_else(|| classify::classify(record));
        if !outcome_filter.contains(&status.kind()) {
            filtered_out += 1;
            continue;
        }

        let Some(energy) = record.energy(energy_key) else {
            missing_energy.push(GautilityError::RankingKeyMissing {
                source_id: record.source_id.clone(),
                energy_key: energy_key.as_str().to_string(),
            });
            continue;
        };

        partitions
            .entry(identity_key_of(record))
            .or_default()
            .push(IsomerMember {
                record: record.clone(),
                energy,
                relative_energy: 0.0,
            });
    }

    let mut groups = Vec::new();
    for (identity_key, mut members) in partitions {
        // 升序，能量相同时按来源标识字典序保证确定性
        members.sort_by(|a, b| {
            a.energy
                .partial_cmp(&b.energy)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record.source_id.cmp(&b.record.source_id))
        });

        let deduplicated = match dedup_tolerance {
            Some(tol) => deduplicate(&mut members, tol),
            None => Vec::new(),
        };

        let min_energy = members.first().map(|m| m.energy).unwrap_or(0.0);
        for m in &mut members {
            m.relative_energy = m.energy - min_energy;
        }

        groups.push(IsomerGroup {
            identity_key,
            members,
            deduplicated,
        });
    }

    RankingReport {
        groups,
        missing_energy,
        filtered_out,
    }
}

/// 组内去重：成员已按能量升序，逐个与已保留代表比较对齐距离，
/// 命中阈值即视为重复并丢弃（保留者能量必然更低）。
/// 返回被丢弃成员的来源标识。
fn deduplicate(members: &mut Vec<IsomerMember>, tolerance: f64) -> Vec<String> {
    let mut kept: Vec<IsomerMember> = Vec::new();
    let mut dropped = Vec::new();

    for member in members.drain(..) {
        let duplicate_of_kept = kept.iter().any(|rep| {
            match (
                rep.record.final_structure(),
                member.record.final_structure(),
            ) {
                (Some(a), Some(b)) => {
                    align::aligned_max_distance(a, b).is_some_and(|d| d <= tolerance)
                }
                _ => false,
            }
        });

        if duplicate_of_kept {
            dropped.push(member.record.source_id.clone());
        } else {
            kept.push(member);
        }
    }

    *members = kept;
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AtomSite, Geometry, JobType};

    fn ethylene() -> Geometry {
        Geometry::new(vec![
            AtomSite::new("C", [0.0, 0.0, 0.665]),
            AtomSite::new("C", [0.0, 0.0, -0.665]),
            AtomSite::new("H", [0.0, 0.923, 1.238]),
            AtomSite::new("H", [0.0, -0.923, 1.238]),
            AtomSite::new("H", [0.0, 0.923, -1.238]),
            AtomSite::new("H", [0.0, -0.923, -1.238]),
        ])
    }

    fn record(source_id: &str, hf: f64, geom: Geometry) -> CalculationRecord {
        let mut rec = CalculationRecord::new(source_id, JobType::Optimization);
        rec.energy_terms.insert(EnergyKey::Electronic, hf);
        rec.structures.push(geom);
        rec.normal_termination = true;
        rec.convergence_marker = true;
        rec.status = Some(JobStatus::Converged);
        rec
    }

    const CONVERGED_AND_UNSTABLE: &[StatusKind] = &[StatusKind::Converged, StatusKind::Unstable];

    #[test]
    fn test_c2h4_ranking_scenario() {
        let records = vec![
            record("a.log", -78.41, ethylene()),
            record("b.log", -78.42, ethylene()),
            record("c.log", -78.415, ethylene()),
        ];
        let report = rank_isomers(&records, EnergyKey::Electronic, CONVERGED_AND_UNSTABLE, None);

        assert_eq!(report.groups.len(), 1);
        let group = &report.groups[0];
        assert_eq!(group.identity_key, "C2H4,0,1");
        assert_eq!(group.members.len(), 3);

        let ids: Vec<&str> = group
            .members
            .iter()
            .map(|m| m.record.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b.log", "c.log", "a.log"]);

        assert!(group.members[0].relative_energy.abs() < 1e-12);
        assert!((group.members[1].relative_energy - 0.005).abs() < 1e-9);
        assert!((group.members[2].relative_energy - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_relative_energies_non_negative_and_sorted() {
        let records = vec![
            record("x.log", -10.0, ethylene()),
            record("y.log", -10.5, ethylene()),
            record("z.log", -9.8, ethylene()),
        ];
        let report = rank_isomers(&records, EnergyKey::Electronic, CONVERGED_AND_UNSTABLE, None);
        let group = &report.groups[0];
        for pair in group.members.windows(2) {
            assert!(pair[0].relative_energy <= pair[1].relative_energy);
        }
        assert!(group.members.iter().all(|m| m.relative_energy >= 0.0));
    }

    #[test]
    fn test_single_member_group_has_zero_relative_energy() {
        let records = vec![record("only.log", -42.0, ethylene())];
        let report = rank_isomers(&records, EnergyKey::Electronic, CONVERGED_AND_UNSTABLE, None);
        assert_eq!(report.groups[0].members[0].relative_energy, 0.0);
    }

    #[test]
    fn test_missing_energy_key_reported_not_dropped() {
        let mut incomplete = record("no-etot.log", -1.0, ethylene());
        incomplete.energy_terms.clear();
        incomplete
            .energy_terms
            .insert(EnergyKey::Electronic, -78.0);
        let records = vec![record("full.log", -78.4, ethylene()), incomplete];

        let report = rank_isomers(
            &records,
            EnergyKey::ElectronicPlusZpe,
            CONVERGED_AND_UNSTABLE,
            None,
        );
        // 两条记录都没有 electronic+zpe
        assert_eq!(report.groups.len(), 0);
        assert_eq!(report.missing_energy.len(), 2);
        assert!(matches!(
            report.missing_energy[0],
            GautilityError::RankingKeyMissing { .. }
        ));
    }

    #[test]
    fn test_outcome_filter_excludes_error_terminated() {
        let mut failed = record("failed.log", -80.0, ethylene());
        failed.status = Some(JobStatus::ErrorTerminated("l9999".into()));
        let records = vec![record("ok.log", -78.4, ethylene()), failed];

        let report = rank_isomers(&records, EnergyKey::Electronic, CONVERGED_AND_UNSTABLE, None);
        assert_eq!(report.ranked_count(), 1);
        assert_eq!(report.filtered_out, 1);
    }

    #[test]
    fn test_dedup_keeps_lowest_energy_representative() {
        // 同一结构平移一份：应视为重复，保留能量更低者
        let mut shifted = ethylene();
        for atom in &mut shifted.atoms {
            atom.position[0] += 5.0;
        }
        let records = vec![
            record("low.log", -78.42, ethylene()),
            record("dup.log", -78.41, shifted),
        ];

        let report = rank_isomers(
            &records,
            EnergyKey::Electronic,
            CONVERGED_AND_UNSTABLE,
            Some(0.1),
        );
        let group = &report.groups[0];
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].record.source_id, "low.log");
        assert_eq!(group.deduplicated, vec!["dup.log".to_string()]);
    }

    #[test]
    fn test_dedup_idempotent() {
        let records = vec![
            record("a.log", -78.42, ethylene()),
            record("b.log", -78.41, ethylene()),
        ];
        let first = rank_isomers(
            &records,
            EnergyKey::Electronic,
            CONVERGED_AND_UNSTABLE,
            Some(0.1),
        );
        let survivors: Vec<CalculationRecord> = first.groups[0]
            .members
            .iter()
            .map(|m| m.record.clone())
            .collect();

        let second = rank_isomers(
            &survivors,
            EnergyKey::Electronic,
            CONVERGED_AND_UNSTABLE,
            Some(0.1),
        );
        assert_eq!(
            second.groups[0].members.len(),
            first.groups[0].members.len()
        );
        assert!(second.groups[0].deduplicated.is_empty());
    }

    #[test]
    fn test_groups_split_by_charge() {
        let mut anion = record("anion.log", -78.5, ethylene());
        anion.charge = Some(-1);
        anion.multiplicity = Some(2);
        let records = vec![record("neutral.log", -78.4, ethylene()), anion];

        let report = rank_isomers(&records, EnergyKey::Electronic, CONVERGED_AND_UNSTABLE, None);
        assert_eq!(report.groups.len(), 2);
        // 身份键字典序
        assert_eq!(report.groups[0].identity_key, "C2H4,-1,2");
        assert_eq!(report.groups[1].identity_key, "C2H4,0,1");
    }

    #[test]
    fn test_tie_broken_by_source_id() {
        let records = vec![
            record("z.log", -78.4, ethylene()),
            record("a.log", -78.4, ethylene()),
        ];
        let report = rank_isomers(&records, EnergyKey::Electronic, CONVERGED_AND_UNSTABLE, None);
        assert_eq!(report.groups[0].members[0].record.source_id, "a.log");
    }

    #[test]
    fn test_relative_energy_ev_conversion() {
        let m = IsomerMember {
            record: record("x.log", -78.0, ethylene()),
            energy: -78.0,
            relative_energy: 0.01,
        };
        assert!((m.relative_energy_ev() - 0.2721138).abs() < 1e-9);
    }
}
