//! # Gaussian .fchk 轨道能级解析器
//!
//! 从格式化检查点文件提取占据轨道能级，用于 DOS / PES 谱合成。
//!
//! ## 锚点
//! - `Number of alpha electrons` / `Number of beta electrons`
//! - `Alpha Orbital Energies` / `Beta Orbital Energies` 数据段
//!   （自由格式浮点行，读到非数值行为止）
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`、`batch/` 使用
//! - 使用 `models/` 数据模型

use crate::error::{GautilityError, Result};
use crate::models::record::HARTREE_TO_EV;
use crate::models::{CalculationRecord, EnergyKey, JobType, Level};

/// 占据轨道数据，能量已换算为 eV
#[derive(Debug, Clone)]
pub struct OrbitalData {
    /// 占据 alpha 轨道能级 (eV)
    pub alpha: Vec<f64>,
    /// 占据 beta 轨道能级 (eV)
    pub beta: Vec<f64>,
}

impl OrbitalData {
    /// 全部占据能级，升序，无显式强度
    pub fn occupied_levels(&self) -> Vec<Level> {
        let mut all: Vec<f64> = self.alpha.iter().chain(self.beta.iter()).copied().collect();
        all.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        all.into_iter().map(Level::new).collect()
    }
}

/// 解析 .fchk 文本为占据轨道数据
pub fn parse_fchk(source_id: &str, raw_text: &str) -> Result<OrbitalData> {
    if raw_text.trim().is_empty() {
        return Err(GautilityError::ParseError {
            source_id: source_id.to_string(),
            reason: "empty input".to_string(),
            byte_offset: 0,
        });
    }

    let lines: Vec<&str> = raw_text.lines().collect();

    let mut nalpha: Option<usize> = None;
    let mut nbeta: Option<usize> = None;
    for line in &lines {
        if line.starts_with("Number of alpha electrons") {
            nalpha = line.split_whitespace().last().and_then(|t| t.parse().ok());
        } else if line.starts_with("Number of beta electrons") {
            nbeta = line.split_whitespace().last().and_then(|t| t.parse().ok());
        }
    }

    let alpha_raw = read_energy_section(&lines, "Alpha Orbital Energies");
    let beta_raw = read_energy_section(&lines, "Beta Orbital Energies");

    if alpha_raw.is_empty() {
        return Err(GautilityError::ParseError {
            source_id: source_id.to_string(),
            reason: "no orbital energy section found".to_string(),
            byte_offset: 0,
        });
    }

    // 仅保留占据轨道（前 nα / nβ 个），Hartree -> eV
    let take_alpha = nalpha.unwrap_or(alpha_raw.len()).min(alpha_raw.len());
    let take_beta = nbeta.unwrap_or(beta_raw.len()).min(beta_raw.len());
    let alpha: Vec<f64> = alpha_raw[..take_alpha]
        .iter()
        .map(|e| e * HARTREE_TO_EV)
        .collect();
    let beta: Vec<f64> = beta_raw[..take_beta]
        .iter()
        .map(|e| e * HARTREE_TO_EV)
        .collect();

    if alpha.is_empty() && beta.is_empty() {
        return Err(GautilityError::ParseError {
            source_id: source_id.to_string(),
            reason: "no occupied orbital levels".to_string(),
            byte_offset: 0,
        });
    }

    Ok(OrbitalData { alpha, beta })
}

/// 解析 .fchk 文本为归一化计算记录。
///
/// 格式化检查点由已写出检查点的任务生成，视为正常终止；
/// 轨道能级进入 `orbital_levels`，总能量/电荷/多重度按锚点行提取。
pub fn parse_fchk_record(source_id: &str, raw_text: &str) -> Result<CalculationRecord> {
    let data = parse_fchk(source_id, raw_text)?;

    let mut record = CalculationRecord::new(source_id, JobType::SinglePoint);
    record.normal_termination = true;
    record.orbital_levels = Some(data.occupied_levels());

    for line in raw_text.lines() {
        if line.starts_with("Total Energy") {
            if let Some(e) = last_token_f64(line) {
                record.energy_terms.insert(EnergyKey::Electronic, e);
            }
        } else if line.starts_with("Charge ") {
            record.charge = last_token(line).and_then(|t| t.parse().ok());
        } else if line.starts_with("Multiplicity") {
            record.multiplicity = last_token(line).and_then(|t| t.parse().ok());
        }
    }

    Ok(record)
}

fn last_token(line: &str) -> Option<&str> {
    line.split_whitespace().last()
}

fn last_token_f64(line: &str) -> Option<f64> {
    last_token(line).and_then(|t| t.parse().ok())
}

/// 读取锚点行之后的自由格式浮点数据段
fn read_energy_section(lines: &[&str], anchor: &str) -> Vec<f64> {
    let mut values = Vec::new();
    let Some(start) = lines.iter().position(|l| l.starts_with(anchor)) else {
        return values;
    };

    for line in &lines[start + 1..] {
        let mut any = false;
        let mut row = Vec::new();
        for tok in line.split_whitespace() {
            match tok.parse::<f64>() {
                Ok(v) => {
                    row.push(v);
                    any = true;
                }
                Err(_) => return values,
            }
        }
        if !any {
            break;
        }
        values.extend(row);
    }
    values
}
