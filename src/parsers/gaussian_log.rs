//! # Gaussian .log 输出解析器
//!
//! 解析 opt / sp 任务的 .log 输出，提取归档块字段（对称性、电子态、
//! HF 能量、NImag）、热化学能量、结构块与终止状态标志。
//!
//! ## 锚点与回退链
//! - 归档块字段使用容忍 70 列换行的正则（`HF=` 等标记可能在任意字符间断行）
//! - 热化学字段使用整行锚点（`Zero-point correction=` 等）
//! - 结构块使用 `Standard orientation:` 锚点 + 固定列数行
//! - 错误代码按 `/g16/lNNN.exe` 精确捕获，非子串启发式；
//!   仅在未正常终止时扫描（`#p` 路由在正常运行中也逐 link 打印
//!   `(Enter .../lNNN.exe)`）
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/` 数据模型

use crate::error::{GautilityError, Result};
use crate::models::geometry::element_symbol;
use crate::models::{AtomSite, CalculationRecord, EnergyKey, Geometry, JobType};
use regex::Regex;
use std::sync::OnceLock;

/// 归档块点群符号 -> 常规记法
fn normalize_point_group(raw: &str) -> String {
    match raw {
        "C01" => "C1",
        "C02" => "C2",
        "CS" => "Cs",
        "C02H" => "C2h",
        "C02V" => "C2v",
        "C03V" => "C3v",
        "C04V" => "C4v",
        "D02H" => "D2h",
        "D03H" => "D3h",
        "D02D" => "D2d",
        "D*H" => "Dinfh",
        "C*V" => "Cinfv",
        "C*H" => "Cinfh",
        other => return other.to_string(),
    }
    .to_string()
}

/// 归档块字段正则集合，进程内编译一次
struct LogPatterns {
    sym: Regex,
    state: Regex,
    hf: Regex,
    nimag: Regex,
    zpe: Regex,
    etot: Regex,
    etherm: Regex,
    charge_mult: Regex,
    error_link: Regex,
}

fn patterns() -> &'static LogPatterns {
    static PATTERNS: OnceLock<LogPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LogPatterns {
        // 归档块在 70 列处硬换行，标记可能被拆散在任意字符间
        sym: Regex::new(r"P\s*G\s*=\s*([^=\[]*)\s*\[").unwrap(),
        state: Regex::new(r"S\s*t\s*a\s*t\s*e\s*=\s*([^=\\]*)\\").unwrap(),
        hf: Regex::new(r"H\s*F\s*=\s*([^=\\]*)\\").unwrap(),
        nimag: Regex::new(r"N\s*I\s*m\s*a\s*g\s*=\s*([^=\\]*)\\").unwrap(),
        zpe: Regex::new(r"Zero-point correction=\s*([^=(]*)\(").unwrap(),
        etot: Regex::new(r"Sum of electronic and zero-point Energies=\s*(\S+)").unwrap(),
        etherm: Regex::new(r"Sum of electronic and thermal Energies=\s*(\S+)").unwrap(),
        charge_mult: Regex::new(r"Charge\s*=\s*(-?\d+)\s+Multiplicity\s*=\s*(\d+)").unwrap(),
        error_link: Regex::new(r"/g(?:09|16)/(l\d+)\.exe").unwrap(),
    })
}

/// 取最后一次匹配的捕获组并去除换行/空白（归档块值可能跨行）
fn last_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| {
            m.as_str()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
        })
        .filter(|s| !s.is_empty())
}

/// 解析 .log 文本
pub fn parse_log(
    source_id: &str,
    raw_text: &str,
    hint: Option<JobType>,
) -> Result<CalculationRecord> {
    check_signature(source_id, raw_text)?;

    let lines: Vec<&str> = raw_text.lines().collect();
    let p = patterns();

    // 终止/收敛/稳定性标志
    let normal_termination = raw_text.contains("Normal termination of Gaussian");
    let convergence_marker =
        raw_text.contains("Stationary point found") || raw_text.contains("Optimization completed");
    let instability_marker = raw_text.contains("The wavefunction has an internal instability")
        || raw_text.contains("The wavefunction is unstable");

    // 错误代码：按出现顺序去重。正常终止的任务不扫描，
    // 否则 `#p` 路由打印的 (Enter .../lNNN.exe) 会全部误报
    let mut raw_errors: Vec<String> = Vec::new();
    if !normal_termination {
        for cap in p.error_link.captures_iter(raw_text) {
            let code = cap[1].to_string();
            if !raw_errors.contains(&code) {
                raw_errors.push(code);
            }
        }
    }

    // 结构块：槽位损坏时保留缺失信息，避免初始/最终结构互相顶替
    let atom_count = find_atom_count(&lines);
    let slots = extract_structures(&lines, atom_count);
    let geometry_degraded = !slots.is_empty() && slots.iter().any(|s| s.is_none());

    let job_type = hint.unwrap_or_else(|| detect_job_type(raw_text, &lines));

    let mut record = CalculationRecord::new(source_id, job_type);
    record.normal_termination = normal_termination;
    record.convergence_marker = convergence_marker;
    record.instability_marker = instability_marker;
    record.raw_errors = raw_errors;
    if slots.len() == 2 {
        record.initial_structure_degraded = slots[0].is_none() && slots[1].is_some();
        record.final_structure_degraded = slots[1].is_none() && slots[0].is_some();
    }
    record.structures = slots.into_iter().flatten().collect();

    // 归档块字段（正常终止的任务才会写出归档块，但锚点匹配对
    // 截断文件同样安全：匹配不到即字段缺失）
    if let Some(sym) = last_capture(&p.sym, raw_text) {
        record.symmetry_label = Some(normalize_point_group(&sym));
    }
    if let Some(state) = last_capture(&p.state, raw_text) {
        record.state_label = Some(state);
    }
    if let Some(hf) = last_capture(&p.hf, raw_text).and_then(|s| s.parse::<f64>().ok()) {
        record.energy_terms.insert(EnergyKey::Electronic, hf);
    }
    if let Some(n) = last_capture(&p.nimag, raw_text).and_then(|s| s.parse::<u32>().ok()) {
        record.imaginary_mode_count = Some(n);
    }
    if let Some(zpe) = last_capture(&p.zpe, raw_text).and_then(|s| s.parse::<f64>().ok()) {
        record
            .energy_terms
            .insert(EnergyKey::ZeroPointCorrection, zpe);
    }
    if let Some(etot) = last_capture(&p.etot, raw_text).and_then(|s| s.parse::<f64>().ok()) {
        record.energy_terms.insert(EnergyKey::ElectronicPlusZpe, etot);
    }
    if let Some(eth) = last_capture(&p.etherm, raw_text).and_then(|s| s.parse::<f64>().ok()) {
        record
            .energy_terms
            .insert(EnergyKey::ElectronicPlusThermal, eth);
    }
    if let Some(cap) = p.charge_mult.captures_iter(raw_text).next() {
        record.charge = cap[1].parse().ok();
        record.multiplicity = cap[2].parse().ok();
    }

    // 结构块损坏且主能量项同样不可恢复、又无错误代码可解释时，
    // 该文件视为不可解析
    if geometry_degraded
        && record.energy(EnergyKey::Electronic).is_none()
        && record.raw_errors.is_empty()
    {
        return Err(GautilityError::ParseError {
            source_id: source_id.to_string(),
            reason: "malformed geometry block and primary energy term unrecoverable".to_string(),
            byte_offset: raw_text
                .find("Standard orientation:")
                .unwrap_or(0),
        });
    }

    Ok(record)
}

/// 输入签名检查：空文件、二进制内容、非 Gaussian 输出直接拒绝
fn check_signature(source_id: &str, raw_text: &str) -> Result<()> {
    if raw_text.trim().is_empty() {
        return Err(GautilityError::ParseError {
            source_id: source_id.to_string(),
            reason: "empty input".to_string(),
            byte_offset: 0,
        });
    }
    if let Some(pos) = raw_text.find('\0') {
        return Err(GautilityError::ParseError {
            source_id: source_id.to_string(),
            reason: "binary content".to_string(),
            byte_offset: pos,
        });
    }
    if !raw_text.contains("Gaussian") {
        return Err(GautilityError::ParseError {
            source_id: source_id.to_string(),
            reason: "missing Gaussian program signature".to_string(),
            byte_offset: 0,
        });
    }
    Ok(())
}

/// 无 hint 时判别任务类型：路由行含 opt 或出现多个结构块/驻点标志
fn detect_job_type(raw_text: &str, lines: &[&str]) -> JobType {
    for line in lines {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') && trimmed.to_lowercase().contains("opt") {
            return JobType::Optimization;
        }
    }
    if raw_text.contains("Stationary point found") {
        return JobType::Optimization;
    }
    let orientation_blocks = lines
        .iter()
        .filter(|l| l.contains("Standard orientation:"))
        .count();
    if orientation_blocks > 1 {
        JobType::Optimization
    } else {
        JobType::SinglePoint
    }
}

/// 查找 "NAtoms=" 行的原子数
fn find_atom_count(lines: &[&str]) -> Option<usize> {
    for line in lines {
        if let Some(pos) = line.find("NAtoms=") {
            let rest = &line[pos + "NAtoms=".len()..];
            if let Some(tok) = rest.split_whitespace().next() {
                if let Ok(n) = tok.parse::<usize>() {
                    return Some(n);
                }
            }
        }
    }
    None
}

/// 提取结构槽位：初始结构为第一个 `Standard orientation:` 块；
/// 块数大于 1 时优化结构取倒数第二个块（最后一个块为重印）。
/// 损坏的块以 None 占位，槽位身份由调用方保留。
fn extract_structures(lines: &[&str], atom_count: Option<usize>) -> Vec<Option<Geometry>> {
    let block_starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains("Standard orientation:"))
        .map(|(i, _)| i + 5)
        .collect();

    if block_starts.is_empty() {
        return Vec::new();
    }

    let picked: Vec<usize> = if block_starts.len() == 1 {
        vec![block_starts[0]]
    } else {
        vec![block_starts[0], block_starts[block_starts.len() - 2]]
    };

    picked
        .into_iter()
        .map(|start| parse_orientation_block(lines, start, atom_count))
        .collect()
}

/// 解析单个结构块的坐标行。
/// 行格式: 序号 原子序数 原子类型 X Y Z；原子数未知时读到分隔线为止。
fn parse_orientation_block(
    lines: &[&str],
    start: usize,
    atom_count: Option<usize>,
) -> Option<Geometry> {
    let mut atoms = Vec::new();
    let mut idx = start;
    loop {
        if idx >= lines.len() {
            // 文件在块中途截断：已读到的原子不足时整块降级
            break;
        }
        let line = lines[idx];
        if line.contains("----") {
            break;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return None;
        }
        let z: u32 = fields[1].parse().ok()?;
        let element = element_symbol(z)?;
        let x: f64 = fields[3].parse().ok()?;
        let y: f64 = fields[4].parse().ok()?;
        let zc: f64 = fields[5].parse().ok()?;
        atoms.push(AtomSite::new(element, [x, y, zc]));

        idx += 1;
        if let Some(n) = atom_count {
            if atoms.len() == n {
                break;
            }
        }
    }

    if atoms.is_empty() {
        return None;
    }
    if let Some(n) = atom_count {
        if atoms.len() != n {
            return None;
        }
    }
    Some(Geometry::new(atoms))
}
