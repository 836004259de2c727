//! # 分子结构数据模型
//!
//! 定义笛卡尔坐标下的分子几何结构表示及元素符号表。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `ranking/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 元素符号表，按原子序数索引（1-118）
const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// 按原子序数查找元素符号
pub fn element_symbol(atomic_number: u32) -> Option<&'static str> {
    if atomic_number == 0 {
        return None;
    }
    ELEMENT_SYMBOLS.get(atomic_number as usize - 1).copied()
}

/// 原子位点：元素符号 + 笛卡尔坐标 (Å)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomSite {
    /// 元素符号
    pub element: String,

    /// 笛卡尔坐标 [x, y, z] (Å)
    pub position: [f64; 3],
}

impl AtomSite {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        AtomSite {
            element: element.into(),
            position,
        }
    }
}

/// 分子几何结构：有序原子序列
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// 原子列表
    pub atoms: Vec<AtomSite>,
}

impl Geometry {
    pub fn new(atoms: Vec<AtomSite>) -> Self {
        Geometry { atoms }
    }

    /// 原子数
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// 计算化学式（元素按字母序，计数 1 省略）
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 几何中心
    pub fn centroid(&self) -> [f64; 3] {
        let n = self.atoms.len();
        if n == 0 {
            return [0.0; 3];
        }
        let mut c = [0.0; 3];
        for atom in &self.atoms {
            for i in 0..3 {
                c[i] += atom.position[i];
            }
        }
        for v in &mut c {
            *v /= n as f64;
        }
        c
    }

    /// 每种元素的原子计数
    pub fn element_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_symbol() {
        assert_eq!(element_symbol(1), Some("H"));
        assert_eq!(element_symbol(6), Some("C"));
        assert_eq!(element_symbol(79), Some("Au"));
        assert_eq!(element_symbol(118), Some("Og"));
        assert_eq!(element_symbol(0), None);
        assert_eq!(element_symbol(119), None);
    }

    #[test]
    fn test_formula() {
        let geom = Geometry::new(vec![
            AtomSite::new("C", [0.0, 0.0, 0.0]),
            AtomSite::new("C", [1.3, 0.0, 0.0]),
            AtomSite::new("H", [-0.9, 0.9, 0.0]),
            AtomSite::new("H", [-0.9, -0.9, 0.0]),
            AtomSite::new("H", [2.2, 0.9, 0.0]),
            AtomSite::new("H", [2.2, -0.9, 0.0]),
        ]);
        assert_eq!(geom.formula(), "C2H4");
    }

    #[test]
    fn test_formula_single_atom() {
        let geom = Geometry::new(vec![AtomSite::new("Au", [0.0, 0.0, 0.0])]);
        assert_eq!(geom.formula(), "Au");
    }

    #[test]
    fn test_centroid() {
        let geom = Geometry::new(vec![
            AtomSite::new("H", [0.0, 0.0, 0.0]),
            AtomSite::new("H", [2.0, 0.0, 0.0]),
        ]);
        let c = geom.centroid();
        assert!((c[0] - 1.0).abs() < 1e-12);
        assert!(c[1].abs() < 1e-12);
    }
}
