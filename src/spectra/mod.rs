//! # 谱合成模块
//!
//! 把一组或多组离散能级（位置 + 可选强度）卷积为均匀网格上的
//! 连续谱曲线。多组能级共享同一网格，便于直接叠加对比。
//!
//! ## 流程
//! 1. 校验网格/宽度参数（参数非法立即报错，不做静默修正）
//! 2. 确定共享网格：显式固定边界，或由全体能级自动扩边一个宽度
//! 3. 逐网格点、逐能级按固定顺序累加核密度值
//! 4. 按配置做峰高或面积归一化
//!
//! ## 依赖关系
//! - 被 `batch/`, `commands/` 使用
//! - 使用 `models/`, `error.rs`

pub mod kernel;

pub use kernel::Kernel;

use crate::error::{GautilityError, Result};
use crate::models::{CalculationRecord, Level};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 带标签的能级组，一组对应一条输出曲线
#[derive(Debug, Clone)]
pub struct LevelSet {
    pub label: String,
    pub levels: Vec<Level>,
}

impl LevelSet {
    /// 构造能级组，能级按能量升序保存
    pub fn new(label: impl Into<String>, mut levels: Vec<Level>) -> Self {
        levels.sort_by(|a, b| {
            a.energy
                .partial_cmp(&b.energy)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self {
            label: label.into(),
            levels,
        }
    }

    /// 由记录携带的能级构造：优先 VDE 能级，其次占据轨道能级。
    /// 两者皆缺时无谱可合成，返回 None。
    /// 标签取来源路径的主干，用作曲线名与输出文件名。
    pub fn from_record(record: &CalculationRecord) -> Option<Self> {
        let levels = record
            .vde_levels
            .clone()
            .or_else(|| record.orbital_levels.clone())?;
        let label = Path::new(&record.source_id)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| record.source_id.clone());
        Some(Self::new(label, levels))
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// 占据能级 -> 结合能能级：BE = VDE + E(HOMO) - E(orbital)，
/// HOMO 本身落在 VDE 处，更深的轨道映射到更高结合能
pub fn binding_levels(occupied: &[Level], vde: f64) -> Vec<Level> {
    let homo = occupied
        .iter()
        .map(|l| l.energy)
        .fold(f64::NEG_INFINITY, f64::max);
    occupied
        .iter()
        .map(|l| Level::new(vde + homo - l.energy))
        .collect()
}

/// 输出曲线归一化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// 保留核密度绝对值
    #[default]
    None,
    /// 最大值缩放为 1
    Peak,
    /// 梯形积分缩放为 1
    Area,
}

/// 网格设定。`bounds = None` 时由能级范围自动扩边
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridSpec {
    /// 显式固定的 [lo, hi]，None 表示自动
    pub bounds: Option<(f64, f64)>,
    /// 网格点数（含两端）
    pub points: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            bounds: None,
            points: 5000,
        }
    }
}

/// 一次合成的全部参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub kernel: Kernel,
    /// 核宽度参数（Gaussian σ / Lorentzian γ）
    pub width: f64,
    pub grid: GridSpec,
    pub normalization: Normalization,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::Gaussian,
            width: Kernel::Gaussian.width_from_fwhm(0.2),
            grid: GridSpec::default(),
            normalization: Normalization::None,
        }
    }
}

impl SynthesisConfig {
    /// 参数校验：非法配置立即失败
    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(GautilityError::GridConfiguration(format!(
                "kernel width must be positive and finite, got {}",
                self.width
            )));
        }
        if self.grid.points < 2 {
            return Err(GautilityError::GridConfiguration(format!(
                "grid needs at least 2 points, got {}",
                self.grid.points
            )));
        }
        if let Some((lo, hi)) = self.grid.bounds {
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                return Err(GautilityError::GridConfiguration(format!(
                    "grid bounds must satisfy lo < hi, got [{lo}, {hi}]"
                )));
            }
        }
        Ok(())
    }
}

/// 合成得到的单条曲线
#[derive(Debug, Clone)]
pub struct SpectrumCurve {
    pub label: String,
    /// 严格递增的均匀网格
    pub x: Vec<f64>,
    /// 与 x 等长的谱值
    pub y: Vec<f64>,
    pub kernel: Kernel,
    pub width: f64,
    pub level_count: usize,
    pub normalization: Normalization,
}

impl SpectrumCurve {
    pub fn max_y(&self) -> f64 {
        self.y.iter().copied().fold(0.0, f64::max)
    }

    /// 梯形法数值积分
    pub fn integral(&self) -> f64 {
        let mut total = 0.0;
        for i in 1..self.x.len() {
            total += 0.5 * (self.y[i] + self.y[i - 1]) * (self.x[i] - self.x[i - 1]);
        }
        total
    }

    /// (x, y) 点对迭代
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// 多组能级在共享网格上各自合成一条曲线。
/// 组顺序决定输出顺序；未给定强度的能级权重为 1。
pub fn synthesize(level_sets: &[LevelSet], config: &SynthesisConfig) -> Result<Vec<SpectrumCurve>> {
    config.validate()?;
    let grid = shared_grid(level_sets, config)?;

    let curves = level_sets
        .iter()
        .map(|set| {
            let mut y = evaluate_on_grid(&set.levels, &grid, config);
            normalize(&mut y, &grid, config.normalization);
            SpectrumCurve {
                label: set.label.clone(),
                x: grid.clone(),
                y,
                kernel: config.kernel,
                width: config.width,
                level_count: set.levels.len(),
                normalization: config.normalization,
            }
        })
        .collect();
    Ok(curves)
}

/// 全部能级组并入一条叠加总曲线（组序、组内能级序固定）
pub fn synthesize_combined(
    level_sets: &[LevelSet],
    config: &SynthesisConfig,
    label: impl Into<String>,
) -> Result<SpectrumCurve> {
    config.validate()?;
    let grid = shared_grid(level_sets, config)?;

    let all: Vec<Level> = level_sets
        .iter()
        .flat_map(|set| set.levels.iter().cloned())
        .collect();
    let mut y = evaluate_on_grid(&all, &grid, config);
    normalize(&mut y, &grid, config.normalization);
    Ok(SpectrumCurve {
        label: label.into(),
        x: grid,
        y,
        kernel: config.kernel,
        width: config.width,
        level_count: all.len(),
        normalization: config.normalization,
    })
}

/// 计算所有组共用的均匀网格。
/// 边界未固定时取能级范围并向外各扩一个核宽度，
/// 保证边缘能级的峰形不被截断。
fn shared_grid(level_sets: &[LevelSet], config: &SynthesisConfig) -> Result<Vec<f64>> {
    let (lo, hi) = match config.grid.bounds {
        Some(bounds) => bounds,
        None => {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for set in level_sets {
                for level in &set.levels {
                    min = min.min(level.energy);
                    max = max.max(level.energy);
                }
            }
            if !min.is_finite() {
                return Err(GautilityError::GridConfiguration(
                    "no levels to synthesize and no explicit grid bounds".to_string(),
                ));
            }
            (min - config.width, max + config.width)
        }
    };

    let n = config.grid.points;
    let step = (hi - lo) / (n - 1) as f64;
    Ok((0..n).map(|i| lo + step * i as f64).collect())
}

/// 逐网格点、按能级列表顺序累加（求和顺序固定以保证可复现）
fn evaluate_on_grid(levels: &[Level], grid: &[f64], config: &SynthesisConfig) -> Vec<f64> {
    grid.iter()
        .map(|&x| {
            levels
                .iter()
                .map(|l| l.weight() * config.kernel.evaluate(x - l.energy, config.width))
                .sum()
        })
        .collect()
}

fn normalize(y: &mut [f64], x: &[f64], mode: Normalization) {
    let scale = match mode {
        Normalization::None => return,
        Normalization::Peak => y.iter().copied().fold(0.0, f64::max),
        Normalization::Area => {
            let mut total = 0.0;
            for i in 1..x.len() {
                total += 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
            }
            total
        }
    };
    if scale > 0.0 {
        for v in y.iter_mut() {
            *v /= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn config_201(normalization: Normalization) -> SynthesisConfig {
        SynthesisConfig {
            kernel: Kernel::Gaussian,
            width: 0.1,
            grid: GridSpec {
                bounds: Some((-6.0, -4.0)),
                points: 201,
            },
            normalization,
        }
    }

    #[test]
    fn test_single_level_peak_height() {
        // σ = 0.1 的单能级，峰位网格点上高度为 1/(σ√(2π))
        let sets = vec![LevelSet::new("a", vec![Level::with_intensity(-5.0, 1.0)])];
        let curves = synthesize(&sets, &config_201(Normalization::None)).unwrap();
        let curve = &curves[0];

        let idx = curve
            .x
            .iter()
            .position(|&x| (x - (-5.0)).abs() < 1e-9)
            .unwrap();
        let expected = 1.0 / (0.1 * (2.0 * PI).sqrt());
        assert!((curve.y[idx] - expected).abs() < 1e-6);

        // 峰位即全局最大
        let argmax = curve
            .y
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(argmax, idx);
    }

    #[test]
    fn test_two_resolvable_peaks() {
        // 间距 0.5 eV、σ = 0.1：两峰可分辨，峰高比约等于强度比 2:1
        let sets = vec![LevelSet::new(
            "b",
            vec![
                Level::with_intensity(-5.0, 2.0),
                Level::with_intensity(-4.5, 1.0),
            ],
        )];
        let curves = synthesize(&sets, &config_201(Normalization::None)).unwrap();
        let curve = &curves[0];

        let y_at = |target: f64| {
            let idx = curve
                .x
                .iter()
                .position(|&x| (x - target).abs() < 1e-9)
                .unwrap();
            curve.y[idx]
        };
        let base = 1.0 / (0.1 * (2.0 * PI).sqrt());
        assert!((y_at(-5.0) - 2.0 * base).abs() < 1e-4);
        assert!((y_at(-4.5) - base).abs() < 1e-4);
        // 两峰之间存在低谷
        assert!(y_at(-4.75) < y_at(-5.0) * 0.1);
    }

    #[test]
    fn test_curve_non_negative_and_grid_increasing() {
        let sets = vec![LevelSet::new(
            "s",
            vec![Level::new(-5.2), Level::new(-4.8), Level::new(-4.3)],
        )];
        let curves = synthesize(&sets, &config_201(Normalization::None)).unwrap();
        for curve in &curves {
            assert!(curve.y.iter().all(|&v| v >= 0.0));
            for pair in curve.x.windows(2) {
                assert!(pair[1] > pair[0]);
            }
        }
    }

    #[test]
    fn test_area_normalization_integrates_to_one() {
        let sets = vec![LevelSet::new(
            "s",
            vec![
                Level::with_intensity(-5.0, 3.0),
                Level::with_intensity(-4.6, 1.5),
            ],
        )];
        let curves = synthesize(&sets, &config_201(Normalization::Area)).unwrap();
        assert!((curves[0].integral() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_peak_normalization_max_is_one() {
        let sets = vec![LevelSet::new(
            "s",
            vec![Level::with_intensity(-5.0, 42.0)],
        )];
        let curves = synthesize(&sets, &config_201(Normalization::Peak)).unwrap();
        assert!((curves[0].max_y() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_auto_bounds_expand_by_one_width() {
        let config = SynthesisConfig {
            kernel: Kernel::Gaussian,
            width: 0.5,
            grid: GridSpec {
                bounds: None,
                points: 101,
            },
            normalization: Normalization::None,
        };
        let sets = vec![LevelSet::new("s", vec![Level::new(-5.0), Level::new(-3.0)])];
        let curves = synthesize(&sets, &config).unwrap();
        let curve = &curves[0];
        assert!((curve.x[0] - (-5.5)).abs() < 1e-12);
        assert!((curve.x[curve.x.len() - 1] - (-2.5)).abs() < 1e-12);
    }

    #[test]
    fn test_pinned_bounds_are_not_expanded() {
        // 固定边界时即使能级贴边也不扩
        let mut config = config_201(Normalization::None);
        config.grid.bounds = Some((-5.0, -4.0));
        let sets = vec![LevelSet::new("s", vec![Level::new(-5.0)])];
        let curves = synthesize(&sets, &config).unwrap();
        assert!((curves[0].x[0] - (-5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_shared_grid_across_sets() {
        let sets = vec![
            LevelSet::new("a", vec![Level::new(-5.0)]),
            LevelSet::new("b", vec![Level::new(-4.5)]),
        ];
        let curves = synthesize(&sets, &config_201(Normalization::None)).unwrap();
        assert_eq!(curves[0].x, curves[1].x);
    }

    #[test]
    fn test_combined_curve_is_sum_of_individuals() {
        let config = config_201(Normalization::None);
        let sets = vec![
            LevelSet::new("a", vec![Level::with_intensity(-5.0, 1.0)]),
            LevelSet::new("b", vec![Level::with_intensity(-4.5, 2.0)]),
        ];
        let individual = synthesize(&sets, &config).unwrap();
        let combined = synthesize_combined(&sets, &config, "overlay").unwrap();
        for i in 0..combined.x.len() {
            let sum = individual[0].y[i] + individual[1].y[i];
            assert!((combined.y[i] - sum).abs() < 1e-12);
        }
    }

    #[test]
    fn test_missing_intensity_defaults_to_unit_weight() {
        let config = config_201(Normalization::None);
        let implicit = synthesize(
            &[LevelSet::new("s", vec![Level::new(-5.0)])],
            &config,
        )
        .unwrap();
        let explicit = synthesize(
            &[LevelSet::new("s", vec![Level::with_intensity(-5.0, 1.0)])],
            &config,
        )
        .unwrap();
        assert_eq!(implicit[0].y, explicit[0].y);
    }

    #[test]
    fn test_invalid_width_rejected() {
        let mut config = config_201(Normalization::None);
        config.width = 0.0;
        let sets = vec![LevelSet::new("s", vec![Level::new(-5.0)])];
        assert!(matches!(
            synthesize(&sets, &config),
            Err(GautilityError::GridConfiguration(_))
        ));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut config = config_201(Normalization::None);
        config.grid.bounds = Some((1.0, 1.0));
        let sets = vec![LevelSet::new("s", vec![Level::new(-5.0)])];
        assert!(matches!(
            synthesize(&sets, &config),
            Err(GautilityError::GridConfiguration(_))
        ));
    }

    #[test]
    fn test_too_few_points_rejected() {
        let mut config = config_201(Normalization::None);
        config.grid.points = 1;
        let sets = vec![LevelSet::new("s", vec![Level::new(-5.0)])];
        assert!(matches!(
            synthesize(&sets, &config),
            Err(GautilityError::GridConfiguration(_))
        ));
    }

    #[test]
    fn test_empty_levels_without_bounds_rejected() {
        let config = SynthesisConfig {
            grid: GridSpec {
                bounds: None,
                points: 100,
            },
            ..SynthesisConfig::default()
        };
        assert!(matches!(
            synthesize(&[LevelSet::new("s", vec![])], &config),
            Err(GautilityError::GridConfiguration(_))
        ));
    }

    #[test]
    fn test_empty_levels_with_pinned_bounds_yield_zero_curve() {
        let curves = synthesize(
            &[LevelSet::new("s", vec![])],
            &config_201(Normalization::None),
        )
        .unwrap();
        assert!(curves[0].y.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_level_set_from_record_prefers_vde() {
        use crate::models::{CalculationRecord, JobType};
        let mut rec = CalculationRecord::new("runs/anion.fchk", JobType::SinglePoint);
        assert!(LevelSet::from_record(&rec).is_none());

        rec.orbital_levels = Some(vec![Level::new(-8.0), Level::new(-5.0)]);
        let dos = LevelSet::from_record(&rec).unwrap();
        assert_eq!(dos.levels.len(), 2);
        assert_eq!(dos.label, "anion");

        rec.vde_levels = Some(vec![Level::new(2.5)]);
        let pes = LevelSet::from_record(&rec).unwrap();
        assert_eq!(pes.levels.len(), 1);
        assert!((pes.levels[0].energy - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_binding_energy_transform() {
        let occupied = vec![
            Level::new(-8.0),
            Level::new(-7.5),
            Level::new(-6.0),
            Level::new(-5.5),
            Level::new(-3.0),
        ];
        let set = LevelSet::new("anion", binding_levels(&occupied, 2.5));
        // HOMO 映射到 VDE 本身，更深的轨道映射到更高结合能
        assert_eq!(set.levels.len(), 5);
        assert!((set.levels[0].energy - 2.5).abs() < 1e-12);
        assert!((set.levels[set.levels.len() - 1].energy - (2.5 + (-3.0) - (-8.0))).abs() < 1e-12);
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let sets = vec![LevelSet::new(
            "s",
            vec![Level::new(-5.0), Level::new(-4.7), Level::new(-4.2)],
        )];
        let config = config_201(Normalization::Area);
        let a = synthesize(&sets, &config).unwrap();
        let b = synthesize(&sets, &config).unwrap();
        assert_eq!(a[0].y, b[0].y);
    }
}
