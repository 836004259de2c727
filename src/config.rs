//! # 配置模块
//!
//! JSON 配置文件的读取与默认值合并：用户文件里只写想改的键，
//! 其余键取内置默认。配置仅携带参数，不做业务逻辑。
//!
//! ## 依赖关系
//! - 被 `cli/`, `commands/` 使用
//! - 使用 `error.rs`, `spectra/`

use crate::error::{GautilityError, Result};
use crate::spectra::{GridSpec, Kernel, Normalization, SynthesisConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 谱合成参数（面向用户：宽度以 FWHM 给出）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectraSettings {
    /// 展宽核类型
    pub kernel: Kernel,
    /// 半高全宽 (eV)
    pub fwhm: f64,
    /// 网格下界 (eV)，与 grid_max 同时为 None 时自动扩边
    pub grid_min: Option<f64>,
    /// 网格上界 (eV)
    pub grid_max: Option<f64>,
    /// 网格点数
    pub points: usize,
    /// 归一化方式
    pub normalization: Normalization,
}

impl Default for SpectraSettings {
    fn default() -> Self {
        Self {
            kernel: Kernel::Gaussian,
            fwhm: 0.2,
            grid_min: Some(0.0),
            grid_max: Some(5.0),
            points: 5000,
            normalization: Normalization::None,
        }
    }
}

impl SpectraSettings {
    /// 转为内部合成参数（FWHM -> σ/γ）
    pub fn to_synthesis_config(&self) -> Result<SynthesisConfig> {
        let bounds = match (self.grid_min, self.grid_max) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            (None, None) => None,
            _ => {
                return Err(GautilityError::GridConfiguration(
                    "grid_min and grid_max must be given together".to_string(),
                ))
            }
        };
        let config = SynthesisConfig {
            kernel: self.kernel,
            width: self.kernel.width_from_fwhm(self.fwhm),
            grid: GridSpec {
                bounds,
                points: self.points,
            },
            normalization: self.normalization,
        };
        config.validate()?;
        Ok(config)
    }
}

/// 分析参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// 异构体去重阈值 (Å)，None 关闭去重
    pub dedup_tolerance: Option<f64>,
    /// 并行线程数，0 = 自动
    pub threads: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            dedup_tolerance: None,
            threads: 0,
        }
    }
}

/// 顶层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisSettings,
    pub spectra: SpectraSettings,
}

impl AppConfig {
    /// 从 JSON 文件读取；缺失的键取默认值
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| GautilityError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// 给定路径则读取，否则用默认配置
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.spectra.points, 5000);
        assert_eq!(config.spectra.fwhm, 0.2);
        assert_eq!(config.spectra.grid_min, Some(0.0));
        assert_eq!(config.spectra.grid_max, Some(5.0));
        assert_eq!(config.analysis.threads, 0);
    }

    #[test]
    fn test_partial_json_merges_with_defaults() {
        let json = r#"{ "spectra": { "fwhm": 0.35 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.spectra.fwhm, 0.35);
        // 未给出的键保持默认
        assert_eq!(config.spectra.points, 5000);
        assert!(config.analysis.dedup_tolerance.is_none());
    }

    #[test]
    fn test_to_synthesis_config_converts_fwhm() {
        let settings = SpectraSettings::default();
        let synth = settings.to_synthesis_config().unwrap();
        // FWHM 0.2 -> σ ≈ 0.0849
        assert!((synth.width - 0.2 / (2.0 * (2.0 * 2.0f64.ln()).sqrt())).abs() < 1e-12);
        assert_eq!(synth.grid.bounds, Some((0.0, 5.0)));
    }

    #[test]
    fn test_half_open_bounds_rejected() {
        let settings = SpectraSettings {
            grid_min: Some(0.0),
            grid_max: None,
            ..SpectraSettings::default()
        };
        assert!(settings.to_synthesis_config().is_err());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = serde_json::from_str::<AppConfig>("{ not json").unwrap_err();
        let wrapped: GautilityError = err.into();
        assert!(matches!(wrapped, GautilityError::ConfigError(_)));
    }
}
