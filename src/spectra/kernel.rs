//! # 展宽核函数
//!
//! Gaussian / Lorentzian 闭式归一化密度核，用于把离散能级卷积为
//! 连续谱。宽度参数为核的自然宽度（Gaussian 的 σ、Lorentzian 的 γ）；
//! 实验惯用的 FWHM 由换算函数转换。
//!
//! ## 依赖关系
//! - 被 `spectra/mod.rs` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 展宽核类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Kernel {
    /// Gaussian 密度: exp(-(Δ/σ)²/2) / (σ√(2π))
    #[default]
    Gaussian,
    /// Lorentzian 密度: 1 / (πγ (1 + (Δ/γ)²))
    Lorentzian,
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kernel::Gaussian => write!(f, "gaussian"),
            Kernel::Lorentzian => write!(f, "lorentzian"),
        }
    }
}

impl Kernel {
    /// 在偏移 delta 处求核密度值，width 为 σ/γ
    pub fn evaluate(&self, delta: f64, width: f64) -> f64 {
        match self {
            Kernel::Gaussian => {
                let u = delta / width;
                (-0.5 * u * u).exp() / (width * (2.0 * PI).sqrt())
            }
            Kernel::Lorentzian => {
                let u = delta / width;
                1.0 / (PI * width * (1.0 + u * u))
            }
        }
    }

    /// FWHM -> 自然宽度参数
    pub fn width_from_fwhm(&self, fwhm: f64) -> f64 {
        match self {
            Kernel::Gaussian => fwhm / (2.0 * (2.0 * 2.0f64.ln()).sqrt()),
            Kernel::Lorentzian => fwhm / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_peak_height() {
        let sigma = 0.1;
        let peak = Kernel::Gaussian.evaluate(0.0, sigma);
        let expected = 1.0 / (sigma * (2.0 * PI).sqrt());
        assert!((peak - expected).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_symmetry() {
        let k = Kernel::Gaussian;
        assert!((k.evaluate(0.3, 0.2) - k.evaluate(-0.3, 0.2)).abs() < 1e-15);
    }

    #[test]
    fn test_lorentzian_peak_and_half_height() {
        let gamma = 0.2;
        let k = Kernel::Lorentzian;
        let peak = k.evaluate(0.0, gamma);
        assert!((peak - 1.0 / (PI * gamma)).abs() < 1e-12);
        // Δ = γ 处为半高
        assert!((k.evaluate(gamma, gamma) - peak / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fwhm_conversion() {
        // Gaussian: 在 ±FWHM/2 处应为半高
        let fwhm = 0.2;
        let sigma = Kernel::Gaussian.width_from_fwhm(fwhm);
        let k = Kernel::Gaussian;
        let ratio = k.evaluate(fwhm / 2.0, sigma) / k.evaluate(0.0, sigma);
        assert!((ratio - 0.5).abs() < 1e-12);

        assert_eq!(Kernel::Lorentzian.width_from_fwhm(fwhm), 0.1);
    }

    #[test]
    fn test_kernels_non_negative() {
        for kernel in [Kernel::Gaussian, Kernel::Lorentzian] {
            for i in -50..50 {
                assert!(kernel.evaluate(i as f64 * 0.1, 0.15) >= 0.0);
            }
        }
    }
}
