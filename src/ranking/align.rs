//! # 刚体对齐与结构相似度
//!
//! 判定两个独立优化得到的结构是否为同一异构体：数值噪声与
//! 平移/旋转差异使坐标逐项比较不可行，需先做最优刚体对齐。
//!
//! ## 算法概述
//! 1. 两结构分别平移至质心
//! 2. Kabsch/Horn 四元数法求最优旋转（4x4 对称矩阵最大特征向量，
//!    Jacobi 迭代求解）
//! 3. 对齐后逐原子取同元素最近邻距离，取双向最大值作为相似度度量
//!
//! ## 依赖关系
//! - 被 `ranking/mod.rs` 使用
//! - 使用 `models/geometry.rs`

use crate::models::Geometry;

/// 对齐后的最大最近邻距离 (Å)。
/// 元素组成不一致或结构为空时返回 None（不可比较）。
pub fn aligned_max_distance(a: &Geometry, b: &Geometry) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a.element_counts() != b.element_counts() {
        return None;
    }

    let pa = centered(a);
    let pb = centered(b);

    let rot = optimal_rotation(&pa, &pb);
    let pa_rot: Vec<[f64; 3]> = pa.iter().map(|p| apply(&rot, p)).collect();

    let fwd = max_nearest_distance(a, &pa_rot, b, &pb);
    let rev = max_nearest_distance(b, &pb, a, &pa_rot);
    Some(fwd.max(rev))
}

/// 质心平移后的坐标
fn centered(geom: &Geometry) -> Vec<[f64; 3]> {
    let c = geom.centroid();
    geom.atoms
        .iter()
        .map(|a| {
            [
                a.position[0] - c[0],
                a.position[1] - c[1],
                a.position[2] - c[2],
            ]
        })
        .collect()
}

/// 每个 src 原子到 dst 中同元素原子的最近距离，取最大值
fn max_nearest_distance(
    src_geom: &Geometry,
    src: &[[f64; 3]],
    dst_geom: &Geometry,
    dst: &[[f64; 3]],
) -> f64 {
    let mut worst: f64 = 0.0;
    for (i, p) in src.iter().enumerate() {
        let elem = &src_geom.atoms[i].element;
        let mut best = f64::INFINITY;
        for (j, q) in dst.iter().enumerate() {
            if &dst_geom.atoms[j].element != elem {
                continue;
            }
            let d = dist(p, q);
            if d < best {
                best = d;
            }
        }
        if best > worst {
            worst = best;
        }
    }
    worst
}

fn dist(p: &[f64; 3], q: &[f64; 3]) -> f64 {
    let dx = p[0] - q[0];
    let dy = p[1] - q[1];
    let dz = p[2] - q[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Horn 四元数法：将 p 旋转到 q 的最优旋转矩阵（按索引对应）
fn optimal_rotation(p: &[[f64; 3]], q: &[[f64; 3]]) -> [[f64; 3]; 3] {
    // 协方差矩阵 S = Σ p_i q_i^T
    let mut s = [[0.0f64; 3]; 3];
    for (pi, qi) in p.iter().zip(q.iter()) {
        for r in 0..3 {
            for c in 0..3 {
                s[r][c] += pi[r] * qi[c];
            }
        }
    }

    // 4x4 对称关键矩阵
    let k = [
        [
            s[0][0] + s[1][1] + s[2][2],
            s[1][2] - s[2][1],
            s[2][0] - s[0][2],
            s[0][1] - s[1][0],
        ],
        [
            s[1][2] - s[2][1],
            s[0][0] - s[1][1] - s[2][2],
            s[0][1] + s[1][0],
            s[2][0] + s[0][2],
        ],
        [
            s[2][0] - s[0][2],
            s[0][1] + s[1][0],
            -s[0][0] + s[1][1] - s[2][2],
            s[1][2] + s[2][1],
        ],
        [
            s[0][1] - s[1][0],
            s[2][0] + s[0][2],
            s[1][2] + s[2][1],
            -s[0][0] - s[1][1] + s[2][2],
        ],
    ];

    let quat = dominant_eigenvector(k);
    quaternion_to_matrix(&quat)
}

/// Jacobi 迭代求对称 4x4 矩阵最大特征值对应的特征向量
fn dominant_eigenvector(mut a: [[f64; 4]; 4]) -> [f64; 4] {
    let mut v = [[0.0f64; 4]; 4];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _ in 0..64 {
        // 最大非对角元
        let (mut p, mut q, mut maxval) = (0, 1, 0.0f64);
        for i in 0..4 {
            for j in (i + 1)..4 {
                if a[i][j].abs() > maxval {
                    maxval = a[i][j].abs();
                    p = i;
                    q = j;
                }
            }
        }
        if maxval < 1e-14 {
            break;
        }

        let theta = 0.5 * (a[q][q] - a[p][p]) / a[p][q];
        let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
        let c = 1.0 / (t * t + 1.0).sqrt();
        let s = t * c;

        for i in 0..4 {
            let aip = a[i][p];
            let aiq = a[i][q];
            a[i][p] = c * aip - s * aiq;
            a[i][q] = s * aip + c * aiq;
        }
        for j in 0..4 {
            let apj = a[p][j];
            let aqj = a[q][j];
            a[p][j] = c * apj - s * aqj;
            a[q][j] = s * apj + c * aqj;
        }
        for i in 0..4 {
            let vip = v[i][p];
            let viq = v[i][q];
            v[i][p] = c * vip - s * viq;
            v[i][q] = s * vip + c * viq;
        }
    }

    // 最大特征值所在列
    let mut best = 0;
    for i in 1..4 {
        if a[i][i] > a[best][best] {
            best = i;
        }
    }
    [v[0][best], v[1][best], v[2][best], v[3][best]]
}

/// 单位四元数 (w, x, y, z) -> 旋转矩阵
fn quaternion_to_matrix(q: &[f64; 4]) -> [[f64; 3]; 3] {
    let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    let (w, x, y, z) = (q[0] / norm, q[1] / norm, q[2] / norm, q[3] / norm);
    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
        ],
        [
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
        ],
        [
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

fn apply(m: &[[f64; 3]; 3], p: &[f64; 3]) -> [f64; 3] {
    [
        m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2],
        m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2],
        m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2],
    ]
}
