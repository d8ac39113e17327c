// Copyright 2024 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! Table evaluation on the force-loop hot path
//!
//! Given a prepared table, a column, and a squared pair distance, the
//! functions here return the interpolated potential and its derivative in
//! O(1), without allocating and without failing. They are called once per
//! interacting pair per time step and are safe for unsynchronized
//! concurrent use since the table is immutable after setup.
//!
//! Conventions, relied on by every caller:
//!
//! - The distance argument is the *squared* distance; queries beyond the
//!   column cutoff are clamped to it and read the sentinel rows.
//! - Queries below the tabulated domain are clamped to the domain start
//!   and flagged via [`PairEval::short`]; the flag is a signal, not an
//!   error, left to the caller to interpret.
//! - The returned gradient is **twice** the derivative with respect to
//!   the squared distance, which equals `(1/r)·dV/dr`; the force vector
//!   is then `-gradient * offset` (see [`force_vector`]).

use crate::interpolate::Interpolation;
use crate::table::PotentialTable;
use crate::Vector3;

/// Result of a pair-potential lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairEval {
    /// Interpolated potential value
    pub value: f64,
    /// Twice the derivative with respect to the squared distance,
    /// i.e. `(1/r)·dV/dr`
    pub gradient: f64,
    /// Set when the queried distance fell below the tabulated domain
    pub short: bool,
}

/// Force vector on a particle from the evaluated gradient and the pair
/// offset vector.
#[inline]
pub fn force_vector(gradient: f64, offset: &Vector3) -> Vector3 {
    offset * (-gradient)
}

/// Clamp the squared distance into the tabulated domain and split it into
/// a sample index and a fractional offset `chi` in `[0, 1)`.
#[inline]
fn locate(pt: &PotentialTable, col: usize, r2: f64, kmin: usize) -> (usize, f64, bool) {
    let mut r2a = r2.min(pt.end[col]) - pt.begin[col];
    let mut short = false;
    if r2a < 0.0 {
        r2a = 0.0;
        short = true;
    }
    let istep = pt.invstep[col];
    let k = ((r2a * istep) as usize).max(kmin);
    let chi = (r2a - k as f64 * pt.step[col]) * istep;
    (k, chi, short)
}

impl Interpolation {
    /// Evaluate potential and gradient for one pair.
    #[inline]
    pub fn evaluate_pair(&self, pt: &PotentialTable, col: usize, r2: f64) -> PairEval {
        match self {
            Interpolation::ThreePoint => {
                let (k, chi, short) = locate(pt, col, r2, 0);
                let (p0, p1, p2) = (pt.at(k, col), pt.at(k + 1, col), pt.at(k + 2, col));
                let dv = p1 - p0;
                let d2v = p2 - 2.0 * p1 + p0;
                PairEval {
                    value: p0 + chi * dv + 0.5 * chi * (chi - 1.0) * d2v,
                    gradient: 2.0 * pt.invstep[col] * (dv + (chi - 0.5) * d2v),
                    short,
                }
            }
            Interpolation::FourPoint => {
                let (k, chi, short) = locate(pt, col, r2, 1);
                let p = [
                    pt.at(k - 1, col),
                    pt.at(k, col),
                    pt.at(k + 1, col),
                    pt.at(k + 2, col),
                ];
                let fac = lagrange3(chi);
                let dfac = lagrange3_deriv(chi);
                PairEval {
                    value: fac[0] * p[0] + fac[1] * p[1] + fac[2] * p[2] + fac[3] * p[3],
                    gradient: 2.0
                        * pt.invstep[col]
                        * (dfac[0] * p[0] + dfac[1] * p[1] + dfac[2] * p[2] + dfac[3] * p[3]),
                    short,
                }
            }
            Interpolation::Spline => {
                let (k, chi, short) = locate(pt, col, r2, 0);
                let (a, b) = (1.0 - chi, chi);
                let step = pt.step[col];
                let (y0, y1) = (pt.at(k, col), pt.at(k + 1, col));
                let (z0, z1) = (pt.at2(k, col), pt.at2(k + 1, col));
                let curv = step * step / 6.0;
                PairEval {
                    value: a * y0 + b * y1 + ((a * a * a - a) * z0 + (b * b * b - b) * z1) * curv,
                    gradient: 2.0
                        * pt.invstep[col]
                        * (y1 - y0 + curv * ((3.0 * b * b - 1.0) * z1 - (3.0 * a * a - 1.0) * z0)),
                    short,
                }
            }
        }
    }

    /// Evaluate the function value only, for non-force contexts.
    #[inline]
    pub fn evaluate_value(&self, pt: &PotentialTable, col: usize, r2: f64) -> (f64, bool) {
        match self {
            Interpolation::ThreePoint => {
                let (k, chi, short) = locate(pt, col, r2, 0);
                let (p0, p1, p2) = (pt.at(k, col), pt.at(k + 1, col), pt.at(k + 2, col));
                let dv = p1 - p0;
                let d2v = p2 - 2.0 * p1 + p0;
                (p0 + chi * dv + 0.5 * chi * (chi - 1.0) * d2v, short)
            }
            Interpolation::FourPoint => {
                let (k, chi, short) = locate(pt, col, r2, 1);
                let fac = lagrange3(chi);
                let value = fac[0] * pt.at(k - 1, col)
                    + fac[1] * pt.at(k, col)
                    + fac[2] * pt.at(k + 1, col)
                    + fac[3] * pt.at(k + 2, col);
                (value, short)
            }
            Interpolation::Spline => {
                let (k, chi, short) = locate(pt, col, r2, 0);
                let (a, b) = (1.0 - chi, chi);
                let curv = pt.step[col] * pt.step[col] / 6.0;
                let value = a * pt.at(k, col)
                    + b * pt.at(k + 1, col)
                    + ((a * a * a - a) * pt.at2(k, col) + (b * b * b - b) * pt.at2(k + 1, col))
                        * curv;
                (value, short)
            }
        }
    }

    /// Evaluate the derivative only; as everywhere, *twice* the derivative
    /// with respect to the squared distance.
    #[inline]
    pub fn evaluate_derivative(&self, pt: &PotentialTable, col: usize, r2: f64) -> (f64, bool) {
        match self {
            Interpolation::ThreePoint => {
                let (k, chi, short) = locate(pt, col, r2, 0);
                let (p0, p1, p2) = (pt.at(k, col), pt.at(k + 1, col), pt.at(k + 2, col));
                let dv = p1 - p0;
                let d2v = p2 - 2.0 * p1 + p0;
                (2.0 * pt.invstep[col] * (dv + (chi - 0.5) * d2v), short)
            }
            Interpolation::FourPoint => {
                let (k, chi, short) = locate(pt, col, r2, 1);
                let dfac = lagrange3_deriv(chi);
                let grad = dfac[0] * pt.at(k - 1, col)
                    + dfac[1] * pt.at(k, col)
                    + dfac[2] * pt.at(k + 1, col)
                    + dfac[3] * pt.at(k + 2, col);
                (2.0 * pt.invstep[col] * grad, short)
            }
            Interpolation::Spline => {
                let (k, chi, short) = locate(pt, col, r2, 0);
                let (a, b) = (1.0 - chi, chi);
                let step = pt.step[col];
                let curv = step * step / 6.0;
                let grad = pt.at(k + 1, col) - pt.at(k, col)
                    + curv
                        * ((3.0 * b * b - 1.0) * pt.at2(k + 1, col)
                            - (3.0 * a * a - 1.0) * pt.at2(k, col));
                (2.0 * pt.invstep[col] * grad, short)
            }
        }
    }
}

/// Third-degree Lagrange basis weights for samples at -1, 0, 1, 2.
#[inline]
fn lagrange3(chi: f64) -> [f64; 4] {
    [
        -(1.0 / 6.0) * chi * (chi - 1.0) * (chi - 2.0),
        0.5 * (chi * chi - 1.0) * (chi - 2.0),
        -0.5 * chi * (chi + 1.0) * (chi - 2.0),
        (1.0 / 6.0) * chi * (chi * chi - 1.0),
    ]
}

/// Derivatives of the third-degree Lagrange basis weights.
#[inline]
fn lagrange3_deriv(chi: f64) -> [f64; 4] {
    [
        -(1.0 / 6.0) * ((3.0 * chi - 6.0) * chi + 2.0),
        0.5 * ((3.0 * chi - 4.0) * chi - 1.0),
        -0.5 * ((3.0 * chi - 2.0) * chi - 2.0),
        (1.0 / 6.0) * (3.0 * chi * chi - 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table_from(samples: &[f64], begin: f64, step: f64) -> PotentialTable {
        let n = samples.len();
        let mut pt = PotentialTable::with_capacity(1, n);
        for (k, &v) in samples.iter().enumerate() {
            *pt.at_mut(k, 0) = v;
        }
        pt.set_column_info(0, begin, begin + (n - 1) as f64 * step, step, n);
        pt
    }

    #[test]
    fn quadratic_interpolation_of_a_quadratic() {
        // c·x² per column, sampled on 0..=4; quadratic interpolation is
        // exact, and the per-column results verify the row-major layout
        let mut pt = PotentialTable::with_capacity(3, 5);
        for col in 0..3 {
            for k in 0..5 {
                *pt.at_mut(k, col) = (col + 1) as f64 * (k * k) as f64;
            }
            pt.set_column_info(col, 0.0, 4.0, 1.0, 5);
        }
        let scheme = Interpolation::ThreePoint;
        scheme.prepare(&mut pt, true).unwrap();

        let eval = scheme.evaluate_pair(&pt, 0, 2.5);
        assert_relative_eq!(eval.value, 6.25);
        // df/dx = 2x = 5, and the gradient convention doubles it
        assert_relative_eq!(eval.gradient, 10.0);
        assert!(!eval.short);
        for col in 1..3 {
            let scale = (col + 1) as f64;
            let eval = scheme.evaluate_pair(&pt, col, 2.5);
            assert_relative_eq!(eval.value, scale * 6.25);
            assert_relative_eq!(eval.gradient, scale * 10.0);
        }

        // value/derivative-only entry points agree
        assert_relative_eq!(scheme.evaluate_value(&pt, 0, 2.5).0, 6.25);
        assert_relative_eq!(scheme.evaluate_derivative(&pt, 0, 2.5).0, 10.0);
    }

    #[test]
    fn offset_domain() {
        // f(x) = (x - 1)² sampled from begin = 1 with step 0.5
        let samples: Vec<f64> = (0..5).map(|k| (0.5 * k as f64).powi(2)).collect();
        let mut pt = table_from(&samples, 1.0, 0.5);
        let scheme = Interpolation::ThreePoint;
        scheme.prepare(&mut pt, true).unwrap();
        let eval = scheme.evaluate_pair(&pt, 0, 1.75);
        assert_relative_eq!(eval.value, 0.5625);
        assert_relative_eq!(eval.gradient, 3.0); // 2 · 2(x-1) at x = 1.75
    }

    #[test]
    fn cubic_interpolation_of_a_cubic() {
        let mut pt = table_from(&[0.0, 1.0, 8.0, 27.0, 64.0], 0.0, 1.0);
        let scheme = Interpolation::FourPoint;
        scheme.prepare(&mut pt, true).unwrap();
        let eval = scheme.evaluate_pair(&pt, 0, 2.5);
        assert_relative_eq!(eval.value, 15.625, epsilon = 1e-12);
        // df/dx = 3x² = 18.75, doubled
        assert_relative_eq!(eval.gradient, 37.5, epsilon = 1e-12);
        assert_relative_eq!(scheme.evaluate_value(&pt, 0, 2.5).0, 15.625, epsilon = 1e-12);
        assert_relative_eq!(
            scheme.evaluate_derivative(&pt, 0, 2.5).0,
            37.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn spline_is_exact_at_knots_and_linear_between() {
        let mut pt = table_from(&[0.0, 1.0, 2.0, 3.0, 4.0], 0.0, 1.0);
        let scheme = Interpolation::Spline;
        scheme.prepare(&mut pt, false).unwrap();
        for k in 0..5 {
            let eval = scheme.evaluate_pair(&pt, 0, k as f64);
            assert_relative_eq!(eval.value, k as f64, epsilon = 1e-12);
        }
        let eval = scheme.evaluate_pair(&pt, 0, 2.5);
        assert_relative_eq!(eval.value, 2.5, epsilon = 1e-12);
        assert_relative_eq!(eval.gradient, 2.0, epsilon = 1e-12);
        assert_relative_eq!(
            scheme.evaluate_derivative(&pt, 0, 2.5).0,
            2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn short_distance_flag() {
        let samples: Vec<f64> = (0..5).map(|k| (1.0 + k as f64).powi(2)).collect();
        let mut pt = table_from(&samples, 1.0, 1.0);
        let scheme = Interpolation::ThreePoint;
        scheme.prepare(&mut pt, true).unwrap();
        let eval = scheme.evaluate_pair(&pt, 0, 0.25);
        assert!(eval.short);
        // clamped to the domain start: the first sample
        assert_relative_eq!(eval.value, 1.0);
        assert!(!scheme.evaluate_pair(&pt, 0, 1.0).short);
        assert!(scheme.evaluate_value(&pt, 0, 0.25).1);
        assert!(scheme.evaluate_derivative(&pt, 0, 0.25).1);
    }

    #[test]
    fn beyond_cutoff_is_clamped_and_continuous() {
        let base = table_from(&[0.0, 1.0, 4.0, 9.0, 16.0], 0.0, 1.0);
        for scheme in [
            Interpolation::ThreePoint,
            Interpolation::FourPoint,
            Interpolation::Spline,
        ] {
            let mut pt = base.clone();
            scheme.prepare(&mut pt, false).unwrap();
            let at_end = scheme.evaluate_pair(&pt, 0, 4.0);
            let beyond = scheme.evaluate_pair(&pt, 0, 4.7);
            assert_relative_eq!(at_end.value, 16.0, epsilon = 1e-12);
            assert_relative_eq!(beyond.value, at_end.value);
            assert!(!beyond.short);
            // approaching the cutoff from below stays continuous through
            // the sentinel rows
            let near = scheme.evaluate_pair(&pt, 0, 4.0 - 1e-7);
            assert_relative_eq!(near.value, at_end.value, epsilon = 1e-5);
        }
    }

    #[test]
    fn force_vector_follows_the_gradient() {
        let offset = Vector3::new(1.0, 2.0, -2.0);
        let f = force_vector(0.5, &offset);
        assert_relative_eq!(f.x, -0.5);
        assert_relative_eq!(f.y, -1.0);
        assert_relative_eq!(f.z, 1.0);
    }
}
