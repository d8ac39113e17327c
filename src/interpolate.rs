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

//! Interpolation strategies for tabulated potentials
//!
//! Before a table can be evaluated it is prepared once for a chosen
//! [`Interpolation`] strategy. Preparation fills the two sentinel rows
//! past each column's last real sample by continuing the interpolation
//! polynomial, so that evaluation at the domain boundary needs no
//! special-case branch. Spline preparation additionally solves the
//! tridiagonal recurrence for the per-sample second derivatives.
//!
//! The strategy is a run-wide policy chosen once at setup; all tables of
//! a run are prepared and evaluated with the same strategy.

use crate::load::TableError;
use crate::table::PotentialTable;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Interpolation strategy, fixed for the whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Interpolation {
    /// Quadratic interpolation through three consecutive samples
    #[default]
    ThreePoint,
    /// Cubic Lagrange interpolation through four samples
    FourPoint,
    /// Natural cubic spline; clamped to zero slope at the cutoff for
    /// radial potentials
    Spline,
}

impl Interpolation {
    /// Smallest column length the strategy can work with.
    fn required_samples(&self) -> usize {
        match self {
            Interpolation::ThreePoint => 3,
            Interpolation::FourPoint => 4,
            Interpolation::Spline => 2,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Interpolation::ThreePoint => "three-point",
            Interpolation::FourPoint => "four-point",
            Interpolation::Spline => "spline",
        }
    }

    /// Prepare a fully populated table for evaluation with this strategy.
    ///
    /// Columns of length zero (pairs without any potential) are skipped;
    /// columns shorter than the strategy's sample requirement are a fatal
    /// configuration error.
    pub fn prepare(&self, pt: &mut PotentialTable, radial: bool) -> Result<(), TableError> {
        if *self == Interpolation::Spline {
            pt.table2 = Some(vec![0.0; (pt.maxsteps + 2) * pt.ncols]);
        }
        for col in 0..pt.ncols {
            let n = pt.len[col];
            if n == 0 {
                continue;
            }
            if n < self.required_samples() {
                return Err(TableError::ColumnTooShort {
                    col,
                    len: n,
                    scheme: self.label(),
                    needed: self.required_samples(),
                });
            }
            match self {
                Interpolation::ThreePoint => init_threepoint(pt, col),
                Interpolation::FourPoint => init_fourpoint(pt, col),
                Interpolation::Spline => init_spline(pt, col, radial),
            }
        }
        Ok(())
    }
}

/// Continue the last quadratic through the two sentinel rows.
fn init_threepoint(pt: &mut PotentialTable, col: usize) {
    let n = pt.len[col];
    let y = |k: usize| pt.at(k, col);
    let (s0, s1) = (
        3.0 * y(n - 1) - 3.0 * y(n - 2) + y(n - 3),
        6.0 * y(n - 1) - 8.0 * y(n - 2) + 3.0 * y(n - 3),
    );
    *pt.at_mut(n, col) = s0;
    *pt.at_mut(n + 1, col) = s1;
}

/// Continue the last cubic through the two sentinel rows.
fn init_fourpoint(pt: &mut PotentialTable, col: usize) {
    let n = pt.len[col];
    let y = |k: usize| pt.at(k, col);
    let (s0, s1) = (
        4.0 * y(n - 1) - 6.0 * y(n - 2) + 4.0 * y(n - 3) - y(n - 4),
        10.0 * y(n - 1) - 20.0 * y(n - 2) + 15.0 * y(n - 3) - 4.0 * y(n - 4),
    );
    *pt.at_mut(n, col) = s0;
    *pt.at_mut(n + 1, col) = s1;
}

/// Solve the tridiagonal recurrence for the spline second derivatives of
/// one column. The left boundary is always natural; the right boundary is
/// clamped to zero slope for radial potentials so the force vanishes
/// smoothly at the cutoff, natural otherwise.
fn init_spline(pt: &mut PotentialTable, col: usize, radial: bool) {
    let n = pt.len[col];
    let step = pt.step[col];
    let mut u = vec![0.0; n];

    *pt.at2_mut(0, col) = 0.0;
    for i in 1..n - 1 {
        let p = 0.5 * pt.at2(i - 1, col) + 2.0;
        *pt.at2_mut(i, col) = -0.5 / p;
        let d2 = (pt.at(i + 1, col) - 2.0 * pt.at(i, col) + pt.at(i - 1, col)) / step;
        u[i] = (6.0 * d2 / (2.0 * step) - 0.5 * u[i - 1]) / p;
    }

    let (qn, un) = if radial {
        (
            0.5,
            (3.0 / step) * (pt.at(n - 2, col) - pt.at(n - 1, col)) / step,
        )
    } else {
        (0.0, 0.0)
    };
    *pt.at2_mut(n - 1, col) = (un - qn * u[n - 2]) / (qn * pt.at2(n - 2, col) + 1.0);
    for k in (0..=n - 2).rev() {
        *pt.at2_mut(k, col) = pt.at2(k, col) * pt.at2(k + 1, col) + u[k];
    }

    // continue the last interpolation polynomial into the sentinel row
    let y_n = 2.0 * pt.at(n - 1, col) - pt.at(n - 2, col) + step * step * pt.at2(n - 1, col);
    let y2_n = 2.0 * pt.at2(n - 1, col) - pt.at2(n - 2, col);
    *pt.at_mut(n, col) = y_n;
    *pt.at2_mut(n, col) = y2_n;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Table holding f(k) in one column, with unit step from zero.
    fn table_from(samples: &[f64]) -> PotentialTable {
        let n = samples.len();
        let mut pt = PotentialTable::with_capacity(1, n);
        for (k, &v) in samples.iter().enumerate() {
            *pt.at_mut(k, 0) = v;
        }
        pt.set_column_info(0, 0.0, (n - 1) as f64, 1.0, n);
        pt
    }

    #[test]
    fn threepoint_continues_a_quadratic() {
        let mut pt = table_from(&[0.0, 1.0, 4.0, 9.0, 16.0]);
        Interpolation::ThreePoint.prepare(&mut pt, true).unwrap();
        assert_relative_eq!(pt.at(5, 0), 25.0);
        assert_relative_eq!(pt.at(6, 0), 36.0);
    }

    #[test]
    fn fourpoint_continues_a_cubic() {
        let mut pt = table_from(&[0.0, 1.0, 8.0, 27.0, 64.0]);
        Interpolation::FourPoint.prepare(&mut pt, true).unwrap();
        assert_relative_eq!(pt.at(5, 0), 125.0);
        assert_relative_eq!(pt.at(6, 0), 216.0);
    }

    #[test]
    fn spline_natural_boundaries() {
        let mut pt = table_from(&[0.0, 1.0, 4.0, 9.0, 16.0]);
        Interpolation::Spline.prepare(&mut pt, false).unwrap();
        // natural boundary: zero second derivative at both ends
        assert_relative_eq!(pt.at2(0, 0), 0.0);
        assert_relative_eq!(pt.at2(4, 0), 0.0);
    }

    #[test]
    fn spline_linear_data_has_zero_curvature() {
        let mut pt = table_from(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        Interpolation::Spline.prepare(&mut pt, false).unwrap();
        for k in 0..5 {
            assert_relative_eq!(pt.at2(k, 0), 0.0, epsilon = 1e-12);
        }
        // the sentinel row continues the straight line
        assert_relative_eq!(pt.at(5, 0), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn too_short_column_is_fatal() {
        let mut pt = table_from(&[0.0, 1.0]);
        let err = Interpolation::ThreePoint.prepare(&mut pt, true).unwrap_err();
        assert!(matches!(
            err,
            TableError::ColumnTooShort {
                col: 0,
                len: 2,
                needed: 3,
                ..
            }
        ));
        let mut pt = table_from(&[0.0, 1.0, 4.0]);
        assert!(Interpolation::FourPoint.prepare(&mut pt, true).is_err());
    }

    #[test]
    fn empty_columns_are_skipped() {
        let mut pt = PotentialTable::with_capacity(2, 5);
        for (k, v) in [0.0, 1.0, 4.0, 9.0, 16.0].iter().enumerate() {
            *pt.at_mut(k, 0) = *v;
        }
        pt.set_column_info(0, 0.0, 4.0, 1.0, 5);
        // column 1 stays empty (len = 0), as for an uncovered pair
        Interpolation::ThreePoint.prepare(&mut pt, true).unwrap();
        assert_relative_eq!(pt.at(5, 0), 25.0);
    }
}
