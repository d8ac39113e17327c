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

use super::{PairPotential, TailMode};
use crate::{Cutoff, Info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Tersoff repulsive pair term
///
/// $$ u(r) = f_c(r) \\, A e^{-\lambda r} $$
///
/// with the cosine cutoff function $f_c$ equal to one below $r_0$, zero
/// above the cutoff, and $\frac{1}{2}(1 + \cos \pi \frac{r - r_0}{r_c - r_0})$
/// in between. The bond-order attractive part of the full Tersoff
/// potential is outside this crate's scope. See
/// [doi:10.1103/PhysRevB.39.5566](https://doi.org/10.1103/PhysRevB.39.5566).
#[derive(Debug, Clone, PartialEq, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct Tersoff {
    /// Repulsion strength, A
    a: f64,
    /// Decay constant, λ
    lambda: f64,
    /// Inner cutoff where smoothing starts, r₀
    r0: f64,
    /// Outer cutoff, r_c
    cutoff: f64,
}

impl Tersoff {
    pub fn new(a: f64, lambda: f64, r0: f64, cutoff: f64) -> Self {
        assert!(cutoff > r0, "cutoff must exceed the smoothing onset");
        Self {
            a,
            lambda,
            r0,
            cutoff,
        }
    }
}

impl PairPotential for Tersoff {
    #[inline]
    fn energy_and_gradient(&self, r2: f64) -> (f64, f64) {
        let r = r2.sqrt();
        let (fc, dfc) = if r < self.r0 {
            (1.0, 0.0)
        } else if r > self.cutoff {
            (0.0, 0.0)
        } else {
            let width = PI / (self.cutoff - self.r0);
            let arg = width * (r - self.r0);
            (0.5 * (1.0 + arg.cos()), -0.5 * width * arg.sin())
        };
        let repulsive = self.a * (-self.lambda * r).exp();
        (
            fc * repulsive,
            (dfc - fc * self.lambda) * repulsive / r,
        )
    }

    fn tail_mode(&self) -> TailMode {
        TailMode::Raw
    }
}

impl Cutoff for Tersoff {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

impl Info for Tersoff {
    fn citation(&self) -> Option<&'static str> {
        Some("doi:10.1103/PhysRevB.39.5566")
    }
    fn short_name(&self) -> Option<&'static str> {
        Some("tersoff")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cutoff_window() {
        let ters = Tersoff::new(100.0, 2.0, 1.5, 2.0);
        // below r0 the cutoff function is one
        let (u, _) = ters.energy_and_gradient(1.0);
        assert_relative_eq!(u, 100.0 * (-2.0_f64).exp());
        // halfway through the window f_c = 1/2
        let (u, _) = ters.energy_and_gradient(1.75_f64.powi(2));
        assert_relative_eq!(u, 0.5 * 100.0 * (-3.5_f64).exp(), epsilon = 1e-12);
        // beyond the cutoff it vanishes
        assert_eq!(ters.energy_and_gradient(4.41).0, 0.0);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let ters = Tersoff::new(100.0, 2.0, 1.5, 2.0);
        for r2 in [1.0, 2.89, 3.24] {
            let h = 1e-7;
            let dv_dr2 = (ters.energy_and_gradient(r2 + h).0 - ters.energy_and_gradient(r2 - h).0)
                / (2.0 * h);
            assert_relative_eq!(
                ters.energy_and_gradient(r2).1,
                2.0 * dv_dr2,
                max_relative = 1e-5
            );
        }
    }
}
