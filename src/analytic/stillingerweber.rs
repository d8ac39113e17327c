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

/// Stillinger-Weber pair term
///
/// $$ u(r) = \left (A r^{-p} - B r^{-q} \right ) e^{\delta / (r - a)} \qquad r < a $$
///
/// The exponential factor drives the potential and all of its derivatives
/// smoothly to zero at the cutoff $a$, so no tail correction is applied.
/// The three-body angular part of the full Stillinger-Weber potential is
/// outside this crate's scope. See
/// [doi:10.1103/PhysRevB.31.5262](https://doi.org/10.1103/PhysRevB.31.5262).
#[derive(Debug, Clone, PartialEq, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct StillingerWeber {
    /// Repulsion strength, A
    a: f64,
    /// Attraction strength, B
    b: f64,
    /// Repulsive exponent, p
    p: f64,
    /// Attractive exponent, q
    q: f64,
    /// Cutoff distance, a₁
    cutoff: f64,
    /// Decay length of the cutoff function, δ
    delta: f64,
}

impl StillingerWeber {
    pub fn new(a: f64, b: f64, p: f64, q: f64, cutoff: f64, delta: f64) -> Self {
        assert!(cutoff > 0.0, "cutoff must be positive");
        Self {
            a,
            b,
            p,
            q,
            cutoff,
            delta,
        }
    }
}

impl PairPotential for StillingerWeber {
    #[inline]
    fn energy_and_gradient(&self, r2: f64) -> (f64, f64) {
        let r = r2.sqrt();
        // the cutoff exponent overflows as r -> a; keep a small guard band
        let x = r - self.cutoff;
        if x >= -0.01 * self.delta {
            return (0.0, 0.0);
        }
        let phi_r = self.a * r.powf(-self.p);
        let phi_a = -self.b * r.powf(-self.q);
        let inv_c = 1.0 / x;
        let inv_r = 1.0 / r;
        let f_cut = (self.delta * inv_c).exp();
        let pot = (phi_r + phi_a) * f_cut;
        let grad = (-pot * self.delta * inv_c * inv_c
            - f_cut * inv_r * (self.p * phi_r + self.q * phi_a))
            * inv_r;
        (pot, grad)
    }

    fn suggested_begin(&self) -> Option<f64> {
        Some(0.05 * self.cutoff)
    }

    fn tail_mode(&self) -> TailMode {
        TailMode::Raw
    }
}

impl Cutoff for StillingerWeber {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

impl Info for StillingerWeber {
    fn citation(&self) -> Option<&'static str> {
        Some("doi:10.1103/PhysRevB.31.5262")
    }
    fn short_name(&self) -> Option<&'static str> {
        Some("stillinger-weber")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Stillinger-Weber silicon pair term, reduced units: A·B and A of the
    /// original parametrization map onto the repulsion and attraction
    /// strengths here.
    fn silicon() -> StillingerWeber {
        StillingerWeber::new(4.245537, 7.049556277, 4.0, 0.0, 1.8, 1.0)
    }

    #[test]
    fn vanishes_at_cutoff() {
        let sw = silicon();
        let (u, g) = sw.energy_and_gradient(1.8_f64.powi(2));
        assert_eq!(u, 0.0);
        assert_eq!(g, 0.0);
        // and inside the guard band just below the cutoff
        let (u, _) = sw.energy_and_gradient(1.795_f64.powi(2));
        assert_eq!(u, 0.0);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let sw = silicon();
        for r2 in [1.0, 1.44, 2.25] {
            let h = 1e-7;
            let dv_dr2 =
                (sw.energy_and_gradient(r2 + h).0 - sw.energy_and_gradient(r2 - h).0) / (2.0 * h);
            assert_relative_eq!(
                sw.energy_and_gradient(r2).1,
                2.0 * dv_dr2,
                max_relative = 1e-4
            );
        }
    }

    #[test]
    fn silicon_bond_minimum_is_attractive() {
        // near the dimer minimum the pair term is negative
        let sw = silicon();
        assert!(sw.energy_and_gradient(1.12).0 < 0.0);
    }
}
