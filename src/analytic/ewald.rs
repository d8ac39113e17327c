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
use crate::{Cutoff, Info, ELECTRIC_PREFACTOR};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Real-space part of the Ewald-split Coulomb potential
///
/// $$ u(r) = k_e \\, q_i q_j \\, \frac{\mathrm{erfc}(\kappa r)}{r} $$
///
/// where $\kappa$ is the Ewald splitting parameter. The reciprocal-space
/// part is handled elsewhere; when tabulated, this term is energy- and
/// force-shifted at its own cutoff so the truncated sum stays smooth.
/// See [doi:10.1002/andp.19213690304](https://doi.org/10.1002/andp.19213690304).
#[derive(Debug, Clone, PartialEq, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct RealSpaceEwald {
    /// Product of the two charges, q_i·q_j
    charge_product: f64,
    /// Ewald splitting parameter, κ
    kappa: f64,
    /// Real-space cutoff distance
    cutoff: f64,
    /// Coulomb coupling constant, k_e
    prefactor: f64,
}

impl RealSpaceEwald {
    /// Square root of pi
    const SQRT_PI: f64 = 1.7724538509055159;

    /// New real-space Ewald term with the default Coulomb prefactor
    /// ([`ELECTRIC_PREFACTOR`], for charges in elementary units and
    /// distances in ångström).
    pub fn new(charge_product: f64, kappa: f64, cutoff: f64) -> Self {
        assert!(cutoff > 0.0, "cutoff must be positive");
        Self {
            charge_product,
            kappa,
            cutoff,
            prefactor: ELECTRIC_PREFACTOR,
        }
    }

    /// Override the Coulomb coupling constant, e.g. for other unit systems.
    pub fn with_prefactor(mut self, prefactor: f64) -> Self {
        self.prefactor = prefactor;
        self
    }
}

impl PairPotential for RealSpaceEwald {
    #[inline]
    fn energy_and_gradient(&self, r2: f64) -> (f64, f64) {
        let r = r2.sqrt();
        let chg = self.charge_product * self.prefactor;
        let fac = chg * 2.0 * self.kappa / Self::SQRT_PI;
        let pot = chg * libm::erfc(self.kappa * r) / r;
        let grad = -(pot + fac * (-self.kappa * self.kappa * r2).exp()) / r2;
        (pot, grad)
    }

    fn suggested_begin(&self) -> Option<f64> {
        Some(0.2)
    }

    fn tail_mode(&self) -> TailMode {
        TailMode::ForceShift
    }
}

impl Cutoff for RealSpaceEwald {
    fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

impl Info for RealSpaceEwald {
    fn citation(&self) -> Option<&'static str> {
        Some("doi:10.1002/andp.19213690304")
    }
    fn short_name(&self) -> Option<&'static str> {
        Some("ewald")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reduces_to_coulomb_for_small_kappa() {
        // erfc(0) = 1: plain Coulomb with unit prefactor
        let ewald = RealSpaceEwald::new(1.0, 0.0, 10.0).with_prefactor(1.0);
        let (u, g) = ewald.energy_and_gradient(4.0);
        assert_relative_eq!(u, 0.5);
        // (1/r)·d(1/r)/dr = -1/r³
        assert_relative_eq!(g, -0.125);
    }

    #[test]
    fn screened_value() {
        let ewald = RealSpaceEwald::new(1.0, 1.0, 10.0).with_prefactor(1.0);
        let (u, _) = ewald.energy_and_gradient(1.0);
        // erfc(1)/1
        assert_relative_eq!(u, 0.15729920705028513, epsilon = 1e-12);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let ewald = RealSpaceEwald::new(-0.5, 0.4, 10.0).with_prefactor(1.0);
        for r2 in [1.0, 4.0, 25.0] {
            let h = 1e-6;
            let dv_dr2 = (ewald.energy_and_gradient(r2 + h).0
                - ewald.energy_and_gradient(r2 - h).0)
                / (2.0 * h);
            assert_relative_eq!(
                ewald.energy_and_gradient(r2).1,
                2.0 * dv_dr2,
                max_relative = 1e-5
            );
        }
    }
}
