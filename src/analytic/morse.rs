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

//! Implementation of the Morse potential.

use super::PairPotential;
use crate::{Cutoff, Info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Morse potential
///
/// $$ u(r) = \epsilon \left [ \left (1 - e^{-\alpha (r - \sigma)}\right )^2 - 1 \right ]$$
///
/// with well depth $\epsilon$, equilibrium distance $\sigma$, and inverse
/// width $\alpha$. See <https://en.wikipedia.org/wiki/Morse_potential>.
#[derive(Debug, Clone, PartialEq, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct Morse {
    /// Well depth, ε
    #[cfg_attr(feature = "serde", serde(rename = "eps"))]
    epsilon: f64,
    /// Equilibrium distance, σ
    #[cfg_attr(feature = "serde", serde(rename = "sigma"))]
    equilibrium_distance: f64,
    /// Inverse width of the well, α
    alpha: f64,
}

impl Morse {
    pub fn new(epsilon: f64, equilibrium_distance: f64, alpha: f64) -> Self {
        assert!(
            equilibrium_distance > 0.0,
            "equilibrium distance must be positive"
        );
        Self {
            epsilon,
            equilibrium_distance,
            alpha,
        }
    }
}

impl PairPotential for Morse {
    #[inline]
    fn energy_and_gradient(&self, r2: f64) -> (f64, f64) {
        let r = r2.sqrt();
        let exppot = (-self.alpha * (r - self.equilibrium_distance)).exp();
        let cexppot = 1.0 - exppot;
        (
            self.epsilon * (cexppot * cexppot - 1.0),
            2.0 * self.alpha * self.epsilon / r * exppot * cexppot,
        )
    }
}

impl Cutoff for Morse {
    fn cutoff(&self) -> f64 {
        f64::INFINITY
    }
}

impl Info for Morse {
    fn citation(&self) -> Option<&'static str> {
        Some("doi:10.1103/PhysRev.34.57")
    }
    fn short_name(&self) -> Option<&'static str> {
        Some("morse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimum_at_equilibrium_distance() {
        let morse = Morse::new(0.7, 1.2, 2.0);
        let (u, g) = morse.energy_and_gradient(1.2_f64.powi(2));
        assert_relative_eq!(u, -0.7);
        assert_relative_eq!(g, 0.0, epsilon = 1e-12);
        // dissociates to zero
        let (u, _) = morse.energy_and_gradient(100.0_f64.powi(2));
        assert_relative_eq!(u, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let morse = Morse::new(0.7, 1.2, 2.0);
        let r2 = 2.1;
        let h = 1e-6;
        let dv_dr2 =
            (morse.energy_and_gradient(r2 + h).0 - morse.energy_and_gradient(r2 - h).0) / (2.0 * h);
        assert_relative_eq!(morse.energy_and_gradient(r2).1, 2.0 * dv_dr2, epsilon = 1e-6);
    }
}
