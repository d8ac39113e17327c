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

use super::PairPotential;
#[cfg(feature = "serde")]
use crate::{sqrt_serialize, square_deserialize};
use crate::{Cutoff, Info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lennard-Jones potential in the well-depth form
///
/// $$ u(r) = \epsilon \left [\left (\frac{\sigma}{r}\right )^{12} - 2\left (\frac{\sigma}{r}\right )^6 \right ]$$
///
/// so that the minimum sits at $r = \sigma$ with depth $-\epsilon$.
/// Originally by J. E. Lennard-Jones, see
/// [doi:10/cqhgm7](https://dx.doi.org/10/cqhgm7) or
/// [Wikipedia](https://en.wikipedia.org/wiki/Lennard-Jones_potential).
///
/// # Examples:
/// ~~~
/// use pairtab::analytic::{LennardJones, PairPotential};
/// let lj = LennardJones::new(1.5, 2.0);
/// let (u, g) = lj.energy_and_gradient(4.0); // at r = sigma
/// assert_eq!(u, -1.5);
/// assert_eq!(g, 0.0);
/// ~~~
#[derive(Debug, Clone, PartialEq, Default, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct LennardJones {
    /// Interaction strength, ε
    #[cfg_attr(feature = "serde", serde(rename = "eps"))]
    epsilon: f64,
    /// Squared diameter, σ²
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "sigma",
            serialize_with = "sqrt_serialize",
            deserialize_with = "square_deserialize"
        )
    )]
    sigma_squared: f64,
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64) -> Self {
        assert!(sigma > 0.0, "sigma must be positive");
        Self {
            epsilon,
            sigma_squared: sigma.powi(2),
        }
    }
}

impl PairPotential for LennardJones {
    #[inline]
    fn energy_and_gradient(&self, r2: f64) -> (f64, f64) {
        let x = self.sigma_squared / r2; // (σ/r)²
        let x6 = x * x * x; // (σ/r)⁶
        let x12 = x6 * x6; // (σ/r)¹²
        (
            self.epsilon * (x12 - 2.0 * x6),
            -12.0 * self.epsilon / r2 * (x12 - x6),
        )
    }

    fn suggested_begin(&self) -> Option<f64> {
        Some(0.1 * self.sigma_squared.sqrt())
    }
}

impl Cutoff for LennardJones {
    fn cutoff(&self) -> f64 {
        f64::INFINITY
    }
    fn cutoff_squared(&self) -> f64 {
        f64::INFINITY
    }
}

impl Info for LennardJones {
    fn citation(&self) -> Option<&'static str> {
        Some("doi:10/cqhgm7")
    }
    fn short_name(&self) -> Option<&'static str> {
        Some("lennard-jones")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn minimum_at_sigma() {
        let lj = LennardJones::new(0.5, 1.3);
        let (u, g) = lj.energy_and_gradient(1.3_f64.powi(2));
        assert_relative_eq!(u, -0.5);
        assert_relative_eq!(g, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let lj = LennardJones::new(2.0, 1.1);
        let r2 = 1.7;
        let h = 1e-6;
        let dv_dr2 =
            (lj.energy_and_gradient(r2 + h).0 - lj.energy_and_gradient(r2 - h).0) / (2.0 * h);
        // (1/r)·dV/dr = 2·dV/d(r²)
        assert_relative_eq!(lj.energy_and_gradient(r2).1, 2.0 * dv_dr2, epsilon = 1e-6);
    }
}
