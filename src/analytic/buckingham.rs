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
use crate::{Cutoff, Info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Buckingham potential
///
/// $$ u(r) = A e^{-r/\sigma} - C \left (\frac{\sigma}{r}\right )^6 $$
///
/// Exponential repulsion with a van der Waals attraction, see
/// [doi:10.1098/rspa.1938.0173](https://doi.org/10.1098/rspa.1938.0173).
#[derive(Debug, Clone, PartialEq, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct Buckingham {
    /// Repulsion strength, A
    a: f64,
    /// Attraction strength, C
    c: f64,
    /// Length scale, σ
    sigma: f64,
}

impl Buckingham {
    pub const fn new(a: f64, c: f64, sigma: f64) -> Self {
        Self { a, c, sigma }
    }
}

impl PairPotential for Buckingham {
    #[inline]
    fn energy_and_gradient(&self, r2: f64) -> (f64, f64) {
        let rinv = self.sigma / r2.sqrt(); // σ/r
        let rinv2 = rinv * rinv;
        let powpot = self.c * rinv2 * rinv2 * rinv2; // C (σ/r)⁶
        let exppot = self.a * (-1.0 / rinv).exp(); // A e^(-r/σ)
        let invs2 = 1.0 / (self.sigma * self.sigma);
        (
            exppot - powpot,
            (-exppot * rinv + 6.0 * powpot * rinv2) * invs2,
        )
    }

    fn suggested_begin(&self) -> Option<f64> {
        Some(0.1 * self.sigma)
    }
}

impl Cutoff for Buckingham {
    fn cutoff(&self) -> f64 {
        f64::INFINITY
    }
}

impl Info for Buckingham {
    fn citation(&self) -> Option<&'static str> {
        Some("doi:10.1098/rspa.1938.0173")
    }
    fn short_name(&self) -> Option<&'static str> {
        Some("buckingham")
    }
}
