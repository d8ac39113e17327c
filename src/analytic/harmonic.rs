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

/// Harmonic spring potential, $u(r) = \frac{1}{2} k r^2$
///
/// Ties a core-shell pair to a common center, as used in shell models of
/// polarizable ions. The spring is anchored at zero separation, so the
/// tabulated domain for a spring-only pair starts at the origin.
#[derive(Debug, Clone, PartialEq, Default, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(deny_unknown_fields)
)]
pub struct Harmonic {
    /// Spring constant, k
    #[cfg_attr(feature = "serde", serde(rename = "k"))]
    spring_constant: f64,
}

impl Harmonic {
    pub const fn new(spring_constant: f64) -> Self {
        Self { spring_constant }
    }
}

impl PairPotential for Harmonic {
    #[inline]
    fn energy_and_gradient(&self, r2: f64) -> (f64, f64) {
        // (1/r)·d(kr²/2)/dr = k
        (0.5 * self.spring_constant * r2, self.spring_constant)
    }

    fn suggested_begin(&self) -> Option<f64> {
        Some(0.0)
    }

    fn tail_mode(&self) -> TailMode {
        TailMode::Raw
    }
}

impl Cutoff for Harmonic {
    fn cutoff(&self) -> f64 {
        f64::INFINITY
    }
}

impl Info for Harmonic {
    fn short_name(&self) -> Option<&'static str> {
        Some("harmonic")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn energy_and_constant_gradient() {
        let spring = Harmonic::new(4.0);
        let (u, g) = spring.energy_and_gradient(2.25);
        assert_relative_eq!(u, 4.5);
        assert_relative_eq!(g, 4.0);
        assert_relative_eq!(spring.energy_and_gradient(0.0).0, 0.0);
    }
}
