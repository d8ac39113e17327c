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

//! # Pairtab
//!
//! A library for loading, generating, and evaluating tabulated short-ranged
//! interatomic pair potentials, as consumed by the force loop of a
//! molecular dynamics engine.
//!
//! A [`table::PotentialTable`] holds one sampled 1D function per column,
//! typically one column per ordered pair of particle types. Tables come
//! from a text file ([`load`]) or from closed-form physics ([`analytic`]),
//! are post-processed once for a chosen [`interpolate::Interpolation`]
//! strategy, and are then evaluated millions of times per step through the
//! allocation-free functions in [`evaluate`].
//!
//! ## Example
//!
//! ```
//! use pairtab::analytic::{LennardJones, PairSetting, PrePotential};
//! use pairtab::interpolate::Interpolation;
//!
//! // Tabulate a Lennard-Jones potential for a single particle type
//! let mut pre = PrePotential::new(1);
//! pre.set_pair(0, 0, PairSetting::new(2.5).with_term(LennardJones::new(1.0, 1.0)));
//!
//! let mut cellsz = 0.0;
//! let scheme = Interpolation::ThreePoint;
//! let table = pre.create_table(scheme, &mut cellsz).unwrap();
//!
//! // Evaluate near the potential minimum, r = sigma
//! let eval = scheme.evaluate_pair(&table, 0, 1.0);
//! assert!(eval.value < 0.0);
//! assert!(!eval.short);
//! ```

/// A point in 3D space
pub type Vector3 = nalgebra::Vector3<f64>;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serializer};

pub mod analytic;
pub mod evaluate;
pub mod interpolate;
pub mod load;
pub mod replicate;
pub mod setup;
pub mod table;

use physical_constants::{AVOGADRO_CONSTANT, ELEMENTARY_CHARGE, VACUUM_ELECTRIC_PERMITTIVITY};
use std::f64::consts::PI;

/// Electrostatic prefactor, e²/4πε₀ × 10⁷ × NA (Å × kJ / mol).
///
/// Used as the default Coulomb coupling constant of the real-space Ewald
/// term when charges are given in elementary units and distances in
/// ångström:
///
/// Examples:
/// ```
/// use pairtab::ELECTRIC_PREFACTOR;
/// let z1 = 1.0;                    // unit-less charge number
/// let z2 = -1.0;                   // unit-less charge number
/// let r = 7.0;                     // separation in angstrom
/// let rel_dielectric_const = 80.0; // relative dielectric constant
/// let energy = ELECTRIC_PREFACTOR * z1 * z2 / (rel_dielectric_const * r);
/// assert_eq!(energy, -2.48099031507825); // in kJ/mol
/// ```
pub const ELECTRIC_PREFACTOR: f64 =
    ELEMENTARY_CHARGE * ELEMENTARY_CHARGE * 1.0e10 * AVOGADRO_CONSTANT * 1e-3
        / (4.0 * PI * VACUUM_ELECTRIC_PERMITTIVITY);

/// Fraction of the squared cutoff over which analytic pair terms are
/// blended to zero with a quadratic tail, so that both the potential and
/// its derivative vanish at the cutoff.
pub const POT_TAIL: f64 = 0.05;

/// Defines a cutoff distance
pub trait Cutoff {
    /// Squared cutoff distance
    fn cutoff_squared(&self) -> f64 {
        self.cutoff().powi(2)
    }

    /// Cutoff distance
    fn cutoff(&self) -> f64;
}

/// Static information about a potential term
pub trait Info {
    /// Citation, typically a DOI
    fn citation(&self) -> Option<&'static str> {
        None
    }
    /// Short name used in log messages
    fn short_name(&self) -> Option<&'static str> {
        None
    }
}

/// Transform x^2 --> x when serializing
#[cfg(feature = "serde")]
fn sqrt_serialize<S>(x: &f64, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_f64(x.sqrt())
}

/// Transform x --> x^2 when deserializing
#[cfg(feature = "serde")]
fn square_deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(f64::deserialize(deserializer)?.powi(2))
}
