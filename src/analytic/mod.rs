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

//! Analytic pair potentials and table generation
//!
//! For potentials expressible in closed form, this module samples the sum
//! of all terms configured for a species pair onto a [`PotentialTable`]
//! with the same shape as a loaded one, so the force loop never needs to
//! distinguish tabulated from analytic potentials.
//!
//! Terms with an unbounded range (Lennard-Jones, Morse, Buckingham) are
//! cut off smoothly: each is shifted and replaced by a quadratic tail
//! over the outer [`POT_TAIL`](crate::POT_TAIL) fraction of the squared
//! cutoff, matching value and slope at the blend point and vanishing at
//! the cutoff. Terms with a built-in smooth cutoff (Stillinger-Weber,
//! Tersoff) enter raw; the real-space Ewald term is energy- and
//! force-shifted at its own cutoff.

use crate::interpolate::Interpolation;
use crate::load::TableError;
use crate::table::PotentialTable;
use crate::{Cutoff, Info, POT_TAIL};
use dyn_clone::DynClone;
use std::fmt::Debug;
use tracing::{info, warn};

mod buckingham;
mod ewald;
mod harmonic;
mod lennardjones;
mod morse;
mod stillingerweber;
mod tersoff;
pub use self::buckingham::Buckingham;
pub use self::ewald::RealSpaceEwald;
pub use self::harmonic::Harmonic;
pub use self::lennardjones::LennardJones;
pub use self::morse::Morse;
pub use self::stillingerweber::StillingerWeber;
pub use self::tersoff::Tersoff;

/// Default number of samples per generated column
pub const DEFAULT_RESOLUTION: usize = 1000;

/// How a term is truncated when sampled onto a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TailMode {
    /// Shift, then blend into a quadratic tail over the outer `POT_TAIL`
    /// window of the pair cutoff
    Blend,
    /// Evaluate raw inside the term's own cutoff; the functional form
    /// already vanishes smoothly there
    Raw,
    /// Energy- and force-shift at the term's own cutoff
    ForceShift,
}

/// A closed-form pair potential term.
///
/// Every term returns its derivative pre-divided by the distance,
/// `(1/r)·dV/dr`, since forces are assembled as `(1/r)(dV/dr) · offset`.
/// This convention must hold exactly; the table generator and every
/// caller on the hot path rely on it.
pub trait PairPotential: Debug + DynClone + Cutoff + Info {
    /// Potential value and `(1/r)·dV/dr` at squared distance `r2`.
    fn energy_and_gradient(&self, r2: f64) -> (f64, f64);

    /// Suggested domain start (a distance, not squared), derived from the
    /// term's characteristic length. `None` if the term has no opinion.
    fn suggested_begin(&self) -> Option<f64> {
        None
    }

    /// Truncation behavior when sampled onto a table.
    fn tail_mode(&self) -> TailMode {
        TailMode::Blend
    }
}

dyn_clone::clone_trait_object!(PairPotential);

/// Precomputed truncation of one term for one pair column.
#[derive(Clone, Copy, Debug)]
enum TailCorrection {
    Blend {
        blend_start: f64,
        cutoff2: f64,
        shift: f64,
        tail_coeff: f64,
    },
    Raw {
        cutoff2: f64,
    },
    ForceShift {
        cutoff: f64,
        cutoff2: f64,
        shift: f64,
        force_shift: f64,
    },
}

impl TailCorrection {
    /// Fit the truncation of `term` against the pair's squared cutoff.
    fn new(term: &dyn PairPotential, pair_cutoff2: f64) -> Self {
        match term.tail_mode() {
            TailMode::Blend => {
                let blend_start = (1.0 - POT_TAIL) * pair_cutoff2;
                let (pot, grad) = term.energy_and_gradient(blend_start);
                TailCorrection::Blend {
                    blend_start,
                    cutoff2: pair_cutoff2,
                    shift: pot + 0.25 * grad * POT_TAIL * pair_cutoff2,
                    tail_coeff: -0.25 * grad / (POT_TAIL * pair_cutoff2),
                }
            }
            TailMode::Raw => TailCorrection::Raw {
                cutoff2: term.cutoff_squared(),
            },
            TailMode::ForceShift => {
                let cutoff2 = term.cutoff_squared();
                let (shift, force_shift) = term.energy_and_gradient(cutoff2);
                TailCorrection::ForceShift {
                    cutoff: cutoff2.sqrt(),
                    cutoff2,
                    shift,
                    force_shift,
                }
            }
        }
    }

    /// The term's contribution to the column sample at `r2`.
    fn contribution(&self, term: &dyn PairPotential, r2: f64) -> f64 {
        match *self {
            TailCorrection::Blend {
                blend_start,
                cutoff2,
                shift,
                tail_coeff,
            } => {
                if r2 < blend_start {
                    term.energy_and_gradient(r2).0 - shift
                } else if r2 <= cutoff2 {
                    tail_coeff * (cutoff2 - r2) * (cutoff2 - r2)
                } else {
                    0.0
                }
            }
            TailCorrection::Raw { cutoff2 } => {
                if r2 < cutoff2 {
                    term.energy_and_gradient(r2).0
                } else {
                    0.0
                }
            }
            TailCorrection::ForceShift {
                cutoff,
                cutoff2,
                shift,
                force_shift,
            } => {
                if r2 < cutoff2 {
                    let r = r2.sqrt();
                    term.energy_and_gradient(r2).0 - shift - r * force_shift * (r - cutoff)
                } else {
                    0.0
                }
            }
        }
    }
}

/// Configuration of one species pair: the contributing terms, the cutoff,
/// and the sampling of the generated column.
#[derive(Clone, Debug)]
pub struct PairSetting {
    terms: Vec<Box<dyn PairPotential>>,
    cutoff: f64,
    resolution: usize,
    begin: Option<f64>,
}

impl PairSetting {
    /// New pair configuration with the given cutoff distance.
    pub fn new(cutoff: f64) -> Self {
        assert!(cutoff > 0.0, "pair cutoff must be positive");
        Self {
            terms: Vec::new(),
            cutoff,
            resolution: DEFAULT_RESOLUTION,
            begin: None,
        }
    }

    /// Add a contributing term.
    pub fn with_term(mut self, term: impl PairPotential + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    /// Number of samples for the generated column.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        assert!(resolution >= 2, "need at least two samples per column");
        self.resolution = resolution;
        self
    }

    /// Override the domain start (a distance, not squared).
    pub fn with_begin(mut self, begin: f64) -> Self {
        self.begin = Some(begin);
        self
    }

    /// Pair cutoff raised to cover every term with a built-in cutoff.
    fn blend_cutoff(&self) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.tail_mode() == TailMode::Raw)
            .map(|t| t.cutoff())
            .filter(|c| c.is_finite())
            .fold(self.cutoff, f64::max)
    }

    /// Squared domain end: the blend cutoff or, if larger, the range of a
    /// force-shifted (Ewald) term.
    fn end_squared(&self) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.tail_mode() == TailMode::ForceShift)
            .map(|t| t.cutoff_squared())
            .fold(self.blend_cutoff().powi(2), f64::max)
    }

    /// Domain start: the explicit override, or the first term suggestion.
    fn begin_distance(&self) -> f64 {
        self.begin
            .or_else(|| self.terms.iter().find_map(|t| t.suggested_begin()))
            .unwrap_or(0.0)
    }
}

/// Analytically defined potentials for all species pairs.
///
/// The generator counterpart of the table loader: samples every
/// configured pair onto a table column and hands the result to the
/// interpolation engine, either as a fresh table or merged into a loaded
/// one. Settings are symmetric: configuring `(i, j)` also covers `(j, i)`.
#[derive(Clone, Debug)]
pub struct PrePotential {
    ntypes: usize,
    pairs: Vec<Option<PairSetting>>,
}

impl PrePotential {
    /// New, empty configuration for `ntypes` species.
    pub fn new(ntypes: usize) -> Self {
        assert!(ntypes > 0, "need at least one particle type");
        Self {
            ntypes,
            pairs: vec![None; ntypes * ntypes],
        }
    }

    /// Number of table columns, `ntypes²`.
    pub fn ncols(&self) -> usize {
        self.ntypes * self.ntypes
    }

    /// Configure the pair `(i, j)` and its mirror `(j, i)`.
    pub fn set_pair(&mut self, i: usize, j: usize, setting: PairSetting) {
        assert!(i < self.ntypes && j < self.ntypes, "type index out of range");
        self.pairs[i * self.ntypes + j] = Some(setting.clone());
        self.pairs[j * self.ntypes + i] = Some(setting);
    }

    fn max_resolution(&self) -> usize {
        self.pairs
            .iter()
            .flatten()
            .map(|p| p.resolution)
            .max()
            .unwrap_or(0)
    }

    /// Build a fresh table from the configured pairs.
    ///
    /// Pairs without any configured term are a warning, not an error:
    /// their columns are zero-filled, since sparse interaction matrices
    /// are a legitimate configuration. The finished table is prepared for
    /// `scheme` and `cellsz` is raised to the largest squared cutoff.
    pub fn create_table(
        &self,
        scheme: Interpolation,
        cellsz: &mut f64,
    ) -> Result<PotentialTable, TableError> {
        let mut pt = PotentialTable::with_capacity(self.ncols(), self.max_resolution());
        self.fill(&mut pt, true, cellsz);
        scheme.prepare(&mut pt, true)?;
        Ok(pt)
    }

    /// Merge the configured pairs into an existing (loaded) table,
    /// overwriting their columns and leaving all others untouched. The
    /// capacity grows as needed, preserving existing samples.
    pub fn merge_into(
        &self,
        pt: &mut PotentialTable,
        scheme: Interpolation,
        cellsz: &mut f64,
    ) -> Result<(), TableError> {
        if pt.ncols() != self.ncols() {
            return Err(TableError::ColumnCountMismatch {
                expected: self.ncols(),
                found: pt.ncols(),
            });
        }
        pt.grow(self.max_resolution());
        self.fill(pt, false, cellsz);
        scheme.prepare(pt, true)
    }

    fn fill(&self, pt: &mut PotentialTable, warn_uncovered: bool, cellsz: &mut f64) {
        for i in 0..self.ntypes {
            for j in 0..self.ntypes {
                let col = i * self.ntypes + j;
                let Some(setting) = &self.pairs[col] else {
                    if warn_uncovered {
                        warn!(i, j, "no pair potential for atom types");
                        pt.set_column_info(col, 0.0, 0.0, 0.0, 0);
                    }
                    continue;
                };

                let blend_cutoff2 = setting.blend_cutoff().powi(2);
                let end2 = setting.end_squared();
                let begin2 = setting.begin_distance().powi(2);
                let res = setting.resolution;
                let step = (end2 - begin2) / (res - 1) as f64;
                pt.set_column_info(col, begin2, end2, step, res);

                let tails: Vec<TailCorrection> = setting
                    .terms
                    .iter()
                    .map(|term| TailCorrection::new(term.as_ref(), blend_cutoff2))
                    .collect();
                if i <= j {
                    for (term, tail) in setting.terms.iter().zip(&tails) {
                        if let TailCorrection::Blend { shift, .. }
                        | TailCorrection::ForceShift { shift, .. } = tail
                        {
                            if *shift != 0.0 {
                                info!(
                                    term = term.short_name().unwrap_or("pair"),
                                    i,
                                    j,
                                    shift = -shift,
                                    "analytic potential shifted"
                                );
                            }
                        }
                    }
                }

                for n in 0..res {
                    let r2 = begin2 + n as f64 * step;
                    let val: f64 = setting
                        .terms
                        .iter()
                        .zip(&tails)
                        .map(|(term, tail)| tail.contribution(term.as_ref(), r2))
                        .sum();
                    *pt.at_mut(n, col) = val;
                }
                *cellsz = cellsz.max(end2);
            }
        }
    }
}
