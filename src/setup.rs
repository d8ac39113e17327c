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

//! One-time construction of the simulation's potential registry
//!
//! [`setup_potentials`] builds every configured table (loaded from file,
//! generated from closed-form terms, or both), replicates it across
//! worker processes, and prepares it for the chosen interpolation
//! strategy. It runs once before the first time step; afterwards all
//! tables are immutable and the evaluator may be called from any thread
//! without synchronization.
//!
//! The global interaction range `cellsz` (the largest squared cutoff over
//! all radial tables) is returned explicitly for the caller to fold into
//! neighbor-list sizing.

use crate::analytic::PrePotential;
use crate::interpolate::Interpolation;
use crate::load::read_pot_table;
use crate::replicate::Replicate;
use crate::table::PotentialTable;
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

/// Sources for the simulation's potential tables.
#[derive(Clone, Debug)]
pub struct PotentialConfig {
    /// Number of particle types; pair tables hold `ntypes²` columns
    pub ntypes: usize,
    /// Interpolation strategy used for every table of the run
    pub interpolation: Interpolation,
    /// Tabulated pair potential file
    pub pair_file: Option<PathBuf>,
    /// Smoothing potential file (three-body smoothing schemes)
    pub smoothing_file: Option<PathBuf>,
    /// Embedding energy file, one column per type, not radial
    pub embedding_file: Option<PathBuf>,
    /// Electron density file, one column per ordered pair
    pub density_file: Option<PathBuf>,
    /// Analytically defined pair potentials; merged over `pair_file`
    /// when both are given
    pub pre_pot: Option<PrePotential>,
}

impl PotentialConfig {
    /// Empty configuration for `ntypes` particle types.
    pub fn new(ntypes: usize) -> Self {
        Self {
            ntypes,
            interpolation: Interpolation::default(),
            pair_file: None,
            smoothing_file: None,
            embedding_file: None,
            density_file: None,
            pre_pot: None,
        }
    }
}

/// The simulation-wide potential registry, immutable after setup.
#[derive(Clone, Debug)]
pub struct Potentials {
    /// Pair potential, `ntypes²` columns
    pub pair: Option<PotentialTable>,
    /// Smoothing potential, `ntypes²` columns
    pub smoothing: Option<PotentialTable>,
    /// Embedding energy, `ntypes` columns over the density domain
    pub embedding: Option<PotentialTable>,
    /// Electron density, `ntypes²` columns
    pub density: Option<PotentialTable>,
    /// The strategy every table was prepared for
    pub interpolation: Interpolation,
    /// Largest squared cutoff over all radial tables; feeds
    /// neighbor-list sizing in the caller
    pub cellsz: f64,
}

/// Build every configured table from file or analytic generation.
///
/// File I/O happens on the coordinating process only; every table is
/// replicated to all workers before interpolation preparation. With both
/// a pair file and analytic terms configured, the file is loaded first
/// and the generated columns are merged over it.
pub fn setup_potentials<C: Replicate>(
    config: &PotentialConfig,
    comm: &C,
) -> anyhow::Result<Potentials> {
    anyhow::ensure!(config.ntypes > 0, "need at least one particle type");
    let ncols = config.ntypes * config.ntypes;
    let scheme = config.interpolation;
    let mut cellsz = 0.0;

    let mut pair = load_optional(
        &config.pair_file,
        ncols,
        true,
        scheme,
        &mut cellsz,
        comm,
        "pair potential",
    )?;
    if let Some(pre) = &config.pre_pot {
        anyhow::ensure!(
            pre.ncols() == ncols,
            "analytic potential covers {} columns; expected {ncols}",
            pre.ncols()
        );
        pair = Some(match pair.take() {
            Some(mut pt) => {
                pre.merge_into(&mut pt, scheme, &mut cellsz)
                    .context("merging analytic pair potentials")?;
                pt
            }
            None => pre
                .create_table(scheme, &mut cellsz)
                .context("generating analytic pair potentials")?,
        });
    }

    let smoothing = load_optional(
        &config.smoothing_file,
        ncols,
        true,
        scheme,
        &mut cellsz,
        comm,
        "smoothing potential",
    )?;
    let embedding = load_optional(
        &config.embedding_file,
        config.ntypes,
        false,
        scheme,
        &mut cellsz,
        comm,
        "embedding energy",
    )?;
    let density = load_optional(
        &config.density_file,
        ncols,
        true,
        scheme,
        &mut cellsz,
        comm,
        "electron density",
    )?;

    info!(cellsz, "potential setup complete");
    Ok(Potentials {
        pair,
        smoothing,
        embedding,
        density,
        interpolation: scheme,
        cellsz,
    })
}

#[allow(clippy::too_many_arguments)]
fn load_optional<C: Replicate>(
    path: &Option<PathBuf>,
    ncols: usize,
    radial: bool,
    scheme: Interpolation,
    cellsz: &mut f64,
    comm: &C,
    what: &str,
) -> anyhow::Result<Option<PotentialTable>> {
    path.as_ref()
        .map(|path| {
            read_pot_table(path, ncols, radial, scheme, cellsz, comm)
                .with_context(|| format!("loading {what} from {}", path.display()))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytic::{LennardJones, PairSetting};
    use crate::replicate::SingleProcess;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn lj_pre_pot() -> PrePotential {
        let mut pre = PrePotential::new(1);
        pre.set_pair(
            0,
            0,
            PairSetting::new(3.0).with_term(LennardJones::new(1.0, 1.0)),
        );
        pre
    }

    #[test]
    fn analytic_only_setup() {
        let mut config = PotentialConfig::new(1);
        config.pre_pot = Some(lj_pre_pot());
        let pots = setup_potentials(&config, &SingleProcess).unwrap();
        let pair = pots.pair.unwrap();
        assert_eq!(pair.ncols(), 1);
        assert_relative_eq!(pots.cellsz, 9.0);
        assert!(pots.smoothing.is_none());
    }

    #[test]
    fn file_then_merge() {
        // a coarse tabulated pair potential covering one type pair
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "#F 2 1\n#E\n0.0 16.0 1.0\n").unwrap();
        for k in 0..17 {
            writeln!(file, "{}", 16 - k).unwrap();
        }

        let mut config = PotentialConfig::new(1);
        config.pair_file = Some(file.path().to_owned());
        config.pre_pot = Some(lj_pre_pot());
        let pots = setup_potentials(&config, &SingleProcess).unwrap();
        let pair = pots.pair.unwrap();

        // the analytic column replaced the loaded one, at its resolution
        assert_eq!(pair.len(0), 1000);
        // but the file's larger cutoff still rules the global range
        assert_relative_eq!(pots.cellsz, 16.0);
    }

    #[test]
    fn missing_file_is_fatal() {
        let mut config = PotentialConfig::new(1);
        config.pair_file = Some(PathBuf::from("/nonexistent/potential.dat"));
        let err = setup_potentials(&config, &SingleProcess).unwrap_err();
        assert!(err.to_string().contains("pair potential"));
    }

    #[test]
    fn embedding_table_is_per_type() {
        // embedding energies: one column per type, not radial, so no
        // cutoff shift and no cellsz contribution
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "#F 1 2\n#E\n").unwrap();
        for k in 0..6 {
            writeln!(file, "{} {} {}", k as f64 * 0.5, k, 2 * k + 1).unwrap();
        }
        let mut config = PotentialConfig::new(2);
        config.embedding_file = Some(file.path().to_owned());
        let pots = setup_potentials(&config, &SingleProcess).unwrap();
        let embed = pots.embedding.unwrap();
        assert_eq!(embed.ncols(), 2);
        assert_eq!(embed.len(0), 6);
        // last samples survive unshifted
        assert_relative_eq!(embed.at(5, 0), 5.0);
        assert_relative_eq!(embed.at(5, 1), 11.0);
        assert_relative_eq!(pots.cellsz, 0.0);
    }
}
