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

//! Tabulated potential functions
//!
//! A [`PotentialTable`] stores one sampled 1D function per *column*.
//! For radial potentials the domain is the squared pair distance and the
//! column index encodes an ordered pair of particle types,
//! `p * ntypes + q`; for per-type functions (e.g. embedding energies)
//! there is one column per type.
//!
//! Samples are kept in a single dense row-major buffer of shape
//! `(maxsteps + 2) × ncols`: row = sample index, column = function index.
//! The two extra rows per column hold extrapolated sentinel values past
//! the last real sample so that boundary evaluation needs no special-case
//! branch. Columns share the allocation bound `maxsteps` but may use
//! fewer samples each (`len`).

/// A set of tabulated 1D functions sharing one sample buffer.
///
/// Cloning is a full deep copy: the clone owns independent metadata and
/// sample buffers, and mutating it never affects the original. Dropping
/// the table frees every owned buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PotentialTable {
    /// Number of columns (tabulated functions)
    pub(crate) ncols: usize,
    /// Allocation bound: every column may hold up to this many samples
    pub(crate) maxsteps: usize,
    /// Domain start per column (squared distance for radial potentials)
    pub(crate) begin: Vec<f64>,
    /// Domain end per column, i.e. the squared cutoff
    pub(crate) end: Vec<f64>,
    /// Uniform sample spacing per column
    pub(crate) step: Vec<f64>,
    /// Cached reciprocal of `step`
    pub(crate) invstep: Vec<f64>,
    /// Number of valid samples per column
    pub(crate) len: Vec<usize>,
    /// Row-major sample storage, `(maxsteps + 2) * ncols`
    pub(crate) table: Vec<f64>,
    /// Spline second-derivative coefficients, same shape as `table`.
    /// Present only after preparing for spline interpolation.
    pub(crate) table2: Option<Vec<f64>>,
}

impl PotentialTable {
    /// Allocate a zero-filled table with `ncols` columns and capacity for
    /// `maxsteps` samples per column (plus the two sentinel rows).
    pub fn with_capacity(ncols: usize, maxsteps: usize) -> Self {
        Self {
            ncols,
            maxsteps,
            begin: vec![0.0; ncols],
            end: vec![0.0; ncols],
            step: vec![0.0; ncols],
            invstep: vec![0.0; ncols],
            len: vec![0; ncols],
            table: vec![0.0; (maxsteps + 2) * ncols],
            table2: None,
        }
    }

    /// Number of columns
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Current allocation bound (samples per column)
    #[inline]
    pub fn maxsteps(&self) -> usize {
        self.maxsteps
    }

    /// Domain start of a column
    #[inline]
    pub fn begin(&self, col: usize) -> f64 {
        self.begin[col]
    }

    /// Domain end (squared cutoff) of a column
    #[inline]
    pub fn end(&self, col: usize) -> f64 {
        self.end[col]
    }

    /// Sample spacing of a column
    #[inline]
    pub fn step(&self, col: usize) -> f64 {
        self.step[col]
    }

    /// Reciprocal sample spacing of a column
    #[inline]
    pub fn invstep(&self, col: usize) -> f64 {
        self.invstep[col]
    }

    /// Number of valid samples in a column
    #[inline]
    pub fn len(&self, col: usize) -> usize {
        self.len[col]
    }

    /// True if no column holds any sample
    pub fn is_empty(&self) -> bool {
        self.len.iter().all(|&n| n == 0)
    }

    /// Set the per-column metadata; `invstep` is derived from `step`.
    pub fn set_column_info(&mut self, col: usize, begin: f64, end: f64, step: f64, len: usize) {
        self.begin[col] = begin;
        self.end[col] = end;
        self.step[col] = step;
        self.invstep[col] = if step != 0.0 { 1.0 / step } else { 0.0 };
        self.len[col] = len;
    }

    /// Sample value at row `k` of column `col`.
    ///
    /// Rows `len..len + 2` are the extrapolated sentinel rows.
    #[inline]
    pub fn at(&self, k: usize, col: usize) -> f64 {
        debug_assert!(col < self.ncols, "column {col} out of range");
        debug_assert!(k < self.maxsteps + 2, "row {k} out of range");
        self.table[k * self.ncols + col]
    }

    /// Mutable sample access, same indexing as [`Self::at`].
    #[inline]
    pub fn at_mut(&mut self, k: usize, col: usize) -> &mut f64 {
        debug_assert!(col < self.ncols, "column {col} out of range");
        debug_assert!(k < self.maxsteps + 2, "row {k} out of range");
        &mut self.table[k * self.ncols + col]
    }

    /// Spline second derivative at row `k` of column `col`.
    ///
    /// Panics if the table has not been prepared for spline interpolation.
    #[inline]
    pub fn at2(&self, k: usize, col: usize) -> f64 {
        debug_assert!(col < self.ncols && k < self.maxsteps + 2);
        let table2 = self
            .table2
            .as_ref()
            .expect("table not prepared for spline interpolation");
        table2[k * self.ncols + col]
    }

    #[inline]
    pub(crate) fn at2_mut(&mut self, k: usize, col: usize) -> &mut f64 {
        debug_assert!(col < self.ncols && k < self.maxsteps + 2);
        let table2 = self
            .table2
            .as_mut()
            .expect("table not prepared for spline interpolation");
        &mut table2[k * self.ncols + col]
    }

    /// Grow the allocation bound to at least `maxsteps`, preserving all
    /// existing samples. Shrinking is a no-op.
    ///
    /// Thanks to the row-major layout the existing rows keep their
    /// positions; the new tail rows are zero-filled.
    pub fn grow(&mut self, maxsteps: usize) {
        if maxsteps <= self.maxsteps {
            return;
        }
        self.maxsteps = maxsteps;
        let size = (maxsteps + 2) * self.ncols;
        self.table.resize(size, 0.0);
        if let Some(table2) = &mut self.table2 {
            table2.resize(size, 0.0);
        }
    }

    /// Largest domain end over all columns; radial tables fold this into
    /// the global interaction range used for neighbor-list sizing.
    pub fn max_end(&self) -> f64 {
        self.end.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_table() -> PotentialTable {
        let mut pt = PotentialTable::with_capacity(2, 4);
        for k in 0..4 {
            *pt.at_mut(k, 0) = k as f64;
            *pt.at_mut(k, 1) = 10.0 * k as f64;
        }
        pt.set_column_info(0, 0.0, 3.0, 1.0, 4);
        pt.set_column_info(1, 0.0, 3.0, 1.0, 4);
        pt
    }

    #[test]
    fn grow_preserves_samples() {
        let mut pt = ramp_table();
        pt.grow(10);
        assert_eq!(pt.maxsteps(), 10);
        for k in 0..4 {
            assert_eq!(pt.at(k, 0), k as f64);
            assert_eq!(pt.at(k, 1), 10.0 * k as f64);
        }
        // new rows are zero-filled
        assert_eq!(pt.at(9, 0), 0.0);
        // shrinking is a no-op
        pt.grow(4);
        assert_eq!(pt.maxsteps(), 10);
    }

    #[test]
    fn clone_is_deep() {
        let pt = ramp_table();
        let mut copy = pt.clone();
        *copy.at_mut(0, 0) = -1.0;
        copy.set_column_info(0, 1.0, 2.0, 0.5, 2);
        assert_eq!(pt.at(0, 0), 0.0);
        assert_eq!(pt.begin(0), 0.0);
        assert_eq!(pt.len(0), 4);
    }

    #[test]
    fn column_info_derives_invstep() {
        let mut pt = PotentialTable::with_capacity(1, 4);
        pt.set_column_info(0, 0.0, 3.0, 0.5, 4);
        assert_eq!(pt.invstep(0), 2.0);
        pt.set_column_info(0, 0.0, 0.0, 0.0, 0);
        assert_eq!(pt.invstep(0), 0.0);
    }

    #[test]
    fn max_end_over_columns() {
        let mut pt = PotentialTable::with_capacity(3, 4);
        pt.set_column_info(0, 0.0, 2.0, 1.0, 3);
        pt.set_column_info(2, 0.0, 6.25, 1.0, 3);
        assert_eq!(pt.max_end(), 6.25);
    }
}
