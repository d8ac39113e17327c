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

//! Replication of tables across worker processes
//!
//! Potential tables are parsed by exactly one coordinating process and
//! then copied verbatim to every worker, which afterwards holds an
//! independent, immutable copy. The transport is abstracted behind the
//! [`Replicate`] trait so the table code stays free of any message
//! passing library; [`SingleProcess`] is the identity implementation for
//! serial runs and tests.
//!
//! Broadcasts are synchronous, deterministic, and all-or-nothing: a
//! transport failure is treated as fatal for the whole run by the
//! implementation, so the primitives here are infallible by contract.

use crate::table::PotentialTable;

/// Buffer replication from the coordinating process to all workers.
///
/// On the coordinator every broadcast leaves the buffer unchanged; on a
/// worker the buffer is resized to the coordinator's length and
/// overwritten with the coordinator's data. All processes must call the
/// same sequence of broadcasts.
pub trait Replicate {
    /// True on the single process that performs file I/O.
    fn is_coordinator(&self) -> bool;

    /// Replicate a buffer of reals.
    fn broadcast_f64(&self, buf: &mut Vec<f64>);

    /// Replicate a buffer of indices/lengths.
    fn broadcast_usize(&self, buf: &mut Vec<usize>);

    /// Replicate a single real, e.g. the global interaction range.
    fn broadcast_scalar_f64(&self, value: &mut f64) {
        let mut buf = vec![*value];
        self.broadcast_f64(&mut buf);
        *value = buf[0];
    }
}

/// Identity transport for serial runs: nothing to replicate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Replicate for SingleProcess {
    fn is_coordinator(&self) -> bool {
        true
    }
    fn broadcast_f64(&self, _: &mut Vec<f64>) {}
    fn broadcast_usize(&self, _: &mut Vec<usize>) {}
}

/// Replicate every field of a table from the coordinator to all workers.
///
/// Workers resize their buffers from the broadcast dimensions before the
/// sample buffer is transferred, so implementations may treat every
/// buffer as pre-sized. Spline coefficients are not replicated:
/// interpolation preparation runs on every process after this call.
pub fn replicate_table<C: Replicate>(pt: &mut PotentialTable, comm: &C) {
    let mut dims = vec![pt.ncols, pt.maxsteps];
    comm.broadcast_usize(&mut dims);
    let (ncols, maxsteps) = (dims[0], dims[1]);

    if !comm.is_coordinator() {
        pt.ncols = ncols;
        pt.maxsteps = maxsteps;
        pt.begin.resize(ncols, 0.0);
        pt.end.resize(ncols, 0.0);
        pt.step.resize(ncols, 0.0);
        pt.invstep.resize(ncols, 0.0);
        pt.len.resize(ncols, 0);
        pt.table.resize((maxsteps + 2) * ncols, 0.0);
    }
    comm.broadcast_f64(&mut pt.begin);
    comm.broadcast_f64(&mut pt.end);
    comm.broadcast_f64(&mut pt.step);
    comm.broadcast_f64(&mut pt.invstep);
    comm.broadcast_usize(&mut pt.len);
    comm.broadcast_f64(&mut pt.table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Worker-side mock that records broadcast shapes and replays canned
    /// coordinator data.
    struct Playback {
        f64_bufs: RefCell<Vec<Vec<f64>>>,
        usize_bufs: RefCell<Vec<Vec<usize>>>,
    }

    impl Replicate for Playback {
        fn is_coordinator(&self) -> bool {
            false
        }
        fn broadcast_f64(&self, buf: &mut Vec<f64>) {
            *buf = self.f64_bufs.borrow_mut().remove(0);
        }
        fn broadcast_usize(&self, buf: &mut Vec<usize>) {
            *buf = self.usize_bufs.borrow_mut().remove(0);
        }
    }

    #[test]
    fn single_process_is_identity() {
        let mut pt = PotentialTable::with_capacity(2, 3);
        pt.set_column_info(0, 0.0, 2.0, 1.0, 3);
        *pt.at_mut(1, 0) = 42.0;
        let before = pt.clone();
        replicate_table(&mut pt, &SingleProcess);
        assert_eq!(pt, before);
    }

    #[test]
    fn worker_receives_all_fields() {
        let comm = Playback {
            usize_bufs: RefCell::new(vec![vec![1, 3], vec![3]]),
            f64_bufs: RefCell::new(vec![
                vec![0.0],
                vec![2.0],
                vec![1.0],
                vec![1.0],
                vec![5.0, 6.0, 7.0, 0.0, 0.0],
            ]),
        };
        // workers start from an empty placeholder
        let mut pt = PotentialTable::with_capacity(1, 0);
        replicate_table(&mut pt, &comm);
        assert_eq!(pt.maxsteps(), 3);
        assert_eq!(pt.len(0), 3);
        assert_eq!(pt.end(0), 2.0);
        assert_eq!(pt.at(2, 0), 7.0);
        assert!(comm.f64_bufs.borrow().is_empty());
        assert!(comm.usize_bufs.borrow().is_empty());
    }
}
