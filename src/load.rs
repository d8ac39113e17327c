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

//! Loading of tabulated potentials from text files
//!
//! Two body formats are supported, selected by an optional header:
//!
//! - **Format 1** (implicit grid): one sample row per line, holding the
//!   domain value followed by one number per column. The grid is assumed
//!   equidistant; the step is derived from the first and last domain
//!   values once the whole body has been read. Per column, the last
//!   non-zero sample determines the column's cutoff and length, so
//!   trailing zeros do not count towards a column's support.
//! - **Format 2** (explicit grid): one `begin end step` triple per
//!   column, followed by each column's samples, one value per line.
//!   Columns may differ in length and spacing; blank separator lines are
//!   ignored.
//!
//! The header consists of `#`-prefixed lines: `#F format ncols` declares
//! the body format, `#E` terminates the header, anything else is a
//! comment. A file without any header is legal (format 1 is assumed,
//! with a warning); a header that starts but is malformed is a fatal
//! [`TableError`].
//!
//! For radial potentials (functions of the squared distance), every
//! column whose trailing value is non-zero is shifted down so the
//! potential vanishes exactly at its cutoff, and the caller's global
//! interaction range `cellsz` is raised to the largest squared cutoff.

use crate::interpolate::Interpolation;
use crate::replicate::{replicate_table, Replicate};
use crate::table::PotentialTable;
use itertools::{izip, Itertools};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Errors raised while loading or post-processing a potential table.
///
/// Every variant is fatal: a partially read table is never handed to the
/// evaluator.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("could not read table file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected end of file inside table header")]
    UnexpectedEof,
    #[error("corrupted table header: non-comment line before the #E terminator")]
    CorruptHeader,
    #[error("corrupted format header line {line:?}")]
    BadFormatLine { line: String },
    #[error("table declares {found} data columns; expected {expected}")]
    ColumnCountMismatch { expected: usize, found: usize },
    #[error("unrecognized table format {0}; expected 1 or 2")]
    UnknownFormat(u32),
    #[error("table header carries no #F format line")]
    MissingFormat,
    #[error("unparsable number {token:?} in table body")]
    BadNumber { token: String },
    #[error("table body row {line} holds {found} values; expected {expected}")]
    IncompleteLine {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("table body ended after {found} of {expected} values")]
    Truncated { expected: usize, found: usize },
    #[error("table body holds fewer than two sample rows")]
    NoData,
    #[error("table domain values are not increasing")]
    NonIncreasingDomain,
    #[error("column {col} declares a non-positive sample spacing")]
    BadStep { col: usize },
    #[error("column {col} ends before it begins")]
    BadDomain { col: usize },
    #[error("column {col} holds {len} samples; {scheme} interpolation needs at least {needed}")]
    ColumnTooShort {
        col: usize,
        len: usize,
        scheme: &'static str,
        needed: usize,
    },
}

/// Read, replicate, and prepare a potential table.
///
/// The file is parsed on the coordinating process only; every other
/// process receives the finished table through `comm` and must never
/// touch the file system. Interpolation preparation runs on all
/// processes after replication. `cellsz` is raised to the largest
/// squared cutoff seen so far (radial tables only) and kept in sync
/// across processes.
pub fn read_pot_table<C: Replicate>(
    path: &Path,
    ncols: usize,
    radial: bool,
    scheme: Interpolation,
    cellsz: &mut f64,
    comm: &C,
) -> Result<PotentialTable, TableError> {
    let mut pt = if comm.is_coordinator() {
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Read {
            path: path.to_owned(),
            source,
        })?;
        let pt = parse_pot_table(&text, ncols, radial, cellsz)?;
        info!(
            path = %path.display(),
            ncols,
            maxsteps = pt.maxsteps(),
            "read tabulated function"
        );
        pt
    } else {
        PotentialTable::with_capacity(ncols, 0)
    };
    replicate_table(&mut pt, comm);
    comm.broadcast_scalar_f64(cellsz);
    scheme.prepare(&mut pt, radial)?;
    Ok(pt)
}

/// Parse a potential table from text.
///
/// Single-process core of [`read_pot_table`]: header detection, body
/// parsing, and the radial cutoff shift, but no replication and no
/// interpolation preparation.
pub fn parse_pot_table(
    text: &str,
    ncols: usize,
    radial: bool,
    cellsz: &mut f64,
) -> Result<PotentialTable, TableError> {
    let lines: Vec<&str> = text.lines().collect();
    let (format, body_start) = parse_header(&lines, ncols)?;
    let body = &lines[body_start..];
    match format {
        1 => read_body_format1(body, ncols, radial, cellsz),
        _ => read_body_format2(body, ncols, radial, cellsz),
    }
}

/// Scan the optional header; returns the body format and the line index
/// where the body begins.
fn parse_header(lines: &[&str], ncols: usize) -> Result<(u32, usize), TableError> {
    let mut format = 1;
    let mut have_header = false;
    let mut have_format = false;
    let mut body_start = None;

    for (i, line) in lines.iter().enumerate() {
        if let Some(rest) = line.strip_prefix('#') {
            have_header = true;
            if rest.starts_with('E') {
                body_start = Some(i + 1);
                break;
            }
            if rest.starts_with('F') {
                let mut fields = rest[1..].split_whitespace();
                let (fmt, size) = fields
                    .next()
                    .zip(fields.next())
                    .and_then(|(f, s)| f.parse::<u32>().ok().zip(s.parse::<usize>().ok()))
                    .ok_or_else(|| TableError::BadFormatLine {
                        line: (*line).to_owned(),
                    })?;
                if size != ncols {
                    return Err(TableError::ColumnCountMismatch {
                        expected: ncols,
                        found: size,
                    });
                }
                if fmt != 1 && fmt != 2 {
                    return Err(TableError::UnknownFormat(fmt));
                }
                format = fmt;
                have_format = true;
            }
            // any other '#' line is a comment
        } else if have_header {
            return Err(TableError::CorruptHeader);
        } else {
            // no header at all; the body starts at the first byte
            body_start = Some(0);
            break;
        }
    }

    if have_header && !have_format && body_start.is_some() {
        return Err(TableError::MissingFormat);
    }
    match body_start {
        Some(start) => {
            if !have_header {
                warn!("table file has no header; assuming format 1");
            }
            Ok((format, start))
        }
        // every line was a header line but no #E terminator was seen
        None if have_header => Err(TableError::UnexpectedEof),
        None => Err(TableError::NoData),
    }
}

/// Format 1: implicit equidistant grid, one row per line.
fn read_body_format1(
    lines: &[&str],
    ncols: usize,
    radial: bool,
    cellsz: &mut f64,
) -> Result<PotentialTable, TableError> {
    let mut values = Vec::new();
    let mut domain = Vec::new();
    let mut end = vec![0.0; ncols];
    let mut len = vec![0usize; ncols];

    for (lineno, line) in lines.iter().enumerate() {
        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| TableError::BadNumber {
                    token: token.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if row.is_empty() {
            continue;
        }
        if row.len() != ncols + 1 {
            return Err(TableError::IncompleteLine {
                line: lineno + 1,
                expected: ncols + 1,
                found: row.len(),
            });
        }
        domain.push(row[0]);
        for (col, &val) in row[1..].iter().enumerate() {
            values.push(val);
            if val != 0.0 {
                // track the last non-zero sample per column
                end[col] = row[0];
                len[col] = domain.len();
            }
        }
    }

    let npot = domain.len();
    if npot < 2 {
        return Err(TableError::NoData);
    }
    let r2_start = domain[0];
    let r2_step = (domain[npot - 1] - r2_start) / (npot - 1) as f64;
    if r2_step <= 0.0 {
        return Err(TableError::NonIncreasingDomain);
    }

    // The body is assumed equidistant; the recorded domain values are only
    // checked against the derived grid so a malformed file does not get
    // silently averaged away.
    let tolerance = 1e-6 * (domain[npot - 1] - r2_start);
    let worst = domain
        .iter()
        .enumerate()
        .map(|(k, &x)| (x - (r2_start + k as f64 * r2_step)).abs())
        .fold(0.0, f64::max);
    if worst > tolerance {
        warn!(
            deviation = worst,
            "table domain values are not equidistant; using the averaged step"
        );
    }

    let mut pt = PotentialTable::with_capacity(ncols, npot);
    pt.table[..npot * ncols].copy_from_slice(&values);
    let inv = 1.0 / r2_step;
    for (b, s, i) in izip!(&mut pt.begin, &mut pt.step, &mut pt.invstep) {
        *b = r2_start;
        *s = r2_step;
        *i = inv;
    }
    pt.end = end;
    pt.len = len;

    if radial {
        for col in 0..ncols {
            let delta = pt.at(npot - 1, col);
            if delta != 0.0 {
                info!(col, delta, "potential column shifted to zero at cutoff");
                for k in 0..npot {
                    *pt.at_mut(k, col) -= delta;
                }
            }
            *cellsz = cellsz.max(pt.end[col]);
        }
    }
    Ok(pt)
}

/// Format 2: per-column `begin end step` triples, then each column's
/// samples in one contiguous block.
fn read_body_format2(
    lines: &[&str],
    ncols: usize,
    radial: bool,
    cellsz: &mut f64,
) -> Result<PotentialTable, TableError> {
    let numbers = lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .map(|token| {
            token.parse::<f64>().map_err(|_| TableError::BadNumber {
                token: token.to_owned(),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;
    if numbers.len() < 3 * ncols {
        return Err(TableError::Truncated {
            expected: 3 * ncols,
            found: numbers.len(),
        });
    }

    let mut begin = vec![0.0; ncols];
    let mut end = vec![0.0; ncols];
    let mut step = vec![0.0; ncols];
    let mut len = vec![0usize; ncols];
    let mut maxsteps = 0;
    for (col, (b, e, s)) in numbers.iter().copied().tuples().take(ncols).enumerate() {
        if s <= 0.0 {
            return Err(TableError::BadStep { col });
        }
        if e < b {
            return Err(TableError::BadDomain { col });
        }
        // some security against rounding errors
        let numstep = 1.0 + (e - b) / s;
        let n = (numstep + 0.49) as usize;
        if (n as f64 - numstep).abs() >= 0.1 {
            warn!(col, numstep, rounded = n, "sample count rounded");
        }
        begin[col] = b;
        end[col] = e;
        step[col] = s;
        len[col] = n;
        maxsteps = maxsteps.max(n);
        if radial {
            *cellsz = cellsz.max(e);
        }
    }

    let total: usize = len.iter().sum();
    let available = numbers.len() - 3 * ncols;
    if available < total {
        return Err(TableError::Truncated {
            expected: total,
            found: available,
        });
    }

    let mut pt = PotentialTable::with_capacity(ncols, maxsteps);
    let mut cursor = numbers[3 * ncols..].iter();
    for col in 0..ncols {
        pt.set_column_info(col, begin[col], end[col], step[col], len[col]);
        for k in 0..len[col] {
            *pt.at_mut(k, col) = *cursor.next().expect("sample count checked above");
        }
    }

    if radial {
        for col in 0..ncols {
            let delta = pt.at(len[col] - 1, col);
            if delta != 0.0 {
                info!(col, delta, "potential column shifted to zero at cutoff");
                for k in 0..len[col] {
                    *pt.at_mut(k, col) -= delta;
                }
            }
        }
    }
    info!(maxsteps, "maximal length of table");
    Ok(pt)
}
