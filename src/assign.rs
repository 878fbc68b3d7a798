//! Bipartite assignment between predicted tracks and the frame's detections.
//!
//! Square, sentinel-padded cost matrix solved with [`lapjv`], with gated
//! (infinite) pairs never selected. Adds a deterministic tie-break and a
//! time-budget fallback to a greedy assignment when matching runs long.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use ndarray::Array2;

use crate::config::TrackerConfig;
use crate::error::Degeneracy;

/// Large finite stand-in for a gated (`+inf`) cost; `lapjv` requires finite
/// input. Chosen far above any realistic real cost so it is never preferred
/// over a genuine pairing, while still being excluded by the
/// `is_finite`-on-the-original-matrix check below.
const SENTINEL_COST: f64 = 1.0e9;

/// Tie-break epsilon, scaled by `(row, col)` so that among equal-cost pairs
/// the lexicographically smallest `(row, col)` is always preferred, making
/// the assignment reproducible given the same inputs.
const TIE_BREAK_EPS: f64 = 1.0e-9;

#[derive(Debug, Clone)]
pub struct Assignment {
    /// `(track_row, detection_col)` pairs, ascending by `track_row`.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
    pub used_fallback: bool,
}

pub struct Assigner;

impl Assigner {
    /// `cost_matrix[[track_row, detection_col]]`; `+inf` marks a gated pair.
    pub fn assign(cost_matrix: &Array2<f64>, config: &TrackerConfig) -> Assignment {
        let (rows, cols) = cost_matrix.dim();
        if rows == 0 {
            return Assignment {
                matches: vec![],
                unmatched_tracks: vec![],
                unmatched_detections: (0..cols).collect(),
                used_fallback: false,
            };
        }
        if cols == 0 {
            return Assignment {
                matches: vec![],
                unmatched_tracks: (0..rows).collect(),
                unmatched_detections: vec![],
                used_fallback: false,
            };
        }

        let budget = config.assigner_timeout_micros;
        if budget == 0 {
            return Self::solve_exact(cost_matrix);
        }

        // Run the exact solve on a worker thread and cap how long we wait
        // on it, rather than always paying for the full solve and only
        // checking the clock afterward: that would make the configured
        // budget bound nothing but a log message. A timed-out solve keeps
        // running on its own thread and is discarded; the step proceeds
        // immediately with the greedy fallback.
        let matrix = cost_matrix.to_owned();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(Self::solve_exact(&matrix));
        });

        match rx.recv_timeout(Duration::from_micros(budget)) {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    reason = Degeneracy::AssignerTimeout.as_str(),
                    rows,
                    cols,
                    budget_micros = budget,
                    "matching exceeded time budget, falling back to greedy assignment"
                );
                Self::solve_greedy(cost_matrix)
            }
        }
    }

    fn solve_exact(cost_matrix: &Array2<f64>) -> Assignment {
        let (rows, cols) = cost_matrix.dim();
        let size = rows.max(cols);
        let mut padded = Array2::from_elem((size, size), SENTINEL_COST);
        for i in 0..rows {
            for j in 0..cols {
                let base = cost_matrix[[i, j]];
                let base = if base.is_finite() { base } else { SENTINEL_COST };
                padded[[i, j]] = base + TIE_BREAK_EPS * (i as f64 * cols as f64 + j as f64);
            }
        }

        match lapjv::lapjv(&padded) {
            Ok((row_to_col, _)) => Self::from_row_to_col(cost_matrix, &row_to_col, rows, cols, false),
            Err(_) => Self::solve_greedy(cost_matrix),
        }
    }

    fn from_row_to_col(
        cost_matrix: &Array2<f64>,
        row_to_col: &[usize],
        rows: usize,
        cols: usize,
        used_fallback: bool,
    ) -> Assignment {
        let mut matches = Vec::new();
        let mut unmatched_tracks = Vec::new();
        let mut matched_cols = vec![false; cols];

        for row in 0..rows {
            let col = row_to_col[row];
            if col < cols && cost_matrix[[row, col]].is_finite() {
                matches.push((row, col));
                matched_cols[col] = true;
            } else {
                unmatched_tracks.push(row);
            }
        }

        let unmatched_detections = (0..cols).filter(|&c| !matched_cols[c]).collect();

        Assignment {
            matches,
            unmatched_tracks,
            unmatched_detections,
            used_fallback,
        }
    }

    /// Sort all finite `(cost, row, col)` triples ascending and assign
    /// without reusing a row or column. Deterministic by construction since
    /// the sort key includes `(row, col)` as a tie-break.
    fn solve_greedy(cost_matrix: &Array2<f64>) -> Assignment {
        let (rows, cols) = cost_matrix.dim();
        let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
        for i in 0..rows {
            for j in 0..cols {
                let c = cost_matrix[[i, j]];
                if c.is_finite() {
                    candidates.push((c, i, j));
                }
            }
        }
        candidates.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap()
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let mut row_used = vec![false; rows];
        let mut col_used = vec![false; cols];
        let mut matches = Vec::new();
        for (_, row, col) in candidates {
            if !row_used[row] && !col_used[col] {
                row_used[row] = true;
                col_used[col] = true;
                matches.push((row, col));
            }
        }
        matches.sort_by_key(|&(row, _)| row);

        let unmatched_tracks = (0..rows).filter(|&r| !row_used[r]).collect();
        let unmatched_detections = (0..cols).filter(|&c| !col_used[c]).collect();

        Assignment {
            matches,
            unmatched_tracks,
            unmatched_detections,
            used_fallback: true,
        }
    }
}
