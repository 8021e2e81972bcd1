/*
Copyright 2021 Jakub Lewandowski

This file is part of Animated Hourly Reanalysis (AnimH).

Animated Hourly Reanalysis (AnimH) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Animated Hourly Reanalysis (AnimH) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Animated Hourly Reanalysis (AnimH). If not, see https://www.gnu.org/licenses/.
*/

//! Sub-module deciding which advection substeps
//! contribute to the output of each cell.
//!
//! Every cell gets a phase so that neighbouring cells show
//! different parts of their tracer paths, and the phase
//! shifts by one substep with each sequence number.

use crate::constants::PHASE_STRIDE;
use ndarray::Array2;
use std::cmp::Ordering;

/// Substeps `(start, end]`, wrapped around the number
/// of iterations, during which one cell is visible.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Phase {
    start: usize,
    end: usize,
}

impl Phase {
    pub fn contains(&self, substep: usize) -> bool {
        match self.start.cmp(&self.end) {
            Ordering::Less => self.start < substep && substep <= self.end,
            Ordering::Greater => substep > self.start || substep <= self.end,
            Ordering::Equal => false,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum VisibilityWindow {
    /// Every substep of every cell counts.
    Always,

    /// Per-cell phases for one sequence number.
    Rolling(Array2<Phase>),
}

impl VisibilityWindow {
    /// Computes phases of all cells for given `sequence`.
    ///
    /// Phases are tiled in row-major order from `0, 3, 6, ...`
    /// below `iterations`. Requires `window < iterations`.
    pub fn rolling(
        shape: (usize, usize),
        iterations: usize,
        window: usize,
        sequence: u64,
    ) -> Self {
        let offset = (sequence % iterations as u64) as usize;
        let tiles: Vec<usize> = (0..iterations).step_by(PHASE_STRIDE).collect();

        let phases = Array2::from_shape_fn(shape, |(i, j)| {
            let tile = tiles[(i * shape.1 + j) % tiles.len()];
            let end = (tile + offset) % iterations;
            let start = (end + iterations - window) % iterations;

            Phase { start, end }
        });

        VisibilityWindow::Rolling(phases)
    }

    pub fn is_visible(&self, cell: (usize, usize), substep: usize) -> bool {
        match self {
            VisibilityWindow::Always => true,
            VisibilityWindow::Rolling(phases) => phases[cell].contains(substep),
        }
    }
}
