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

//! Module containing constants used by the animation.

use crate::Float;

/// Length (in seconds) of the window in which tracks
/// that have just ended or are about to start are still drawn.
pub const FADE_WINDOW_SECONDS: i64 = 12 * 3600;

/// Longitude jump (in degrees) between consecutive trail points
/// above which the segment is treated as a date-line crossing.
pub const TRAIL_BREAK_LONGITUDE: Float = 90.0;

/// Stride of per-cell phases in the advection visibility window.
pub const PHASE_STRIDE: usize = 3;

///Default number of advection substeps
pub const DEFAULT_ITERATIONS: usize = 50;

///Default displacement scale of one advection substep
pub const DEFAULT_STEP_SIZE: Float = 0.003;

///Default number of visible substeps for a single cell
pub const DEFAULT_VISIBILITY_WINDOW: usize = 25;

///Default normalisation of the advected contribution
pub const DEFAULT_SCALE: Float = 1.0;

/// Format of timestamps in the track dataset.
pub const TRACK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
