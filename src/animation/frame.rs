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

//! Module computing a single animation frame.
//!
//! A frame reads the hourly wind, moves it into the view, advects
//! the shared noise seed along it and places the cyclone tracks.
//! Frames share only read-only data, so any number of them can
//! be computed at once and in any order.

mod writer;

pub use writer::FrameFiles;

use crate::animation::environment::{FieldProvider, Grid, RotatedPole, Variable};
use crate::animation::noise::{NoiseFieldAdvector, NoiseSeed, SequenceClock};
use crate::animation::tracks::{TrackObservation, Tracks};
use crate::errors::FrameError;
use chrono::NaiveDateTime;
use log::debug;
use std::{path::PathBuf, sync::Arc};

const LAND_MASK_FILE: &str = "land_mask.csv";

/// Everything the frames need, shared between them.
pub struct FrameContext {
    pub provider: Box<dyn FieldProvider>,
    pub advector: NoiseFieldAdvector,
    pub seed: NoiseSeed,
    pub tracks: Tracks,
    pub wind_grid: Grid,
    pub pole: RotatedPole,

    /// Fields written next to the noise in each frame.
    pub layers: Vec<Variable>,

    /// Without the clock every frame shows the static texture.
    pub clock: Option<SequenceClock>,

    pub output_dir: PathBuf,
}

impl FrameContext {
    pub fn files(&self, datetime: NaiveDateTime) -> FrameFiles {
        FrameFiles::new(&self.output_dir, datetime)
    }
}

/// Computes the frame at `datetime` and writes it to the output directory.
pub fn render(
    datetime: NaiveDateTime,
    context: &Arc<FrameContext>,
) -> Result<FrameFiles, FrameError> {
    debug!("Rendering frame {}", datetime);

    let wind = context
        .provider
        .load_wind(datetime)?
        .regrid_rotated(&context.wind_grid, &context.pole)?;

    let sequence = context
        .clock
        .map(|clock| clock.sequence(datetime, context.advector.params().iterations));

    let noise = context.advector.advect(&wind, &context.seed, sequence)?;

    let placements = context.tracks.place(datetime)?;

    let trails = placements
        .current
        .keys()
        .chain(placements.fading_out.keys())
        .map(|tid| context.tracks.trail(tid, datetime))
        .collect::<Result<Vec<&[TrackObservation]>, _>>()?;

    let files = context.files(datetime);

    for &variable in &context.layers {
        let layer = context
            .provider
            .load(variable, datetime)?
            .regrid_rotated(&context.wind_grid, &context.pole)?;

        files.write_layer(variable, &layer)?;
    }

    files.write_tracks(&placements)?;
    files.write_trails(trails)?;
    files.write_noise(&noise)?;

    if placements.is_empty() {
        debug!("Frame {} finished with no cyclones placed", datetime);
    } else {
        debug!(
            "Frame {} finished with {} placed tracks",
            datetime,
            placements.len()
        );
    }

    Ok(files)
}

/// Writes the land-sea mask resampled onto the view grid.
///
/// The mask does not change between frames so it is written once
/// per run, values between `0` and `1` mark the coastline.
pub fn write_land_mask(context: &FrameContext) -> Result<PathBuf, FrameError> {
    let mask = context
        .provider
        .load_land_mask()?
        .regrid_rotated(&context.wind_grid, &context.pole)?;

    let file_path = context.output_dir.join(LAND_MASK_FILE);
    writer::write_raster(&file_path, &mask)?;

    Ok(file_path)
}
