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

//! Module containing the actual animation code.
//!
//! Frames are scheduled at a fixed step over the configured period
//! and rendered in parallel on a thread pool. Each frame consists of
//! the wind noise texture and the cyclone tracks placed at the frame
//! time (see [`frame::render`]). A frame that fails is reported and
//! skipped, the rest of the batch continues.

mod configuration;
mod environment;
mod frame;
mod noise;
mod tracks;


use crate::{
    animation::{
        configuration::{Config, Frames, Output},
        environment::{GribArchive, Grid},
        frame::FrameContext,
        noise::{NoiseFieldAdvector, NoiseSeed},
        tracks::{load_tracks, Tracks},
    },
    errors::AnimationError,
    ALLOCATOR,
};
use chrono::{Duration, NaiveDateTime};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    fs,
    path::Path,
    sync::{mpsc, Arc},
};

/// Main animation function, responsible for all rendering steps.
///
/// It reads the provided configuration and input data,
/// deploys frames onto the threadpool and checks for errors.
pub fn main() -> Result<(), AnimationError> {
    info!("Preparing the animation core");

    let core = Core::new(Path::new("config.yaml"))?;

    prepare_output_dir(&core.config.output)?;

    let context = Arc::new(prepare_context(&core.config)?);

    if core.config.input.land_mask {
        let mask_path = frame::write_land_mask(&context)?;
        info!("Land mask written to {}", mask_path.display());
    }

    let frames: Vec<NaiveDateTime> = prepare_frames_list(&core.config.frames)
        .into_iter()
        .filter(|datetime| !context.files(*datetime).is_complete())
        .collect();
    let frames_count = frames.len();

    info!("Rendering {} frames", frames_count);

    // set progress bar for rendered frames
    let frames_bar = ProgressBar::new(frames_count as u64);
    frames_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    frames_bar.set_prefix("Rendered frames");

    // deploy frames on to the threadpool
    let (tx, rx) = mpsc::channel();

    for datetime in frames {
        let tx = tx.clone();
        let context = Arc::clone(&context);

        core.threadpool.spawn(move || {
            let result = frame::render(datetime, &context).map_err(|err| (datetime, err));

            if tx.send(result).is_err() {
                error!("Result of frame {} could not be delivered", datetime);
            }
        });
    }

    // receive frames status
    let mut failed = 0;

    for _ in 0..frames_count {
        match rx.recv()? {
            Ok(files) => debug!("Frame written to {}", files.noise.display()),
            Err((datetime, err)) => {
                failed += 1;
                error!("Frame {} failed and was skipped: {}", datetime, err);
            }
        }
        frames_bar.inc(1);
    }

    frames_bar.finish_with_message("All frames finished");

    if failed > 0 {
        info!("{} of {} frames failed, rerun to retry them", failed, frames_count);
    }

    Ok(())
}

/// Structure containing the animation setup.
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
}

impl Core {
    /// Animation [`Core`] constructor.
    ///
    /// Before the rendering can start, the configuration must be
    /// loaded and checked and the resources limited accordingly.
    pub fn new(config_path: &Path) -> Result<Self, AnimationError> {
        debug!("Reading configuration from {}", config_path.display());
        let config = Config::new_from_file(config_path)?;

        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory.saturating_mul(1024 * 1024))
            .map_err(|_| AnimationError::MemoryLimit(config.resources.memory))?;

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .stack_size(2 * 1024 * 1024)
            .build()?;

        Ok(Core { config, threadpool })
    }
}

/// Loads and builds everything shared by frames.
fn prepare_context(config: &Config) -> Result<FrameContext, AnimationError> {
    let pole = config.view.pole();
    let (lat_extent, lon_extent) = config.view.extent();

    let wind_grid = Grid::regular(config.view.wind_resolution, lat_extent, lon_extent)?;
    let seed_grid = Grid::regular(config.noise.resolution, lat_extent, lon_extent)?;

    debug!("Preparing noise seed on {:?} grid", seed_grid.shape());
    let seed = match &config.noise.file {
        Some(file_path) => NoiseSeed::from_csv(file_path, seed_grid)?,
        None => NoiseSeed::random(seed_grid, config.noise.seed)?,
    };

    let tracks = match &config.input.tracks_file {
        Some(file_path) => load_tracks(file_path)?.rotated(&pole),
        None => Tracks::default(),
    };

    if tracks.is_empty() {
        info!("No cyclone tracks loaded, frames will show only fields");
    } else {
        info!("Loaded {} cyclone tracks", tracks.len());
    }

    let clock = if config.advection.static_texture {
        None
    } else {
        Some(config.advection.clock())
    };

    Ok(FrameContext {
        provider: Box::new(GribArchive::new(&config.input.data_dir)),
        advector: NoiseFieldAdvector::new(config.advection.params())?,
        seed,
        tracks,
        wind_grid,
        pole,
        layers: config.input.layers.clone(),
        clock,
        output_dir: config.output.directory.clone(),
    })
}

/// Checks that the output directory can be written to,
/// creating it when missing.
///
/// Unless resuming, the directory must be empty.
fn prepare_output_dir(output: &Output) -> Result<(), AnimationError> {
    debug!("Checking and setting output directory");

    let out_path = output.directory.as_path();

    if out_path.is_dir() {
        if out_path.read_dir()?.next().is_none() {
            debug!("Output directory exists but is empty so continuing");
        } else if output.resume {
            info!("Output directory is not empty, finished frames will be kept");
        } else {
            return Err(AnimationError::FaultyOutput(
                "Output directory exists and is not empty",
            ));
        }
    } else {
        debug!("Output directory does not exist so creating a new one");
        fs::create_dir_all(out_path)?;
    }

    Ok(())
}

/// Datetimes of all frames from start to end inclusive.
fn prepare_frames_list(frames: &Frames) -> Vec<NaiveDateTime> {
    let step = Duration::minutes(i64::from(frames.step_minutes));
    let mut datetimes = vec![];
    let mut datetime = frames.start;

    while datetime <= frames.end {
        datetimes.push(datetime);
        datetime += step;
    }

    datetimes
}
