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

//! Module responsible for parsing and checking the configuration file.
//!
//! The configuration file uses [YAML](https://en.wikipedia.org/wiki/YAML)
//! and `serde` to enforce strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use crate::animation::environment::{RotatedPole, Variable};
use crate::animation::noise::{AdvectionParams, SequenceClock};
use crate::constants::{
    DEFAULT_ITERATIONS, DEFAULT_SCALE, DEFAULT_STEP_SIZE, DEFAULT_VISIBILITY_WINDOW,
};
use crate::errors::ConfigError;
use crate::Float;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Fields with information about rendered frames.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Frames {
    /// Datetime of the first frame.
    pub start: NaiveDateTime,

    /// Datetime of the last frame. Cannot be earlier than `start`.
    pub end: NaiveDateTime,

    /// _(Optional)_ Time between consecutive frames in minutes.
    ///
    /// Defaults to `15`. Cannot be less than `1`.
    #[serde(default = "Frames::default_step_minutes")]
    pub step_minutes: u32,
}

impl Frames {
    fn default_step_minutes() -> u32 {
        15
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.end < self.start {
            return Err(ConfigError::OutOfBounds(
                "Last frame cannot be earlier than the first one",
            ));
        }

        if self.step_minutes < 1 {
            return Err(ConfigError::OutOfBounds(
                "Frame step cannot be shorter than 1 minute",
            ));
        }

        Ok(())
    }
}

/// _(Optional)_ Fields describing the rotated-pole view of frames.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct View {
    /// _(Optional)_ Longitude of the rotated pole. Defaults to `180`.
    #[serde(default = "View::default_pole_longitude")]
    pub pole_longitude: Float,

    /// _(Optional)_ Latitude of the rotated pole. Defaults to `90`.
    ///
    /// Must meet the condition: `-90 <= pole_latitude <= 90`
    #[serde(default = "View::default_pole_latitude")]
    pub pole_latitude: Float,

    /// _(Optional)_ Longitude shift of the view centre
    /// along the rotated equator. Defaults to `0`.
    #[serde(default)]
    pub npg_longitude: Float,

    /// _(Optional)_ Zoom of the view, the frame covers
    /// `±180/zoom` degrees of rotated longitude and `±90/zoom` of latitude.
    ///
    /// Defaults to `1`. Cannot be less than `1`.
    #[serde(default = "View::default_zoom")]
    pub zoom: Float,

    /// _(Optional)_ Resolution (in degrees) of the grid on which
    /// wind and the advected noise are computed.
    ///
    /// Defaults to `0.2`. Must be positive.
    #[serde(default = "View::default_wind_resolution")]
    pub wind_resolution: Float,
}

impl View {
    fn default_pole_longitude() -> Float {
        180.0
    }

    fn default_pole_latitude() -> Float {
        90.0
    }

    fn default_zoom() -> Float {
        1.0
    }

    fn default_wind_resolution() -> Float {
        0.2
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.pole_latitude) {
            return Err(ConfigError::OutOfBounds(
                "Pole latitude is too low or too high",
            ));
        }

        if !self.pole_longitude.is_finite() || !self.npg_longitude.is_finite() {
            return Err(ConfigError::OutOfBounds("View longitudes must be finite"));
        }

        if !(self.zoom >= 1.0 && self.zoom.is_finite()) {
            return Err(ConfigError::OutOfBounds("Zoom cannot be less than 1"));
        }

        if !(self.wind_resolution > 0.0 && self.wind_resolution.is_finite()) {
            return Err(ConfigError::OutOfBounds(
                "Wind grid resolution must be positive",
            ));
        }

        Ok(())
    }

    pub fn pole(&self) -> RotatedPole {
        RotatedPole::new(self.pole_longitude, self.pole_latitude, self.npg_longitude)
    }

    /// Latitude and longitude extent of the view in rotated degrees.
    pub fn extent(&self) -> ((Float, Float), (Float, Float)) {
        (
            (-90.0 / self.zoom, 90.0 / self.zoom),
            (-180.0 / self.zoom, 180.0 / self.zoom),
        )
    }
}

impl Default for View {
    fn default() -> Self {
        View {
            pole_longitude: View::default_pole_longitude(),
            pole_latitude: View::default_pole_latitude(),
            npg_longitude: 0.0,
            zoom: View::default_zoom(),
            wind_resolution: View::default_wind_resolution(),
        }
    }
}

/// _(Optional)_ Fields with parameters of the noise advection.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Advection {
    /// _(Optional)_ Number of advection substeps. Defaults to `50`.
    #[serde(default = "Advection::default_iterations")]
    pub iterations: usize,

    /// _(Optional)_ Displacement of one substep per unit of wind.
    /// Defaults to `0.003`.
    #[serde(default = "Advection::default_step_size")]
    pub step_size: Float,

    /// _(Optional)_ Number of substeps visible in one frame.
    ///
    /// Defaults to `25`. Must be less than `iterations`.
    #[serde(default = "Advection::default_visibility_window")]
    pub visibility_window: usize,

    /// _(Optional)_ Divisor of the advected contribution. Defaults to `1`.
    #[serde(default = "Advection::default_scale")]
    pub scale: Float,

    /// _(Optional)_ Sequence numbers per hour of frame time.
    /// Defaults to `5`.
    #[serde(default = "Advection::default_sequence_rate")]
    pub sequence_rate: Float,

    /// _(Optional)_ Datetime of sequence number zero.
    /// Defaults to `2000-01-01T00:00:00`.
    #[serde(default = "Advection::default_sequence_epoch")]
    pub sequence_epoch: NaiveDateTime,

    /// _(Optional)_ When `true` every frame shows all substeps
    /// and the texture does not flow. Defaults to `false`.
    #[serde(default)]
    pub static_texture: bool,
}

impl Advection {
    fn default_iterations() -> usize {
        DEFAULT_ITERATIONS
    }

    fn default_step_size() -> Float {
        DEFAULT_STEP_SIZE
    }

    fn default_visibility_window() -> usize {
        DEFAULT_VISIBILITY_WINDOW
    }

    fn default_scale() -> Float {
        DEFAULT_SCALE
    }

    fn default_sequence_rate() -> Float {
        5.0
    }

    fn default_sequence_epoch() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MIN)
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.params().check_bounds().is_err() {
            return Err(ConfigError::OutOfBounds(
                "Advection needs iterations > visibility_window, a non-zero scale and finite step",
            ));
        }

        if !(self.sequence_rate > 0.0 && self.sequence_rate.is_finite()) {
            return Err(ConfigError::OutOfBounds("Sequence rate must be positive"));
        }

        Ok(())
    }

    pub fn params(&self) -> AdvectionParams {
        AdvectionParams {
            iterations: self.iterations,
            step_size: self.step_size,
            visibility_window: self.visibility_window,
            scale: self.scale,
        }
    }

    pub fn clock(&self) -> SequenceClock {
        SequenceClock {
            epoch: self.sequence_epoch,
            rate: self.sequence_rate,
        }
    }
}

impl Default for Advection {
    fn default() -> Self {
        Advection {
            iterations: Advection::default_iterations(),
            step_size: Advection::default_step_size(),
            visibility_window: Advection::default_visibility_window(),
            scale: Advection::default_scale(),
            sequence_rate: Advection::default_sequence_rate(),
            sequence_epoch: Advection::default_sequence_epoch(),
            static_texture: false,
        }
    }
}

/// _(Optional)_ Fields describing the static noise seed.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Noise {
    /// _(Optional)_ Resolution (in degrees) of the random seed grid
    /// covering the view. Defaults to `0.1`. Must be positive.
    #[serde(default = "Noise::default_resolution")]
    pub resolution: Float,

    /// _(Optional)_ Seed of the random generator. Defaults to `0`.
    #[serde(default)]
    pub seed: u64,

    /// _(Optional)_ Headerless CSV raster used instead of random noise.
    /// It must have one line per latitude of the seed grid.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Noise {
    fn default_resolution() -> Float {
        0.1
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(self.resolution > 0.0 && self.resolution.is_finite()) {
            return Err(ConfigError::OutOfBounds(
                "Noise grid resolution must be positive",
            ));
        }

        Ok(())
    }
}

impl Default for Noise {
    fn default() -> Self {
        Noise {
            resolution: Noise::default_resolution(),
            seed: 0,
            file: None,
        }
    }
}

/// Fields with information about input data.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Input {
    /// Root of the GRIB archive with hourly fields,
    /// laid out as `{data_dir}/{YYYY}/{MM}/{variable}.grib`.
    pub data_dir: PathBuf,

    /// _(Optional)_ CSV dataset of cyclone tracks.
    /// Without it frames have no tracks.
    #[serde(default)]
    pub tracks_file: Option<PathBuf>,

    /// _(Optional)_ Additional hourly fields written with each frame,
    /// named as in the archive (`total_precipitation`, `2m_temperature`).
    /// Defaults to none.
    #[serde(default)]
    pub layers: Vec<Variable>,

    /// _(Optional)_ When `true` the land-sea mask is read from
    /// `{data_dir}/land_mask.grib` and written once for the view.
    /// Defaults to `false`.
    #[serde(default)]
    pub land_mask: bool,
}

/// Fields with information about output.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Output {
    /// Directory to which frames are written.
    pub directory: PathBuf,

    /// _(Optional)_ When `true` frames already present in
    /// the output directory are kept and not recomputed.
    /// Otherwise the directory must be empty. Defaults to `false`.
    #[serde(default)]
    pub resume: bool,
}

/// _(Optional)_ Fields with information about
/// resources available for the program.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Number of frames rendered in parallel.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,

    /// _(Optional)_ Heap memory limit in MB.
    /// Useful for enabling meaningful Out-of-memory error messages.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space.
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if thread count and memory limit are
    /// above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Config {
    pub frames: Frames,

    #[serde(default)]
    pub view: View,

    #[serde(default)]
    pub advection: Advection,

    #[serde(default)]
    pub noise: Noise,

    pub input: Input,

    pub output: Output,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        Config::new_from_slice(data.as_slice())
    }

    fn new_from_slice(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        config.frames.check_bounds()?;
        config.view.check_bounds()?;
        config.advection.check_bounds()?;
        config.noise.check_bounds()?;
        config.resources.check_bounds()?;

        Ok(config)
    }
}
