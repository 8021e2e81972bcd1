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

use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnimationError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Error while loading cyclone tracks: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Error while preparing the noise seed: {0}")]
    Noise(#[from] AdvectionError),

    #[error("Error while setting up the view grids: {0}")]
    Grid(#[from] GridError),

    #[error("Error while writing the land mask: {0}")]
    LandMask(#[from] FrameError),

    #[error("Error while handling output directory: {0}")]
    Output(#[from] std::io::Error),

    #[error("Error while preparing output: {0}")]
    FaultyOutput(&'static str),

    #[error("Cannot set memory limit of {0} MB")]
    MemoryLimit(usize),

    #[error("Frame results channel closed unexpectedly: {0}")]
    Channel(#[from] std::sync::mpsc::RecvError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),
}

/// Errors raised while parsing the cyclone track dataset.
///
/// Any of them aborts the whole load, a partially read
/// dataset is never returned.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Cannot read the tracks file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unparsable timestamp {value:?} in row {row}: {source}")]
    Timestamp {
        row: usize,
        value: String,
        source: chrono::ParseError,
    },

    #[error("Column {column} in row {row} is not a finite number: {value}")]
    NonFinite {
        row: usize,
        column: &'static str,
        value: f64,
    },

    #[error("Track {tid} is not strictly increasing in time at row {row}")]
    UnorderedTrack { tid: String, row: usize },
}

#[derive(Error, Debug, PartialEq)]
pub enum TrackError {
    #[error("Observations of track {tid} bracketing {time} share the same timestamp")]
    DegenerateInterval { tid: String, time: NaiveDateTime },

    #[error("There is no track with id {0}")]
    UnknownTrack(String),

    #[error("Track must contain at least one observation")]
    EmptyTrack,

    #[error("Observations of track {0} are not strictly increasing in time or mix track ids")]
    NotIncreasing(String),
}

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Requested data is missing: {0}")]
    MissingData(String),

    #[error("Error while reading GRIB: {0}")]
    Grib(#[from] eccodes::errors::CodesError),

    #[error("GRIB key {0} has unexpected type")]
    IncorrectKeyType(&'static str),

    #[error("Cannot shape GRIB values into a grid: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Input grid is not usable: {0}")]
    Grid(#[from] GridError),
}

#[derive(Error, Debug, PartialEq)]
pub enum GridError {
    #[error("Grid axis needs at least two points")]
    TooFewPoints,

    #[error("Grid axis must be strictly ascending and finite")]
    NotAscending,

    #[error("Array of shape {found:?} does not match grid of shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Grid resolution must be positive and finite")]
    IncorrectResolution,

    #[error("Cannot locate point on grid axis: {0}")]
    Search(#[from] SearchError),
}

#[derive(Error, Debug, PartialEq)]
pub enum SearchError {
    #[error("Searched value is out of array bounds")]
    OutOfBounds,

    #[error("Searched array is empty")]
    EmptyArray,
}

#[derive(Error, Debug)]
pub enum AdvectionError {
    #[error("Advection parameters are incorrect: {0}")]
    IncorrectParams(&'static str),

    #[error("Cannot read the noise seed file: {0}")]
    SeedFile(#[from] csv::Error),

    #[error("Noise seed file is not a rectangular raster matching its grid")]
    SeedShape,

    #[error("Noise seed grid is not usable: {0}")]
    Grid(#[from] GridError),
}

/// Errors ending the processing of a single frame.
///
/// The batch driver logs them and moves on to the next frame.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("{0}")]
    Environment(#[from] EnvironmentError),

    #[error("{0}")]
    Advection(#[from] AdvectionError),

    #[error("{0}")]
    Track(#[from] TrackError),

    #[error("{0}")]
    Grid(#[from] GridError),

    #[error("Cannot write frame output: {0}")]
    Output(#[from] csv::Error),

    #[error("Cannot flush frame output: {0}")]
    Io(#[from] std::io::Error),
}
