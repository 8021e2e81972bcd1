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

//! Sub-module writing the overlays of one frame to CSV files.
//!
//! Each frame produces three files named after the frame time:
//! `{stamp}_tracks.csv`, `{stamp}_trails.csv` and `{stamp}_noise.csv`,
//! plus `{stamp}_{variable}.csv` for each additional field.
//! The noise file is written last and through a temporary name,
//! so its presence marks a finished frame.

use crate::animation::environment::{ScalarField, Variable};
use crate::animation::tracks::{trail_segments, InterpolatedPoint, Placements, TrackObservation};
use crate::errors::FrameError;
use chrono::NaiveDateTime;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Names of the output files of one frame.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FrameFiles {
    pub noise: PathBuf,
    pub tracks: PathBuf,
    pub trails: PathBuf,
    stamp: String,
}

impl FrameFiles {
    pub fn new(output_dir: &Path, datetime: NaiveDateTime) -> Self {
        let stamp = datetime.format("%Y%m%d%H%M").to_string();

        FrameFiles {
            noise: output_dir.join(format!("{}_noise.csv", stamp)),
            tracks: output_dir.join(format!("{}_tracks.csv", stamp)),
            trails: output_dir.join(format!("{}_trails.csv", stamp)),
            stamp,
        }
    }

    /// Path of the raster of `variable` in this frame.
    pub fn layer(&self, variable: Variable) -> PathBuf {
        self.noise
            .with_file_name(format!("{}_{}.csv", self.stamp, variable.name()))
    }

    /// Checks if the frame has been completely written before.
    pub fn is_complete(&self) -> bool {
        self.noise.is_file()
    }

    pub fn write_tracks(&self, placements: &Placements) -> Result<(), FrameError> {
        let mut out_file = csv::Writer::from_path(&self.tracks)?;

        out_file.write_record(&[
            "bucket",
            "trackId",
            "dateTime",
            "longitude",
            "latitude",
            "mslp",
            "windSpeed",
            "opacity",
            "markerRadius",
            "timeOffsetSeconds",
            "label",
        ])?;

        let buckets = [
            ("current", &placements.current),
            ("fadingOut", &placements.fading_out),
            ("fadingIn", &placements.fading_in),
        ];

        for (bucket, points) in buckets {
            for point in points.values() {
                out_file.write_record(&placement_record(bucket, point))?;
            }
        }

        out_file.flush()?;

        Ok(())
    }

    /// Writes trail polylines, numbered within each track.
    pub fn write_trails<'a>(
        &self,
        trails: impl IntoIterator<Item = &'a [TrackObservation]>,
    ) -> Result<(), FrameError> {
        let mut out_file = csv::Writer::from_path(&self.trails)?;

        out_file.write_record(&[
            "trackId",
            "segment",
            "dateTime",
            "longitude",
            "latitude",
            "lineWidth",
        ])?;

        for trail in trails {
            for (segment, points) in trail_segments(trail).iter().enumerate() {
                for obs in points.iter() {
                    out_file.write_record(&[
                        obs.tid.clone(),
                        segment.to_string(),
                        obs.time.to_string(),
                        obs.lon.to_string(),
                        obs.lat.to_string(),
                        obs.trail_width().to_string(),
                    ])?;
                }
            }
        }

        out_file.flush()?;

        Ok(())
    }

    pub fn write_layer(&self, variable: Variable, field: &ScalarField) -> Result<(), FrameError> {
        write_raster(&self.layer(variable), field)
    }

    pub fn write_noise(&self, noise: &ScalarField) -> Result<(), FrameError> {
        let partial = self.noise.with_extension("csv.part");

        write_raster(&partial, noise)?;
        fs::rename(&partial, &self.noise)?;

        Ok(())
    }
}

/// Writes the raster as headerless CSV, one line
/// per latitude row from south to north.
pub fn write_raster(file_path: &Path, field: &ScalarField) -> Result<(), FrameError> {
    let mut out_file = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(file_path)?;

    for row in field.values().rows() {
        out_file.write_record(row.iter().map(|v| v.to_string()))?;
    }

    out_file.flush()?;

    Ok(())
}

fn placement_record(bucket: &str, point: &InterpolatedPoint) -> [String; 11] {
    let obs = &point.observation;

    [
        bucket.to_string(),
        obs.tid.clone(),
        obs.time.to_string(),
        obs.lon.to_string(),
        obs.lat.to_string(),
        obs.mslp.to_string(),
        obs.ws.to_string(),
        point.opacity().to_string(),
        obs.marker_radius().to_string(),
        point
            .time_offset
            .map(|offset| offset.num_seconds().to_string())
            .unwrap_or_default(),
        obs.label.clone().unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::FrameFiles;
    use crate::animation::environment::Variable;
    use crate::animation::tracks::tests::datetime;
    use std::path::{Path, PathBuf};

    #[test]
    fn frame_file_names() {
        let files = FrameFiles::new(Path::new("./output"), datetime(25, 6));

        assert_eq!(files.noise, PathBuf::from("./output/200508250600_noise.csv"));
        assert_eq!(files.tracks, PathBuf::from("./output/200508250600_tracks.csv"));
        assert_eq!(files.trails, PathBuf::from("./output/200508250600_trails.csv"));
        assert_eq!(
            files.layer(Variable::TotalPrecipitation),
            PathBuf::from("./output/200508250600_total_precipitation.csv")
        );
        assert!(!files.is_complete());
    }
}
