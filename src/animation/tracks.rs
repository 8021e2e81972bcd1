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

//! Module handling the cyclone tracks drawn over the frames.
//!
//! Tracks are irregularly sampled in time, so to place a storm
//! on a frame its position and intensity are linearly interpolated
//! between the two bracketing observations. Storms that have just
//! ended or are about to start are drawn semi-transparent at their
//! last or first observation, fading over 12 hours.
//!
//! Nothing here mutates the loaded dataset, so one [`Tracks`]
//! is shared by all frames.

mod dataset;
mod interpolation;
mod placement;

pub use dataset::load_tracks;
pub use placement::Placements;

use crate::animation::environment::RotatedPole;
use crate::constants::{FADE_WINDOW_SECONDS, TRAIL_BREAK_LONGITUDE};
use crate::{errors::TrackError, Float};
use chrono::{Duration, NaiveDateTime};
use rustc_hash::FxHashMap;

/// Brings longitude (in degrees) into `(-180, 180]`.
///
/// Values already in the range are returned unchanged.
pub fn normalize_longitude(lon: Float) -> Float {
    if lon > -180.0 && lon <= 180.0 {
        return lon;
    }

    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;

    if wrapped <= -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Single row of the track dataset.
#[derive(Clone, PartialEq, Debug)]
pub struct TrackObservation {
    pub tid: String,
    pub time: NaiveDateTime,
    pub lon: Float,
    pub lat: Float,

    /// Mean sea-level pressure.
    pub mslp: Float,

    /// Maximum wind speed.
    pub ws: Float,

    pub tropical_flag: Option<Float>,
    pub transition_zone: Option<Float>,
    pub label: Option<String>,
}

impl TrackObservation {
    /// Radius (in display degrees) of the storm marker.
    pub fn marker_radius(&self) -> Float {
        self.ws.max(0.0).sqrt() / 5.0 * 2.0
    }

    /// Width (in display degrees) of the trail line.
    pub fn trail_width(&self) -> Float {
        self.ws.max(0.0).sqrt() / 2.0 * 2.0
    }
}

/// Observation synthesized for a given frame time.
///
/// Fade placements carry `time_offset`, the distance
/// between the frame time and the observation they show.
#[derive(Clone, PartialEq, Debug)]
pub struct InterpolatedPoint {
    pub observation: TrackObservation,
    pub time_offset: Option<Duration>,
}

impl InterpolatedPoint {
    /// Opacity of the marker, linearly fading over 12 hours.
    pub fn opacity(&self) -> Float {
        match self.time_offset {
            Some(offset) => {
                1.0 - offset.num_milliseconds() as Float / (FADE_WINDOW_SECONDS * 1000) as Float
            }
            None => 1.0,
        }
    }
}

/// Time-ordered observations of one storm.
#[derive(Clone, PartialEq, Debug)]
pub struct Track {
    tid: String,
    observations: Vec<TrackObservation>,
}

impl Track {
    /// Track constructor, checking that all observations share
    /// one id and are strictly increasing in time.
    pub fn new(observations: Vec<TrackObservation>) -> Result<Self, TrackError> {
        let tid = observations
            .first()
            .ok_or(TrackError::EmptyTrack)?
            .tid
            .clone();

        let consistent = observations.iter().all(|obs| obs.tid == tid)
            && observations.windows(2).all(|w| w[0].time < w[1].time);

        if !consistent {
            return Err(TrackError::NotIncreasing(tid));
        }

        Ok(Track { tid, observations })
    }

    pub fn tid(&self) -> &str {
        &self.tid
    }

    pub fn observations(&self) -> &[TrackObservation] {
        &self.observations
    }

    pub fn first_time(&self) -> NaiveDateTime {
        self.observations[0].time
    }

    pub fn last_time(&self) -> NaiveDateTime {
        self.observations[self.observations.len() - 1].time
    }

    /// Checks if `datetime` lies between the first and last observation.
    pub fn covers(&self, datetime: NaiveDateTime) -> bool {
        self.first_time() <= datetime && datetime <= self.last_time()
    }

    /// Observations not later than `datetime`, in time order.
    pub fn trail(&self, datetime: NaiveDateTime) -> &[TrackObservation] {
        let end = self.observations.partition_point(|obs| obs.time <= datetime);

        &self.observations[..end]
    }
}

/// All tracks of the dataset, by track id.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Tracks {
    tracks: FxHashMap<String, Track>,
}

impl Tracks {
    pub fn new(tracks: Vec<Track>) -> Self {
        Tracks {
            tracks: tracks
                .into_iter()
                .map(|track| (track.tid.clone(), track))
                .collect(),
        }
    }

    pub fn get(&self, tid: &str) -> Option<&Track> {
        self.tracks.get(tid)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Trail of track `tid` up to `datetime`.
    pub fn trail(
        &self,
        tid: &str,
        datetime: NaiveDateTime,
    ) -> Result<&[TrackObservation], TrackError> {
        self.get(tid)
            .map(|track| track.trail(datetime))
            .ok_or_else(|| TrackError::UnknownTrack(tid.to_string()))
    }

    /// Moves all observations into the rotated frame of `pole`.
    pub fn rotated(mut self, pole: &RotatedPole) -> Self {
        for track in self.tracks.values_mut() {
            for obs in &mut track.observations {
                let (lon, lat) = pole.rotate(obs.lon, obs.lat);
                obs.lon = lon;
                obs.lat = lat;
            }
        }

        self
    }
}

/// Splits the trail into polylines that do not cross the date line.
pub fn trail_segments(trail: &[TrackObservation]) -> Vec<&[TrackObservation]> {
    if trail.is_empty() {
        return vec![];
    }

    let mut segments = vec![];
    let mut start = 0;

    for (i, pair) in trail.windows(2).enumerate() {
        if (pair[1].lon - pair[0].lon).abs() > TRAIL_BREAK_LONGITUDE {
            segments.push(&trail[start..=i]);
            start = i + 1;
        }
    }

    segments.push(&trail[start..]);

    segments
}
