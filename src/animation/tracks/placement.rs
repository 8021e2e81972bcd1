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

//! Sub-module sorting tracks into what is drawn on a frame.

use super::{InterpolatedPoint, Track, Tracks};
use crate::{constants::FADE_WINDOW_SECONDS, errors::TrackError};
use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;

/// Tracks placed on one frame, by track id.
///
/// A track lands in at most one of the buckets.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Placements {
    /// Tracks active at the frame time.
    pub current: BTreeMap<String, InterpolatedPoint>,

    /// Tracks that ended less than 12 hours before the frame,
    /// shown at their last observation.
    pub fading_out: BTreeMap<String, InterpolatedPoint>,

    /// Tracks that start less than 12 hours after the frame,
    /// shown at their first observation.
    pub fading_in: BTreeMap<String, InterpolatedPoint>,
}

impl Placements {
    pub fn len(&self) -> usize {
        self.current.len() + self.fading_out.len() + self.fading_in.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Track {
    /// Marker shown `offset` away from the frame, if still inside the fade window.
    fn fade_point(&self, index: usize, offset: Duration) -> Option<InterpolatedPoint> {
        if offset <= Duration::zero() || offset >= Duration::seconds(FADE_WINDOW_SECONDS) {
            return None;
        }

        Some(InterpolatedPoint {
            observation: self.observations[index].clone(),
            time_offset: Some(offset),
        })
    }
}

impl Tracks {
    /// Places every track on the frame at `datetime`.
    pub fn place(&self, datetime: NaiveDateTime) -> Result<Placements, TrackError> {
        let mut placements = Placements::default();

        for track in self.iter() {
            let tid = track.tid().to_string();

            if track.covers(datetime) {
                if let Some(point) = track.interpolate(datetime)? {
                    placements.current.insert(tid, point);
                }
            } else if datetime > track.last_time() {
                let last = track.observations().len() - 1;

                if let Some(point) = track.fade_point(last, datetime - track.last_time()) {
                    placements.fading_out.insert(tid, point);
                }
            } else if let Some(point) = track.fade_point(0, track.first_time() - datetime) {
                placements.fading_in.insert(tid, point);
            }
        }

        Ok(placements)
    }
}

#[cfg(test)]
mod tests {
    use crate::animation::tracks::tests::{datetime, observation};
    use crate::animation::tracks::{Track, Tracks};
    use chrono::Duration;
    use float_cmp::approx_eq;

    fn single(start_hour: u32, end_hour: u32) -> Tracks {
        Tracks::new(vec![Track::new(vec![
            observation("A", datetime(10, start_hour), 0.0, 0.0),
            observation("A", datetime(10, end_hour), 2.0, 1.0),
        ])
        .unwrap()])
    }

    #[test]
    fn fade_out_window() {
        let tracks = single(0, 6);

        let expired = tracks
            .place(datetime(10, 18) + Duration::seconds(1))
            .unwrap();
        assert!(expired.is_empty());

        let boundary = tracks.place(datetime(10, 18)).unwrap();
        assert!(boundary.is_empty());

        let fading = tracks.place(datetime(10, 17)).unwrap();
        let point = &fading.fading_out["A"];

        assert_eq!(point.time_offset, Some(Duration::hours(11)));
        assert!(approx_eq!(f64, point.opacity(), 1.0 / 12.0, epsilon = 1e-12));
        assert_eq!(point.observation.time, datetime(10, 6));
        assert!(fading.current.is_empty() && fading.fading_in.is_empty());
    }

    #[test]
    fn fade_in_window() {
        let tracks = single(12, 18);

        let point = &tracks.place(datetime(10, 9)).unwrap().fading_in["A"];
        assert_eq!(point.time_offset, Some(Duration::hours(3)));
        assert!(approx_eq!(f64, point.opacity(), 0.75, epsilon = 1e-12));
        assert_eq!(point.observation.time, datetime(10, 12));

        assert!(tracks.place(datetime(9, 23)).unwrap().is_empty());
    }

    #[test]
    fn current_covers_both_ends() {
        let tracks = single(0, 6);

        for hour in [0, 3, 6] {
            let placements = tracks.place(datetime(10, hour)).unwrap();
            let point = &placements.current["A"];

            assert_eq!(placements.len(), 1);
            assert_eq!(point.opacity(), 1.0);
            assert_eq!(point.observation.time, datetime(10, hour));
        }
    }
}
