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

//! Sub-module with linear interpolation of track observations in time.

use super::{normalize_longitude, InterpolatedPoint, Track, TrackObservation};
use crate::{errors::TrackError, Float};
use chrono::NaiveDateTime;

impl Track {
    /// Observation interpolated to `datetime`.
    ///
    /// Returns `None` when `datetime` is outside the track span.
    /// An observation exactly at `datetime` is returned as is.
    pub fn interpolate(
        &self,
        datetime: NaiveDateTime,
    ) -> Result<Option<InterpolatedPoint>, TrackError> {
        let split = self
            .observations
            .partition_point(|obs| obs.time <= datetime);

        let before = match split.checked_sub(1) {
            Some(i) => &self.observations[i],
            None => return Ok(None),
        };

        if before.time == datetime {
            return Ok(Some(InterpolatedPoint {
                observation: before.clone(),
                time_offset: None,
            }));
        }

        let after = match self.observations.get(split) {
            Some(after) => after,
            None => return Ok(None),
        };

        Ok(Some(InterpolatedPoint {
            observation: interpolate_between(before, after, datetime)?,
            time_offset: None,
        }))
    }
}

/// Linearly interpolates every numeric field of two observations
/// to `datetime`, taking the shorter way across the date line.
///
/// Flags are interpolated only when both observations have them.
/// Track id and label come from `before`. Inputs are left untouched.
pub fn interpolate_between(
    before: &TrackObservation,
    after: &TrackObservation,
    datetime: NaiveDateTime,
) -> Result<TrackObservation, TrackError> {
    let span = (after.time - before.time).num_milliseconds();

    if span == 0 {
        return Err(TrackError::DegenerateInterval {
            tid: before.tid.clone(),
            time: before.time,
        });
    }

    let fraction = (datetime - before.time).num_milliseconds() as Float / span as Float;
    let lerp = |a: Float, b: Float| a + (b - a) * fraction;

    let mut lon_delta = after.lon - before.lon;
    if lon_delta > 180.0 {
        lon_delta -= 360.0;
    } else if lon_delta < -180.0 {
        lon_delta += 360.0;
    }

    let flag = |a: Option<Float>, b: Option<Float>| match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b)),
        _ => None,
    };

    Ok(TrackObservation {
        tid: before.tid.clone(),
        time: datetime,
        lon: normalize_longitude(before.lon + lon_delta * fraction),
        lat: lerp(before.lat, after.lat),
        mslp: lerp(before.mslp, after.mslp),
        ws: lerp(before.ws, after.ws),
        tropical_flag: flag(before.tropical_flag, after.tropical_flag),
        transition_zone: flag(before.transition_zone, after.transition_zone),
        label: before.label.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::interpolate_between;
    use crate::animation::tracks::tests::{datetime, observation};
    use crate::animation::tracks::Track;
    use crate::errors::TrackError;
    use chrono::Duration;
    use float_cmp::approx_eq;

    fn track() -> Track {
        let mut later = observation("A", datetime(2, 6), 30.0, 20.0);
        later.mslp = 960.0;
        later.ws = 45.0;
        later.transition_zone = Some(1.0);

        Track::new(vec![
            observation("A", datetime(2, 0), 10.0, 10.0),
            later,
            observation("A", datetime(2, 18), 40.0, 22.0),
        ])
        .unwrap()
    }

    #[test]
    fn boundary_exactness() {
        let track = track();

        for obs in track.observations() {
            let point = track.interpolate(obs.time).unwrap().unwrap();

            assert_eq!(&point.observation, obs);
            assert_eq!(point.time_offset, None);
        }
    }

    #[test]
    fn outside_span() {
        let track = track();

        assert_eq!(
            track.interpolate(datetime(2, 0) - Duration::seconds(1)),
            Ok(None)
        );
        assert_eq!(
            track.interpolate(datetime(2, 18) + Duration::seconds(1)),
            Ok(None)
        );
    }

    #[test]
    fn linear_fields() {
        let track = track();

        let point = track.interpolate(datetime(2, 3)).unwrap().unwrap().observation;

        assert_eq!(point.time, datetime(2, 3));
        assert!(approx_eq!(f64, point.lon, 20.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, point.lat, 15.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, point.mslp, 980.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, point.ws, 35.0, epsilon = 1e-12));
        assert_eq!(point.tropical_flag, Some(1.0));
        assert_eq!(point.transition_zone, None);
    }

    #[test]
    fn monotonic_within_bracket() {
        let track = track();
        let mut previous = (10.0, 10.0);

        for minutes in (15..360).step_by(15) {
            let time = datetime(2, 0) + Duration::minutes(minutes);
            let point = track.interpolate(time).unwrap().unwrap().observation;

            assert!(point.lon > previous.0 && point.lat > previous.1);
            assert!(point.lon < 30.0 && point.lat < 20.0);
            previous = (point.lon, point.lat);
        }
    }

    #[test]
    fn date_line_midpoint() {
        let before = observation("A", datetime(3, 0), 170.0, 30.0);
        let after = observation("A", datetime(3, 12), -170.0, 32.0);

        let mid = interpolate_between(&before, &after, datetime(3, 6)).unwrap();
        assert!(approx_eq!(f64, mid.lon.abs(), 180.0, epsilon = 1e-9));

        let quarter = interpolate_between(&before, &after, datetime(3, 3)).unwrap();
        assert!(approx_eq!(f64, quarter.lon, 175.0, epsilon = 1e-9));

        let late = interpolate_between(&before, &after, datetime(3, 9)).unwrap();
        assert!(approx_eq!(f64, late.lon, -175.0, epsilon = 1e-9));

        // repeated use of the same pair gives the same answer
        let again = interpolate_between(&before, &after, datetime(3, 6)).unwrap();
        assert_eq!(mid, again);
        assert_eq!(before.lon, 170.0);
        assert_eq!(after.lon, -170.0);
    }

    #[test]
    fn degenerate_interval() {
        let before = observation("A", datetime(3, 0), 0.0, 0.0);
        let after = observation("A", datetime(3, 0), 1.0, 0.0);

        assert_eq!(
            interpolate_between(&before, &after, datetime(3, 0)),
            Err(TrackError::DegenerateInterval {
                tid: "A".to_string(),
                time: datetime(3, 0)
            })
        );
    }
}
