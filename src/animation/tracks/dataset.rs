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

//! Sub-module reading the cyclone track dataset.
//!
//! The dataset is a CSV file with a header and one row per observation.
//! Required columns are `TID`, `ISOTIME`, `LON`, `LAT`, `MSLP` and `WS`.
//! Columns `Tropical_Flag`, `Transition_Zone` and `Short_Label` are
//! optional and unparsable or non-finite flag values are read as absent.
//!
//! Any malformed row aborts the whole load.

use super::{normalize_longitude, Track, TrackObservation, Tracks};
use crate::{constants::TRACK_TIME_FORMAT, errors::DatasetError, Float};
use chrono::NaiveDateTime;
use log::debug;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct TrackRecord {
    #[serde(rename = "TID")]
    tid: String,

    #[serde(rename = "ISOTIME")]
    isotime: String,

    #[serde(rename = "LON")]
    lon: Float,

    #[serde(rename = "LAT")]
    lat: Float,

    #[serde(rename = "MSLP")]
    mslp: Float,

    #[serde(rename = "WS")]
    ws: Float,

    #[serde(
        rename = "Tropical_Flag",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    tropical_flag: Option<Float>,

    #[serde(
        rename = "Transition_Zone",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    transition_zone: Option<Float>,

    #[serde(rename = "Short_Label", default)]
    short_label: Option<String>,
}

/// Reads all tracks from the dataset at `file_path`,
/// grouping rows by track id in file order.
pub fn load_tracks(file_path: &Path) -> Result<Tracks, DatasetError> {
    debug!("Reading cyclone tracks from {}", file_path.display());

    let reader = csv::Reader::from_path(file_path)?;
    read_tracks(reader)
}

fn read_tracks<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Tracks, DatasetError> {
    let mut grouped: FxHashMap<String, Vec<TrackObservation>> = FxHashMap::default();

    for (index, record) in reader.deserialize::<TrackRecord>().enumerate() {
        let row = index + 1;
        let observation = to_observation(record?, row)?;

        let track = grouped.entry(observation.tid.clone()).or_default();

        if let Some(previous) = track.last() {
            if previous.time >= observation.time {
                return Err(DatasetError::UnorderedTrack {
                    tid: observation.tid,
                    row,
                });
            }
        }

        track.push(observation);
    }

    let tracks: Vec<Track> = grouped
        .into_values()
        .map(|observations| {
            let tid = observations[0].tid.clone();
            Track { tid, observations }
        })
        .collect();

    debug!("Read {} cyclone tracks", tracks.len());

    Ok(Tracks::new(tracks))
}

fn to_observation(record: TrackRecord, row: usize) -> Result<TrackObservation, DatasetError> {
    let time = NaiveDateTime::parse_from_str(record.isotime.trim(), TRACK_TIME_FORMAT).map_err(
        |source| DatasetError::Timestamp {
            row,
            value: record.isotime.clone(),
            source,
        },
    )?;

    let finite = |column: &'static str, value: Float| {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DatasetError::NonFinite { row, column, value })
        }
    };

    Ok(TrackObservation {
        lon: normalize_longitude(finite("LON", record.lon)?),
        lat: finite("LAT", record.lat)?,
        mslp: finite("MSLP", record.mslp)?,
        ws: finite("WS", record.ws)?,
        tid: record.tid,
        time,
        tropical_flag: record.tropical_flag.filter(|flag| flag.is_finite()),
        transition_zone: record.transition_zone.filter(|flag| flag.is_finite()),
        label: record.short_label,
    })
}

#[cfg(test)]
mod tests {
    use super::read_tracks;
    use crate::animation::tracks::tests::datetime;
    use crate::errors::DatasetError;
    use float_cmp::approx_eq;

    fn read(data: &str) -> Result<crate::animation::tracks::Tracks, DatasetError> {
        read_tracks(csv::Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn groups_rows_by_id() {
        let tracks = read(
            "TID,ISOTIME,LON,LAT,MSLP,WS,Tropical_Flag,Transition_Zone,Short_Label\n\
             12,2005-08-10 00:00:00,270.5,20.0,1005.0,15.0,1,0,TS\n\
             13,2005-08-10 00:00:00,-40.0,12.0,1009.0,12.0,NA,,\n\
             12,2005-08-10 06:00:00,-88.0,21.0,1001.0,18.0,1,0,TS\n",
        )
        .unwrap();

        assert_eq!(tracks.len(), 2);

        let first = tracks.get("12").unwrap();
        assert_eq!(first.observations().len(), 2);
        assert_eq!(first.first_time(), datetime(10, 0));
        assert_eq!(first.last_time(), datetime(10, 6));
        assert!(approx_eq!(f64, first.observations()[0].lon, -89.5));
        assert_eq!(first.observations()[0].label.as_deref(), Some("TS"));

        let second = &tracks.get("13").unwrap().observations()[0];
        assert_eq!(second.tropical_flag, None);
        assert_eq!(second.transition_zone, None);
        assert_eq!(second.label, None);
    }

    #[test]
    fn non_finite_flags_are_absent() {
        let tracks = read(
            "TID,ISOTIME,LON,LAT,MSLP,WS,Tropical_Flag,Transition_Zone\n\
             7,2005-08-10 00:00:00,10.0,20.0,1005.0,15.0,NaN,inf\n",
        )
        .unwrap();

        let obs = &tracks.get("7").unwrap().observations()[0];
        assert_eq!(obs.tropical_flag, None);
        assert_eq!(obs.transition_zone, None);
    }

    #[test]
    fn optional_columns() {
        let tracks = read(
            "TID,ISOTIME,LON,LAT,MSLP,WS\n\
             7,2005-08-10 00:00:00,10.0,20.0,1005.0,15.0\n",
        )
        .unwrap();

        let obs = &tracks.get("7").unwrap().observations()[0];
        assert_eq!(obs.tropical_flag, None);
        assert_eq!(obs.label, None);
    }

    #[test]
    fn malformed_rows_abort() {
        let bad_time = read(
            "TID,ISOTIME,LON,LAT,MSLP,WS\n\
             7,2005-08-10 00:00:00,10.0,20.0,1005.0,15.0\n\
             7,10/08/2005 06:00,10.0,20.0,1005.0,15.0\n",
        );
        assert!(matches!(
            bad_time,
            Err(DatasetError::Timestamp { row: 2, .. })
        ));

        let missing_column = read(
            "TID,ISOTIME,LON,LAT,WS\n\
             7,2005-08-10 00:00:00,10.0,20.0,15.0\n",
        );
        assert!(matches!(missing_column, Err(DatasetError::Csv(_))));

        let bad_number = read(
            "TID,ISOTIME,LON,LAT,MSLP,WS\n\
             7,2005-08-10 00:00:00,east,20.0,1005.0,15.0\n",
        );
        assert!(matches!(bad_number, Err(DatasetError::Csv(_))));

        let not_a_number = read(
            "TID,ISOTIME,LON,LAT,MSLP,WS\n\
             7,2005-08-10 00:00:00,10.0,20.0,1005.0,15.0\n\
             7,2005-08-10 06:00:00,NaN,20.0,1005.0,15.0\n",
        );
        assert!(matches!(
            not_a_number,
            Err(DatasetError::NonFinite {
                row: 2,
                column: "LON",
                ..
            })
        ));

        let infinite = read(
            "TID,ISOTIME,LON,LAT,MSLP,WS\n\
             7,2005-08-10 00:00:00,10.0,20.0,1005.0,inf\n",
        );
        assert!(matches!(
            infinite,
            Err(DatasetError::NonFinite {
                row: 1,
                column: "WS",
                ..
            })
        ));

        let unordered = read(
            "TID,ISOTIME,LON,LAT,MSLP,WS\n\
             7,2005-08-10 06:00:00,10.0,20.0,1005.0,15.0\n\
             7,2005-08-10 06:00:00,11.0,20.0,1005.0,15.0\n",
        );
        assert!(matches!(
            unordered,
            Err(DatasetError::UnorderedTrack { row: 2, .. })
        ));
    }
}
