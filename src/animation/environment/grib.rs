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

//! Sub-module reading hourly reanalysis fields from GRIB archives.
//!
//! The archive keeps one file per variable and month:
//! `{data_dir}/{YYYY}/{MM}/{variable}.grib`, each holding
//! all hourly messages of that month. The land-sea mask does not
//! change in time and is kept in `{data_dir}/land_mask.grib`.

use super::grid::{Grid, ScalarField};
use super::{FieldProvider, Variable};
use crate::{errors::EnvironmentError, Float};
use chrono::{Datelike, NaiveDateTime, Timelike};
use eccodes::{
    codes_handle::{
        CodesHandle,
        KeyType::{Float as GribFloat, FloatArray, Int},
        KeyedMessage,
        ProductKind::GRIB,
    },
    FallibleIterator,
};
use log::debug;
use ndarray::{s, Array1, Array2};
use std::path::{Path, PathBuf};

/// Field provider backed by a directory of GRIB files.
#[derive(Clone, Debug)]
pub struct GribArchive {
    data_dir: PathBuf,
}

impl GribArchive {
    pub fn new(data_dir: &Path) -> Self {
        GribArchive {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn file_path(&self, variable: Variable, datetime: NaiveDateTime) -> PathBuf {
        self.data_dir
            .join(format!("{:04}", datetime.year()))
            .join(format!("{:02}", datetime.month()))
            .join(format!("{}.grib", variable.name()))
    }

    fn land_mask_path(&self) -> PathBuf {
        self.data_dir.join("land_mask.grib")
    }
}

impl FieldProvider for GribArchive {
    fn load(
        &self,
        variable: Variable,
        datetime: NaiveDateTime,
    ) -> Result<ScalarField, EnvironmentError> {
        let file_path = self.file_path(variable, datetime);

        if !file_path.is_file() {
            return Err(EnvironmentError::MissingData(format!(
                "No data file {}",
                file_path.display()
            )));
        }

        debug!("Reading {} for {} from GRIB", variable.name(), datetime);

        // hourly data, so minutes are ignored
        let data_date = i64::from(datetime.year()) * 10_000
            + i64::from(datetime.month()) * 100
            + i64::from(datetime.day());
        let data_time = i64::from(datetime.hour()) * 100;

        let handle = CodesHandle::new_from_file(&file_path, GRIB)?;

        let messages: Vec<KeyedMessage> = handle
            .filter(|msg| {
                Ok(msg.read_key("dataDate")?.value == Int(data_date)
                    && msg.read_key("dataTime")?.value == Int(data_time))
            })
            .collect()?;

        let message = messages.first().ok_or_else(|| {
            EnvironmentError::MissingData(format!(
                "No {} for {} in {}",
                variable.name(),
                datetime,
                file_path.display()
            ))
        })?;

        read_field(message)
    }

    fn load_land_mask(&self) -> Result<ScalarField, EnvironmentError> {
        let file_path = self.land_mask_path();

        if !file_path.is_file() {
            return Err(EnvironmentError::MissingData(format!(
                "No land mask file {}",
                file_path.display()
            )));
        }

        debug!("Reading land mask from GRIB");

        let mut handle = CodesHandle::new_from_file(&file_path, GRIB)?;

        let message = handle.next()?.ok_or_else(|| {
            EnvironmentError::MissingData(format!(
                "Land mask file {} has no messages",
                file_path.display()
            ))
        })?;

        to_land_sea(read_field(&message)?)
    }
}

/// Turns the land fraction into a binary mask,
/// cells at least half covered by land become land.
fn to_land_sea(fraction: ScalarField) -> Result<ScalarField, EnvironmentError> {
    let values = fraction
        .values()
        .mapv(|v| if v >= 0.5 { 1.0 } else { 0.0 });

    Ok(ScalarField::new(fraction.grid().clone(), values)?)
}

fn read_int(msg: &KeyedMessage, key: &'static str) -> Result<i64, EnvironmentError> {
    match msg.read_key(key)?.value {
        Int(v) => Ok(v),
        _ => Err(EnvironmentError::IncorrectKeyType(key)),
    }
}

fn read_float(msg: &KeyedMessage, key: &'static str) -> Result<Float, EnvironmentError> {
    match msg.read_key(key)?.value {
        GribFloat(v) => Ok(v),
        Int(v) => Ok(v as Float),
        _ => Err(EnvironmentError::IncorrectKeyType(key)),
    }
}

/// Reads the regular lat-lon field from GRIB message
/// with latitudes turned into ascending order.
fn read_field(msg: &KeyedMessage) -> Result<ScalarField, EnvironmentError> {
    let ni = read_int(msg, "Ni")? as usize;
    let nj = read_int(msg, "Nj")? as usize;

    let lat_first = read_float(msg, "latitudeOfFirstGridPointInDegrees")?;
    let lat_last = read_float(msg, "latitudeOfLastGridPointInDegrees")?;
    let lon_first = read_float(msg, "longitudeOfFirstGridPointInDegrees")?;
    let mut lon_last = read_float(msg, "longitudeOfLastGridPointInDegrees")?;

    // grids crossing the prime meridian are stored as eg. 180 -> 179.75
    if lon_last < lon_first {
        lon_last += 360.0;
    }

    let values = if let FloatArray(v) = msg.read_key("values")?.value {
        v
    } else {
        return Err(EnvironmentError::IncorrectKeyType("values"));
    };

    // values are stored row by row, with longitude changing fastest
    let values = Array2::from_shape_vec((nj, ni), values)?;
    let lons = Array1::linspace(lon_first, lon_last, ni).to_vec();

    let (lats, values) = if lat_first > lat_last {
        (
            Array1::linspace(lat_last, lat_first, nj).to_vec(),
            values.slice(s![..;-1, ..]).to_owned(),
        )
    } else {
        (Array1::linspace(lat_first, lat_last, nj).to_vec(), values)
    };

    let grid = Grid::new(lats, lons)?;

    Ok(ScalarField::new(grid, values)?)
}

#[cfg(test)]
mod tests {
    use super::{to_land_sea, GribArchive};
    use crate::animation::environment::{FieldProvider, Grid, ScalarField, Variable};
    use crate::errors::EnvironmentError;
    use chrono::NaiveDate;
    use ndarray::array;
    use std::path::{Path, PathBuf};

    #[test]
    fn archive_layout() {
        let archive = GribArchive::new(Path::new("/data/ERA5"));
        let datetime = NaiveDate::from_ymd_opt(2021, 3, 7)
            .and_then(|d| d.and_hms_opt(18, 15, 0))
            .unwrap();

        assert_eq!(
            archive.file_path(Variable::UWind10m, datetime),
            PathBuf::from("/data/ERA5/2021/03/10m_u_component_of_wind.grib")
        );
    }

    #[test]
    fn missing_file() {
        let archive = GribArchive::new(Path::new("./no-such-archive"));
        let datetime = NaiveDate::from_ymd_opt(2021, 3, 7)
            .and_then(|d| d.and_hms_opt(18, 0, 0))
            .unwrap();

        let result = archive.load(Variable::VWind10m, datetime);

        assert!(matches!(result, Err(EnvironmentError::MissingData(_))));
    }

    #[test]
    fn archive_layout_of_other_fields() {
        let archive = GribArchive::new(Path::new("/data/ERA5"));
        let datetime = NaiveDate::from_ymd_opt(2005, 8, 29)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();

        assert_eq!(
            archive.file_path(Variable::TotalPrecipitation, datetime),
            PathBuf::from("/data/ERA5/2005/08/total_precipitation.grib")
        );
        assert_eq!(
            archive.file_path(Variable::Temperature2m, datetime),
            PathBuf::from("/data/ERA5/2005/08/2m_temperature.grib")
        );
        assert_eq!(
            archive.land_mask_path(),
            PathBuf::from("/data/ERA5/land_mask.grib")
        );
    }

    #[test]
    fn missing_land_mask() {
        let archive = GribArchive::new(Path::new("./no-such-archive"));

        assert!(matches!(
            archive.load_land_mask(),
            Err(EnvironmentError::MissingData(_))
        ));
    }

    #[test]
    fn land_fraction_to_mask() {
        let grid = Grid::regular(1.0, (0.0, 1.0), (0.0, 2.0)).unwrap();
        let fraction = ScalarField::new(grid, array![[0.0, 0.49, 0.5], [1.0, 0.2, 0.93]]).unwrap();

        let mask = to_land_sea(fraction).unwrap();

        assert_eq!(mask.values(), &array![[0.0, 0.0, 1.0], [1.0, 0.0, 1.0]]);
    }
}
