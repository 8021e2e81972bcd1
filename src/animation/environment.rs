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

//! Module responsible for reading gridded reanalysis fields
//! and bringing them onto the grids used by frames.

mod bisection;
mod grib;
mod grid;
mod projection;
mod resampling;

pub use grib::GribArchive;
pub use grid::{Grid, ScalarField, VectorField};
pub use projection::RotatedPole;

use crate::errors::EnvironmentError;
use chrono::NaiveDateTime;
use serde::Deserialize;

/// Enum containing reanalysis fields
/// that can be requested.
///
/// In `config.yaml` variables are named as in the archive.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize)]
pub enum Variable {
    #[serde(rename = "10m_u_component_of_wind")]
    UWind10m,

    #[serde(rename = "10m_v_component_of_wind")]
    VWind10m,

    #[serde(rename = "total_precipitation")]
    TotalPrecipitation,

    #[serde(rename = "2m_temperature")]
    Temperature2m,
}

impl Variable {
    /// Name of the variable as used by the archive.
    pub fn name(&self) -> &'static str {
        match self {
            Variable::UWind10m => "10m_u_component_of_wind",
            Variable::VWind10m => "10m_v_component_of_wind",
            Variable::TotalPrecipitation => "total_precipitation",
            Variable::Temperature2m => "2m_temperature",
        }
    }
}

/// Source of hourly gridded fields.
///
/// Implementors must be shareable between frames
/// rendered on different threads.
pub trait FieldProvider: Send + Sync {
    /// Loads `variable` valid at the hour of `datetime`.
    fn load(&self, variable: Variable, datetime: NaiveDateTime)
        -> Result<ScalarField, EnvironmentError>;

    /// Loads the time-independent land-sea mask,
    /// with `1` over land and `0` over sea.
    fn load_land_mask(&self) -> Result<ScalarField, EnvironmentError>;

    /// Loads near-surface wind valid at the hour of `datetime`.
    fn load_wind(&self, datetime: NaiveDateTime) -> Result<VectorField, EnvironmentError> {
        let u = self.load(Variable::UWind10m, datetime)?;
        let v = self.load(Variable::VWind10m, datetime)?;

        Ok(VectorField::from_components(u, v)?)
    }
}
