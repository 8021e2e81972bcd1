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

//! Sub-module with the gridded data containers.
//!
//! Axis 0 of every array is latitude-like (bounded) and
//! axis 1 is longitude-like (periodic), both strictly ascending.

use crate::{errors::GridError, Float};
use ndarray::{Array1, Array2, Zip};

/// Rectangular lattice of cell positions.
#[derive(Clone, PartialEq, Debug)]
pub struct Grid {
    lats: Vec<Float>,
    lons: Vec<Float>,
}

impl Grid {
    /// Grid constructor from explicit coordinate vectors.
    pub fn new(lats: Vec<Float>, lons: Vec<Float>) -> Result<Self, GridError> {
        check_axis(&lats)?;
        check_axis(&lons)?;

        Ok(Grid { lats, lons })
    }

    /// Builds a regular grid covering `[min, max]` on both axes with
    /// points at `min, min + resolution, ...` not exceeding `max`.
    pub fn regular(
        resolution: Float,
        lat_range: (Float, Float),
        lon_range: (Float, Float),
    ) -> Result<Self, GridError> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(GridError::IncorrectResolution);
        }

        Grid::new(
            regular_axis(resolution, lat_range),
            regular_axis(resolution, lon_range),
        )
    }

    pub fn lats(&self) -> &[Float] {
        &self.lats
    }

    pub fn lons(&self) -> &[Float] {
        &self.lons
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// Smallest and largest latitude of the grid.
    pub fn lat_bounds(&self) -> (Float, Float) {
        (self.lats[0], self.lats[self.lats.len() - 1])
    }

    /// Smallest and largest longitude of the grid.
    pub fn lon_bounds(&self) -> (Float, Float) {
        (self.lons[0], self.lons[self.lons.len() - 1])
    }

    /// Checks if the longitude axis wraps around the whole globe,
    /// ie. the step after the last point lands on the first one.
    pub fn is_lon_periodic(&self) -> bool {
        let n = self.lons.len();
        let step = self.lons[n - 1] - self.lons[n - 2];
        let span = self.lons[n - 1] - self.lons[0] + step;

        (span - 360.0).abs() < step / 2.0
    }
}

fn check_axis(axis: &[Float]) -> Result<(), GridError> {
    if axis.len() < 2 {
        return Err(GridError::TooFewPoints);
    }

    if axis.iter().any(|v| !v.is_finite()) || axis.windows(2).any(|w| w[1] <= w[0]) {
        return Err(GridError::NotAscending);
    }

    Ok(())
}

fn regular_axis(resolution: Float, range: (Float, Float)) -> Vec<Float> {
    // small tolerance so that the upper edge survives rounding
    let steps = ((range.1 - range.0) / resolution + 1e-9).floor().max(0.0) as usize;

    Array1::linspace(
        range.0,
        range.0 + (steps as Float * resolution),
        steps + 1,
    )
    .to_vec()
}

/// Scalar values registered on a [`Grid`].
#[derive(Clone, PartialEq, Debug)]
pub struct ScalarField {
    grid: Grid,
    values: Array2<Float>,
}

impl ScalarField {
    pub fn new(grid: Grid, values: Array2<Float>) -> Result<Self, GridError> {
        check_shape(&grid, &values)?;

        Ok(ScalarField { grid, values })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn values(&self) -> &Array2<Float> {
        &self.values
    }
}

/// Horizontal wind on a [`Grid`], `u` eastward and `v` northward.
#[derive(Clone, PartialEq, Debug)]
pub struct VectorField {
    grid: Grid,
    u: Array2<Float>,
    v: Array2<Float>,
}

impl VectorField {
    pub fn new(grid: Grid, u: Array2<Float>, v: Array2<Float>) -> Result<Self, GridError> {
        check_shape(&grid, &u)?;
        check_shape(&grid, &v)?;

        Ok(VectorField { grid, u, v })
    }

    /// Combines two co-registered components into a vector field.
    pub fn from_components(u: ScalarField, v: ScalarField) -> Result<Self, GridError> {
        if u.grid != v.grid {
            return Err(GridError::ShapeMismatch {
                expected: u.grid.shape(),
                found: v.grid.shape(),
            });
        }

        Ok(VectorField {
            grid: u.grid,
            u: u.values,
            v: v.values,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn u(&self) -> &Array2<Float> {
        &self.u
    }

    pub fn v(&self) -> &Array2<Float> {
        &self.v
    }

    /// Magnitude of the vector at each gridpoint.
    pub fn speed(&self) -> Array2<Float> {
        let mut speed = Array2::zeros(self.u.raw_dim());

        Zip::from(&mut speed)
            .and(&self.u)
            .and(&self.v)
            .for_each(|s, &u, &v| *s = (u * u + v * v).sqrt());

        speed
    }
}

fn check_shape(grid: &Grid, values: &Array2<Float>) -> Result<(), GridError> {
    if values.dim() != grid.shape() {
        return Err(GridError::ShapeMismatch {
            expected: grid.shape(),
            found: values.dim(),
        });
    }

    Ok(())
}
