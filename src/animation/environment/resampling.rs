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

//! Sub-module with bilinear resampling of fields between grids.
//!
//! Points outside of the source latitude range take the value
//! of the nearest edge. Longitudes wrap around when the source
//! grid covers the whole globe and are clamped otherwise.

use super::bisection::find_left_closest;
use super::grid::{Grid, ScalarField, VectorField};
use super::projection::RotatedPole;
use crate::{errors::GridError, Float};
use ndarray::Array2;

/// Pair of neighbouring axis indices with the weight of the upper one.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Bracket {
    lo: usize,
    hi: usize,
    weight: Float,
}

fn bracket_clamped(axis: &[Float], x: Float) -> Result<Bracket, GridError> {
    let x = x.clamp(axis[0], axis[axis.len() - 1]);
    let lo = find_left_closest(axis, &x)?;

    if lo == axis.len() - 1 {
        return Ok(Bracket {
            lo,
            hi: lo,
            weight: 0.0,
        });
    }

    Ok(Bracket {
        lo,
        hi: lo + 1,
        weight: (x - axis[lo]) / (axis[lo + 1] - axis[lo]),
    })
}

fn bracket_periodic(axis: &[Float], x: Float) -> Result<Bracket, GridError> {
    let first = axis[0];
    let last = axis[axis.len() - 1];
    let x = first + (x - first).rem_euclid(360.0);

    // gap between the last and the first longitude
    if x > last {
        return Ok(Bracket {
            lo: axis.len() - 1,
            hi: 0,
            weight: (x - last) / (first + 360.0 - last),
        });
    }

    bracket_clamped(axis, x)
}

fn blend(values: &Array2<Float>, lat: Bracket, lon: Bracket) -> Float {
    let south = values[[lat.lo, lon.lo]] * (1.0 - lon.weight) + values[[lat.lo, lon.hi]] * lon.weight;
    let north = values[[lat.hi, lon.lo]] * (1.0 - lon.weight) + values[[lat.hi, lon.hi]] * lon.weight;

    south * (1.0 - lat.weight) + north * lat.weight
}

impl Grid {
    fn lat_bracket(&self, lat: Float) -> Result<Bracket, GridError> {
        bracket_clamped(self.lats(), lat)
    }

    fn lon_bracket(&self, lon: Float) -> Result<Bracket, GridError> {
        if self.is_lon_periodic() {
            bracket_periodic(self.lons(), lon)
        } else {
            bracket_clamped(self.lons(), lon)
        }
    }
}

impl ScalarField {
    /// Bilinearly interpolated value at given point.
    pub fn sample(&self, lat: Float, lon: Float) -> Result<Float, GridError> {
        let lat = self.grid().lat_bracket(lat)?;
        let lon = self.grid().lon_bracket(lon)?;

        Ok(blend(self.values(), lat, lon))
    }

    /// Bilinearly resamples the field onto `target` grid.
    pub fn regrid(&self, target: &Grid) -> Result<ScalarField, GridError> {
        if self.grid() == target {
            return Ok(self.clone());
        }

        let lat_brackets = target
            .lats()
            .iter()
            .map(|&lat| self.grid().lat_bracket(lat))
            .collect::<Result<Vec<_>, _>>()?;

        let lon_brackets = target
            .lons()
            .iter()
            .map(|&lon| self.grid().lon_bracket(lon))
            .collect::<Result<Vec<_>, _>>()?;

        let values = Array2::from_shape_fn(target.shape(), |(i, j)| {
            blend(self.values(), lat_brackets[i], lon_brackets[j])
        });

        ScalarField::new(target.clone(), values)
    }

    /// Resamples the field onto `target` grid given
    /// in the rotated coordinates of `pole`.
    pub fn regrid_rotated(&self, target: &Grid, pole: &RotatedPole) -> Result<ScalarField, GridError> {
        let mut values = Array2::zeros(target.shape());

        for (i, &rlat) in target.lats().iter().enumerate() {
            for (j, &rlon) in target.lons().iter().enumerate() {
                let (lon, lat) = pole.unrotate(rlon, rlat);
                values[[i, j]] = self.sample(lat, lon)?;
            }
        }

        ScalarField::new(target.clone(), values)
    }
}

impl VectorField {
    /// Resamples the wind onto `target` grid given in the rotated
    /// coordinates of `pole`, turning the vectors into that frame.
    pub fn regrid_rotated(&self, target: &Grid, pole: &RotatedPole) -> Result<VectorField, GridError> {
        let (rows, cols) = target.shape();
        let mut u = Array2::zeros((rows, cols));
        let mut v = Array2::zeros((rows, cols));

        for (i, &rlat) in target.lats().iter().enumerate() {
            for (j, &rlon) in target.lons().iter().enumerate() {
                let (lon, lat) = pole.unrotate(rlon, rlat);

                let lat_bracket = self.grid().lat_bracket(lat)?;
                let lon_bracket = self.grid().lon_bracket(lon)?;

                let geo_u = blend(self.u(), lat_bracket, lon_bracket);
                let geo_v = blend(self.v(), lat_bracket, lon_bracket);

                let (rot_u, rot_v) = pole.rotate_wind(lon, lat, geo_u, geo_v);
                u[[i, j]] = rot_u;
                v[[i, j]] = rot_v;
            }
        }

        VectorField::new(target.clone(), u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::super::grid::{Grid, ScalarField, VectorField};
    use super::super::projection::RotatedPole;
    use float_cmp::approx_eq;
    use ndarray::Array2;

    fn linear_field() -> ScalarField {
        let grid = Grid::regular(1.0, (0.0, 4.0), (0.0, 4.0)).unwrap();
        let values = Array2::from_shape_fn(grid.shape(), |(i, j)| (2 * i + j) as f64);

        ScalarField::new(grid, values).unwrap()
    }

    #[test]
    fn bilinear_sample() {
        let field = linear_field();

        assert!(approx_eq!(f64, field.sample(1.5, 2.5).unwrap(), 5.5, epsilon = 1e-12));
        assert!(approx_eq!(f64, field.sample(4.0, 4.0).unwrap(), 12.0, epsilon = 1e-12));
        // clamped to the edge
        assert!(approx_eq!(f64, field.sample(-3.0, 0.0).unwrap(), 0.0, epsilon = 1e-12));
    }

    #[test]
    fn regrid_shape_and_values() {
        let field = linear_field();
        let target = Grid::regular(0.5, (1.0, 3.0), (1.0, 2.0)).unwrap();

        let regridded = field.regrid(&target).unwrap();

        assert_eq!(regridded.values().dim(), target.shape());
        assert!(approx_eq!(f64, regridded.values()[[1, 1]], 4.5, epsilon = 1e-12));
    }

    #[test]
    fn periodic_longitudes() {
        let grid = Grid::regular(90.0, (-90.0, 90.0), (0.0, 270.0)).unwrap();
        let values = Array2::from_shape_fn(grid.shape(), |(_, j)| j as f64);
        let field = ScalarField::new(grid, values).unwrap();

        // halfway between 270 (value 3) and 360 (value 0)
        assert!(approx_eq!(f64, field.sample(0.0, -45.0).unwrap(), 1.5, epsilon = 1e-12));
        assert!(approx_eq!(f64, field.sample(0.0, -90.0).unwrap(), 3.0, epsilon = 1e-12));
    }

    #[test]
    fn rotated_scalar_regrid() {
        let field = linear_field();
        let target = Grid::regular(0.5, (1.0, 3.0), (1.0, 2.0)).unwrap();

        let unrotated = field.regrid_rotated(&target, &RotatedPole::default()).unwrap();
        let plain = field.regrid(&target).unwrap();
        assert!(unrotated
            .values()
            .iter()
            .zip(plain.values().iter())
            .all(|(a, b)| approx_eq!(f64, *a, *b, epsilon = 1e-9)));

        // with the pole moved the view centre lands elsewhere
        let pole = RotatedPole::new(180.0, 88.0, 0.0);
        let centre = Grid::regular(1.0, (0.0, 1.0), (0.0, 1.0)).unwrap();
        let rotated = field.regrid_rotated(&centre, &pole).unwrap();
        let (lon, lat) = pole.unrotate(0.0, 0.0);

        assert!(approx_eq!(
            f64,
            rotated.values()[[0, 0]],
            field.sample(lat, lon).unwrap(),
            epsilon = 1e-12
        ));
    }

    #[test]
    fn unrotated_wind_regrid() {
        let grid = Grid::regular(1.0, (-10.0, 10.0), (-10.0, 10.0)).unwrap();
        let wind = VectorField::new(
            grid,
            Array2::from_elem((21, 21), 2.0),
            Array2::from_elem((21, 21), -1.0),
        )
        .unwrap();

        let target = Grid::regular(2.5, (-5.0, 5.0), (-5.0, 5.0)).unwrap();
        let regridded = wind.regrid_rotated(&target, &RotatedPole::default()).unwrap();

        assert_eq!(regridded.u().dim(), target.shape());
        assert!(regridded.u().iter().all(|&u| approx_eq!(f64, u, 2.0, epsilon = 1e-9)));
        assert!(regridded.v().iter().all(|&v| approx_eq!(f64, v, -1.0, epsilon = 1e-9)));
    }
}
