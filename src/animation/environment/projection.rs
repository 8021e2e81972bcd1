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

//! Module with methods to do computations
//! of the rotated-pole projection used by the view.
//!
//! Geographic coordinates are rotated so that the pole lands
//! at (`pole_longitude`, `pole_latitude`) and then shifted along
//! the rotated equator by `npg_longitude`. The default pole
//! (180, 90) with no shift is the identity.

use nalgebra::{Matrix3, Vector3};

use crate::animation::tracks::normalize_longitude;
use crate::Float;

/// Front-facing struct of the rotated-pole projection.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RotatedPole {
    rotation: Matrix3<Float>,
    npg_longitude: Float,
}

impl RotatedPole {
    pub fn new(pole_longitude: Float, pole_latitude: Float, npg_longitude: Float) -> Self {
        let (sin_pol, cos_pol) = pole_latitude.to_radians().sin_cos();
        let (sin_lam, cos_lam) = pole_longitude.to_radians().sin_cos();

        // rotation about the z axis bringing the pole meridian to zero
        let to_pole_meridian = Matrix3::new(
            cos_lam, sin_lam, 0.0, //
            -sin_lam, cos_lam, 0.0, //
            0.0, 0.0, 1.0,
        );

        // tilt about the y axis, with longitude measured from the
        // meridian opposite to the pole
        let tilt = Matrix3::new(
            -sin_pol, 0.0, cos_pol, //
            0.0, -1.0, 0.0, //
            cos_pol, 0.0, sin_pol,
        );

        RotatedPole {
            rotation: tilt * to_pole_meridian,
            npg_longitude,
        }
    }

    /// Geographic (lon, lat) to rotated (lon, lat).
    pub fn rotate(&self, lon: Float, lat: Float) -> (Float, Float) {
        let (rlon, rlat) = to_lonlat(&(self.rotation * to_cartesian(lon, lat)));

        (normalize_longitude(rlon + self.npg_longitude), rlat)
    }

    /// Rotated (lon, lat) back to geographic (lon, lat).
    pub fn unrotate(&self, rlon: Float, rlat: Float) -> (Float, Float) {
        let point = to_cartesian(rlon - self.npg_longitude, rlat);
        let (lon, lat) = to_lonlat(&(self.rotation.transpose() * point));

        (normalize_longitude(lon), lat)
    }

    /// Rotates the (u, v) wind given at geographic (lon, lat)
    /// into eastward and northward components of the rotated frame.
    pub fn rotate_wind(&self, lon: Float, lat: Float, u: Float, v: Float) -> (Float, Float) {
        let (east, north) = local_basis(lon, lat);
        let wind = self.rotation * (u * east + v * north);

        let (rlon, rlat) = to_lonlat(&(self.rotation * to_cartesian(lon, lat)));
        let (rot_east, rot_north) = local_basis(rlon, rlat);

        (wind.dot(&rot_east), wind.dot(&rot_north))
    }
}

impl Default for RotatedPole {
    fn default() -> Self {
        RotatedPole::new(180.0, 90.0, 0.0)
    }
}

fn to_cartesian(lon: Float, lat: Float) -> Vector3<Float> {
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();

    Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

fn to_lonlat(point: &Vector3<Float>) -> (Float, Float) {
    let lon = point.y.atan2(point.x).to_degrees();
    let lat = point.z.clamp(-1.0, 1.0).asin().to_degrees();

    (lon, lat)
}

/// Unit vectors pointing east and north at given point.
fn local_basis(lon: Float, lat: Float) -> (Vector3<Float>, Vector3<Float>) {
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();

    let east = Vector3::new(-sin_lon, cos_lon, 0.0);
    let north = Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);

    (east, north)
}
