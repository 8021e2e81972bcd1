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

//! Module producing the animated wind texture.
//!
//! A static noise pattern is smeared along the wind by tracers
//! released from every cell. Each tracer is moved with forward Euler
//! substeps, with the wind sampled at the tracer's current cell
//! (no sub-cell interpolation of the velocity), and the noise it
//! passes over, weighted by the local wind speed, is added to the cell
//! it started from. Which substeps count depends on the frame sequence
//! number (see [`VisibilityWindow`]), so consecutive frames show
//! the texture flowing with the wind.
//!
//! Nothing is kept between calls: every frame rebuilds all tracers
//! from its own wind, so frames can be computed in any order.

mod seed;
mod visibility;

pub use seed::NoiseSeed;
use visibility::VisibilityWindow;

use crate::animation::environment::{Grid, ScalarField, VectorField};
use crate::constants::{
    DEFAULT_ITERATIONS, DEFAULT_SCALE, DEFAULT_STEP_SIZE, DEFAULT_VISIBILITY_WINDOW,
};
use crate::{errors::AdvectionError, Float};
use chrono::NaiveDateTime;
use log::debug;
use ndarray::{Array2, Zip};

/// Parameters of the noise advection.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AdvectionParams {
    /// Number of tracer substeps. Defaults to `50`.
    pub iterations: usize,

    /// Displacement of one substep per unit of wind. Defaults to `0.003`.
    pub step_size: Float,

    /// How many substeps of each tracer are visible in one frame.
    /// Defaults to `25`, must be smaller than `iterations`.
    pub visibility_window: usize,

    /// Divisor of the advected contribution. Defaults to `1`.
    pub scale: Float,
}

impl Default for AdvectionParams {
    fn default() -> Self {
        AdvectionParams {
            iterations: DEFAULT_ITERATIONS,
            step_size: DEFAULT_STEP_SIZE,
            visibility_window: DEFAULT_VISIBILITY_WINDOW,
            scale: DEFAULT_SCALE,
        }
    }
}

impl AdvectionParams {
    pub fn check_bounds(&self) -> Result<(), AdvectionError> {
        if self.iterations == 0 {
            return Err(AdvectionError::IncorrectParams(
                "iterations must be at least 1",
            ));
        }

        if self.visibility_window >= self.iterations {
            return Err(AdvectionError::IncorrectParams(
                "visibility window must be shorter than iterations",
            ));
        }

        if self.scale == 0.0 || !self.scale.is_finite() {
            return Err(AdvectionError::IncorrectParams(
                "scale must be finite and non-zero",
            ));
        }

        if !self.step_size.is_finite() {
            return Err(AdvectionError::IncorrectParams("step size is not finite"));
        }

        Ok(())
    }
}

/// Position of one tracer, both real and as grid index.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Tracer {
    x: Float,
    y: Float,
    i: usize,
    j: usize,
}

/// Mapping between grid indices and real positions.
///
/// `x` runs along axis 0 (latitude) and is clamped at the edges,
/// `y` runs along axis 1 (longitude) and wraps around.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Lattice {
    x_bounds: (Float, Float),
    y_bounds: (Float, Float),
    width: usize,
    height: usize,
}

impl Lattice {
    fn new(grid: &Grid) -> Self {
        let (width, height) = grid.shape();

        Lattice {
            x_bounds: grid.lat_bounds(),
            y_bounds: grid.lon_bounds(),
            width,
            height,
        }
    }

    fn release(&self, i: usize, j: usize) -> Tracer {
        let (xmin, xmax) = self.x_bounds;
        let (ymin, ymax) = self.y_bounds;

        Tracer {
            x: xmin + (i as Float / self.width as Float) * (xmax - xmin),
            y: ymin + (j as Float / self.height as Float) * (ymax - ymin),
            i,
            j,
        }
    }

    fn advance(&self, tracer: &mut Tracer, dx: Float, dy: Float) {
        let (xmin, xmax) = self.x_bounds;
        let (ymin, ymax) = self.y_bounds;

        tracer.x = (tracer.x + dx).clamp(xmin, xmax);

        tracer.y += dy;
        if tracer.y > ymax {
            tracer.y = tracer.y - ymax + ymin;
        } else if tracer.y < ymin {
            tracer.y = tracer.y - ymin + ymax;
        }

        tracer.i = to_index(tracer.x, self.x_bounds, self.width);
        tracer.j = to_index(tracer.y, self.y_bounds, self.height);
    }
}

fn to_index(position: Float, bounds: (Float, Float), len: usize) -> usize {
    let scaled = ((position - bounds.0) / (bounds.1 - bounds.0) * (len - 1) as Float).floor();

    // negative and NaN saturate to 0
    (scaled as usize).min(len - 1)
}

/// Generator of the advected noise texture.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct NoiseFieldAdvector {
    params: AdvectionParams,
}

impl NoiseFieldAdvector {
    pub fn new(params: AdvectionParams) -> Result<Self, AdvectionError> {
        params.check_bounds()?;

        Ok(NoiseFieldAdvector { params })
    }

    pub fn params(&self) -> &AdvectionParams {
        &self.params
    }

    /// Computes the noise texture on the grid of `wind`.
    ///
    /// With `sequence` the output is one frame of the rolling animation,
    /// without it all substeps count and the texture is static.
    /// Identical inputs always give bit-identical output.
    pub fn advect(
        &self,
        wind: &VectorField,
        seed: &NoiseSeed,
        sequence: Option<u64>,
    ) -> Result<ScalarField, AdvectionError> {
        let params = &self.params;
        let grid = wind.grid();
        let shape = grid.shape();

        debug!(
            "Advecting noise on {:?} grid with sequence {:?}",
            shape, sequence
        );

        let noise = seed.field().regrid(grid)?;
        let noise = noise.values();
        let speed = wind.speed();

        let window = match sequence {
            Some(sequence) => VisibilityWindow::rolling(
                shape,
                params.iterations,
                params.visibility_window,
                sequence,
            ),
            None => VisibilityWindow::Always,
        };

        let lattice = Lattice::new(grid);
        let mut tracers = Array2::from_shape_fn(shape, |(i, j)| lattice.release(i, j));
        let mut result = noise.to_owned();

        let (u, v) = (wind.u(), wind.v());

        for substep in 0..params.iterations {
            Zip::indexed(&mut tracers)
                .and(&mut result)
                .and(&speed)
                .for_each(|cell, tracer, out, &speed| {
                    let here = (tracer.i, tracer.j);

                    lattice.advance(
                        tracer,
                        params.step_size * v[here],
                        params.step_size * u[here],
                    );

                    if window.is_visible(cell, substep) {
                        *out += noise[(tracer.i, tracer.j)] * speed / params.scale;
                    }
                });
        }

        Ok(ScalarField::new(grid.clone(), result)?)
    }
}

/// Converts frame times into advection sequence numbers.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SequenceClock {
    /// Time of sequence number zero.
    pub epoch: NaiveDateTime,

    /// Sequence numbers per hour.
    pub rate: Float,
}

impl SequenceClock {
    /// Sequence number of the frame at `datetime`.
    ///
    /// Frames before the epoch are taken modulo `iterations`,
    /// which leaves their phases unchanged.
    pub fn sequence(&self, datetime: NaiveDateTime, iterations: usize) -> u64 {
        let hours = (datetime - self.epoch).num_seconds() as Float / 3600.0;
        let sequence = (hours * self.rate).floor() as i64;

        u64::try_from(sequence)
            .unwrap_or_else(|_| sequence.rem_euclid(iterations as i64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::{AdvectionParams, Lattice, NoiseFieldAdvector, NoiseSeed, SequenceClock};
    use crate::animation::environment::{Grid, ScalarField, VectorField};
    use chrono::{Duration, NaiveDate};
    use float_cmp::approx_eq;
    use ndarray::Array2;

    fn wind(u: f64, v: f64) -> VectorField {
        let grid = Grid::regular(1.0, (-10.0, 10.0), (-20.0, 20.0)).unwrap();
        let shape = grid.shape();

        VectorField::new(
            grid,
            Array2::from_elem(shape, u),
            Array2::from_elem(shape, v),
        )
        .unwrap()
    }

    fn seed() -> NoiseSeed {
        let grid = Grid::regular(0.5, (-10.0, 10.0), (-20.0, 20.0)).unwrap();
        NoiseSeed::random(grid, 7).unwrap()
    }

    #[test]
    fn params_bounds() {
        assert!(AdvectionParams::default().check_bounds().is_ok());

        let wide = AdvectionParams {
            visibility_window: 50,
            ..AdvectionParams::default()
        };
        assert!(NoiseFieldAdvector::new(wide).is_err());

        let unscaled = AdvectionParams {
            scale: 0.0,
            ..AdvectionParams::default()
        };
        assert!(NoiseFieldAdvector::new(unscaled).is_err());
    }

    #[test]
    fn deterministic_output() {
        let advector = NoiseFieldAdvector::new(AdvectionParams::default()).unwrap();
        let wind = wind(7.0, -3.0);
        let seed = seed();

        let first = advector.advect(&wind, &seed, Some(1234)).unwrap();
        let second = advector.advect(&wind, &seed, Some(1234)).unwrap();

        assert_eq!(first.values(), second.values());
        assert_eq!(first.values().dim(), wind.grid().shape());
        assert_eq!(first.grid(), wind.grid());
    }

    #[test]
    fn sequence_changes_texture() {
        let advector = NoiseFieldAdvector::new(AdvectionParams::default()).unwrap();
        let wind = wind(7.0, -3.0);
        let seed = seed();

        let first = advector.advect(&wind, &seed, Some(10)).unwrap();
        let next = advector.advect(&wind, &seed, Some(11)).unwrap();
        let cycled = advector.advect(&wind, &seed, Some(60)).unwrap();

        assert_ne!(first.values(), next.values());
        assert_eq!(first.values(), cycled.values());
    }

    #[test]
    fn calm_wind_keeps_seed() {
        let advector = NoiseFieldAdvector::new(AdvectionParams::default()).unwrap();
        let wind = wind(0.0, 0.0);
        let seed = seed();

        let result = advector.advect(&wind, &seed, None).unwrap();
        let expected = seed.field().regrid(wind.grid()).unwrap();

        assert_eq!(result.values(), expected.values());
    }

    #[test]
    fn static_mode_accumulates_all_substeps() {
        let params = AdvectionParams {
            iterations: 4,
            visibility_window: 2,
            ..AdvectionParams::default()
        };
        let advector = NoiseFieldAdvector::new(params).unwrap();

        let grid = Grid::regular(1.0, (0.0, 3.0), (0.0, 3.0)).unwrap();
        let wind = VectorField::new(
            grid.clone(),
            Array2::from_elem((4, 4), 0.0),
            Array2::from_elem((4, 4), 2.0),
        )
        .unwrap();
        let seed = NoiseSeed::new(ScalarField::new(grid, Array2::from_elem((4, 4), 1.0)).unwrap());

        // uniform noise: every visible substep adds noise * speed
        let all = advector.advect(&wind, &seed, None).unwrap();
        assert!(all.values().iter().all(|&v| approx_eq!(f64, v, 1.0 + 4.0 * 2.0)));

        let rolling = advector.advect(&wind, &seed, Some(0)).unwrap();
        assert!(rolling
            .values()
            .iter()
            .all(|&v| approx_eq!(f64, v, 1.0 + 2.0 * 2.0)));
    }

    #[test]
    fn tracers_wrap_and_clamp() {
        let grid = Grid::regular(1.0, (0.0, 10.0), (0.0, 10.0)).unwrap();
        let lattice = Lattice::new(&grid);
        let mut tracer = lattice.release(10, 10);

        lattice.advance(&mut tracer, 5.0, 3.0);
        assert!(approx_eq!(f64, tracer.x, 10.0));
        assert!(approx_eq!(
            f64,
            tracer.y,
            10.0 / 11.0 * 10.0 + 3.0 - 10.0,
            epsilon = 1e-12
        ));
        assert_eq!(tracer.i, 10);

        lattice.advance(&mut tracer, -20.0, -5.0);
        assert!(approx_eq!(f64, tracer.x, 0.0));
        assert_eq!(tracer.i, 0);
        assert!(tracer.y >= 0.0 && tracer.y <= 10.0);
    }

    #[test]
    fn sequence_from_time() {
        let clock = SequenceClock {
            epoch: NaiveDate::from_ymd_opt(2000, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap(),
            rate: 5.0,
        };

        assert_eq!(clock.sequence(clock.epoch + Duration::hours(2), 50), 10);
        assert_eq!(clock.sequence(clock.epoch + Duration::minutes(15), 50), 1);
        assert_eq!(clock.sequence(clock.epoch - Duration::hours(2), 50), 40);
    }
}
