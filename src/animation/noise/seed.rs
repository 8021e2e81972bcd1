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

//! Static random field that the advection distorts.

use crate::animation::environment::{Grid, ScalarField};
use crate::{errors::AdvectionError, Float};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Noise pattern independent of time.
///
/// Created once per run and shared by all frames,
/// so that the texture stays coherent between them.
#[derive(Clone, PartialEq, Debug)]
pub struct NoiseSeed {
    field: ScalarField,
}

impl NoiseSeed {
    pub fn new(field: ScalarField) -> Self {
        NoiseSeed { field }
    }

    /// Uniform noise in `[-1, 1)`, the same for the same `seed`.
    pub fn random(grid: Grid, seed: u64) -> Result<Self, AdvectionError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let values = Array2::from_shape_simple_fn(grid.shape(), || rng.gen_range(-1.0..1.0));

        Ok(NoiseSeed::new(ScalarField::new(grid, values)?))
    }

    /// Reads the noise from headerless CSV with one line per latitude row.
    pub fn from_csv(file_path: &Path, grid: Grid) -> Result<Self, AdvectionError> {
        let (rows, cols) = grid.shape();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(file_path)?;

        let mut values = Vec::<Float>::with_capacity(rows * cols);

        for record in reader.deserialize() {
            let row: Vec<Float> = record?;

            if row.len() != cols {
                return Err(AdvectionError::SeedShape);
            }

            values.extend(row);
        }

        let values =
            Array2::from_shape_vec((rows, cols), values).map_err(|_| AdvectionError::SeedShape)?;

        Ok(NoiseSeed::new(ScalarField::new(grid, values)?))
    }

    pub fn field(&self) -> &ScalarField {
        &self.field
    }
}

#[cfg(test)]
mod tests {
    use super::NoiseSeed;
    use crate::animation::environment::Grid;
    use crate::errors::AdvectionError;
    use std::{env, fs};

    fn grid() -> Grid {
        Grid::regular(1.0, (0.0, 2.0), (0.0, 3.0)).unwrap()
    }

    #[test]
    fn reproducible_random_seed() {
        let first = NoiseSeed::random(grid(), 42).unwrap();
        let second = NoiseSeed::random(grid(), 42).unwrap();
        let other = NoiseSeed::random(grid(), 43).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert!(first
            .field()
            .values()
            .iter()
            .all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn seed_from_csv() {
        let file_path = env::temp_dir().join("animh_seed_from_csv.csv");
        let file_path = file_path.as_path();
        fs::write(file_path, "0,1,2,3\n4,5,6,7\n8,9,10,11\n").unwrap();

        let seed = NoiseSeed::from_csv(file_path, grid()).unwrap();
        assert_eq!(seed.field().values()[[2, 1]], 9.0);

        fs::write(file_path, "0,1,2,3\n4,5,6,7\n").unwrap();
        assert!(matches!(
            NoiseSeed::from_csv(file_path, grid()),
            Err(AdvectionError::SeedShape)
        ));

        fs::write(file_path, "0,1,2\n4,5,6\n8,9,10\n").unwrap();
        assert!(matches!(
            NoiseSeed::from_csv(file_path, grid()),
            Err(AdvectionError::SeedShape)
        ));
    }
}
