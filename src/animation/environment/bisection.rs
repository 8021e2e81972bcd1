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

//! Module containg methods for conducting
//! binary search (bisection) of elements closests
//! to searched values in grid axes.

use crate::errors::SearchError;

/// Core bisection function, simply an implementation
/// of binary search algorithm adapted to searching values
/// in-between the set items.
///
/// Grid axes are always ascending, so unlike `binary_search()`
/// for slices this returns the first item not smaller than `x`
/// instead of failing on values between the items.
fn binary_search<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let (first, last) = match (array.first(), array.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SearchError::EmptyArray),
    };

    if x < first || x > last {
        return Err(SearchError::OutOfBounds);
    }

    let mut lo = 0;
    let mut hi = array.len() - 1;

    while lo < hi {
        let mid = (lo + hi) / 2;

        if array[mid] >= *x {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    Ok(lo)
}

/// Convienience public method to find a closest value
/// to requested to the left of the searched item.
pub fn find_left_closest<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let found_index = binary_search(array, x)?;

    if array[found_index] <= *x {
        Ok(found_index)
    } else {
        Ok(found_index - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::find_left_closest;
    use crate::errors::SearchError;

    #[test]
    fn left_closest() {
        let axis = [0.0, 1.0, 2.0, 3.0];

        assert_eq!(find_left_closest(&axis, &0.0), Ok(0));
        assert_eq!(find_left_closest(&axis, &1.5), Ok(1));
        assert_eq!(find_left_closest(&axis, &2.0), Ok(2));
        assert_eq!(find_left_closest(&axis, &3.0), Ok(3));
    }

    #[test]
    fn out_of_bounds() {
        let axis = [0.0, 1.0];
        let empty: [f64; 0] = [];

        assert_eq!(find_left_closest(&axis, &-0.5), Err(SearchError::OutOfBounds));
        assert_eq!(find_left_closest(&axis, &1.5), Err(SearchError::OutOfBounds));
        assert_eq!(find_left_closest(&empty, &0.0), Err(SearchError::EmptyArray));
    }
}
