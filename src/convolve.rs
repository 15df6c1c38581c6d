//! Dense 2-D convolution over `f64` grids.
//!
//! [`convolve_symmetric`] is a "same"-shaped convolution whose out-of-range
//! samples are mirrored at the grid edge with the edge sample repeated
//! (`... 1 0 | 0 1 2 ... n-1 | n-1 n-2 ...`). It applies the kernel as is, so
//! any normalisation is the caller's job.

use ndarray::Array2;

/// Folds an out-of-range index back into `0..len` by mirroring about the
/// grid edges, repeating the edge sample.
///
/// Indices further out than one grid length keep folding, which matters when
/// the kernel is larger than the grid.
#[inline]
fn reflect(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let folded = index.rem_euclid(period);
    if folded < len as isize {
        folded as usize
    } else {
        (period - 1 - folded) as usize
    }
}

#[inline]
fn clamp_index(index: isize, len: usize) -> usize {
    index.clamp(0, len as isize - 1) as usize
}

/// Convolves `grid` with `kernel` and returns a grid of the same shape.
///
/// The kernel is flipped (true convolution, not correlation) and anchored at
/// `((rows - 1) / 2, (cols - 1) / 2)`, so odd and even kernel sizes line up the
/// same way a "same"-mode convolution does. Grids of any parity are accepted.
///
/// An empty grid yields an empty grid.
pub fn convolve_symmetric(grid: &Array2<f64>, kernel: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((rows, cols));
    }

    let (k_rows, k_cols) = kernel.dim();
    let anchor_row = ((k_rows.max(1) - 1) / 2) as isize;
    let anchor_col = ((k_cols.max(1) - 1) / 2) as isize;

    // Only non-zero taps contribute; the neighbour kernel has a zero centre.
    let taps: Vec<(isize, isize, f64)> = kernel
        .indexed_iter()
        .filter(|&(_, &weight)| weight != 0.0)
        .map(|((kr, kc), &weight)| (anchor_row - kr as isize, anchor_col - kc as isize, weight))
        .collect();

    Array2::from_shape_fn((rows, cols), |(row, col)| {
        taps.iter()
            .map(|&(dr, dc, weight)| {
                let r = reflect(row as isize + dr, rows);
                let c = reflect(col as isize + dc, cols);
                weight * grid[[r, c]]
            })
            .sum()
    })
}

/// Mean over a `size x size` window centred on each pixel, with borders
/// extended by replicating the edge samples.
///
/// Computed as two running-sum passes, so the cost does not grow with the
/// window area. `size` is expected to be odd.
pub fn box_mean_replicate(grid: &Array2<f64>, size: usize) -> Array2<f64> {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 || size == 0 {
        return grid.clone();
    }
    let radius = (size / 2) as isize;

    let mut horizontal = Array2::<f64>::zeros((rows, cols));
    for row in 0..rows {
        let mut sum: f64 = (-radius..=radius)
            .map(|dc| grid[[row, clamp_index(dc, cols)]])
            .sum();
        horizontal[[row, 0]] = sum;
        for col in 1..cols {
            let entering = clamp_index(col as isize + radius, cols);
            let leaving = clamp_index(col as isize - radius - 1, cols);
            sum += grid[[row, entering]] - grid[[row, leaving]];
            horizontal[[row, col]] = sum;
        }
    }

    let area = (size * size) as f64;
    let mut mean = Array2::<f64>::zeros((rows, cols));
    for col in 0..cols {
        let mut sum: f64 = (-radius..=radius)
            .map(|dr| horizontal[[clamp_index(dr, rows), col]])
            .sum();
        mean[[0, col]] = sum / area;
        for row in 1..rows {
            let entering = clamp_index(row as isize + radius, rows);
            let leaving = clamp_index(row as isize - radius - 1, rows);
            sum += horizontal[[entering, col]] - horizontal[[leaving, col]];
            mean[[row, col]] = sum / area;
        }
    }

    mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_grid_eq(actual: &Array2<f64>, expected: &Array2<f64>) {
        assert_eq!(actual.dim(), expected.dim());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-9, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn reflect_repeats_edge_sample() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        // Folds again past one full period.
        assert_eq!(reflect(9, 4), 1);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn output_shape_matches_input() {
        for (rows, cols) in [(1, 1), (4, 7), (6, 6), (9, 2)] {
            let grid = Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f64);
            for size in [1, 3, 5, 9] {
                let kernel = Array2::from_elem((size, size), 1.0);
                assert_eq!(convolve_symmetric(&grid, &kernel).dim(), (rows, cols));
            }
        }
    }

    #[test]
    fn zero_kernel_gives_zero_output() {
        let grid = Array2::from_shape_fn((5, 8), |(r, c)| (r * 31 + c * 7) as f64);
        let kernel = Array2::zeros((3, 3));
        let out = convolve_symmetric(&grid, &kernel);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn ones_kernel_uses_mirrored_border() {
        let grid = array![[1.0, 2.0], [3.0, 4.0]];
        let kernel = Array2::from_elem((3, 3), 1.0);
        // Top-left neighbourhood after mirroring:
        // 1 1 2 / 1 1 2 / 3 3 4
        let out = convolve_symmetric(&grid, &kernel);
        assert_grid_eq(&out, &array![[18.0, 21.0], [24.0, 27.0]]);
    }

    #[test]
    fn kernel_is_flipped() {
        let grid = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let mut kernel = Array2::<f64>::zeros((3, 3));
        kernel[[0, 0]] = 1.0;
        let out = convolve_symmetric(&grid, &kernel);
        // A top-left impulse pulls each sample from the lower-right neighbour.
        assert_eq!(out[[0, 0]], 5.0);
        assert_eq!(out[[1, 1]], 9.0);
        assert_eq!(out[[2, 0]], 8.0);
        // Past the edge the mirrored sample is the edge itself.
        assert_eq!(out[[2, 2]], 9.0);
    }

    #[test]
    fn kernel_larger_than_grid() {
        let grid = array![[2.0]];
        let kernel = Array2::from_elem((5, 5), 1.0);
        assert_grid_eq(&convolve_symmetric(&grid, &kernel), &array![[50.0]]);
    }

    #[test]
    fn box_mean_of_constant_is_constant() {
        let grid = Array2::from_elem((7, 11), 42.0);
        let mean = box_mean_replicate(&grid, 5);
        assert!(mean.iter().all(|&v| (v - 42.0).abs() < 1e-9));
    }

    #[test]
    fn box_mean_replicates_edges() {
        let grid = array![[0.0, 0.0, 9.0]];
        let mean = box_mean_replicate(&grid, 3);
        // Rows replicate, so each column mean is the horizontal mean.
        assert_grid_eq(&mean, &array![[0.0, 3.0, 6.0]]);
    }
}
