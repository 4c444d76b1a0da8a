//! Tiny fixed-size linear algebra for the filter math.
//!
//! Matrix dimensions are const generics, so shape mismatches are compile errors. Only the
//! operations needed by [`crate::filter::Kalman`] are provided.

use std::{
    array, fmt,
    ops::{Add, Index, IndexMut, Mul, Sub},
};

/// A 1x1 matrix.
pub type Mat1 = Matrix<1, 1>;
/// A 3x3 matrix.
pub type Mat3 = Matrix<3, 3>;
/// A matrix with 1 row and 3 columns.
pub type Mat1x3 = Matrix<1, 3>;
/// A column vector with `N` elements.
pub type ColVec<const N: usize> = Matrix<N, 1>;
/// A column vector with 3 elements.
pub type Vec3 = ColVec<3>;

/// A column-major matrix of [`f64`]s with `R` rows and `C` columns.
///
/// Elements are indexed with `(row, column)` tuples, 0-based.
#[derive(Clone, Copy, PartialEq)]
pub struct Matrix<const R: usize, const C: usize>([[f64; R]; C]);

impl<const R: usize, const C: usize> Matrix<R, C> {
    /// A matrix with every element set to 0.
    pub const ZERO: Self = Self([[0.0; R]; C]);

    /// Creates a [`Matrix`] from an array of rows.
    pub fn from_rows(rows: [[f64; C]; R]) -> Self {
        Self::from_fn(|row, col| rows[row][col])
    }

    /// Creates a [`Matrix`] by invoking a closure with the row and column of each element.
    pub fn from_fn<F>(mut cb: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        Self(array::from_fn(|col| array::from_fn(|row| cb(row, col))))
    }

    /// Applies a closure to each element, returning a new matrix.
    pub fn map<F>(self, mut f: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        Self(self.0.map(|column| column.map(|v| f(v))))
    }

    /// Swaps the rows and columns of this matrix.
    pub fn transpose(self) -> Matrix<C, R> {
        Matrix::from_fn(|row, col| self[(col, row)])
    }
}

impl<const N: usize> Matrix<N, N> {
    /// The identity matrix, with 1 on its diagonal and 0 everywhere else.
    pub const IDENTITY: Self = {
        let mut m = [[0.0; N]; N];
        let mut i = 0;
        while i < N {
            m[i][i] = 1.0;
            i += 1;
        }
        Self(m)
    };

    /// Creates a square matrix with `diagonal` on its diagonal and 0 everywhere else.
    pub fn from_diagonal(diagonal: [f64; N]) -> Self {
        Self::from_fn(|row, col| if row == col { diagonal[row] } else { 0.0 })
    }
}

impl<const N: usize> ColVec<N> {
    /// Creates a column vector from its elements.
    pub fn from_column(elems: [f64; N]) -> Self {
        Self([elems])
    }

    /// Returns the elements of this column vector.
    pub fn into_column(self) -> [f64; N] {
        self.0[0]
    }
}

impl Mat1 {
    pub fn scalar(self) -> f64 {
        self.0[0][0]
    }
}

impl From<f64> for Mat1 {
    fn from(value: f64) -> Self {
        Self([[value]])
    }
}

impl<const R: usize, const C: usize> Index<(usize, usize)> for Matrix<R, C> {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.0[col][row]
    }
}

impl<const R: usize, const C: usize> IndexMut<(usize, usize)> for Matrix<R, C> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.0[col][row]
    }
}

/// Matrix * Matrix.
impl<const M: usize, const N: usize, const P: usize> Mul<Matrix<N, P>> for Matrix<M, N> {
    type Output = Matrix<M, P>;

    fn mul(self, rhs: Matrix<N, P>) -> Matrix<M, P> {
        Matrix::from_fn(|i, j| (0..N).fold(0.0, |acc, k| acc + self[(i, k)] * rhs[(k, j)]))
    }
}

/// Matrix * Scalar.
impl<const R: usize, const C: usize> Mul<f64> for Matrix<R, C> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.map(|elem| elem * rhs)
    }
}

impl<const R: usize, const C: usize> Add for Matrix<R, C> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_fn(|row, col| self[(row, col)] + rhs[(row, col)])
    }
}

impl<const R: usize, const C: usize> Sub for Matrix<R, C> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_fn(|row, col| self[(row, col)] - rhs[(row, col)])
    }
}

impl<const R: usize, const C: usize> fmt::Debug for Matrix<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for row in 0..R {
            let row: [f64; C] = array::from_fn(|col| self[(row, col)]);
            list.entry(&row);
        }
        list.finish()
    }
}
