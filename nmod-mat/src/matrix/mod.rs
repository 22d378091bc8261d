//! # Matrix Module
//!
//! Dense row-major matrices over [`ModRing`], the borrowed views the
//! algorithms operate on, entrywise arithmetic, and random generators.

pub mod ops;
pub mod random;
pub mod view;

pub use view::{MatMut, MatRef};

use std::ops::Index;

use crate::errors::NmodMatError;
use crate::ring::ModRing;

/// An owning `rows x cols` matrix with entries canonically reduced into
/// `[0, n)`, stored contiguously row by row.
#[derive(Debug, Clone)]
pub struct NmodMat {
    rows: usize,
    cols: usize,
    ring: ModRing,
    entries: Vec<u64>,
}

impl NmodMat {
    /// Zero matrix. An empty shape allocates nothing.
    pub fn new(rows: usize, cols: usize, ring: ModRing) -> Self {
        NmodMat {
            rows,
            cols,
            ring,
            entries: vec![0; rows * cols],
        }
    }

    /// Zero matrix over Z/`modulus`Z.
    ///
    /// # Errors
    ///
    /// Returns `NmodMatError::InvalidModulus` for modulus 0.
    pub fn try_with(rows: usize, cols: usize, modulus: u64) -> Result<Self, NmodMatError> {
        Ok(Self::new(rows, cols, ModRing::try_with(modulus)?))
    }

    pub fn identity(n: usize, ring: ModRing) -> Self {
        let mut m = Self::new(n, n, ring);
        m.set_one();
        m
    }

    /// Builds a matrix from row vectors, reducing every entry.
    ///
    /// # Errors
    ///
    /// Returns `NmodMatError::DimensionMismatch` if the rows are ragged.
    ///
    /// # Example
    ///
    /// ```
    /// # use nmod_mat::{ModRing, NmodMat};
    /// let ring = ModRing::try_with(7).unwrap();
    /// let m = NmodMat::from_rows(&[vec![1, 9], vec![14, 3]], ring).unwrap();
    /// assert_eq!(m.row(0), &[1, 2]);
    /// assert_eq!(m.get(1, 0), 0);
    /// assert!(NmodMat::from_rows(&[vec![1], vec![1, 2]], ring).is_err());
    /// ```
    pub fn from_rows(data: &[Vec<u64>], ring: ModRing) -> Result<Self, NmodMatError> {
        let rows = data.len();
        let cols = data.first().map_or(0, Vec::len);
        let mut entries = Vec::with_capacity(rows * cols);
        for (i, row) in data.iter().enumerate() {
            if row.len() != cols {
                return Err(NmodMatError::DimensionMismatch(format!(
                    "Row {} has length {} but expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            entries.extend(row.iter().map(|&v| ring.reduce(v)));
        }
        Ok(NmodMat {
            rows,
            cols,
            ring,
            entries,
        })
    }

    /// Builds a matrix from `rows * cols` row-major entries, reducing them.
    ///
    /// # Errors
    ///
    /// Returns `NmodMatError::DimensionMismatch` on a length mismatch.
    pub fn from_entries(
        rows: usize,
        cols: usize,
        mut entries: Vec<u64>,
        ring: ModRing,
    ) -> Result<Self, NmodMatError> {
        if entries.len() != rows * cols {
            return Err(NmodMatError::DimensionMismatch(format!(
                "{} entries cannot fill a {}x{} matrix",
                entries.len(),
                rows,
                cols
            )));
        }
        crate::vector::reduce(&mut entries, ring);
        Ok(NmodMat {
            rows,
            cols,
            ring,
            entries,
        })
    }

    pub(crate) fn from_reduced(rows: usize, cols: usize, ring: ModRing, entries: Vec<u64>) -> Self {
        debug_assert_eq!(entries.len(), rows * cols);
        NmodMat {
            rows,
            cols,
            ring,
            entries,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn ring(&self) -> ModRing {
        self.ring
    }

    pub fn modulus(&self) -> u64 {
        self.ring.modulus()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Row-major entries.
    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u64 {
        self[(i, j)]
    }

    /// Stores `value` reduced into `[0, n)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: u64) {
        assert!(i < self.rows && j < self.cols, "entry ({i}, {j}) out of range");
        self.entries[i * self.cols + j] = self.ring.reduce(value);
    }

    pub fn row(&self, i: usize) -> &[u64] {
        assert!(i < self.rows, "row {i} out of range");
        &self.entries[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [u64] {
        assert!(i < self.rows, "row {i} out of range");
        &mut self.entries[i * self.cols..(i + 1) * self.cols]
    }

    pub fn view(&self) -> MatRef<'_> {
        MatRef::from_slice(&self.entries, self.rows, self.cols, self.cols, self.ring)
    }

    pub fn view_mut(&mut self) -> MatMut<'_> {
        MatMut::from_slice(&mut self.entries, self.rows, self.cols, self.cols, self.ring)
    }

    /// Borrowed view of rows `[r1, r2)` and columns `[c1, c2)`.
    pub fn window(&self, r1: usize, c1: usize, r2: usize, c2: usize) -> MatRef<'_> {
        self.view().window(r1, c1, r2, c2)
    }

    pub fn window_mut(&mut self, r1: usize, c1: usize, r2: usize, c2: usize) -> MatMut<'_> {
        self.view_mut().window(r1, c1, r2, c2)
    }

    pub fn set_zero(&mut self) {
        self.entries.fill(0);
    }

    /// Sets the matrix to the identity; requires a square matrix.
    pub fn set_one(&mut self) {
        assert!(self.is_square(), "identity needs a square matrix");
        self.view_mut().set_identity();
    }

    pub fn is_zero(&self) -> bool {
        crate::vector::is_zero(&self.entries)
    }

    /// Exchanges two matrices without touching their entries.
    pub fn swap(&mut self, other: &mut NmodMat) {
        std::mem::swap(self, other);
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.view_mut().swap_rows(i, j);
    }

    pub fn transpose(&self) -> NmodMat {
        self.view().transpose()
    }

    /// Transposes a square matrix in place.
    pub fn transpose_in_place(&mut self) {
        self.view_mut().transpose_in_place();
    }

    /// `[self | other]`.
    pub fn concat_horizontal(&self, other: &NmodMat) -> NmodMat {
        assert_eq!(self.rows, other.rows, "horizontal concat needs equal row counts");
        assert_eq!(self.ring, other.ring, "operands over different moduli");
        let mut out = NmodMat::new(self.rows, self.cols + other.cols, self.ring);
        for i in 0..self.rows {
            let (left, right) = out.row_mut(i).split_at_mut(self.cols);
            left.copy_from_slice(self.row(i));
            right.copy_from_slice(other.row(i));
        }
        out
    }

    /// `self` stacked on top of `other`.
    pub fn concat_vertical(&self, other: &NmodMat) -> NmodMat {
        assert_eq!(self.cols, other.cols, "vertical concat needs equal column counts");
        assert_eq!(self.ring, other.ring, "operands over different moduli");
        let mut entries = Vec::with_capacity(self.entries.len() + other.entries.len());
        entries.extend_from_slice(&self.entries);
        entries.extend_from_slice(&other.entries);
        NmodMat::from_reduced(self.rows + other.rows, self.cols, self.ring, entries)
    }

    /// Sum of the diagonal of a square matrix.
    pub fn trace(&self) -> u64 {
        assert!(self.is_square(), "trace needs a square matrix");
        (0..self.rows).fold(0, |acc, i| self.ring.add(acc, self.get(i, i)))
    }
}

impl PartialEq for NmodMat {
    fn eq(&self, other: &Self) -> bool {
        self.view().equal(&other.view())
    }
}

impl Eq for NmodMat {}

impl Index<(usize, usize)> for NmodMat {
    type Output = u64;

    fn index(&self, (i, j): (usize, usize)) -> &u64 {
        assert!(i < self.rows && j < self.cols, "entry ({i}, {j}) out of range");
        &self.entries[i * self.cols + j]
    }
}
