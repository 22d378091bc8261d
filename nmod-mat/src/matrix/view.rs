//! Borrowed matrix views.
//!
//! A view is `{pointer, rows, cols, stride, ring}` borrowed from an owning
//! [`NmodMat`] (or from any word buffer). Entry `(i, j)` lives at
//! `i * stride + j` from the view's base. [`MatRef`] is a shared, copyable
//! view; [`MatMut`] is unique and can be split into disjoint sub-views, which
//! is how the recursive algorithms address quadrants of a single buffer.

use std::fmt;
use std::marker::PhantomData;

use crate::ring::ModRing;

use super::NmodMat;

/// Checks that `rows x cols` entries with the given stride fit in `len`
/// words.
///
/// # Safety contract
///
/// Every `unsafe` block in this module relies on the following, for a view
/// `{ptr, rows, cols, stride}` with lifetime `'a`:
///
/// 1. For every `i < rows` the words `ptr + i * stride .. ptr + i * stride + cols`
///    lie inside one buffer borrowed for `'a`.
/// 2. `stride >= cols` whenever `rows > 1`, so two distinct rows of one view
///    never share a word.
/// 3. Two `MatMut` usable at the same time never share a word.
///
/// `from_slice` establishes 1 and 2 through this check. `window`, the splits
/// and `into_tiles` keep them: a sub-view keeps `stride`, starts inside the
/// parent and only shrinks `rows` and `cols`, as `check_window` asserts.
/// Property 3 holds because the splits cut along row or column boundaries
/// and consume the parent, and `rb_mut` and `window_mut` borrow it uniquely.
/// A view with `cols == 0` never forms a slice from its pointer.
fn check_extent(len: usize, rows: usize, cols: usize, stride: usize) {
    if rows > 0 && cols > 0 {
        assert!(rows == 1 || stride >= cols, "stride shorter than a row");
        assert!(
            len >= (rows - 1) * stride + cols,
            "view does not fit in its buffer"
        );
    }
}

fn check_window(rows: usize, cols: usize, r1: usize, c1: usize, r2: usize, c2: usize) {
    assert!(
        r1 <= r2 && r2 <= rows && c1 <= c2 && c2 <= cols,
        "window [{r1}, {r2}) x [{c1}, {c2}) out of bounds for {rows} x {cols}"
    );
}

#[derive(Clone, Copy)]
pub struct MatRef<'a> {
    ptr: *const u64,
    rows: usize,
    cols: usize,
    stride: usize,
    ring: ModRing,
    _marker: PhantomData<&'a [u64]>,
}

// SAFETY: a MatRef only hands out shared access to plain words within the
// borrowed region (contract 1 on `check_extent`).
unsafe impl Send for MatRef<'_> {}
unsafe impl Sync for MatRef<'_> {}

impl<'a> MatRef<'a> {
    /// Views `rows x cols` entries of `data` laid out with the given stride.
    pub fn from_slice(
        data: &'a [u64],
        rows: usize,
        cols: usize,
        stride: usize,
        ring: ModRing,
    ) -> Self {
        check_extent(data.len(), rows, cols, stride);
        MatRef {
            ptr: data.as_ptr(),
            rows,
            cols,
            stride,
            ring,
            _marker: PhantomData,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn stride(&self) -> usize {
        self.stride
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

    #[inline]
    pub fn row(&self, i: usize) -> &'a [u64] {
        assert!(i < self.rows, "row {i} out of range for {} rows", self.rows);
        if self.cols == 0 {
            return &[];
        }
        // SAFETY: i < rows, so by contract 1 on `check_extent` row i is
        // `cols` words inside the region borrowed for 'a.
        unsafe { std::slice::from_raw_parts(self.ptr.wrapping_add(i * self.stride), self.cols) }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u64 {
        self.row(i)[j]
    }

    /// Iterates over the rows as slices.
    pub fn row_slices(self) -> impl Iterator<Item = &'a [u64]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Iterates down column `j`.
    pub fn col_iter(self, j: usize) -> impl Iterator<Item = u64> + 'a {
        assert!(j < self.cols, "column {j} out of range for {} columns", self.cols);
        (0..self.rows).map(move |i| self.row(i)[j])
    }

    /// View of rows `[r1, r2)` and columns `[c1, c2)`.
    pub fn window(self, r1: usize, c1: usize, r2: usize, c2: usize) -> MatRef<'a> {
        check_window(self.rows, self.cols, r1, c1, r2, c2);
        MatRef {
            ptr: self.ptr.wrapping_add(r1 * self.stride + c1),
            rows: r2 - r1,
            cols: c2 - c1,
            ..self
        }
    }

    pub fn split_at_row(self, r: usize) -> (MatRef<'a>, MatRef<'a>) {
        (
            self.window(0, 0, r, self.cols),
            self.window(r, 0, self.rows, self.cols),
        )
    }

    pub fn split_at_col(self, c: usize) -> (MatRef<'a>, MatRef<'a>) {
        (
            self.window(0, 0, self.rows, c),
            self.window(0, c, self.rows, self.cols),
        )
    }

    /// Copies the view into a fresh owning matrix.
    pub fn to_mat(&self) -> NmodMat {
        let mut entries = Vec::with_capacity(self.rows * self.cols);
        for row in self.row_slices() {
            entries.extend_from_slice(row);
        }
        NmodMat::from_reduced(self.rows, self.cols, self.ring, entries)
    }

    pub fn transpose(&self) -> NmodMat {
        let mut out = NmodMat::new(self.cols, self.rows, self.ring);
        for (i, row) in self.row_slices().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                out.row_mut(j)[i] = v;
            }
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.row_slices().all(crate::vector::is_zero)
    }

    /// Same shape and same entries. Shapes are compared before any entry is read.
    pub fn equal(&self, other: &MatRef<'_>) -> bool {
        if self.rows != other.rows || self.cols != other.cols {
            return false;
        }
        if self.is_empty() {
            return true;
        }
        self.row_slices().zip(other.row_slices()).all(|(a, b)| a == b)
    }
}

impl PartialEq for MatRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl fmt::Debug for MatRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatRef")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("modulus", &self.ring.modulus())
            .field("entries", &self.row_slices().collect::<Vec<_>>())
            .finish()
    }
}

pub struct MatMut<'a> {
    ptr: *mut u64,
    rows: usize,
    cols: usize,
    stride: usize,
    ring: ModRing,
    _marker: PhantomData<&'a mut [u64]>,
}

// SAFETY: a MatMut is a unique borrow of plain words, and sub-views moved to
// other threads are disjoint (contract 3 on `check_extent`). Through `&MatMut`
// only reads are possible.
unsafe impl Send for MatMut<'_> {}
unsafe impl Sync for MatMut<'_> {}

impl<'a> MatMut<'a> {
    pub fn from_slice(
        data: &'a mut [u64],
        rows: usize,
        cols: usize,
        stride: usize,
        ring: ModRing,
    ) -> Self {
        check_extent(data.len(), rows, cols, stride);
        MatMut {
            ptr: data.as_mut_ptr(),
            rows,
            cols,
            stride,
            ring,
            _marker: PhantomData,
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

    /// Shared reborrow.
    pub fn rb(&self) -> MatRef<'_> {
        MatRef {
            ptr: self.ptr,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
            ring: self.ring,
            _marker: PhantomData,
        }
    }

    /// Unique reborrow with a shorter lifetime.
    pub fn rb_mut(&mut self) -> MatMut<'_> {
        MatMut {
            ptr: self.ptr,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
            ring: self.ring,
            _marker: PhantomData,
        }
    }

    pub fn into_ref(self) -> MatRef<'a> {
        MatRef {
            ptr: self.ptr,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
            ring: self.ring,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[u64] {
        self.rb().row(i)
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [u64] {
        assert!(i < self.rows, "row {i} out of range for {} rows", self.rows);
        if self.cols == 0 {
            return &mut [];
        }
        // SAFETY: in bounds by contract 1 on `check_extent`; no other view
        // reaches these words by contract 3, and `&mut self` holds this one.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.wrapping_add(i * self.stride), self.cols) }
    }

    /// Two distinct rows, both writable.
    pub fn row_pair_mut(&mut self, i: usize, j: usize) -> (&mut [u64], &mut [u64]) {
        assert!(i != j, "row_pair_mut needs two distinct rows");
        assert!(i < self.rows && j < self.rows, "row out of range");
        if self.cols == 0 {
            return (&mut [], &mut []);
        }
        // SAFETY: both rows are in bounds by contract 1 and, being distinct
        // rows of one view with rows > 1, disjoint by contract 2.
        unsafe {
            (
                std::slice::from_raw_parts_mut(self.ptr.wrapping_add(i * self.stride), self.cols),
                std::slice::from_raw_parts_mut(self.ptr.wrapping_add(j * self.stride), self.cols),
            )
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u64 {
        self.row(i)[j]
    }

    /// Stores `value` reduced into `[0, n)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: u64) {
        let value = self.ring.reduce(value);
        self.row_mut(i)[j] = value;
    }

    pub fn window(self, r1: usize, c1: usize, r2: usize, c2: usize) -> MatMut<'a> {
        check_window(self.rows, self.cols, r1, c1, r2, c2);
        MatMut {
            ptr: self.ptr.wrapping_add(r1 * self.stride + c1),
            rows: r2 - r1,
            cols: c2 - c1,
            ..self
        }
    }

    pub fn split_at_row(self, r: usize) -> (MatMut<'a>, MatMut<'a>) {
        assert!(r <= self.rows, "split row {r} out of range");
        let top = MatMut { rows: r, ..self };
        let bottom = MatMut {
            ptr: self.ptr.wrapping_add(r * self.stride),
            rows: self.rows - r,
            ..self
        };
        (top, bottom)
    }

    pub fn split_at_col(self, c: usize) -> (MatMut<'a>, MatMut<'a>) {
        assert!(c <= self.cols, "split column {c} out of range");
        let left = MatMut { cols: c, ..self };
        let right = MatMut {
            ptr: self.ptr.wrapping_add(c),
            cols: self.cols - c,
            ..self
        };
        (left, right)
    }

    /// Splits into top-left, top-right, bottom-left, bottom-right.
    pub fn split_at(self, r: usize, c: usize) -> (MatMut<'a>, MatMut<'a>, MatMut<'a>, MatMut<'a>) {
        let (top, bottom) = self.split_at_row(r);
        let (tl, tr) = top.split_at_col(c);
        let (bl, br) = bottom.split_at_col(c);
        (tl, tr, bl, br)
    }

    /// Cuts the view into disjoint tiles of at most `tile_rows x tile_cols`,
    /// each tagged with its top-left position.
    pub fn into_tiles(self, tile_rows: usize, tile_cols: usize) -> Vec<(usize, usize, MatMut<'a>)> {
        assert!(tile_rows > 0 && tile_cols > 0, "tiles must be nonempty");
        let mut tiles = Vec::new();
        let mut rest = self;
        let mut r0 = 0;
        while rest.rows > 0 && rest.cols > 0 {
            let h = tile_rows.min(rest.rows);
            let (mut band, tail) = rest.split_at_row(h);
            rest = tail;
            let mut c0 = 0;
            while band.cols > 0 {
                let w = tile_cols.min(band.cols);
                let (tile, right) = band.split_at_col(w);
                tiles.push((r0, c0, tile));
                band = right;
                c0 += w;
            }
            r0 += h;
        }
        tiles
    }

    /// Fills with `value`, which must already be reduced.
    pub fn fill(&mut self, value: u64) {
        for i in 0..self.rows {
            self.row_mut(i).fill(value);
        }
    }

    pub fn fill_zero(&mut self) {
        self.fill(0);
    }

    /// Zero with ones on the main diagonal.
    pub fn set_identity(&mut self) {
        let one = self.ring.one();
        self.fill_zero();
        for i in 0..self.rows.min(self.cols) {
            self.row_mut(i)[i] = one;
        }
    }

    pub fn copy_from(&mut self, src: MatRef<'_>) {
        assert!(
            self.rows == src.rows() && self.cols == src.cols(),
            "copy between shapes {}x{} and {}x{}",
            self.rows,
            self.cols,
            src.rows(),
            src.cols()
        );
        for i in 0..self.rows {
            self.row_mut(i).copy_from_slice(src.row(i));
        }
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        if i != j {
            let (a, b) = self.row_pair_mut(i, j);
            a.swap_with_slice(b);
        }
    }

    /// Row `i` becomes the old row `perm[i]`.
    pub fn permute_rows(&mut self, perm: &[usize]) {
        assert_eq!(perm.len(), self.rows, "permutation length must match rows");
        let old = self.rb().to_mat();
        for (i, &src) in perm.iter().enumerate() {
            self.row_mut(i).copy_from_slice(old.row(src));
        }
    }

    /// Transposes a square view in place.
    pub fn transpose_in_place(&mut self) {
        assert_eq!(self.rows, self.cols, "in-place transpose needs a square view");
        for i in 0..self.rows {
            for j in i + 1..self.cols {
                let (upper, lower) = (self.get(i, j), self.get(j, i));
                self.row_mut(i)[j] = lower;
                self.row_mut(j)[i] = upper;
            }
        }
    }
}

impl fmt::Debug for MatMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.rb().fmt(f)
    }
}
