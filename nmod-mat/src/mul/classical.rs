//! Classical product: transpose `B` so both operands stream row by row, then
//! one dot product per output entry.

use crate::matrix::{MatMut, MatRef};
use crate::vector::{DotParams, dot};

use super::Accumulate;

pub(crate) fn mul(mut c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, op: Accumulate) {
    let ring = a.ring();
    let params = DotParams::new(a.cols(), ring);
    let bt = b.transpose();

    for i in 0..a.rows() {
        let a_row = a.row(i);
        for (j, out) in c.row_mut(i).iter_mut().enumerate() {
            let value = dot(a_row, bt.row(j), params);
            *out = op.apply(*out, value, ring);
        }
    }
}
