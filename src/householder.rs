use ndarray::{s, Array2, ArrayBase, Data, DataMut, Ix1, Ix2, NdFloat};

/// Reflection across the hyperplane orthogonal to a unit (or zero) axis, `H = I - 2 * v * v.t`.
///
/// A zero axis is the identity, which is how an already-cleared column is represented.
pub struct Reflection<S: Data> {
    axis: ArrayBase<S, Ix1>,
}

impl<A: NdFloat, S: Data<Elem = A>> Reflection<S> {
    pub fn new(axis: ArrayBase<S, Ix1>) -> Self {
        Self { axis }
    }

    /// Replaces every column `x` of `rhs` with `H * x`
    pub fn reflect_cols<M: DataMut<Elem = A>>(&self, rhs: &mut ArrayBase<M, Ix2>) {
        let m_two = A::from(-2.0f64).unwrap();
        for mut col in rhs.columns_mut() {
            let factor = self.axis.dot(&col) * m_two;
            col.scaled_add(factor, &self.axis);
        }
    }
}

/// Turns `col` into the unit axis of the reflection mapping it onto a multiple of the first
/// basis vector.
///
/// Returns the first component of the reflected column, or `None` if the column is zero, in
/// which case `col` is left as a zero axis.
pub fn reflection_axis_mut<A: NdFloat, S: DataMut<Elem = A>>(
    col: &mut ArrayBase<S, Ix1>,
) -> Option<A> {
    let norm_sq = col.dot(col);
    let norm = norm_sq.sqrt();

    let first = col[0];
    let signed_norm = first.signum() * norm;
    col[0] += signed_norm;
    // equal to the squared norm of the updated column
    let axis_norm_sq = (norm_sq + first.abs() * norm) * A::from(2.0f64).unwrap();

    if axis_norm_sq.is_zero() {
        None
    } else {
        *col /= axis_norm_sq.sqrt();
        Some(-signed_norm)
    }
}

/// Reflects away the entries of column `icol` below row `icol + shift`, applying the same
/// reflection to every column to its right. The axis is left in the cleared entries.
///
/// Returns the entry left at `(icol + shift, icol)`.
pub fn clear_column<A: NdFloat, S: DataMut<Elem = A>>(
    matrix: &mut ArrayBase<S, Ix2>,
    icol: usize,
    shift: usize,
) -> A {
    let (mut left, mut right) = matrix.multi_slice_mut((s![.., icol], s![.., icol + 1..]));
    let mut axis = left.slice_mut(s![icol + shift..]);
    let value = reflection_axis_mut(&mut axis);

    if value.is_some() {
        Reflection::new(axis).reflect_cols(&mut right.slice_mut(s![icol + shift.., ..]));
    }
    value.unwrap_or_else(A::zero)
}

/// Reflects away the entries of row `irow` right of column `irow + shift`.
pub fn clear_row<A: NdFloat, S: DataMut<Elem = A>>(
    matrix: &mut ArrayBase<S, Ix2>,
    irow: usize,
    shift: usize,
) -> A {
    clear_column(&mut matrix.view_mut().reversed_axes(), irow, shift)
}

/// Multiplies out the reflections stored in the columns of `axes` into an orthogonal matrix with
/// `axes.nrows()` rows and `width` columns.
///
/// Reflection `i` has its axis in column `i`, starting at row `i + shift`, and acts on the
/// coordinates from `i + shift` onward.
///
/// Panics if `width` is smaller than the number of reflections.
pub fn assemble_q<A: NdFloat, S: Data<Elem = A>>(
    axes: &ArrayBase<S, Ix2>,
    shift: usize,
    width: usize,
) -> Array2<A> {
    let (nrows, ncols) = axes.dim();
    let count = nrows.min(ncols).saturating_sub(shift);
    assert!(width >= count && width <= nrows);

    let mut q = Array2::zeros((nrows, width));
    q.diag_mut().fill(A::one());

    // Columns before `i + shift` are still unit vectors with nothing below row `i + shift`, so
    // each reflection only needs to touch the trailing block.
    for i in (0..count).rev() {
        let axis = axes.slice(s![i + shift.., i]);
        Reflection::new(axis).reflect_cols(&mut q.slice_mut(s![i + shift.., i + shift..]));
    }
    q
}
