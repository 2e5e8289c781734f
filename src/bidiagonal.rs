//! Householder reduction of a tall matrix to upper-bidiagonal form

use ndarray::{s, Array1, Array2, ArrayBase, ArrayView1, DataMut, Ix2, NdFloat, RawDataClone};

use crate::{
    householder::{assemble_q, clear_column, clear_row},
    LinalgError, Result,
};

/// Bidiagonal decomposition of a non-empty matrix with at least as many rows as columns
pub trait Bidiagonal {
    type Decomp;

    /// Reduces the matrix to `U * B * V.t`, where `B` is upper-bidiagonal and `U`, `V` are
    /// orthogonal.
    ///
    /// Fails with `EmptyMatrix` on zero-sized input, `WrongRows` if the matrix is wider than it
    /// is tall, and `ReductionFailure` if the reduction produces non-finite values.
    fn bidiagonal(self) -> Result<Self::Decomp>;
}

impl<S, A> Bidiagonal for ArrayBase<S, Ix2>
where
    A: NdFloat,
    S: DataMut<Elem = A>,
{
    type Decomp = BidiagonalDecomp<A, S>;

    fn bidiagonal(mut self) -> Result<Self::Decomp> {
        let (nrows, ncols) = self.dim();
        if nrows == 0 || ncols == 0 {
            return Err(LinalgError::EmptyMatrix);
        }
        if nrows < ncols {
            return Err(LinalgError::WrongRows {
                expected: ncols,
                actual: nrows,
            });
        }

        let mut diagonal = vec![A::zero(); ncols];
        let mut off_diagonal = vec![A::zero(); ncols - 1];
        for i in 0..ncols - 1 {
            diagonal[i] = clear_column(&mut self, i, 0);
            off_diagonal[i] = clear_row(&mut self, i, 1);
        }
        diagonal[ncols - 1] = clear_column(&mut self, ncols - 1, 0);

        let finite = |x: &A| x.is_finite();
        if !diagonal.iter().all(finite) || !off_diagonal.iter().all(finite) {
            return Err(LinalgError::ReductionFailure);
        }

        Ok(BidiagonalDecomp {
            uv: self,
            diagonal,
            off_diagonal,
        })
    }
}

/// Upper-bidiagonal decomposition `A = U * B * V.t`.
///
/// The Householder axes of `U` live below the diagonal of `uv` and those of `V` to the right of
/// the superdiagonal; the factors are only multiplied out on request.
#[derive(Debug)]
pub struct BidiagonalDecomp<A, S: DataMut<Elem = A>> {
    uv: ArrayBase<S, Ix2>,
    diagonal: Vec<A>,
    off_diagonal: Vec<A>,
}

impl<A: Clone, S: DataMut<Elem = A> + RawDataClone> Clone for BidiagonalDecomp<A, S> {
    fn clone(&self) -> Self {
        Self {
            uv: self.uv.clone(),
            diagonal: self.diagonal.clone(),
            off_diagonal: self.off_diagonal.clone(),
        }
    }
}

impl<A: NdFloat, S: DataMut<Elem = A>> BidiagonalDecomp<A, S> {
    /// Generates `U`, which is R x R, or R x C if `compact` is set, where R and C are the
    /// dimensions of the decomposed matrix
    pub fn generate_u(&self, compact: bool) -> Array2<A> {
        let (nrows, ncols) = self.uv.dim();
        assemble_q(&self.uv, 0, if compact { ncols } else { nrows })
    }

    /// Generates `V`, which is C x C
    pub fn generate_v(&self) -> Array2<A> {
        let ncols = self.uv.ncols();
        assemble_q(&self.uv.t(), 1, ncols)
    }

    /// Main diagonal and superdiagonal of `B`
    pub fn diagonals(&self) -> (&[A], &[A]) {
        (&self.diagonal, &self.off_diagonal)
    }

    /// Returns `B` as a dense R x C matrix
    pub fn into_b(self) -> Array2<A> {
        let (nrows, ncols) = self.uv.dim();
        let mut b = Array2::zeros((nrows, ncols));
        b.diag_mut().assign(&ArrayView1::from(&self.diagonal));
        b.slice_mut(s![.., 1..])
            .diag_mut()
            .assign(&ArrayView1::from(&self.off_diagonal));
        b
    }

    /// Returns the main diagonal and superdiagonal of `B` as 1D arrays
    pub fn into_diagonals(self) -> (Array1<A>, Array1<A>) {
        (Array1::from(self.diagonal), Array1::from(self.off_diagonal))
    }
}
