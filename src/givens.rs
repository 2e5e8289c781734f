//! Givens plane rotations

use ndarray::{s, ArrayBase, DataMut, Ix2, NdFloat, Zip};

/// A Givens rotation acting on a pair of coordinates `(i, j)`:
///
/// ```text
/// x_i' =  c * x_i + s * x_j
/// x_j' = -s * x_i + c * x_j
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GivensRotation<A> {
    c: A,
    s: A,
}

impl<A: NdFloat> GivensRotation<A> {
    /// The rotation by `angle` radians
    pub fn from_angle(angle: A) -> Self {
        Self {
            c: angle.cos(),
            s: angle.sin(),
        }
    }

    /// Computes the rotation `R` such that the second component of `R * [x, y].t` is 0.
    ///
    /// Returns the rotation along with the first component of the rotated vector, which is the
    /// norm of `[x, y]`. When `y` is already 0 the identity is returned together with `x`.
    pub fn cancel_y(x: A, y: A) -> (Self, A) {
        if y.is_zero() {
            return (Self::identity(), x);
        }
        let r = x.hypot(y);
        (Self { c: x / r, s: y / r }, r)
    }

    pub fn identity() -> Self {
        Self {
            c: A::one(),
            s: A::zero(),
        }
    }

    /// Rotates the 2-vector `(x, y)`
    #[inline]
    pub fn apply(&self, x: A, y: A) -> (A, A) {
        (self.c * x + self.s * y, -self.s * x + self.c * y)
    }

    /// Rotates rows `i` and `j` of `mat` in place, treating each column as a `(x_i, x_j)` pair.
    ///
    /// Panics if `i == j` or either index is out of bounds.
    pub fn rotate_rows<S: DataMut<Elem = A>>(&self, mat: &mut ArrayBase<S, Ix2>, i: usize, j: usize) {
        let (mut ri, mut rj) = mat.multi_slice_mut((s![i, ..], s![j, ..]));
        Zip::from(&mut ri).and(&mut rj).for_each(|a, b| {
            let (x, y) = self.apply(*a, *b);
            *a = x;
            *b = y;
        });
    }
}
