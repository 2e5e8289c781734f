//! Singular value decomposition of general real matrices
//!
//! [`SvdImplicitQr`] reduces the input to bidiagonal form, runs the implicit QR iteration on the
//! bidiagonal, and assembles `A = U * W * V.t`. Wide matrices are decomposed through their
//! transpose, so the iteration always works on the tall orientation.

use std::{cmp::Ordering, mem};

use log::{debug, warn};
use ndarray::{
    s, Array1, Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut2, Axis, Data, Ix2,
    NdFloat,
};

use crate::{
    bidiagonal::Bidiagonal,
    implicit_qr::{magnitude_exponent, scale_by_pow2, ImplicitQr, QrConfig},
    Factor, LinalgError, Result,
};

/// What a decomposition computes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvdConfig {
    /// Keep only the `min(R, C)` singular vectors that pair with singular values
    pub compact: bool,
    pub compute_u: bool,
    pub compute_v: bool,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            compact: false,
            compute_u: true,
            compute_v: true,
        }
    }
}

impl SvdConfig {
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn with_u(mut self, compute_u: bool) -> Self {
        self.compute_u = compute_u;
        self
    }

    pub fn with_v(mut self, compute_v: bool) -> Self {
        self.compute_v = compute_v;
        self
    }
}

/// Orientation in which the iteration runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// At least as many rows as columns; decomposed as is
    Tall,
    /// More columns than rows; the transpose is decomposed instead
    Wide,
}

impl Orientation {
    pub fn of(nrows: usize, ncols: usize) -> Self {
        if ncols > nrows {
            Orientation::Wide
        } else {
            Orientation::Tall
        }
    }

    pub fn is_transposed(self) -> bool {
        self == Orientation::Wide
    }

    /// Maps the requested `(U, V)` onto the factors of the problem actually decomposed. For the
    /// transpose, `U` of the original is `V` of the transpose and the other way around.
    pub fn resolve(self, compute_u: bool, compute_v: bool) -> (bool, bool) {
        match self {
            Orientation::Tall => (compute_u, compute_v),
            Orientation::Wide => (compute_v, compute_u),
        }
    }
}

/// Singular value decomposition by bidiagonalization and implicit-shift QR iteration.
///
/// An instance can be reused for any number of decompositions; its scratch storage grows to the
/// largest input seen and is never shrunk. Decomposing takes `&mut self`, so one instance serves
/// one decomposition at a time.
#[derive(Debug, Clone)]
pub struct SvdImplicitQr<A> {
    config: SvdConfig,
    engine: ImplicitQr<A>,
    // copy of the input, or of its transpose, reduced in place
    scratch: Vec<A>,
    num_rows: usize,
    num_cols: usize,
    orientation: Orientation,
    singular_values: Vec<A>,
    ut: Option<Array2<A>>,
    vt: Option<Array2<A>>,
    decomposed: bool,
}

impl<A: NdFloat> SvdImplicitQr<A> {
    pub fn new(config: SvdConfig) -> Self {
        Self::with_qr_config(config, QrConfig::default())
    }

    /// Like [`new`](Self::new), with custom tuning of the QR iteration
    pub fn with_qr_config(config: SvdConfig, qr_config: QrConfig) -> Self {
        Self {
            config,
            engine: ImplicitQr::new(qr_config),
            scratch: Vec::new(),
            num_rows: 0,
            num_cols: 0,
            orientation: Orientation::Tall,
            singular_values: Vec::new(),
            ut: None,
            vt: None,
            decomposed: false,
        }
    }

    pub fn config(&self) -> &SvdConfig {
        &self.config
    }

    /// Decomposes `matrix`, replacing the results of any earlier decomposition.
    ///
    /// On failure no results are available until the next successful call.
    pub fn decompose<S: Data<Elem = A>>(&mut self, matrix: &ArrayBase<S, Ix2>) -> Result<()> {
        self.decomposed = false;
        self.singular_values.clear();
        self.ut = None;
        self.vt = None;
        self.num_rows = 0;
        self.num_cols = 0;
        self.orientation = Orientation::Tall;

        let (nrows, ncols) = matrix.dim();
        if nrows == 0 || ncols == 0 {
            return Err(LinalgError::EmptyMatrix);
        }
        if !matrix.iter().all(|x| x.is_finite()) {
            warn!("refusing to decompose a {}x{} matrix with non-finite entries", nrows, ncols);
            return Err(LinalgError::ReductionFailure);
        }

        let orientation = Orientation::of(nrows, ncols);
        let (compute_u, compute_v) =
            orientation.resolve(self.config.compute_u, self.config.compute_v);
        let (rows_t, cols_t) = if orientation.is_transposed() {
            (ncols, nrows)
        } else {
            (nrows, ncols)
        };
        debug!(
            "decomposing {}x{} matrix as {:?}, compact: {}, U: {}, V: {}",
            nrows, ncols, orientation, self.config.compact, compute_u, compute_v
        );

        let len = rows_t * cols_t;
        if self.scratch.len() < len {
            self.scratch.resize(len, A::zero());
        }
        let mut a_mod = ArrayViewMut2::from_shape((rows_t, cols_t), &mut self.scratch[..len])?;
        if orientation.is_transposed() {
            a_mod.assign(&matrix.t());
        } else {
            a_mod.assign(matrix);
        }
        // Bring the largest entry into [1, 2) so the reflections neither underflow nor overflow
        let max = a_mod.iter().fold(A::zero(), |m, x| m.max(x.abs()));
        let exp = if max.is_zero() {
            0
        } else {
            magnitude_exponent(max)
        };
        if exp != 0 {
            a_mod.mapv_inplace(|x| scale_by_pow2(x, -exp));
        }

        let bidiag = a_mod.bidiagonal().map_err(|e| {
            warn!("bidiagonal reduction of {}x{} matrix failed: {}", rows_t, cols_t, e);
            e
        })?;
        let compact = self.config.compact;
        let mut ut = compute_u.then(|| {
            bidiag
                .generate_u(compact)
                .reversed_axes()
                .as_standard_layout()
                .into_owned()
        });
        let mut vt = compute_v.then(|| {
            bidiag
                .generate_v()
                .reversed_axes()
                .as_standard_layout()
                .into_owned()
        });

        let (diag, off) = bidiag.diagonals();
        self.engine.set_fast_values(!compute_u && !compute_v);
        self.engine.set_matrix(rows_t, cols_t, diag, off)?;
        self.engine.process(ut.as_mut(), vt.as_mut()).map_err(|e| {
            warn!("singular values of {}x{} matrix did not converge: {}", nrows, ncols, e);
            e
        })?;

        self.singular_values.extend(
            self.engine
                .singular_values()
                .iter()
                .map(|&x| scale_by_pow2(x, exp)),
        );
        make_singular_positive(&mut self.singular_values, ut.as_mut());

        if orientation.is_transposed() {
            mem::swap(&mut ut, &mut vt);
        }

        self.num_rows = nrows;
        self.num_cols = ncols;
        self.orientation = orientation;
        self.ut = ut;
        self.vt = vt;
        self.decomposed = true;
        debug!(
            "decomposed {}x{} matrix in {} iterations",
            nrows,
            ncols,
            self.engine.iterations()
        );
        Ok(())
    }

    /// Singular values in the order the iteration left them, which is not necessarily sorted.
    /// Empty without a successful decomposition.
    pub fn singular_values(&self) -> &[A] {
        &self.singular_values
    }

    pub fn number_of_singular_values(&self) -> usize {
        self.singular_values.len()
    }

    pub fn is_compact(&self) -> bool {
        self.config.compact
    }

    /// Whether the last decomposition went through the transpose of its input
    pub fn is_transposed(&self) -> bool {
        self.orientation.is_transposed()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// `U`, or `U.t` if `transpose` is set.
    ///
    /// `U` is R x R, or R x min(R, C) for a compact decomposition.
    pub fn u(&self, transpose: bool) -> Result<ArrayView2<'_, A>> {
        factor_view(self.config.compute_u, Factor::U, &self.ut, transpose)
    }

    /// `V`, or `V.t` if `transpose` is set.
    ///
    /// `V` is C x C, or C x min(R, C) for a compact decomposition.
    pub fn v(&self, transpose: bool) -> Result<ArrayView2<'_, A>> {
        factor_view(self.config.compute_v, Factor::V, &self.vt, transpose)
    }

    /// Diagonal matrix of singular values, R x C, or min(R, C) x min(R, C) for a compact
    /// decomposition
    pub fn w(&self) -> Result<Array2<A>> {
        if !self.decomposed {
            return Err(LinalgError::NotDecomposed);
        }
        let p = self.singular_values.len();
        let shape = if self.config.compact {
            (p, p)
        } else {
            (self.num_rows, self.num_cols)
        };
        let mut w = Array2::zeros(shape);
        w.diag_mut()
            .assign(&ArrayView1::from(&self.singular_values));
        Ok(w)
    }

    /// Consumes the decomposition, returning `U` and `V.t` where they were requested
    pub fn into_factors(self) -> Result<(Option<Array2<A>>, Option<Array2<A>>)> {
        if !self.decomposed {
            return Err(LinalgError::NotDecomposed);
        }
        Ok((self.ut.map(Array2::reversed_axes), self.vt))
    }

    /// Sorts the singular values in descending order, permuting the singular vectors along.
    pub fn sort_descending(&mut self) -> Result<()> {
        if !self.decomposed {
            return Err(LinalgError::NotDecomposed);
        }
        let mut order: Vec<usize> = (0..self.singular_values.len()).collect();
        order.sort_by(|&i, &j| {
            self.singular_values[j]
                .partial_cmp(&self.singular_values[i])
                .unwrap_or(Ordering::Equal)
        });

        self.singular_values = order.iter().map(|&i| self.singular_values[i]).collect();
        for factor in [&mut self.ut, &mut self.vt] {
            if let Some(rows) = factor {
                let sorted = rows.select(Axis(0), &order);
                rows.slice_mut(s![..order.len(), ..]).assign(&sorted);
            }
        }
        Ok(())
    }

    /// Default threshold below which a singular value counts as zero:
    /// `eps * max(R, C) * max(singular value)`
    pub fn singular_threshold(&self) -> A {
        let largest = self
            .singular_values
            .iter()
            .fold(A::zero(), |m, &x| m.max(x));
        A::epsilon() * A::from(self.num_rows.max(self.num_cols)).unwrap() * largest
    }

    /// Number of singular values above `threshold`
    pub fn rank(&self, threshold: A) -> usize {
        self.singular_values
            .iter()
            .filter(|&&x| x > threshold)
            .count()
    }

    /// Dimension of the null space: the number of singular values at or below `threshold`, plus
    /// the columns that have no singular value at all
    pub fn nullity(&self, threshold: A) -> usize {
        let small = self.singular_values.len() - self.rank(threshold);
        small + self.num_cols - self.singular_values.len()
    }
}

/// Makes every singular value non-negative by flipping the sign of the matching row of `Ut`,
/// which multiplies `U` by a diagonal matrix of signs.
fn make_singular_positive<A: NdFloat>(values: &mut [A], mut ut: Option<&mut Array2<A>>) {
    for (i, value) in values.iter_mut().enumerate() {
        if value.is_sign_negative() {
            *value = -*value;
            if let Some(ut) = ut.as_deref_mut() {
                ut.row_mut(i).mapv_inplace(|x| -x);
            }
        }
    }
}

fn factor_view<'a, A>(
    requested: bool,
    factor: Factor,
    stored: &'a Option<Array2<A>>,
    transpose: bool,
) -> Result<ArrayView2<'a, A>> {
    if !requested {
        return Err(LinalgError::NotComputed(factor));
    }
    let stored = stored.as_ref().ok_or(LinalgError::NotDecomposed)?;
    Ok(if transpose { stored.view() } else { stored.t() })
}

/// Singular value decomposition of a matrix without consuming it
pub trait SVD {
    type U;
    type Vt;
    type Sigma;

    /// Computes the compact decomposition `U * diag(Sigma) * Vt`, with singular values sorted in
    /// descending order. `U` and `Vt` are only computed on request.
    fn svd(
        &self,
        compute_u: bool,
        compute_vt: bool,
    ) -> Result<(Option<Self::U>, Self::Sigma, Option<Self::Vt>)>;

    /// Computes only the singular values, sorted in descending order
    fn singular_values(&self) -> Result<Self::Sigma> {
        self.svd(false, false).map(|(_, s, _)| s)
    }
}

impl<A: NdFloat, S: Data<Elem = A>> SVD for ArrayBase<S, Ix2> {
    type U = Array2<A>;
    type Vt = Array2<A>;
    type Sigma = Array1<A>;

    fn svd(
        &self,
        compute_u: bool,
        compute_vt: bool,
    ) -> Result<(Option<Self::U>, Self::Sigma, Option<Self::Vt>)> {
        let config = SvdConfig {
            compact: true,
            compute_u,
            compute_v: compute_vt,
        };
        let mut svd = SvdImplicitQr::new(config);
        svd.decompose(self)?;
        svd.sort_descending()?;
        let sigma = Array1::from(svd.singular_values().to_vec());
        let (u, vt) = svd.into_factors()?;
        Ok((u, sigma, vt))
    }
}

/// Singular value decomposition of a matrix, consuming it
pub trait SVDInto {
    type U;
    type Vt;
    type Sigma;

    /// Same as [`SVD::svd`]
    fn svd_into(
        self,
        compute_u: bool,
        compute_vt: bool,
    ) -> Result<(Option<Self::U>, Self::Sigma, Option<Self::Vt>)>;
}

impl<A: NdFloat, S: Data<Elem = A>> SVDInto for ArrayBase<S, Ix2> {
    type U = Array2<A>;
    type Vt = Array2<A>;
    type Sigma = Array1<A>;

    fn svd_into(
        self,
        compute_u: bool,
        compute_vt: bool,
    ) -> Result<(Option<Self::U>, Self::Sigma, Option<Self::Vt>)> {
        self.svd(compute_u, compute_vt)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    fn reconstruct(svd: &SvdImplicitQr<f64>) -> Array2<f64> {
        let u = svd.u(false).unwrap();
        let v = svd.v(false).unwrap();
        u.dot(&svd.w().unwrap()).dot(&v.t())
    }

    #[test]
    fn orientation() {
        assert_eq!(Orientation::of(3, 2), Orientation::Tall);
        assert_eq!(Orientation::of(2, 2), Orientation::Tall);
        assert_eq!(Orientation::of(2, 3), Orientation::Wide);

        assert_eq!(Orientation::Tall.resolve(true, false), (true, false));
        assert_eq!(Orientation::Wide.resolve(true, false), (false, true));
        assert_eq!(Orientation::Wide.resolve(false, true), (true, false));
        assert_eq!(Orientation::Wide.resolve(true, true), (true, true));
    }

    #[test]
    fn identity() {
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&Array2::<f64>::eye(3)).unwrap();
        assert_eq!(svd.singular_values(), &[1., 1., 1.]);
        assert_abs_diff_eq!(svd.u(false).unwrap(), Array2::eye(3), epsilon = 1e-15);
        assert_abs_diff_eq!(svd.v(false).unwrap(), Array2::eye(3), epsilon = 1e-15);
        assert!(!svd.is_transposed());
    }

    #[test]
    fn negative_diagonal() {
        let a = array![[2.0f64, 0., 0.], [0., -3., 0.], [0., 0., 1.]];
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&a).unwrap();

        // already diagonal, so the values stay in diagonal order
        assert_eq!(svd.singular_values(), &[2., 3., 1.]);
        assert_abs_diff_eq!(reconstruct(&svd), a, epsilon = 1e-14);
        // V is the identity up to signs, so the sign of -3 must have gone into U
        let u = svd.u(false).unwrap();
        let v = svd.v(false).unwrap();
        assert_abs_diff_eq!(u[(1, 1)] * v[(1, 1)], -1., epsilon = 1e-15);
    }

    #[test]
    fn sign_fix_touches_ut_only() {
        let mut values = [1.0f64, -2., -0.];
        let mut ut = array![[1., 2.], [3., 4.], [5., 6.]];
        make_singular_positive(&mut values, Some(&mut ut));
        assert_eq!(values, [1., 2., 0.]);
        assert!(values.iter().all(|x| x.is_sign_positive()));
        assert_eq!(ut, array![[1., 2.], [-3., -4.], [-5., -6.]]);

        let mut values = [-1.0f64];
        make_singular_positive(&mut values, None);
        assert_eq!(values, [1.]);
    }

    #[test]
    fn wide() {
        let a = array![[1.0f64, 2., 3., 4.], [-2., 0.5, 1., 0.]];
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&a).unwrap();
        assert!(svd.is_transposed());
        assert_eq!(svd.u(false).unwrap().dim(), (2, 2));
        assert_eq!(svd.v(false).unwrap().dim(), (4, 4));
        assert_eq!(svd.w().unwrap().dim(), (2, 4));
        assert_abs_diff_eq!(reconstruct(&svd), a, epsilon = 1e-12);

        let mut compact = SvdImplicitQr::new(SvdConfig::default().with_compact(true));
        compact.decompose(&a).unwrap();
        assert_eq!(compact.u(false).unwrap().dim(), (2, 2));
        assert_eq!(compact.v(false).unwrap().dim(), (4, 2));
        assert_eq!(compact.w().unwrap().dim(), (2, 2));
        assert_abs_diff_eq!(reconstruct(&compact), a, epsilon = 1e-12);
    }

    #[test]
    fn rank_one() {
        let x = array![[1.0f64], [2.], [-1.], [3.]];
        let y = array![[2.0f64, -1.]];
        let a = x.dot(&y);
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&a).unwrap();

        let threshold = svd.singular_threshold();
        assert!(threshold > 0. && threshold < 1e-12);
        assert_eq!(svd.rank(1e-10), 1);
        assert_eq!(svd.nullity(1e-10), 1);
        assert_eq!(svd.rank(100.), 0);
        assert_eq!(svd.nullity(100.), 2);
        let mut values = svd.singular_values().to_vec();
        values.sort_by(|a, b| b.partial_cmp(a).unwrap());
        // the only singular value is |x| * |y|
        assert_abs_diff_eq!(values[0], (15.0f64 * 5.).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], 0., epsilon = 1e-12);
        assert_abs_diff_eq!(reconstruct(&svd), a, epsilon = 1e-12);
    }

    #[test]
    fn sort_descending() {
        let a = array![[1.0f64, 0., 0.], [0., 3., 0.], [0., 0., 2.], [0., 0., 0.]];
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&a).unwrap();
        assert_eq!(svd.singular_values(), &[1., 3., 2.]);

        svd.sort_descending().unwrap();
        assert_eq!(svd.singular_values(), &[3., 2., 1.]);
        assert_abs_diff_eq!(reconstruct(&svd), a, epsilon = 1e-14);
    }

    #[test]
    fn not_computed() {
        let a = array![[1.0f64, 2.], [3., 4.], [5., 6.]];
        let mut svd = SvdImplicitQr::new(SvdConfig::default().with_u(false));
        svd.decompose(&a).unwrap();
        for transpose in [false, true] {
            assert!(matches!(
                svd.u(transpose),
                Err(LinalgError::NotComputed(Factor::U))
            ));
        }
        assert_eq!(svd.v(false).unwrap().dim(), (2, 2));

        let mut svd = SvdImplicitQr::new(SvdConfig::default().with_v(false));
        svd.decompose(&a.t()).unwrap();
        for transpose in [false, true] {
            assert!(matches!(
                svd.v(transpose),
                Err(LinalgError::NotComputed(Factor::V))
            ));
        }
        assert_eq!(svd.u(true).unwrap().dim(), (2, 2));
    }

    #[test]
    fn failures_clear_results() {
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        assert!(matches!(svd.w(), Err(LinalgError::NotDecomposed)));
        assert!(matches!(svd.u(false), Err(LinalgError::NotDecomposed)));

        svd.decompose(&array![[1.0f64, 2.], [3., 4.]]).unwrap();
        assert!(matches!(
            svd.decompose(&array![[1.0f64, f64::NAN]]),
            Err(LinalgError::ReductionFailure)
        ));
        assert!(svd.singular_values().is_empty());
        assert!(matches!(svd.v(true), Err(LinalgError::NotDecomposed)));
        assert!(matches!(
            svd.decompose(&Array2::<f64>::zeros((0, 3))),
            Err(LinalgError::EmptyMatrix)
        ));
        assert!(matches!(svd.sort_descending(), Err(LinalgError::NotDecomposed)));
    }

    fn scaled_check(a: Array2<f64>, unit: f64, expected: &[f64]) {
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&a).unwrap();
        let mut values: Vec<f64> = svd.singular_values().iter().map(|x| x / unit).collect();
        values.sort_by(|a, b| b.partial_cmp(a).unwrap());
        for (v, e) in values.iter().zip(expected) {
            assert_abs_diff_eq!(v, e, epsilon = 1e-12);
        }
        let rebuilt = reconstruct(&svd);
        assert_abs_diff_eq!(rebuilt / unit, a / unit, epsilon = 1e-12);
    }

    #[test]
    fn tiny_entries() {
        scaled_check(array![[1e-170, 0.], [0., 2e-170]], 1e-170, &[2., 1.]);
        scaled_check(
            array![[3e-200, 0.], [4e-200, 5e-200], [0., 0.]],
            1e-200,
            &[45.0f64.sqrt(), 5.0f64.sqrt()],
        );
    }

    #[test]
    fn huge_entries() {
        let golden = (1. + 5.0f64.sqrt()) / 2.;
        scaled_check(
            array![[1e200, 1e200], [0., 1e200]],
            1e200,
            &[golden, 1. / golden],
        );
        scaled_check(array![[1e300, 0., 0.], [0., 0., -1e300]], 1e300, &[1., 1.]);
    }

    #[test]
    fn subnormal_entries() {
        let a = array![[1e-310f64, 0.], [0., 2e-310]];
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&a).unwrap();
        let mut values: Vec<f64> = svd.singular_values().iter().map(|x| x / 1e-310).collect();
        values.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_abs_diff_eq!(values[0], 2., epsilon = 1e-8);
        assert_abs_diff_eq!(values[1], 1., epsilon = 1e-8);
    }

    #[test]
    fn failure_resets_orientation() {
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&array![[1.0f64, 2., 3.]]).unwrap();
        assert!(svd.is_transposed());
        assert_eq!((svd.num_rows(), svd.num_cols()), (1, 3));

        assert!(svd.decompose(&array![[f64::INFINITY, 2., 3.]]).is_err());
        assert!(!svd.is_transposed());
        assert_eq!((svd.num_rows(), svd.num_cols()), (0, 0));
    }

    #[test]
    fn convergence_failure() {
        let qr_config = QrConfig::default().with_max_iterations_per_value(0);
        let mut svd = SvdImplicitQr::with_qr_config(SvdConfig::default(), qr_config);
        assert!(matches!(
            svd.decompose(&array![[1.0f64, 2.], [3., 4.]]),
            Err(LinalgError::ConvergenceFailure { iterations: 0 })
        ));
        assert!(matches!(svd.w(), Err(LinalgError::NotDecomposed)));

        // diagonal input needs no iterations at all
        svd.decompose(&array![[1.0f64, 0.], [0., 4.]]).unwrap();
    }

    #[test]
    fn one_by_one() {
        let mut svd = SvdImplicitQr::new(SvdConfig::default());
        svd.decompose(&array![[-2.5f64]]).unwrap();
        assert_eq!(svd.singular_values(), &[2.5]);
        assert_abs_diff_eq!(reconstruct(&svd), array![[-2.5]], epsilon = 1e-15);
    }

    #[test]
    fn one_shot() {
        let a = array![[3.0f64, 0.], [4., 5.], [0., 0.]];
        let (u, s, vt) = a.svd(true, true).unwrap();
        let (u, vt) = (u.unwrap(), vt.unwrap());
        assert_eq!(u.dim(), (3, 2));
        assert_eq!(vt.dim(), (2, 2));
        assert_abs_diff_eq!(s, array![45.0f64.sqrt(), 5.0f64.sqrt()], epsilon = 1e-12);
        assert_abs_diff_eq!(u.dot(&Array2::from_diag(&s)).dot(&vt), a, epsilon = 1e-12);
        assert_abs_diff_eq!(SVD::singular_values(&a).unwrap(), s, epsilon = 1e-12);

        let (u, s2, vt) = a.t().svd_into(false, true).unwrap();
        assert!(u.is_none());
        assert_eq!(vt.unwrap().dim(), (2, 3));
        assert_abs_diff_eq!(s2, s, epsilon = 1e-12);
    }

    #[test]
    fn reuse() {
        let mut svd = SvdImplicitQr::new(SvdConfig::default().with_compact(true));
        let inputs = [
            array![[1.0f64, 2., 0.], [0., 1., 3.], [2., 0., 1.]],
            array![[1.0f64, 2.], [3., 4.], [5., 6.], [7., 8.]],
            array![[0.5f64, -1., 2., 0., 1.]],
            array![[2.0f64, 1.], [1., 2.]],
        ];
        for a in &inputs {
            svd.decompose(a).unwrap();
            assert_eq!(svd.num_rows(), a.nrows());
            assert_eq!(svd.num_cols(), a.ncols());
            assert_eq!(svd.number_of_singular_values(), a.nrows().min(a.ncols()));
            assert!(svd.singular_values().iter().all(|&x| x >= 0.));
            assert_abs_diff_eq!(reconstruct(&svd), *a, epsilon = 1e-12);

            // getters can be called any number of times
            let first = svd.u(false).unwrap().to_owned();
            assert_eq!(svd.u(false).unwrap(), first);
            assert_eq!(svd.u(true).unwrap(), first.t());
            assert_eq!(svd.w().unwrap(), svd.w().unwrap());
        }
    }
}
