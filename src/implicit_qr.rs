//! Implicit-shift QR iteration for the singular values of an upper-bidiagonal matrix.
//!
//! Each step is the Golub-Kahan SVD step: a shift taken from the trailing 2x2 block of `B.t * B`
//! determines the first right rotation, and the resulting bulge is chased down the band with
//! alternating left and right Givens rotations, so `B.t * B` is never formed. Negligible
//! superdiagonal entries split the problem, and negligible diagonal entries are rotated out of
//! their row or column before the split.
//!
//! See G. H. Golub and C. F. Van Loan, "Matrix Computations", section 8.6, and D. S. Watkins,
//! "Fundamentals of Matrix Computations", section 5.9.

use log::{debug, trace, warn};
use ndarray::{Array2, NdFloat};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::{givens::GivensRotation, LinalgError, Result};

/// Tuning constants of the iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrConfig {
    /// The iteration gives up after this many QR steps per singular value
    pub max_iterations_per_value: usize,
    /// Number of consecutive steps without a deflation after which an exceptional step is taken.
    /// Zero disables exceptional steps.
    pub exceptional_threshold: usize,
    /// Seed for the random angles of exceptional steps
    pub seed: u64,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_value: 30,
            exceptional_threshold: 15,
            seed: 0x0343_4270,
        }
    }
}

impl QrConfig {
    pub fn with_max_iterations_per_value(mut self, iterations: usize) -> Self {
        self.max_iterations_per_value = iterations;
        self
    }

    pub fn with_exceptional_threshold(mut self, steps: usize) -> Self {
        self.exceptional_threshold = steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Optional factors that receive every rotation applied to the bidiagonal.
///
/// A left rotation of rows `(i, j)` of `B` is applied to rows `(i, j)` of `Ut`, a right rotation
/// of columns `(i, j)` of `B` to rows `(i, j)` of `Vt`, which keeps `Ut.t * B * Vt` invariant.
struct Accumulators<'a, A> {
    ut: Option<&'a mut Array2<A>>,
    vt: Option<&'a mut Array2<A>>,
}

impl<'a, A: NdFloat> Accumulators<'a, A> {
    fn left(&mut self, rot: &GivensRotation<A>, i: usize, j: usize) {
        if let Some(ut) = self.ut.as_deref_mut() {
            rot.rotate_rows(ut, i, j);
        }
    }

    fn right(&mut self, rot: &GivensRotation<A>, i: usize, j: usize) {
        if let Some(vt) = self.vt.as_deref_mut() {
            rot.rotate_rows(vt, i, j);
        }
    }
}

/// Exponent `e` such that `x * 2^-e` lies in [1, 2) for a positive finite `x`.
pub(crate) fn magnitude_exponent<A: NdFloat>(x: A) -> i32 {
    x.log2().floor().to_i32().unwrap_or(0)
}

/// Computes `x * 2^exp` exactly (barring underflow of the result), without forming `2^exp`, which
/// overflows for exponents near the ends of the floating point range.
pub(crate) fn scale_by_pow2<A: NdFloat>(x: A, exp: i32) -> A {
    let two = A::from(2.0).unwrap();
    let half = exp / 2;
    x * two.powi(half) * two.powi(exp - half)
}

/// Computes the wilkinson shift, i.e., the eigenvalue of the 2x2 symmetric matrix closest to its
/// trailing component `tnn`.
///
/// The inputs are interpreted as the 2x2 matrix:
///     tmm  tmn
///     tmn  tnn
fn wilkinson_shift<A: NdFloat>(tmm: A, tnn: A, tmn: A) -> A {
    let tmn_sq = tmn * tmn;
    if tmn_sq.is_zero() {
        return tnn;
    }
    let d = (tmm - tnn) * A::from(0.5).unwrap();
    tnn - tmn_sq / (d + d.signum() * (d * d + tmn_sq).sqrt())
}

/// Same eigenvalue as [`wilkinson_shift`], straight from the quadratic formula. Cheaper, but
/// loses accuracy to cancellation when the two eigenvalues are far apart.
fn quadratic_shift<A: NdFloat>(tmm: A, tnn: A, tmn: A) -> A {
    let half = A::from(0.5).unwrap();
    let mean = (tmm + tnn) * half;
    let d = (tmm - tnn) * half;
    let radius = (d * d + tmn * tmn).sqrt();
    let (a, b) = (mean + radius, mean - radius);
    if (a - tnn).abs() < (b - tnn).abs() {
        a
    } else {
        b
    }
}

/// Singular values of an upper-bidiagonal matrix by implicit-shift QR iteration.
///
/// The engine owns copies of the diagonal and superdiagonal. Singular values come out in the
/// position of the diagonal entry they converged in, unsorted, and possibly negative; fixing
/// the signs and order is left to the caller.
#[derive(Debug, Clone)]
pub struct ImplicitQr<A> {
    config: QrConfig,
    num_rows: usize,
    num_cols: usize,
    diag: Vec<A>,
    off: Vec<A>,
    fast_values: bool,
    rng: Xoshiro256Plus,
    iterations: usize,
    exceptional_steps: usize,
}

impl<A: NdFloat> Default for ImplicitQr<A> {
    fn default() -> Self {
        Self::new(QrConfig::default())
    }
}

impl<A: NdFloat> ImplicitQr<A> {
    pub fn new(config: QrConfig) -> Self {
        Self {
            config,
            num_rows: 0,
            num_cols: 0,
            diag: Vec::new(),
            off: Vec::new(),
            fast_values: false,
            rng: Xoshiro256Plus::seed_from_u64(config.seed),
            iterations: 0,
            exceptional_steps: 0,
        }
    }

    pub fn config(&self) -> &QrConfig {
        &self.config
    }

    /// Loads the bidiagonal of a `num_rows x num_cols` matrix. `diag` must have
    /// `min(num_rows, num_cols)` entries and `off` one fewer. Both are copied.
    pub fn set_matrix(
        &mut self,
        num_rows: usize,
        num_cols: usize,
        diag: &[A],
        off: &[A],
    ) -> Result<()> {
        let n = num_rows.min(num_cols);
        if n == 0 {
            return Err(LinalgError::EmptyMatrix);
        }
        if diag.len() != n || off.len() + 1 != n {
            return Err(LinalgError::ShapeMismatch {
                expected: (n, n - 1),
                actual: (diag.len(), off.len()),
            });
        }
        if !diag.iter().chain(off).all(|x| x.is_finite()) {
            return Err(LinalgError::ReductionFailure);
        }

        self.num_rows = num_rows;
        self.num_cols = num_cols;
        self.diag.clear();
        self.diag.extend_from_slice(diag);
        self.off.clear();
        self.off.extend_from_slice(off);
        Ok(())
    }

    /// Selects the cheaper but less accurate shift formula, meant for runs that accumulate no
    /// factors.
    pub fn set_fast_values(&mut self, fast_values: bool) {
        self.fast_values = fast_values;
    }

    pub fn fast_values(&self) -> bool {
        self.fast_values
    }

    /// Runs the iteration until every superdiagonal entry is negligible.
    ///
    /// `ut` must be `k x num_rows` and `vt` must be `l x num_cols` with `k, l >= min(num_rows,
    /// num_cols)`; only their leading rows are rotated. Passing `None` skips the accumulation.
    pub fn process(
        &mut self,
        ut: Option<&mut Array2<A>>,
        vt: Option<&mut Array2<A>>,
    ) -> Result<()> {
        let n = self.diag.len();
        if n == 0 {
            return Err(LinalgError::EmptyMatrix);
        }
        if let Some(ut) = ut.as_deref() {
            self.check_accumulator(ut, self.num_rows)?;
        }
        if let Some(vt) = vt.as_deref() {
            self.check_accumulator(vt, self.num_cols)?;
        }
        let mut acc = Accumulators { ut, vt };

        self.iterations = 0;
        self.exceptional_steps = 0;
        self.rng = Xoshiro256Plus::seed_from_u64(self.config.seed);

        let max = self
            .diag
            .iter()
            .chain(&self.off)
            .fold(A::zero(), |m, x| m.max(x.abs()));
        if max.is_zero() {
            return Ok(());
        }
        let exp = magnitude_exponent(max);
        for x in self.diag.iter_mut().chain(self.off.iter_mut()) {
            *x = scale_by_pow2(*x, -exp);
        }
        let scaled_max = scale_by_pow2(max, -exp);
        if !scaled_max.is_finite() || scaled_max.is_zero() {
            warn!("could not scale bands with largest magnitude {:e}", max);
            return Err(LinalgError::ReductionFailure);
        }

        let result = self.iterate(&mut acc);

        for x in self.diag.iter_mut() {
            *x = scale_by_pow2(*x, exp);
        }
        result
    }

    fn check_accumulator(&self, acc: &Array2<A>, width: usize) -> Result<()> {
        let n = self.diag.len();
        if acc.nrows() < n || acc.ncols() != width {
            return Err(LinalgError::ShapeMismatch {
                expected: (n, width),
                actual: acc.dim(),
            });
        }
        Ok(())
    }

    fn iterate(&mut self, acc: &mut Accumulators<'_, A>) -> Result<()> {
        let n = self.diag.len();
        let eps = A::epsilon();
        // entries are scaled so the largest magnitude lies in [1, 2)
        let zero_tol = eps;
        let max_iterations = self.config.max_iterations_per_value * n;
        let threshold = self.config.exceptional_threshold;
        let mut since_deflation = 0;

        let mut hi = n - 1;
        while hi > 0 {
            if self.negligible_off(hi - 1, eps) {
                self.off[hi - 1] = A::zero();
                trace!("deflated singular value {} after {} steps", hi, since_deflation);
                hi -= 1;
                since_deflation = 0;
                continue;
            }

            let mut lo = hi - 1;
            while lo > 0 {
                if self.negligible_off(lo - 1, eps) {
                    self.off[lo - 1] = A::zero();
                    break;
                }
                lo -= 1;
            }

            if let Some(k) = (lo..=hi).find(|&k| self.diag[k].abs() <= zero_tol) {
                trace!("zero diagonal entry at {} in block [{}, {}]", k, lo, hi);
                self.diag[k] = A::zero();
                if k < hi {
                    self.chase_row(k, hi, acc);
                } else {
                    self.chase_column(lo, hi, acc);
                }
                continue;
            }

            if self.iterations >= max_iterations {
                warn!(
                    "implicit QR gave up on block [{}, {}] after {} iterations",
                    lo, hi, self.iterations
                );
                return Err(LinalgError::ConvergenceFailure {
                    iterations: self.iterations,
                });
            }
            self.iterations += 1;
            since_deflation += 1;

            let first = if threshold > 0 && since_deflation % threshold == 0 {
                self.exceptional_rotation()
            } else {
                self.shifted_rotation(lo, hi)
            };
            self.chase_bulge(lo, hi, first, acc);
        }

        debug!(
            "implicit QR converged for {} values in {} iterations ({} exceptional)",
            n, self.iterations, self.exceptional_steps
        );
        Ok(())
    }

    fn negligible_off(&self, i: usize, eps: A) -> bool {
        self.off[i].abs() <= eps * (self.diag[i].abs() + self.diag[i + 1].abs())
    }

    /// First rotation of a regular step, which maps the first column of `B.t * B - shift * I` onto
    /// the first basis vector.
    fn shifted_rotation(&self, lo: usize, hi: usize) -> GivensRotation<A> {
        let dm = self.diag[hi - 1];
        let dn = self.diag[hi];
        let fm = self.off[hi - 1];
        let fmm = if hi - 1 > lo {
            self.off[hi - 2]
        } else {
            A::zero()
        };

        let tmm = dm * dm + fmm * fmm;
        let tmn = dm * fm;
        let tnn = dn * dn + fm * fm;
        let shift = if self.fast_values {
            quadratic_shift(tmm, tnn, tmn)
        } else {
            wilkinson_shift(tmm, tnn, tmn)
        };

        let ds = self.diag[lo];
        GivensRotation::cancel_y(ds * ds - shift, ds * self.off[lo]).0
    }

    /// A random first rotation, whose spread grows with every exceptional step taken
    fn exceptional_rotation(&mut self) -> GivensRotation<A> {
        self.exceptional_steps += 1;
        let magnitude = (0.05 * self.exceptional_steps as f64).min(1.0);
        let angle = 2.0 * std::f64::consts::PI * (self.rng.gen::<f64>() - 0.5) * magnitude;
        trace!("exceptional step with angle {}", angle);
        GivensRotation::from_angle(A::from(angle).unwrap())
    }

    /// Applies `first` to columns `lo` and `lo + 1`, then restores the bidiagonal form of the
    /// block `[lo, hi]` by chasing the bulge down to the bottom.
    fn chase_bulge(
        &mut self,
        lo: usize,
        hi: usize,
        first: GivensRotation<A>,
        acc: &mut Accumulators<'_, A>,
    ) {
        let mut right = first;
        let mut bulge = A::zero();

        for k in lo..hi {
            if k > lo {
                let (rot, norm) = GivensRotation::cancel_y(self.off[k - 1], bulge);
                self.off[k - 1] = norm;
                right = rot;
            }

            // columns k, k + 1; the rotation leaves a bulge below the diagonal at (k + 1, k)
            let (dk, ek) = right.apply(self.diag[k], self.off[k]);
            let (below, dk1) = right.apply(A::zero(), self.diag[k + 1]);
            acc.right(&right, k, k + 1);

            // rows k, k + 1; moves the bulge to (k, k + 2)
            let (left, norm) = GivensRotation::cancel_y(dk, below);
            self.diag[k] = norm;
            let (ek, dk1) = left.apply(ek, dk1);
            self.off[k] = ek;
            self.diag[k + 1] = dk1;
            if k + 1 < hi {
                let (above, ek1) = left.apply(A::zero(), self.off[k + 1]);
                bulge = above;
                self.off[k + 1] = ek1;
            }
            acc.left(&left, k, k + 1);
        }
    }

    /// With `diag[k] == 0`, rotates `off[k]` along row `k` and out of the block with left
    /// rotations against rows `k + 1..=hi`.
    fn chase_row(&mut self, k: usize, hi: usize, acc: &mut Accumulators<'_, A>) {
        let mut carry = self.off[k];
        self.off[k] = A::zero();

        for j in k + 1..=hi {
            let (rot, norm) = GivensRotation::cancel_y(self.diag[j], carry);
            self.diag[j] = norm;
            if j < hi {
                let (ej, next) = rot.apply(self.off[j], A::zero());
                self.off[j] = ej;
                carry = next;
            }
            acc.left(&rot, j, k);
        }
    }

    /// With `diag[hi] == 0`, rotates `off[hi - 1]` up column `hi` and out of the block with right
    /// rotations against columns `lo..hi`.
    fn chase_column(&mut self, lo: usize, hi: usize, acc: &mut Accumulators<'_, A>) {
        let mut carry = self.off[hi - 1];
        self.off[hi - 1] = A::zero();

        for j in (lo..hi).rev() {
            let (rot, norm) = GivensRotation::cancel_y(self.diag[j], carry);
            self.diag[j] = norm;
            if j > lo {
                let (ej, next) = rot.apply(self.off[j - 1], A::zero());
                self.off[j - 1] = ej;
                carry = next;
            }
            acc.right(&rot, j, hi);
        }
    }

    /// Number of singular values, `min(num_rows, num_cols)`
    pub fn number_of_singular_values(&self) -> usize {
        self.diag.len()
    }

    /// The `i`-th singular value, by diagonal position. Only meaningful after a successful
    /// [`process`](Self::process).
    pub fn singular_value(&self, i: usize) -> A {
        self.diag[i]
    }

    /// All singular values, by diagonal position. Only meaningful after a successful
    /// [`process`](Self::process).
    pub fn singular_values(&self) -> &[A] {
        &self.diag
    }

    /// Number of QR steps taken by the last call to [`process`](Self::process)
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// How many of those steps were exceptional
    pub fn exceptional_steps(&self) -> usize {
        self.exceptional_steps
    }
}
