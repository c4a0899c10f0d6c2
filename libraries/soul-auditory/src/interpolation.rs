//! Spline interpolation over fixed knots
//!
//! The excitation pattern computed on a coarse Cam grid is resampled to a
//! dense grid every frame. The knot positions never change, so the natural
//! cubic spline's tridiagonal system is factorised once; fitting a frame only
//! runs the forward sweep and back substitution on the new knot values.

/// Interpolation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplineKind {
    /// Piecewise linear
    Linear,
    /// Natural cubic (zero second derivative at both ends)
    Cubic,
}

/// Spline over fixed, strictly ascending knots
#[derive(Debug, Clone)]
pub struct SplineInterpolator {
    kind: SplineKind,
    x: Vec<f64>,
    h: Vec<f64>,
    // Thomas algorithm factors for the interior second derivatives
    c_prime: Vec<f64>,
    denom: Vec<f64>,
    // Per-fit scratch
    y: Vec<f64>,
    m: Vec<f64>,
    rhs: Vec<f64>,
}

impl SplineInterpolator {
    /// Create an interpolator over `knots`
    ///
    /// Fewer than three knots always interpolate linearly.
    ///
    /// # Panics
    /// Panics if `knots` is empty.
    pub fn new(knots: Vec<f64>, kind: SplineKind) -> Self {
        assert!(!knots.is_empty(), "spline needs at least one knot");

        let n = knots.len();
        let kind = if n < 3 { SplineKind::Linear } else { kind };
        let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();

        let interior = n.saturating_sub(2);
        let mut c_prime = vec![0.0; interior];
        let mut denom = vec![0.0; interior];
        if kind == SplineKind::Cubic {
            for k in 0..interior {
                let i = k + 1;
                let sub = h[i - 1];
                let diag = 2.0 * (h[i - 1] + h[i]);
                let sup = h[i];
                denom[k] = if k == 0 {
                    diag
                } else {
                    diag - sub * c_prime[k - 1]
                };
                c_prime[k] = sup / denom[k];
            }
        }

        Self {
            kind,
            x: knots,
            h,
            c_prime,
            denom,
            y: vec![0.0; n],
            m: vec![0.0; n],
            rhs: vec![0.0; interior],
        }
    }

    pub fn kind(&self) -> SplineKind {
        self.kind
    }

    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Fit the spline to new knot values
    ///
    /// # Panics
    /// Panics if `values` does not have one value per knot.
    pub fn fit(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.x.len(), "one value per knot");
        self.y.copy_from_slice(values);

        if self.kind == SplineKind::Linear {
            return;
        }

        let n = self.x.len();
        let interior = n - 2;

        // forward sweep
        for k in 0..interior {
            let i = k + 1;
            let d = 6.0
                * ((self.y[i + 1] - self.y[i]) / self.h[i]
                    - (self.y[i] - self.y[i - 1]) / self.h[i - 1]);
            self.rhs[k] = if k == 0 {
                d / self.denom[k]
            } else {
                (d - self.h[i - 1] * self.rhs[k - 1]) / self.denom[k]
            };
        }

        // back substitution; natural boundary
        self.m[0] = 0.0;
        self.m[n - 1] = 0.0;
        for k in (0..interior).rev() {
            let next = self.m[k + 2];
            self.m[k + 1] = self.rhs[k] - self.c_prime[k] * next;
        }
    }

    /// Evaluate the fitted spline at `t`
    ///
    /// Values outside the knot range clamp to the end values.
    pub fn evaluate(&self, t: f64) -> f64 {
        let n = self.x.len();
        if n == 1 || t <= self.x[0] {
            return self.y[0];
        }
        if t >= self.x[n - 1] {
            return self.y[n - 1];
        }

        // index of the segment containing t
        let j = self.x.partition_point(|&x| x <= t).saturating_sub(1).min(n - 2);
        self.evaluate_segment(j, t)
    }

    /// Evaluate the fitted spline at every point of `ts` (ascending)
    pub fn evaluate_into(&self, ts: &[f64], out: &mut [f64]) {
        let n = self.x.len();
        let mut j = 0;
        for (&t, o) in ts.iter().zip(out.iter_mut()) {
            if n == 1 || t <= self.x[0] {
                *o = self.y[0];
            } else if t >= self.x[n - 1] {
                *o = self.y[n - 1];
            } else {
                while j + 1 < n - 1 && self.x[j + 1] <= t {
                    j += 1;
                }
                *o = self.evaluate_segment(j, t);
            }
        }
    }

    #[inline]
    fn evaluate_segment(&self, j: usize, t: f64) -> f64 {
        let h = self.h[j];
        let a = self.x[j + 1] - t;
        let b = t - self.x[j];

        match self.kind {
            SplineKind::Linear => self.y[j] + (self.y[j + 1] - self.y[j]) * b / h,
            SplineKind::Cubic => {
                let mj = self.m[j];
                let mj1 = self.m[j + 1];
                mj * a * a * a / (6.0 * h)
                    + mj1 * b * b * b / (6.0 * h)
                    + (self.y[j] / h - mj * h / 6.0) * a
                    + (self.y[j + 1] / h - mj1 * h / 6.0) * b
            }
        }
    }
}
