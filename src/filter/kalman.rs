//! A [Kalman filter] with a constant-acceleration motion model.
//!
//! [Kalman filter]: https://en.wikipedia.org/wiki/Kalman_filter

use crate::linalg::{Mat1, Mat1x3, Mat3, Vec3};

use super::{Filter, FilterFactory};

/// Reciprocal used in place of `1 / S` when the residual variance `S` is (almost) zero.
const SINGULAR_RECIPROCAL: f64 = 1e10;
const SINGULAR_EPSILON: f64 = 1e-10;

/// Time between two frames, in frames.
const DT: f64 = 1.0;

/// Noise parameters of a [`Kalman`] filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanParams {
    process_variance: f64,
    measurement_variance: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self::new(0.01, 0.1)
    }
}

impl KalmanParams {
    /// Creates a new set of Kalman filter parameters.
    ///
    /// # Parameters
    ///
    /// - `process_variance` is the variance of the noise added to every state component
    ///   (position, velocity and acceleration) per frame. Larger values make the filter follow
    ///   sudden changes in motion more quickly.
    /// - `measurement_variance` is the expected variance of the measurements. Larger values
    ///   smooth more strongly, but increase lag.
    ///
    /// # Panics
    ///
    /// Both variances must be finite and non-negative, otherwise this function will panic.
    pub fn new(process_variance: f64, measurement_variance: f64) -> Self {
        assert!(process_variance.is_finite() && process_variance >= 0.0);
        assert!(measurement_variance.is_finite() && measurement_variance >= 0.0);
        Self {
            process_variance,
            measurement_variance,
        }
    }

    pub fn process_variance(&self) -> f64 {
        self.process_variance
    }

    pub fn measurement_variance(&self) -> f64 {
        self.measurement_variance
    }
}

impl FilterFactory for KalmanParams {
    type Filter = Kalman;

    fn build(&self) -> Kalman {
        Kalman::new(*self)
    }
}

/// Kalman filter tracking position, velocity and acceleration of a single coordinate.
///
/// Only the position is observed.
#[derive(Debug, Clone)]
pub struct Kalman {
    /// State: position, velocity, acceleration.
    x: Vec3,
    /// State covariance.
    p: Mat3,
    /// State transition.
    f: Mat3,
    /// Process noise.
    q: Mat3,
    /// Measurement model.
    h: Mat1x3,
    /// Measurement noise.
    r: Mat1,
    initialized: bool,
}

impl Kalman {
    pub fn new(params: KalmanParams) -> Self {
        Self {
            x: Vec3::ZERO,
            p: Mat3::IDENTITY,
            f: Mat3::from_rows([
                [1.0, DT, 0.5 * DT * DT],
                [0.0, 1.0, DT],
                [0.0, 0.0, 1.0],
            ]),
            q: Mat3::IDENTITY * params.process_variance,
            h: Mat1x3::from_rows([[1.0, 0.0, 0.0]]),
            r: Mat1::from(params.measurement_variance),
            initialized: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.x[(0, 0)]
    }

    pub fn velocity(&self) -> f64 {
        self.x[(1, 0)]
    }

    pub fn acceleration(&self) -> f64 {
        self.x[(2, 0)]
    }

    pub fn covariance(&self) -> &Mat3 {
        &self.p
    }
}

impl Filter for Kalman {
    fn predict(&mut self) -> f64 {
        self.x = self.f * self.x;
        self.p = self.f * self.p * self.f.transpose() + self.q;
        self.position()
    }

    fn update(&mut self, measurement: f64) {
        if !self.initialized {
            self.x = Vec3::from_column([measurement, 0.0, 0.0]);
            self.initialized = true;
        }

        let residual = measurement - (self.h * self.x).scalar();
        let s = (self.h * self.p * self.h.transpose() + self.r).scalar();
        let s_inv = if s.abs() < SINGULAR_EPSILON {
            SINGULAR_RECIPROCAL
        } else {
            s.recip()
        };
        let gain = self.p * self.h.transpose() * s_inv;

        self.x = self.x + gain * residual;
        self.p = (Mat3::IDENTITY - gain * self.h) * self.p;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn reset(&mut self) {
        self.x = Vec3::ZERO;
        self.p = Mat3::IDENTITY;
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn first_update_snaps_to_measurement() {
        let mut kf = Kalman::new(KalmanParams::default());
        assert!(!kf.is_initialized());
        kf.update(0.25);
        assert!(kf.is_initialized());
        assert_eq!(kf.position(), 0.25);
        assert_eq!(kf.velocity(), 0.0);
        assert_eq!(kf.acceleration(), 0.0);
        assert_eq!(kf.predict(), 0.25);
    }

    #[test]
    fn converges_on_noisy_constant() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let mut kf = Kalman::new(KalmanParams::new(0.0, 0.1));
        let mut predicted = 0.0;
        for _ in 0..500 {
            kf.update(0.5 + (rng.f64() - 0.5) * 0.1);
            predicted = kf.predict();
        }
        assert_abs_diff_eq!(predicted, 0.5, epsilon = 0.02);
    }

    #[test]
    fn dead_reckons_through_gaps() {
        let mut kf = Kalman::new(KalmanParams::new(0.0, 0.1));
        for t in 0..50 {
            kf.update(0.1 + 0.01 * t as f64);
            kf.predict();
        }
        // No more measurements from frame 50 on.
        let mut predicted = 0.0;
        for _ in 0..5 {
            predicted = kf.predict();
        }
        assert_abs_diff_eq!(predicted, 0.1 + 0.01 * 55.0, epsilon = 1e-3);
        assert_abs_diff_eq!(kf.velocity(), 0.01, epsilon = 1e-4);
    }

    #[test]
    fn singular_residual_variance() {
        let mut kf = Kalman::new(KalmanParams::new(0.0, 0.0));
        kf.update(0.5);
        assert_eq!(kf.covariance()[(0, 0)], 0.0);

        // S is exactly zero now, which must not produce a division fault or NaNs.
        kf.update(0.7);
        assert!(kf.position().is_finite());
        assert!(kf.velocity().is_finite());
        assert_eq!(kf.position(), 0.5);
    }

    #[test]
    fn reset() {
        let mut kf = Kalman::new(KalmanParams::default());
        kf.update(0.3);
        kf.predict();
        kf.reset();
        assert!(!kf.is_initialized());
        assert_eq!(kf.position(), 0.0);
        assert_eq!(*kf.covariance(), Mat3::IDENTITY);
    }
}
