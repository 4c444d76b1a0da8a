//! Temporal filtering of noisy, intermittent position measurements.

mod bank;
mod kalman;
mod passthrough;

pub use bank::FilterBank;
pub use kalman::{Kalman, KalmanParams};
pub use passthrough::Passthrough;

/// A filter tracking a single scalar coordinate over time.
///
/// Filters are driven once per frame: [`Filter::update`] is called only if the frame contains a
/// measurement, [`Filter::predict`] is always called afterwards and yields the filtered position.
pub trait Filter {
    /// Advances the filter state by one frame, returning the predicted position.
    fn predict(&mut self) -> f64;

    /// Corrects the filter state with a new measurement.
    fn update(&mut self, measurement: f64);

    /// Returns whether [`Filter::update`] was called since construction or the last reset.
    ///
    /// The output of [`Filter::predict`] is meaningless until this returns `true`.
    fn is_initialized(&self) -> bool;

    /// Resets the state of the filter to be identical to the state just after construction.
    fn reset(&mut self);
}

impl Filter for Box<dyn Filter + Send> {
    fn predict(&mut self) -> f64 {
        (**self).predict()
    }

    fn update(&mut self, measurement: f64) {
        (**self).update(measurement)
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Creates the [`Filter`]s of a [`FilterBank`], one per tracked coordinate.
///
/// This is implemented for filter parameter types like [`KalmanParams`], and for closures returning
/// a filter (eg. `Passthrough::new`).
pub trait FilterFactory {
    type Filter: Filter;

    fn build(&self) -> Self::Filter;
}

impl<F: Filter, C: Fn() -> F> FilterFactory for C {
    type Filter = F;

    fn build(&self) -> F {
        self()
    }
}
