//! Ball contact counting from noisy per-frame body landmark and object detections.
//!
//! A [`Tracker`] receives one [`Detections`] value per video frame. Each frame, it
//!
//! 1. appends the raw detections to a bounded per-[`Poi`] history,
//! 2. smooths every POI's position with one constant-acceleration Kalman filter per axis,
//! 3. looks for prominent maxima of the tracked object's vertical coordinate (the ball at its
//!    lowest point, since image Y points *down*),
//! 4. attributes the first such maximum to the closest body part and counts it.
//!
//! Everything upstream of that (cameras, pose estimation networks, object detectors) and everything
//! downstream (drawing the predictions, showing the counts) is left to the caller.
//!
//! # Coordinates
//!
//! All positions are normalized to the frame size: `(0, 0)` is the top left corner of the image,
//! `(1, 1)` the bottom right corner.
//!
//! # Environment Variables
//!
//! [`TrackerOptions::from_env`] reads the following variables, all of which are optional:
//!
//! * `JUGGLECOUNT_HISTORY_LEN`: number of frames kept in the measurement and prediction history.
//! * `JUGGLECOUNT_PROCESS_VARIANCE`: Kalman filter process noise variance.
//! * `JUGGLECOUNT_MEASUREMENT_VARIANCE`: Kalman filter measurement noise variance.
//! * `JUGGLECOUNT_PROMINENCE`: minimum prominence of a counted peak.
//! * `JUGGLECOUNT_UNRESOLVED`: what to do with a peak no body part can be matched to. Allowed
//!   values are `retain` (the default) and `discard`.

use log::LevelFilter;

pub mod detection;
pub mod filter;
pub mod history;
pub mod linalg;
pub mod peaks;
pub mod poi;
pub mod resolve;
pub mod tracker;

pub use detection::{BoundingBox, Detections};
pub use poi::{Poi, PoiMap};
pub use resolve::{Contact, Counts};
pub use tracker::{FrameReport, Tracker, TrackerOptions, UnresolvedPolicy};

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and this crate will log at *debug* level, unless overridden with `RUST_LOG`.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
