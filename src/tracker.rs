//! The per-frame tracking and counting pipeline.

use std::env::{self, VarError};

use anyhow::{bail, ensure, Context};

use crate::{
    detection::{BoundingBox, Detections},
    filter::{Filter, FilterBank, FilterFactory, Kalman, KalmanParams},
    history::{self, BoxHistory},
    peaks::{find_peaks, PeakOptions},
    poi::{Poi, PoiMap},
    resolve::{Contact, Counts, EventResolver},
};

pub use crate::resolve::UnresolvedPolicy;

/// Configuration of a [`Tracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerOptions {
    history_len: usize,
    kalman: KalmanParams,
    peaks: PeakOptions,
    unresolved: UnresolvedPolicy,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            history_len: 100,
            kalman: KalmanParams::default(),
            peaks: PeakOptions::default(),
            unresolved: UnresolvedPolicy::default(),
        }
    }
}

impl TrackerOptions {
    /// Creates [`TrackerOptions`] from the defaults, overridden by any `JUGGLECOUNT_*` environment
    /// variables that are set.
    ///
    /// See the [crate-level documentation](crate) for the list of variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name))
    }

    fn from_lookup<L>(lookup: L) -> anyhow::Result<Self>
    where
        L: Fn(&str) -> Result<String, VarError>,
    {
        let read = |name: &str| -> anyhow::Result<Option<String>> {
            match lookup(name) {
                Ok(v) => Ok(Some(v)),
                Err(VarError::NotPresent) => Ok(None),
                Err(VarError::NotUnicode(s)) => bail!(
                    "invalid value set for `{name}` variable: {}",
                    s.to_string_lossy()
                ),
            }
        };
        let parse = |name: &str,
                     parser: fn(&str) -> anyhow::Result<f64>|
         -> anyhow::Result<Option<f64>> {
            read(name)?
                .map(|v| {
                    parser(v.trim())
                        .with_context(|| format!("invalid value set for `{name}` variable: '{v}'"))
                })
                .transpose()
        };

        let mut options = Self::default();
        if let Some(v) = read("JUGGLECOUNT_HISTORY_LEN")? {
            let len = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&len| len > 0)
                .with_context(|| {
                    format!("invalid value set for `JUGGLECOUNT_HISTORY_LEN` variable: '{v}'")
                })?;
            options = options.history_len(len);
        }
        if let Some(v) = parse("JUGGLECOUNT_PROCESS_VARIANCE", parse_non_negative)? {
            options = options.process_variance(v);
        }
        if let Some(v) = parse("JUGGLECOUNT_MEASUREMENT_VARIANCE", parse_non_negative)? {
            options = options.measurement_variance(v);
        }
        if let Some(v) = parse("JUGGLECOUNT_PROMINENCE", parse_non_negative)? {
            options = options.prominence(v);
        }
        if let Some(v) = read("JUGGLECOUNT_UNRESOLVED")? {
            let policy = match v.trim() {
                "retain" => UnresolvedPolicy::Retain,
                "discard" => UnresolvedPolicy::Discard,
                _ => bail!("invalid value set for `JUGGLECOUNT_UNRESOLVED` variable: '{v}'"),
            };
            options = options.unresolved(policy);
        }

        log::debug!("tracker options: {options:?}");
        Ok(options)
    }

    /// Sets the number of frames of measurements and predictions to keep.
    ///
    /// Peaks are only searched for within this window.
    ///
    /// # Panics
    ///
    /// Panics if `len` is 0.
    pub fn history_len(self, len: usize) -> Self {
        assert!(len > 0, "history length must be at least 1");
        Self {
            history_len: len,
            ..self
        }
    }

    /// Sets the Kalman filter process noise variance.
    ///
    /// # Panics
    ///
    /// Panics if `variance` is negative or not finite.
    pub fn process_variance(self, variance: f64) -> Self {
        let kalman = KalmanParams::new(variance, self.kalman.measurement_variance());
        Self { kalman, ..self }
    }

    /// Sets the Kalman filter measurement noise variance.
    ///
    /// # Panics
    ///
    /// Panics if `variance` is negative or not finite.
    pub fn measurement_variance(self, variance: f64) -> Self {
        let kalman = KalmanParams::new(self.kalman.process_variance(), variance);
        Self { kalman, ..self }
    }

    /// Sets the minimum prominence of counted peaks (see [`PeakOptions::prominence`]).
    pub fn prominence(self, prominence: f64) -> Self {
        self.peak_options(self.peaks.prominence(prominence))
    }

    /// Replaces all peak detection parameters.
    pub fn peak_options(self, peaks: PeakOptions) -> Self {
        Self { peaks, ..self }
    }

    /// Sets what to do with peaks that can't be attributed to any body part.
    pub fn unresolved(self, unresolved: UnresolvedPolicy) -> Self {
        Self { unresolved, ..self }
    }
}

fn parse_non_negative(s: &str) -> anyhow::Result<f64> {
    let v: f64 = s.parse()?;
    ensure!(
        v.is_finite() && v >= 0.0,
        "value must be finite and non-negative"
    );
    Ok(v)
}

/// Result of [`Tracker::push_frame`].
#[derive(Debug, Clone)]
pub struct FrameReport {
    frame: u64,
    predictions: PoiMap<Option<BoundingBox>>,
    contact: Option<Contact>,
}

impl FrameReport {
    /// Returns the 0-based number of the frame, counted since the tracker was created or reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns the filtered position of `poi` in this frame.
    ///
    /// This is [`None`] if `poi` has never been detected.
    pub fn prediction(&self, poi: Poi) -> Option<BoundingBox> {
        self.predictions[poi]
    }

    pub fn predictions(&self) -> &PoiMap<Option<BoundingBox>> {
        &self.predictions
    }

    /// Returns the contact counted while processing this frame, if any.
    ///
    /// The contact itself usually happened a frame or two earlier, since a peak can only be
    /// recognized once the object has started moving back up.
    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }
}

/// Tracks body parts and the object across frames and counts their contacts.
///
/// By default, positions are smoothed with [`Kalman`] filters. Other filters can be used via
/// [`Tracker::with_filters`].
pub struct Tracker<F = Kalman> {
    options: TrackerOptions,
    measurements: BoxHistory,
    predictions: BoxHistory,
    filters: FilterBank<F>,
    resolver: EventResolver,
    frames: u64,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerOptions::default())
    }
}

impl Tracker {
    pub fn new(options: TrackerOptions) -> Self {
        Self::with_filters(options, &options.kalman)
    }
}

impl<F: Filter> Tracker<F> {
    /// Creates a tracker that uses filters built by `factory`.
    ///
    /// The Kalman parameters in `options` are ignored.
    pub fn with_filters<B>(options: TrackerOptions, factory: &B) -> Self
    where
        B: FilterFactory<Filter = F>,
    {
        Self {
            options,
            measurements: history::box_history(options.history_len),
            predictions: history::box_history(options.history_len),
            filters: FilterBank::new(factory),
            resolver: EventResolver::new(options.unresolved),
            frames: 0,
        }
    }

    /// Processes the detections of the next video frame.
    ///
    /// # Panics
    ///
    /// Panics if the internal histories go out of alignment, which indicates a bug in this crate.
    pub fn push_frame(&mut self, detections: &Detections) -> FrameReport {
        let frame = self.frames;
        self.frames += 1;

        for (poi, detection) in detections.iter() {
            self.measurements[poi].push(detection);
        }
        let predictions = self.filters.step(detections);
        for (poi, prediction) in predictions.iter() {
            self.predictions[poi].push(*prediction);
        }
        history::assert_aligned(&self.measurements, &self.predictions);

        log::trace!(
            "frame {frame}: object at {:?}",
            predictions[Poi::TrackedObject].map(|p| p.position())
        );

        let heights = self.predictions[Poi::TrackedObject]
            .iter()
            .map(|p| p.map(|p| p.y()))
            .collect::<Vec<_>>();
        let contact = find_peaks(&heights, &self.options.peaks)
            .first()
            .and_then(|&slot| {
                self.resolver
                    .resolve(slot, &mut self.measurements, &mut self.predictions)
            });

        FrameReport {
            frame,
            predictions,
            contact,
        }
    }

    /// Returns the contacts counted so far.
    pub fn counts(&self) -> &Counts {
        self.resolver.counts()
    }

    /// Returns the raw detections of the frames in the current window, oldest first.
    pub fn measurements(&self) -> &BoxHistory {
        &self.measurements
    }

    /// Returns the filtered positions of the frames in the current window, oldest first.
    pub fn predictions(&self) -> &BoxHistory {
        &self.predictions
    }

    pub fn filters(&self) -> &FilterBank<F> {
        &self.filters
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    /// Returns the number of frames processed since creation or the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Resets the tracker to the state just after construction.
    ///
    /// This starts a new session: histories, filters and counts are all cleared.
    pub fn reset(&mut self) {
        for history in self
            .measurements
            .values_mut()
            .chain(self.predictions.values_mut())
        {
            history.clear();
        }
        self.filters.reset();
        self.resolver = EventResolver::new(self.options.unresolved);
        self.frames = 0;
    }
}
