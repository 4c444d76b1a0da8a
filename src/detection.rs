//! Per-frame tracker input and adapters for common detector outputs.

use crate::poi::{Poi, PoiMap};

/// An axis-aligned box in normalized image coordinates.
///
/// `x` and `y` locate the tracked point (the box center for detector output, the landmark itself
/// for body landmarks). Body landmarks have a width and height of 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a zero-sized box at `(x, y)`, as used for body landmarks.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn w(&self) -> f64 {
        self.w
    }

    #[inline]
    pub fn h(&self) -> f64 {
        self.h
    }

    #[inline]
    pub fn position(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Euclidean distance between the positions of `self` and `other`.
    pub fn distance(&self, other: &BoundingBox) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }
}

/// The detections of a single video frame.
///
/// Every [`Poi`] is either detected (with a [`BoundingBox`]) or absent. A freshly created
/// [`Detections`] value has every POI absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detections {
    boxes: PoiMap<Option<BoundingBox>>,
}

impl Detections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates [`Detections`] from the output of a BlazePose-style pose landmark network.
    ///
    /// `landmarks` is indexed by landmark index (see [`Poi::pose_landmark`]); a `None` entry or a
    /// list that is too short marks the landmark as not detected. The tracked object is always
    /// left absent and has to be provided separately.
    pub fn from_pose_landmarks(landmarks: &[Option<[f64; 2]>]) -> Self {
        let mut this = Self::new();
        for poi in Poi::BODY {
            let pos = poi
                .pose_landmark()
                .and_then(|idx| landmarks.get(idx).copied().flatten());
            this.set(poi, pos.map(|[x, y]| BoundingBox::point(x, y)));
        }
        this
    }

    /// Sets the detection for `poi`.
    ///
    /// Boxes with non-finite coordinates are treated as absent.
    pub fn set(&mut self, poi: Poi, detection: Option<BoundingBox>) {
        self.boxes[poi] = match detection {
            Some(bbox) if !bbox.is_finite() => {
                log::warn!("ignoring non-finite detection for {poi}: {bbox:?}");
                None
            }
            other => other,
        };
    }

    /// Builder-style variant of [`Detections::set`].
    pub fn with(mut self, poi: Poi, detection: impl Into<Option<BoundingBox>>) -> Self {
        self.set(poi, detection.into());
        self
    }

    pub fn get(&self, poi: Poi) -> Option<BoundingBox> {
        self.boxes[poi]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Poi, Option<BoundingBox>)> + '_ {
        self.boxes.iter().map(|(poi, det)| (poi, *det))
    }
}

/// Estimates the tracked object's position from body landmarks alone.
///
/// This is a crude fallback for when no object detector output is available: it places a small
/// box 15% of the frame height above the higher of the two feet, horizontally centered between
/// them. Requires the nose and both feet to be present.
pub fn estimate_object_from_pose(landmarks: &[Option<[f64; 2]>]) -> Option<BoundingBox> {
    const LIFT: f64 = 0.15;
    const SIZE: f64 = 0.05;

    let landmark = |poi: Poi| {
        poi.pose_landmark()
            .and_then(|idx| landmarks.get(idx).copied().flatten())
    };
    landmark(Poi::Head)?;
    let [lx, ly] = landmark(Poi::LeftFoot)?;
    let [rx, ry] = landmark(Poi::RightFoot)?;

    Some(BoundingBox::new(
        (lx + rx) / 2.0,
        ly.min(ry) - LIFT,
        SIZE,
        SIZE,
    ))
}

/// Minimum confidence a ball detector candidate needs to be considered by [`best_candidate`].
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// An object detector output box with its confidence.
///
/// The box is in the detector's normalized input coordinates (see [`Letterbox`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// Describes how a camera image was scaled and padded into a square detector input.
///
/// The image is scaled to fit while maintaining its aspect ratio and centered, with the remaining
/// space filled with padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Fraction of the input occupied by the image, per axis.
    scale: [f64; 2],
    /// Fraction of the input occupied by the leading padding, per axis.
    offset: [f64; 2],
}

impl Letterbox {
    /// Computes the letterbox transform for an image of `width`x`height` pixels scaled into a
    /// square network input of `input_size`x`input_size` pixels.
    ///
    /// # Panics
    ///
    /// Panics if any of the dimensions is 0.
    pub fn new(width: u32, height: u32, input_size: u32) -> Self {
        assert!(width > 0 && height > 0 && input_size > 0);
        let size = f64::from(input_size);
        let scale = (size / f64::from(width)).min(size / f64::from(height));
        let scaled = [f64::from(width) * scale, f64::from(height) * scale];
        Self {
            scale: [scaled[0] / size, scaled[1] / size],
            offset: [(size - scaled[0]) / 2.0 / size, (size - scaled[1]) / 2.0 / size],
        }
    }

    /// A letterbox that doesn't transform anything.
    pub fn identity() -> Self {
        Self {
            scale: [1.0, 1.0],
            offset: [0.0, 0.0],
        }
    }

    /// Maps a box from normalized network input coordinates to normalized image coordinates.
    pub fn unpad(&self, bbox: BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (bbox.x - self.offset[0]) / self.scale[0],
            (bbox.y - self.offset[1]) / self.scale[1],
            bbox.w / self.scale[0],
            bbox.h / self.scale[1],
        )
    }
}

/// Selects the most confident detector candidate with a confidence of at least `threshold`, and
/// maps it back to image coordinates.
///
/// The position of the result is clamped to the image, so a box centered in the letterbox padding
/// ends up on the image edge. Its size is left as is. On equal confidence, the earlier candidate
/// wins.
pub fn best_candidate<I>(candidates: I, threshold: f32, letterbox: &Letterbox) -> Option<BoundingBox>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates
        .into_iter()
        .filter(|c| c.confidence >= threshold)
        .reduce(|best, c| if c.confidence > best.confidence { c } else { best })
        .map(|c| {
            let bbox = letterbox.unpad(c.bbox);
            BoundingBox::new(
                bbox.x.clamp(0.0, 1.0),
                bbox.y.clamp(0.0, 1.0),
                bbox.w,
                bbox.h,
            )
        })
}
