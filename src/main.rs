//! Runs the tracker on a simulated juggling session and prints the counted contacts.
//!
//! Usage: `jugglecount [frames] [seed]`
//!
//! The tracker is configured from the `JUGGLECOUNT_*` environment variables, and logging from
//! `RUST_LOG`.

use anyhow::Context;
use itertools::Itertools;
use jugglecount::{BoundingBox, Detections, Poi, PoiMap, Tracker, TrackerOptions};

/// Resting positions of the body parts.
const BODY: [(Poi, [f64; 2]); 5] = [
    (Poi::Head, [0.5, 0.15]),
    (Poi::LeftKnee, [0.42, 0.62]),
    (Poi::RightKnee, [0.58, 0.62]),
    (Poi::LeftFoot, [0.4, 0.88]),
    (Poi::RightFoot, [0.6, 0.88]),
];

/// Frames per throw.
const PERIOD: usize = 30;
/// Throw height, in frame heights.
const HEIGHT: f64 = 0.4;
/// Amplitude of the uniform detection jitter.
const JITTER: f64 = 0.004;
/// Probability of the ball detector missing a frame.
const DROPOUT: f64 = 0.02;

fn main() -> anyhow::Result<()> {
    jugglecount::init_logger!();

    let mut args = std::env::args().skip(1);
    let frames = match args.next() {
        Some(arg) => arg
            .parse::<usize>()
            .with_context(|| format!("invalid frame count '{arg}'"))?,
        None => 600,
    };
    let seed = match args.next() {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("invalid seed '{arg}'"))?,
        None => fastrand::u64(..),
    };
    if args.next().is_some() {
        eprintln!("usage: jugglecount [frames] [seed]");
        std::process::exit(1);
    }

    let options = TrackerOptions::from_env()?;
    log::info!("simulating {frames} frames with seed {seed}");

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut tracker = Tracker::new(options);
    let mut thrown = PoiMap::<u32>::default();

    let mut from = Poi::RightFoot;
    let mut to = pick_target(&mut rng);
    for frame in 0..frames {
        let phase = frame % PERIOD;
        if phase == 0 && frame != 0 {
            thrown[to] += 1;
            from = to;
            to = pick_target(&mut rng);
        }

        let u = phase as f64 / PERIOD as f64;
        let [ax, ay] = rest_position(from);
        let [bx, by] = rest_position(to);
        let ball = [
            ax + (bx - ax) * u,
            (1.0 - u) * (ay - 0.02) + u * (by - 0.02) - 4.0 * HEIGHT * u * (1.0 - u),
        ];

        let mut dets = Detections::new();
        for (poi, [x, y]) in BODY {
            dets.set(poi, Some(jitter(&mut rng, x, y, 0.0)));
        }
        if rng.f64() >= DROPOUT {
            dets.set(Poi::TrackedObject, Some(jitter(&mut rng, ball[0], ball[1], 0.05)));
        }

        let report = tracker.push_frame(&dets);
        if let Some(contact) = report.contact() {
            log::info!(
                "frame {}: ball touched the {} ({} contacts so far)",
                report.frame(),
                contact.poi,
                tracker.counts().total(),
            );
        }
    }

    println!("counted:   {}", tracker.counts());
    println!("simulated: {}", format_thrown(&thrown));
    Ok(())
}

fn rest_position(poi: Poi) -> [f64; 2] {
    BODY.iter()
        .find(|(p, _)| *p == poi)
        .map_or([0.5, 0.5], |(_, pos)| *pos)
}

fn pick_target(rng: &mut fastrand::Rng) -> Poi {
    BODY[rng.usize(..BODY.len())].0
}

fn jitter(rng: &mut fastrand::Rng, x: f64, y: f64, size: f64) -> BoundingBox {
    let mut noise = || (rng.f64() - 0.5) * 2.0 * JITTER;
    BoundingBox::new(x + noise(), y + noise(), size, size)
}

fn format_thrown(thrown: &PoiMap<u32>) -> String {
    thrown
        .iter()
        .filter(|(poi, _)| poi.is_body())
        .map(|(poi, n)| format!("{poi}: {n}"))
        .join(", ")
}
