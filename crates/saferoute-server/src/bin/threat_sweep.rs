//! Sweep safety weights over a fixed set of trips and print mean threat counts.
//!
//! Usage: threat_sweep [pairs]

use anyhow::Result;
use saferoute_core::{
    annotate, synthesize_path, BoundingBox, Coordinate, PathBranch, RouteSeed, SeedMode,
};
use saferoute_server::config::Config;

struct SweepTrip {
    name: &'static str,
    start: Coordinate,
    end: Coordinate,
}

fn main() -> Result<()> {
    let config = Config::from_env();
    let profile = config.load_geo_profile()?;
    let pairs: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1000)
        .max(1);

    let trips = vec![
        SweepTrip {
            name: "Lower Manhattan -> Park Slope",
            start: Coordinate::new(40.7061, -73.9969),
            end: Coordinate::new(40.6782, -73.9442),
        },
        SweepTrip {
            name: "Battery Park -> Midtown",
            start: Coordinate::new(40.70, -74.00),
            end: Coordinate::new(40.75, -73.95),
        },
        SweepTrip {
            name: "Long Island City -> Upper West Side",
            start: Coordinate::new(40.7447, -73.9485),
            end: Coordinate::new(40.7870, -73.9754),
        },
        SweepTrip {
            name: "Louvre -> Arc de Triomphe",
            start: Coordinate::new(48.8606, 2.3376),
            end: Coordinate::new(48.8738, 2.2950),
        },
    ];

    println!("Profile: {} | seed mode: {:?}", profile.name, config.seed_mode);
    for trip in &trips {
        let seed = RouteSeed::derive(config.seed_mode, trip.start, trip.end);
        let path = synthesize_path(&profile, trip.start, trip.end, &seed);
        println!("\n=== {} ===", trip.name);
        println!("Branch: {} | points={}", branch_name(path.branch), path.points.len());
        for step in 0..=10 {
            let weight = step as f64 / 10.0;
            let segments = annotate(path.points.len(), weight, &seed);
            println!("  weight {:.1}: {} threat segments", weight, segments.len());
        }
    }

    println!("\n=== Mean over {} synthetic metro trips ===", pairs);
    let sample = sample_trips(&profile.metro, pairs);
    for mode in [SeedMode::SplitMix, SeedMode::Trigonometric] {
        println!("{:?}:", mode);
        for step in 0..=10 {
            let weight = step as f64 / 10.0;
            let total: usize = sample
                .iter()
                .map(|&(start, end)| {
                    let seed = RouteSeed::derive(mode, start, end);
                    let path = synthesize_path(&profile, start, end, &seed);
                    annotate(path.points.len(), weight, &seed).len()
                })
                .sum();
            let mean = total as f64 / sample.len() as f64;
            println!("  weight {:.1}: mean {:.3}", weight, mean);
        }
    }

    Ok(())
}

fn branch_name(branch: PathBranch) -> &'static str {
    match branch {
        PathBranch::Crossing => "crossing",
        PathBranch::Grid => "grid",
        PathBranch::Generic => "generic",
    }
}

/// Trips on a fixed lattice across the metro box, so runs are comparable.
fn sample_trips(metro: &BoundingBox, count: usize) -> Vec<(Coordinate, Coordinate)> {
    let (sw, ne) = (metro.south_west, metro.north_east);
    let lat_span = ne.lat - sw.lat;
    let lng_span = ne.lng - sw.lng;
    let frac = |n: usize| (n % count) as f64 / count as f64;

    (0..count)
        .map(|i| {
            let start = Coordinate::new(
                sw.lat + lat_span * frac(i),
                sw.lng + lng_span * frac(i * 7),
            );
            let end = Coordinate::new(
                ne.lat - lat_span * frac(i),
                ne.lng - lng_span * frac(i * 13),
            );
            (start, end)
        })
        .collect()
}
