//! Write a synthetic `sample.csv` of rental listings for trying the cleaner.
//!
//! Roughly one row in ten is dirty: missing `room_type`, an extreme price,
//! coordinates outside the city, or an unparseable `last_review`.

use anyhow::{Context, Result};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

const HEADER: [&str; 10] = [
    "id",
    "name",
    "host_id",
    "neighbourhood_group",
    "room_type",
    "price",
    "minimum_nights",
    "longitude",
    "latitude",
    "last_review",
];

/// (borough, centre longitude, centre latitude)
const BOROUGHS: [(&str, f64, f64); 5] = [
    ("Manhattan", -73.97, 40.78),
    ("Brooklyn", -73.95, 40.65),
    ("Queens", -73.82, 40.72),
    ("Bronx", -73.87, 40.85),
    ("Staten Island", -74.13, 40.58),
];

const ROOM_TYPES: [&str; 3] = ["Entire home/apt", "Private room", "Shared room"];
const ADJECTIVES: [&str; 5] = ["Cozy", "Sunny", "Spacious", "Quiet", "Charming"];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "sample.csv";
    let rows = 500;

    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record(HEADER)?;

    for id in 0..rows {
        let (borough, lon0, lat0) = *rng.pick(&BOROUGHS);
        let room_type = *rng.pick(&ROOM_TYPES);
        let name = format!("{} {} in {borough}", rng.pick(&ADJECTIVES), room_type.to_lowercase());

        let mut price = match room_type {
            "Entire home/apt" => rng.uniform(90.0, 400.0),
            "Private room" => rng.uniform(40.0, 150.0),
            _ => rng.uniform(20.0, 80.0),
        }
        .round();
        let mut lon = lon0 + rng.uniform(-0.05, 0.05);
        let mut lat = lat0 + rng.uniform(-0.04, 0.04);
        let year = 2015 + (rng.next_u64() % 5);
        let month = 1 + rng.next_u64() % 12;
        let day = 1 + rng.next_u64() % 28;
        let mut last_review = format!("{year}-{month:02}-{day:02}");

        let room_type = if rng.chance(0.03) { "" } else { room_type };
        if rng.chance(0.03) {
            price = rng.uniform(2000.0, 10000.0).round();
        }
        if rng.chance(0.02) {
            lon = rng.uniform(-76.0, -75.0);
            lat = rng.uniform(42.0, 43.0);
        }
        if rng.chance(0.15) {
            last_review.clear();
        } else if rng.chance(0.02) {
            last_review = "not-a-date".to_string();
        }

        writer.write_record([
            (1000 + id).to_string(),
            name,
            (rng.next_u64() % 100_000).to_string(),
            borough.to_string(),
            room_type.to_string(),
            price.to_string(),
            (1 + rng.next_u64() % 30).to_string(),
            format!("{lon:.5}"),
            format!("{lat:.5}"),
            last_review,
        ])?;
    }

    writer.flush().context("flushing sample.csv")?;
    println!("Wrote {rows} listings to {output_path}");
    Ok(())
}
