use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::path::Path;

use barolink::data::legacy::{write_legacy, LegacyOptions};
use barolink::data::loader::save_file;
use barolink::{DataCollection, FilterNumber, Specifications, StationSeries, Units};

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

/// Common-mode pressure wave seen by every station, delayed by `lag` seconds.
fn pressure_wave(t: f64, lag: f64) -> f64 {
    let t = t - lag;
    2e-4 * (2.0 * PI * 0.5 * t).sin() + 5e-5 * (2.0 * PI * 7.0 * t).sin() + 1e-5 * (2.0 * PI * 60.0 * t).cos()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let options = LegacyOptions::default();
    let sampling_frequency = options.sampling_frequency;
    let n_samples = 4096;
    let times: Vec<f64> = (0..n_samples).map(|i| i as f64 / sampling_frequency).collect();

    // (lag [s], static offset [bar], noise level [bar])
    let station_params = [(0.0, 1.0132, 2e-6), (0.012, 1.0127, 3e-6), (0.027, 1.0141, 2e-6), (0.041, 1.0119, 4e-6)];

    let mut data = BTreeMap::new();
    for (station, &(lag, offset, noise)) in options.station_names.iter().zip(&station_params) {
        let pressures = times
            .iter()
            .map(|&t| offset + pressure_wave(t, lag) + rng.gauss(0.0, noise))
            .collect();
        data.insert(
            station.clone(),
            StationSeries {
                pressures,
                times: times.clone(),
            },
        );
    }

    let specifications = Specifications {
        stations: options.station_names.clone(),
        sampling_frequency,
        filter_number: FilterNumber(3),
        units: Units::from([
            ("pressures".to_string(), options.pressure_units.clone()),
            ("times".to_string(), options.time_units.clone()),
        ]),
    };
    let collection = DataCollection::new(specifications, data)?;

    for output in ["sample_collection.parquet", "sample_collection.json"] {
        save_file(&collection, Path::new(output))?;
        println!(
            "Wrote {} stations ({} samples each) to {output}",
            collection.stations().len(),
            n_samples
        );
    }

    let legacy_dir = Path::new("sample_legacy");
    std::fs::create_dir_all(legacy_dir)?;
    write_legacy(&collection, legacy_dir, "sample")?;
    println!("Wrote legacy layout to {}/", legacy_dir.display());

    Ok(())
}
