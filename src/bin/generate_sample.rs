use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

/// Write a synthetic suitability table for trying out the heatmap viewer.
#[derive(Debug, Parser)]
struct Args {
    /// Output CSV path
    #[arg(default_value = "suitability_proportions.csv")]
    output: PathBuf,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// One modelled species range on one continent.
#[derive(Debug, Serialize)]
struct Record {
    #[serde(rename = "Species")]
    species: String,
    #[serde(rename = "Continent")]
    continent: &'static str,
    #[serde(rename = "Model")]
    model: &'static str,
    #[serde(rename = "Current")]
    current: Option<f64>,
    #[serde(rename = "SSP126_2050")]
    ssp126_2050: Option<f64>,
    #[serde(rename = "SSP245_2050")]
    ssp245_2050: Option<f64>,
    #[serde(rename = "SSP585_2050")]
    ssp585_2050: Option<f64>,
    #[serde(rename = "SSP585_2070")]
    ssp585_2070: Option<f64>,
}

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
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A proportion in `[0, 1]`, missing with probability `p_missing`.
fn proportion(rng: &mut SimpleRng, mean: f64, p_missing: f64) -> Option<f64> {
    if rng.next_f64() < p_missing {
        return None;
    }
    let v = rng.gauss(mean, 0.08).clamp(0.0, 1.0);
    Some((v * 10_000.0).round() / 10_000.0)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    // Baseline suitability per continent and the loss per warming scenario.
    let continents: [(&str, f64); 6] = [
        ("Africa", 0.42),
        ("Asia", 0.55),
        ("Europe", 0.61),
        ("North America", 0.48),
        ("Oceania", 0.37),
        ("South America", 0.52),
    ];
    let scenario_loss = [0.03, 0.07, 0.12, 0.21];
    let models = ["maxent", "gbm", "rf"];
    let genera = ["Acer", "Betula", "Quercus", "Pinus", "Fagus"];

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let mut rows = 0usize;
    for (genus_idx, genus) in genera.iter().enumerate() {
        let species = format!("{genus} sp{}", genus_idx + 1);
        // Each species shifts the continental baseline a little.
        let offset = rng.gauss(0.0, 0.05);

        for &(continent, base) in &continents {
            for &model in &models {
                let mean = base + offset;
                let record = Record {
                    species: species.clone(),
                    continent,
                    model,
                    current: proportion(&mut rng, mean, 0.05),
                    ssp126_2050: proportion(&mut rng, mean - scenario_loss[0], 0.05),
                    ssp245_2050: proportion(&mut rng, mean - scenario_loss[1], 0.05),
                    ssp585_2050: proportion(&mut rng, mean - scenario_loss[2], 0.05),
                    ssp585_2070: proportion(&mut rng, mean - scenario_loss[3], 0.10),
                };
                writer.serialize(&record).context("writing record")?;
                rows += 1;
            }
        }
    }
    writer.flush().context("flushing CSV")?;

    println!(
        "Wrote {rows} rows ({} continents) to {}",
        continents.len(),
        args.output.display()
    );
    Ok(())
}
