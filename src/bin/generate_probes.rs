use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Writes synthetic probing-tool CSV files for demos and manual testing.
///
/// Each site file holds one timing (in cycles) per line. The first row of
/// every probe carries the probe's sample count in a second column.
#[derive(Parser, Debug)]
#[command(name = "generate_probes")]
#[command(about = "Generate synthetic cache-probing timing CSVs", long_about = None)]
struct Args {
    /// Directory the site CSV files are written to
    #[arg(default_value = "probe_data")]
    out_dir: PathBuf,

    /// Probes per site
    #[arg(short, long, default_value_t = 50)]
    probes: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Per-site traffic profile.
struct SiteProfile {
    name: &'static str,
    /// Mean traversal time in cycles.
    mean_cycles: f64,
    cycles_jitter: f64,
    /// Mean number of samples per probe.
    mean_samples: f64,
    samples_jitter: f64,
}

const SITES: [SiteProfile; 3] = [
    SiteProfile {
        name: "bbc",
        mean_cycles: 5200.0,
        cycles_jitter: 400.0,
        mean_samples: 40.0,
        samples_jitter: 6.0,
    },
    SiteProfile {
        name: "wikipedia",
        mean_cycles: 4300.0,
        cycles_jitter: 250.0,
        mean_samples: 28.0,
        samples_jitter: 4.0,
    },
    SiteProfile {
        name: "google",
        mean_cycles: 4700.0,
        cycles_jitter: 300.0,
        mean_samples: 33.0,
        samples_jitter: 5.0,
    },
];

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

fn render_site(site: &SiteProfile, probes: usize, rng: &mut SimpleRng) -> Result<String> {
    let mut text = String::new();
    for _ in 0..probes {
        let samples = rng.gauss(site.mean_samples, site.samples_jitter).round().max(1.0) as usize;
        for i in 0..samples {
            let cycles = rng.gauss(site.mean_cycles, site.cycles_jitter).max(1.0);
            if i == 0 {
                writeln!(text, "{cycles:.0},{samples}")?;
            } else {
                writeln!(text, "{cycles:.0}")?;
            }
        }
    }
    Ok(text)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    for site in &SITES {
        let path = args.out_dir.join(format!("{}.csv", site.name));
        let text = render_site(site, args.probes, &mut rng)?;
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {} probes to {}", args.probes, path.display());
    }

    Ok(())
}
