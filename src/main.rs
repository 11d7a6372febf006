use anyhow::{Context, Result};
use perfstats::histogram::{BinLayout, Histogram};
use perfstats::model::ModelOutcome;
use perfstats::samples::{SampleTable, WallClockSource};
use perfstats::{
    EngineConfig, MeasurementSession, ModelSearchEngine, ReportFormatter, SemilogHistogram,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "PERFSTATS_CONFIG";
const NORMAL_SAMPLES: usize = 1_000_000;

/// Initialize tracing subscriber, `RUST_LOG` overrides the default level
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config() -> Result<EngineConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = Path::new(&path);
            EngineConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load configuration: {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn summary<L: BinLayout>(
    out: &mut impl Write,
    formatter: &ReportFormatter,
    title: &str,
    histogram: &Histogram<L>,
) -> Result<()> {
    writeln!(out, "{}", title)?;
    formatter.write_histogram(histogram, out)?;
    let spread = histogram.spread();
    writeln!(
        out,
        "count:{} mean:{:.2} sigma(1):{:.2} sigma(2):{:.2}\n",
        histogram.count(),
        histogram.mean(),
        spread.one_sigma,
        spread.two_sigma
    )?;
    Ok(())
}

fn elapsed_ns(start: Instant) -> u64 {
    start.elapsed().as_nanos().min(u64::MAX as u128) as u64
}

fn histogram_scenarios(
    out: &mut impl Write,
    config: &EngineConfig,
    formatter: &ReportFormatter,
) -> Result<()> {
    let mut histogram = config.histogram.build()?;

    for _ in 0..1000 {
        histogram.add(1000);
    }
    summary(out, formatter, "Single point (1000 x 1000)", &histogram)?;
    histogram.clear();

    for value in 0..10_000 {
        histogram.add(value);
    }
    summary(out, formatter, "Uniform [0, 10000)", &histogram)?;
    histogram.clear();

    // Timing each insertion shows what the histogram costs inside a loop
    let mut cost = config.histogram.build()?;
    let mut rng = StdRng::seed_from_u64(42);
    let normal = Normal::<f64>::new(50_000.0, 2_500.0).context("Invalid normal distribution")?;
    for _ in 0..NORMAL_SAMPLES {
        let value = normal.sample(&mut rng).max(0.0).round() as u64;
        let start = Instant::now();
        histogram.add(value);
        cost.add(elapsed_ns(start));
    }
    summary(out, formatter, "Normal (mean 50000, sigma 2500)", &histogram)?;
    summary(out, formatter, "Cost of add (measure+bin, ns)", &cost)?;

    cost.clear();
    for _ in 0..NORMAL_SAMPLES {
        let start = Instant::now();
        cost.add(elapsed_ns(start));
    }
    summary(out, formatter, "Cost of measuring only (ns)", &cost)?;
    Ok(())
}

/// Synthetic counters with known scaling laws
fn synthetic_table(rng: &mut StdRng) -> Result<SampleTable> {
    let mut table = SampleTable::new();
    for n in (64..=4096u64).step_by(64) {
        let size = n as f64;
        let jitter = |rng: &mut StdRng| rng.gen_range(-0.5..0.5);

        let scan = 40.0 + 3.0 * size + 20.0 * jitter(rng);
        let pairs = 100.0 + 0.5 * size * size + 2000.0 * jitter(rng);
        let search = 25.0 + 8.0 * size.log10() + 0.2 * jitter(rng);

        for (label, cycles) in [("linear_scan", scan), ("pairwise", pairs), ("bisect", search)] {
            let metrics = BTreeMap::from([("cycles".to_string(), cycles)]);
            table.record(label, n, &metrics)?;
        }
    }
    Ok(table)
}

/// Time summing a vector of each size
fn measured_table() -> Result<SampleTable> {
    let mut session = MeasurementSession::new(WallClockSource::new());
    for n in (1024..=65_536usize).step_by(4096) {
        let data: Vec<u64> = (0..n as u64).collect();
        let iterations = 64;
        session.start();
        for _ in 0..iterations {
            std::hint::black_box(data.iter().sum::<u64>());
        }
        session.stop("vec_sum", n as u64, iterations)?;
    }
    Ok(session.into_table())
}

fn print_outcome(
    out: &mut impl Write,
    formatter: &ReportFormatter,
    outcome: &ModelOutcome,
) -> Result<()> {
    formatter.write_model(outcome, out)?;
    write!(out, "{}", formatter.render_candidates(outcome))?;
    writeln!(out)?;
    Ok(())
}

fn model_scenarios(
    out: &mut impl Write,
    config: &EngineConfig,
    formatter: &ReportFormatter,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let table = synthetic_table(&mut rng)?;
    let engine = ModelSearchEngine::new(&table, config.search.clone())?;

    let outcomes = match config.family_assignment() {
        Some(families) => table
            .labels()
            .map(|label| engine.fit(label, &config.dependent, &families))
            .collect::<perfstats::Result<Vec<_>>>()?,
        None => engine.fit_all(&config.dependent)?,
    };
    for outcome in &outcomes {
        print_outcome(out, formatter, outcome)?;
    }

    let pooled = engine.fit_pooled(&config.dependent)?;
    print_outcome(out, formatter, &pooled)?;

    let measured = measured_table()?;
    let engine = ModelSearchEngine::new(&measured, config.search.clone())?;
    let outcome = engine.fit_default("vec_sum", WallClockSource::COUNTER)?;
    print_outcome(out, formatter, &outcome)?;
    formatter.write_json(&outcome, out)?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let config = load_config()?;
    tracing::info!(
        subdivisions = config.histogram.subdivisions,
        dependent = config.dependent.as_str(),
        "starting"
    );

    let formatter = ReportFormatter::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let empty = SemilogHistogram::new(config.histogram.subdivisions)?;
    writeln!(out, "Empty histogram p50: {}\n", empty.percentile(50.0))?;

    histogram_scenarios(&mut out, &config, &formatter)?;
    model_scenarios(&mut out, &config, &formatter)?;
    out.flush()?;
    Ok(())
}
