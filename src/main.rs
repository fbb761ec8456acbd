extern crate env_logger;
extern crate failure;
extern crate income_bench;
#[macro_use]
extern crate log;
extern crate serde_json;

use income_bench::{run_benchmark, BenchmarkConfig};
use std::io::{self, Write};

fn main() -> Result<(), failure::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BenchmarkConfig::default();
    info!("Configuration: {}", serde_json::to_string(&config)?);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_benchmark(&config, &mut out)?;
    out.flush()?;
    Ok(())
}
