use op_cache::{ExpirationSettings, OpCacheConfig};
use std::env;
use std::str::FromStr;

/// Benchmark knobs read from the environment.
///
/// - `DB_LATENCY_MS`: simulated origin latency (default 5)
/// - `BENCH_SAMPLE_SIZE`: criterion sample size (default 100)
/// - `BENCH_RESULT_EXPIRATION_MS`, `BENCH_RESULT_GRACE_EXPIRATION_MS`: cache
///   expirations, loaded through [`ExpirationSettings::from_env`]
#[derive(Debug, Clone, Copy)]
pub struct BenchConfig {
    pub db_latency_ms: u64,
    pub sample_size: usize,
    pub expirations: ExpirationSettings,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl BenchConfig {
    pub fn from_env() -> Self {
        let expirations = ExpirationSettings::from_env("BENCH").unwrap_or_else(|err| {
            eprintln!("Using default expirations: {}", err);
            ExpirationSettings::default()
        });

        let config = BenchConfig {
            db_latency_ms: env_or("DB_LATENCY_MS", 5),
            sample_size: env_or("BENCH_SAMPLE_SIZE", 100),
            expirations,
        };
        eprintln!("{:#?}", config);
        config
    }

    /// Cache configuration for the benchmarked user caches.
    pub fn cache_config<E>(&self) -> OpCacheConfig<E> {
        OpCacheConfig::from(self.expirations).with_name("users")
    }
}
