//! Shared environment configuration for the simulation binary.
//!
//! Consolidates `MONTECARLO_SEED`, `MONTECARLO_LOG` and `RAYON_NUM_THREADS`
//! reads.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const SEED_VAR: &str = "MONTECARLO_SEED";
pub const LOG_VAR: &str = "MONTECARLO_LOG";

/// Filter used when `MONTECARLO_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

fn parse_var<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|s| s.trim().parse().ok())
}

/// Read `MONTECARLO_SEED`. Unset or unparsable means "seed from entropy".
pub fn seed_from_env() -> Option<u64> {
    parse_var(std::env::var(SEED_VAR).ok())
}

/// Install the global tracing subscriber, writing to stderr with the filter
/// from `MONTECARLO_LOG` (default `info`).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`) and size the global
/// rayon pool. Tolerates an already-initialized pool. Returns thread count.
pub fn init_rayon_threads() -> usize {
    let requested: Option<usize> = parse_var(
        std::env::var("RAYON_NUM_THREADS")
            .or_else(|_| std::env::var("OMP_NUM_THREADS"))
            .ok(),
    );
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = requested {
        builder = builder.num_threads(n);
    }
    if builder.build_global().is_err() {
        tracing::debug!("rayon pool already initialized");
    }
    rayon::current_num_threads()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(parse_var::<u64>(Some(" 42 ".to_string())), Some(42));
        assert_eq!(parse_var::<u64>(Some("abc".to_string())), None);
        assert_eq!(parse_var::<u64>(None), None);
        assert_eq!(parse_var::<usize>(Some("-1".to_string())), None);
    }
}
