use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use montecarlo::config::DEFAULT_ROLLS;
use montecarlo::env_config;
use montecarlo::{save_report, ConfigError, ResultForm, SessionAnalyzer, SessionConfig};

/// Roll a weighted dice session from a JSON config and analyze the outcomes.
#[derive(Parser, Debug)]
#[command(name = "montecarlo-simulate", version)]
struct Args {
    /// Session config (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Rolls per die (overrides the config; default 1000)
    #[arg(long)]
    rolls: Option<usize>,

    /// RNG seed (overrides the config and MONTECARLO_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the analysis report as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Results layout to print
    #[arg(long, value_parser = ["wide", "narrow"], default_value = "wide")]
    form: String,

    /// Number of result rows to print
    #[arg(long, default_value_t = 10)]
    show: usize,

    /// Number of most frequent combinations to report
    #[arg(long, default_value_t = 5)]
    top: usize,
}

fn run(args: &Args) -> Result<(), ConfigError> {
    let num_threads = env_config::init_rayon_threads();
    let form: ResultForm = args.form.parse()?;

    let config = SessionConfig::load(&args.config)?;
    let seed = args
        .seed
        .or(config.seed)
        .or_else(env_config::seed_from_env);
    let mut session = config.build_session(seed)?;
    let rolls = args.rolls.or(config.rolls).unwrap_or(DEFAULT_ROLLS);

    println!(
        "Dice session ({} dice, {} rolls, {} threads)",
        session.num_dice(),
        rolls,
        num_threads
    );
    match seed {
        Some(seed) => println!("  Seed: {}", seed),
        None => println!("  Seed: entropy"),
    }
    for (i, die) in session.dice().iter().enumerate() {
        println!("\nDie {}:\n{}", i, die);
    }

    let t0 = Instant::now();
    session.play(rolls)?;
    tracing::info!("played {} rolls in {:.2?}", rolls, t0.elapsed());

    if let Some(results) = session.results(form) {
        println!(
            "\nResults ({}, first {} of {} rows):\n{}",
            form,
            args.show.min(results.shape().0),
            results.shape().0,
            results.head(args.show)
        );
    }

    let analyzer = SessionAnalyzer::new(&session)?;
    let report = analyzer.report(args.top);
    println!(
        "\nJackpots: {} of {} rolls ({:.2}%)",
        report.jackpots,
        report.num_rolls,
        report.jackpot_rate * 100.0
    );
    println!("\nFace frequencies:");
    for freq in &report.face_frequencies {
        println!(
            "  {:>6}: {:>8} ({:.2}%)",
            freq.face,
            freq.count,
            freq.proportion * 100.0
        );
    }
    println!(
        "\nDistinct combinations: {}  Distinct permutations: {}",
        report.distinct_combinations, report.distinct_permutations
    );
    println!("\nTop combinations:\n{}", analyzer.combo_count().head(args.top));

    if let Some(output) = &args.output {
        save_report(&report, output).map_err(|source| ConfigError::Io {
            path: output.display().to_string(),
            source,
        })?;
        println!("\nReport written to {}", output.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_config::init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_checked_at_parse_time() {
        let args = Args::try_parse_from(["montecarlo-simulate", "--config", "dice.json"]).unwrap();
        assert_eq!(args.form.parse::<ResultForm>().unwrap(), ResultForm::Wide);

        let args = Args::try_parse_from([
            "montecarlo-simulate",
            "--config",
            "dice.json",
            "--form",
            "narrow",
        ])
        .unwrap();
        assert_eq!(args.form.parse::<ResultForm>().unwrap(), ResultForm::Narrow);

        let err = Args::try_parse_from([
            "montecarlo-simulate",
            "--config",
            "dice.json",
            "--form",
            "tall",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
