//! # Montecarlo — Weighted Dice Simulator
//!
//! Rolls sets of weighted dice repeatedly and computes descriptive statistics
//! over the outcomes.
//!
//! | Stage | Type | Module | Description |
//! |-------|------|--------|-------------|
//! | Die | [`WeightedDie`] / [`SharedDie`] | [`dice`] | Distinct faces with mutable weights; weighted sampling with replacement |
//! | Game | [`DiceSession`] | [`session`] | Rolls every die `n` times per play and keeps the last batch as a rolls × dice table |
//! | Analyzer | [`SessionAnalyzer`] | [`analysis`] | Jackpots, per-roll face counts, combination and permutation counts |
//!
//! Data flows one way: dice → session → analyzer. Results are [`Table`]s with
//! ordered row and column keys; the narrow results layout is a stack of the
//! wide table, not stored separately.
//!
//! ```
//! use montecarlo::{DiceSession, ResultForm, SessionAnalyzer, SharedDie};
//!
//! let dice: Vec<SharedDie<i64>> = (0..3).map(|_| SharedDie::new(1..=10)).collect::<Result<_, _>>()?;
//! dice[0].set_weight(&10, 10)?;
//!
//! let mut game = DiceSession::with_seed(dice, 42)?;
//! game.play(5)?;
//! assert_eq!(game.results(ResultForm::Wide).unwrap().shape(), (5, 3));
//!
//! let analyzer = SessionAnalyzer::new(&game)?;
//! assert!(analyzer.face_counts_per_roll().row_sums().iter().all(|&n| n == 3));
//! # Ok::<(), montecarlo::DiceError>(())
//! ```
//!
//! ## Weights
//!
//! Weights are `f64`, default 1.0. [`IntoWeight`] accepts any primitive number,
//! numeric text such as `"2.5"`, and JSON numbers or numeric strings; anything
//! else is [`DiceError::InvalidArgument`]. Rolling a die whose weights are all
//! zero, or include a negative or non-finite value, fails with
//! [`DiceError::InvalidWeights`].

pub mod analysis;
pub mod config;
pub mod dice;
pub mod env_config;
pub mod error;
pub mod session;
pub mod table;

pub use analysis::{save_report, AnalysisReport, SessionAnalyzer};
pub use config::{ConfigError, Label, Real, SessionConfig};
pub use dice::{Face, IntoWeight, SharedDie, WeightedDie};
pub use error::DiceError;
pub use session::{DiceSession, ResultForm, SessionResults};
pub use table::{Outcomes, StackedKey, Table};
