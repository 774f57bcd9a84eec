//! Dice sessions: roll a fixed set of dice together and keep the last batch.
//!
//! A [`DiceSession`] rolls every die `n` times per [`play`](DiceSession::play)
//! and stores the outcomes as a wide table: row `r` (1-based roll number)
//! holds the `r`-th simultaneous outcome of every die, column `i` holds die
//! `i`'s sequence. Each play replaces the previous table.
//!
//! Dice are rolled in parallel, each with its own `SmallRng` seeded from the
//! session RNG in die order, so a seeded session produces the same table
//! regardless of thread scheduling.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::dice::{Face, SharedDie};
use crate::error::{DiceError, Result};
use crate::table::{StackedKey, Table};

/// Column name of the narrow results table.
pub const OUTCOME_COLUMN: &str = "Outcome";

/// Rolls × dice: row key is the 1-based roll number, column key the 0-based
/// die index.
pub type WideResults<F> = Table<usize, usize, F>;

/// One row per (roll number, die index) with a single [`OUTCOME_COLUMN`].
pub type NarrowResults<F> = Table<StackedKey<usize, usize>, &'static str, F>;

/// Layout selector for [`DiceSession::results`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResultForm {
    #[default]
    Wide,
    Narrow,
}

impl FromStr for ResultForm {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wide" => Ok(Self::Wide),
            "narrow" => Ok(Self::Narrow),
            other => Err(DiceError::invalid_argument(format!(
                "results form must be \"wide\" or \"narrow\", got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for ResultForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wide => write!(f, "wide"),
            Self::Narrow => write!(f, "narrow"),
        }
    }
}

/// A copy of a session's results in the requested layout.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionResults<F> {
    Wide(WideResults<F>),
    Narrow(NarrowResults<F>),
}

impl<F> SessionResults<F> {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Wide(t) => t.shape(),
            Self::Narrow(t) => t.shape(),
        }
    }

    pub fn as_wide(&self) -> Option<&WideResults<F>> {
        match self {
            Self::Wide(t) => Some(t),
            Self::Narrow(_) => None,
        }
    }

    pub fn as_narrow(&self) -> Option<&NarrowResults<F>> {
        match self {
            Self::Wide(_) => None,
            Self::Narrow(t) => Some(t),
        }
    }
}

impl<F: Face> SessionResults<F> {
    /// First `n` rows, keeping the layout.
    pub fn head(&self, n: usize) -> Self {
        match self {
            Self::Wide(t) => Self::Wide(t.head(n)),
            Self::Narrow(t) => Self::Narrow(t.head(n)),
        }
    }
}

impl<F: Face> fmt::Display for SessionResults<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wide(t) => fmt::Display::fmt(t, f),
            Self::Narrow(t) => fmt::Display::fmt(t, f),
        }
    }
}

// ── DiceSession ─────────────────────────────────────────────────────

/// A fixed, ordered set of dice sharing one face set, plus the outcomes of
/// the most recent play.
#[derive(Debug)]
pub struct DiceSession<F> {
    dice: Vec<SharedDie<F>>,
    rng: SmallRng,
    results: Option<WideResults<F>>,
}

impl<F: Face> DiceSession<F> {
    /// Create a session seeded from OS entropy.
    ///
    /// Fails with [`DiceError::InvalidArgument`] for an empty dice list and
    /// with [`DiceError::FaceMismatch`] when the dice do not all carry the
    /// same set of faces.
    pub fn new(dice: Vec<SharedDie<F>>) -> Result<Self> {
        Self::with_rng(dice, SmallRng::from_os_rng())
    }

    /// Create a session whose plays are reproducible for a given seed.
    pub fn with_seed(dice: Vec<SharedDie<F>>, seed: u64) -> Result<Self> {
        Self::with_rng(dice, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(dice: Vec<SharedDie<F>>, rng: SmallRng) -> Result<Self> {
        check_same_faces(&dice)?;
        Ok(Self {
            dice,
            rng,
            results: None,
        })
    }

    /// Roll every die `rolls` times and replace the stored results.
    ///
    /// On failure (a die whose weights cannot be sampled) the previous
    /// results are kept.
    pub fn play(&mut self, rolls: usize) -> Result<()> {
        let base_seed: u64 = self.rng.random();

        let columns: Vec<Vec<F>> = self
            .dice
            .par_iter()
            .enumerate()
            .map(|(i, die)| {
                let mut rng = SmallRng::seed_from_u64(base_seed.wrapping_add(i as u64));
                let outcomes = die.roll_with(rolls, &mut rng);
                tracing::trace!("die {} rolled {} times", i, rolls);
                outcomes
            })
            .collect::<Result<_>>()?;

        let num_dice = columns.len();
        let mut cells = Vec::with_capacity(rolls * num_dice);
        for r in 0..rolls {
            for column in &columns {
                cells.push(column[r].clone());
            }
        }

        self.results = Some(Table::from_cells(
            (1..=rolls).collect(),
            (0..num_dice).collect(),
            cells,
        ));
        tracing::debug!("played {} rolls with {} dice", rolls, num_dice);
        Ok(())
    }

    /// Copy of the last play's results, or `None` if nothing was played yet.
    pub fn results(&self, form: ResultForm) -> Option<SessionResults<F>> {
        let wide = self.results.as_ref()?;
        Some(match form {
            ResultForm::Wide => SessionResults::Wide(wide.clone()),
            ResultForm::Narrow => SessionResults::Narrow(wide.stack(OUTCOME_COLUMN)),
        })
    }

    /// Like [`results`](Self::results) with the form given as `"wide"` or
    /// `"narrow"`. Returns `Ok(None)` before any play, whatever the literal;
    /// once played, any other literal fails with [`DiceError::InvalidArgument`].
    pub fn results_as(&self, form: &str) -> Result<Option<SessionResults<F>>> {
        if self.results.is_none() {
            return Ok(None);
        }
        let form: ResultForm = form.parse()?;
        Ok(self.results(form))
    }

    /// Borrow the wide results without copying.
    pub fn wide_results(&self) -> Option<&WideResults<F>> {
        self.results.as_ref()
    }

    pub fn dice(&self) -> &[SharedDie<F>] {
        &self.dice
    }

    pub fn num_dice(&self) -> usize {
        self.dice.len()
    }

    /// The shared face set, in the first die's order.
    pub fn faces(&self) -> Vec<F> {
        self.dice[0].read().faces().to_vec()
    }
}

fn check_same_faces<F: Face>(dice: &[SharedDie<F>]) -> Result<()> {
    let Some(first) = dice.first() else {
        return Err(DiceError::invalid_argument(
            "a session needs at least one die",
        ));
    };
    let expected: BTreeSet<F> = first.read().faces().iter().cloned().collect();
    for (i, die) in dice.iter().enumerate().skip(1) {
        let faces: BTreeSet<F> = die.read().faces().iter().cloned().collect();
        if faces != expected {
            return Err(DiceError::FaceMismatch { die_index: i });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_d10() -> Vec<SharedDie<i64>> {
        (0..3).map(|_| SharedDie::new(1..=10).unwrap()).collect()
    }

    #[test]
    fn test_play_shape() {
        let mut session = DiceSession::with_seed(three_d10(), 42).unwrap();
        session.play(4).unwrap();
        let wide = session.wide_results().unwrap();
        assert_eq!(wide.shape(), (4, 3));
        assert_eq!(wide.index(), &[1, 2, 3, 4]);
        assert_eq!(wide.columns(), &[0, 1, 2]);
    }

    #[test]
    fn test_results_absent_before_play() {
        let session = DiceSession::with_seed(three_d10(), 1).unwrap();
        assert!(session.results(ResultForm::Wide).is_none());
        assert!(session.results_as("narrow").unwrap().is_none());
    }

    #[test]
    fn test_zero_rolls_is_present_but_empty() {
        let mut session = DiceSession::with_seed(three_d10(), 1).unwrap();
        session.play(0).unwrap();
        let results = session.results(ResultForm::Wide).unwrap();
        assert_eq!(results.shape(), (0, 3));
    }

    #[test]
    fn test_play_replaces_previous_results() {
        let mut session = DiceSession::with_seed(three_d10(), 5).unwrap();
        session.play(6).unwrap();
        session.play(2).unwrap();
        assert_eq!(session.results(ResultForm::Wide).unwrap().shape(), (2, 3));
    }

    #[test]
    fn test_narrow_matches_wide() {
        let mut session = DiceSession::with_seed(three_d10(), 9).unwrap();
        session.play(2).unwrap();
        let wide = session.wide_results().unwrap().clone();
        let narrow = match session.results_as("narrow").unwrap().unwrap() {
            SessionResults::Narrow(t) => t,
            SessionResults::Wide(_) => panic!("expected narrow results"),
        };
        assert_eq!(narrow.shape(), (6, 1));
        for (key, cells) in narrow.rows() {
            assert_eq!(Some(&cells[0]), wide.lookup(&key.row, &key.column));
        }
    }

    #[test]
    fn test_invalid_form_rejected() {
        let mut session = DiceSession::with_seed(three_d10(), 3).unwrap();
        assert!(matches!(session.results_as("1001"), Ok(None)));
        session.play(1).unwrap();
        assert!(matches!(
            session.results_as("1001"),
            Err(DiceError::InvalidArgument { .. })
        ));
        assert!(matches!(
            session.results_as("tall"),
            Err(DiceError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_face_sets_compared_unordered() {
        let a = SharedDie::new([1, 2, 3]).unwrap();
        let b = SharedDie::new([3, 1, 2]).unwrap();
        assert!(DiceSession::new(vec![a.clone(), b]).is_ok());

        let c = SharedDie::new([1, 2, 4]).unwrap();
        assert_eq!(
            DiceSession::new(vec![a, c]).unwrap_err(),
            DiceError::FaceMismatch { die_index: 1 }
        );
    }

    #[test]
    fn test_empty_dice_rejected() {
        assert!(matches!(
            DiceSession::<i64>::new(Vec::new()),
            Err(DiceError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_table() {
        let mut a = DiceSession::with_seed(three_d10(), 77).unwrap();
        let mut b = DiceSession::with_seed(three_d10(), 77).unwrap();
        a.play(50).unwrap();
        b.play(50).unwrap();
        assert_eq!(a.wide_results(), b.wide_results());
    }

    #[test]
    fn test_reweighting_shared_die_affects_next_play() {
        let dice = three_d10();
        let mut session = DiceSession::with_seed(dice.clone(), 11).unwrap();
        for face in 1..10 {
            dice[0].set_weight(&face, 0).unwrap();
        }
        session.play(20).unwrap();
        let wide = session.wide_results().unwrap();
        assert!(wide.column(0).all(|&f| f == 10));
    }

    #[test]
    fn test_failed_play_keeps_previous_results() {
        let dice = vec![SharedDie::new([1, 2]).unwrap(), SharedDie::new([1, 2]).unwrap()];
        let mut session = DiceSession::with_seed(dice.clone(), 2).unwrap();
        session.play(3).unwrap();
        dice[1].set_weight(&1, 0).unwrap();
        dice[1].set_weight(&2, 0).unwrap();
        assert!(matches!(
            session.play(5),
            Err(DiceError::InvalidWeights { .. })
        ));
        assert_eq!(session.wide_results().unwrap().shape(), (3, 2));
    }
}
