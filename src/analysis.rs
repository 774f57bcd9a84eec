//! Statistics over a played session.
//!
//! [`SessionAnalyzer`] snapshots a session's wide results when it is built and
//! derives:
//!
//! - jackpot count: rolls where every die shows the same face
//! - face counts per roll: how many dice showed each face, per roll
//! - combination counts: occurrences of each sorted outcome multiset
//! - permutation counts: occurrences of each ordered outcome tuple
//!
//! [`AnalysisReport`] gathers these into a serializable summary.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::dice::Face;
use crate::error::{DiceError, Result};
use crate::session::{DiceSession, WideResults};
use crate::table::{Outcomes, Table};

/// Column name of combination and permutation count tables.
pub const COUNT_COLUMN: &str = "Count";

/// Roll number × face → number of dice showing that face.
pub type FaceCounts<F> = Table<usize, F, usize>;

/// Outcome tuple → number of rolls that produced it.
pub type OutcomeCounts<F> = Table<Outcomes<F>, &'static str, usize>;

/// Statistics over a snapshot of one session's wide results.
#[derive(Clone, Debug)]
pub struct SessionAnalyzer<F> {
    results: WideResults<F>,
}

impl<F: Face> SessionAnalyzer<F> {
    /// Snapshot the session's current results.
    ///
    /// Fails with [`DiceError::NoResults`] if the session was never played.
    /// Later plays on the session do not affect this analyzer.
    pub fn new(session: &DiceSession<F>) -> Result<Self> {
        let results = session.wide_results().ok_or(DiceError::NoResults)?.clone();
        Ok(Self { results })
    }

    /// The captured wide results.
    pub fn results(&self) -> &WideResults<F> {
        &self.results
    }

    pub fn num_rolls(&self) -> usize {
        self.results.num_rows()
    }

    pub fn num_dice(&self) -> usize {
        self.results.num_columns()
    }

    /// Number of rolls in which every die produced the same face.
    pub fn jackpot(&self) -> usize {
        self.results
            .rows()
            .filter(|(_, row)| row.windows(2).all(|pair| pair[0] == pair[1]))
            .count()
    }

    /// Per-roll face tally. Columns are every face observed anywhere in the
    /// results, ascending; faces absent from a roll count 0. Each row sums to
    /// the number of dice.
    pub fn face_counts_per_roll(&self) -> FaceCounts<F> {
        let observed: BTreeSet<&F> = self.results.values().iter().collect();
        let faces: Vec<F> = observed.into_iter().cloned().collect();
        let width = faces.len();

        let mut cells = vec![0usize; self.num_rolls() * width];
        for (r, (_, row)) in self.results.rows().enumerate() {
            for face in row {
                if let Ok(c) = faces.binary_search(face) {
                    cells[r * width + c] += 1;
                }
            }
        }

        Table::from_cells(self.results.index().to_vec(), faces, cells)
    }

    /// Count of each order-independent outcome multiset (the row sorted).
    pub fn combo_count(&self) -> OutcomeCounts<F> {
        self.count_outcomes(|row| {
            let mut key = row.to_vec();
            key.sort_unstable();
            key
        })
    }

    /// Count of each ordered outcome tuple (die order preserved).
    pub fn permutation_count(&self) -> OutcomeCounts<F> {
        self.count_outcomes(|row| row.to_vec())
    }

    /// Rows come out by count descending, ties by key ascending.
    fn count_outcomes(&self, key: impl Fn(&[F]) -> Vec<F>) -> OutcomeCounts<F> {
        let mut counts: BTreeMap<Outcomes<F>, usize> = BTreeMap::new();
        for (_, row) in self.results.rows() {
            *counts.entry(Outcomes(key(row))).or_insert(0) += 1;
        }

        let mut entries: Vec<(Outcomes<F>, usize)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        let (index, cells): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        Table::from_cells(index, vec![COUNT_COLUMN], cells)
    }

    /// Summary of the captured results with the `top` most frequent
    /// combinations.
    pub fn report(&self, top: usize) -> AnalysisReport {
        let num_rolls = self.num_rolls();
        let num_dice = self.num_dice();
        let jackpots = self.jackpot();
        let total_outcomes = (num_rolls * num_dice) as f64;

        let counts = self.face_counts_per_roll();
        let face_frequencies = counts
            .columns()
            .iter()
            .enumerate()
            .map(|(c, face)| {
                let count: usize = counts.column(c).sum();
                FaceFrequency {
                    face: face.to_string(),
                    count,
                    proportion: count as f64 / total_outcomes,
                }
            })
            .collect();

        let combos = self.combo_count();
        let top_combinations = combos
            .rows()
            .take(top)
            .map(|(key, cells)| OutcomeCount {
                outcomes: key.as_slice().iter().map(ToString::to_string).collect(),
                count: cells[0],
            })
            .collect();

        AnalysisReport {
            num_rolls,
            num_dice,
            jackpots,
            jackpot_rate: if num_rolls == 0 {
                0.0
            } else {
                jackpots as f64 / num_rolls as f64
            },
            face_frequencies,
            distinct_combinations: combos.num_rows(),
            distinct_permutations: self.permutation_count().num_rows(),
            top_combinations,
        }
    }
}

// ── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub num_rolls: usize,
    pub num_dice: usize,
    pub jackpots: usize,
    pub jackpot_rate: f64,
    /// Over every die and roll, ascending by face.
    pub face_frequencies: Vec<FaceFrequency>,
    pub distinct_combinations: usize,
    pub distinct_permutations: usize,
    pub top_combinations: Vec<OutcomeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceFrequency {
    pub face: String,
    pub count: usize,
    pub proportion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeCount {
    pub outcomes: Vec<String>,
    pub count: usize,
}

/// Write a report as pretty JSON, creating parent directories.
pub fn save_report(report: &AnalysisReport, path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    tracing::debug!("wrote report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::SharedDie;

    /// Analyzer over fixed three-dice rows.
    fn analyzer_for(rows: &[[i32; 3]]) -> SessionAnalyzer<i32> {
        let table = Table::from_cells(
            (1..=rows.len()).collect(),
            vec![0, 1, 2],
            rows.iter().flatten().copied().collect(),
        );
        SessionAnalyzer { results: table }
    }

    #[test]
    fn test_new_requires_results() {
        let dice: Vec<SharedDie<i32>> = (0..2).map(|_| SharedDie::new(1..=6).unwrap()).collect();
        let mut session = DiceSession::with_seed(dice, 3).unwrap();
        assert!(matches!(
            SessionAnalyzer::new(&session),
            Err(DiceError::NoResults)
        ));
        session.play(5).unwrap();
        let analyzer = SessionAnalyzer::new(&session).unwrap();
        assert_eq!(analyzer.num_rolls(), 5);
        assert_eq!(analyzer.num_dice(), 2);
    }

    #[test]
    fn test_snapshot_not_live() {
        let dice: Vec<SharedDie<i32>> = (0..2).map(|_| SharedDie::new(1..=6).unwrap()).collect();
        let mut session = DiceSession::with_seed(dice, 4).unwrap();
        session.play(5).unwrap();
        let analyzer = SessionAnalyzer::new(&session).unwrap();
        session.play(9).unwrap();
        assert_eq!(analyzer.num_rolls(), 5);
    }

    #[test]
    fn test_clone_is_independent_snapshot() {
        let analyzer = analyzer_for(&[[1, 1, 1], [2, 3, 4]]);
        let copy = analyzer.clone();
        assert_eq!(copy.results(), analyzer.results());
        assert_eq!(copy.jackpot(), 1);
        assert!(format!("{copy:?}").starts_with("SessionAnalyzer"));
    }

    #[test]
    fn test_jackpot() {
        let a = analyzer_for(&[[1, 1, 1], [1, 2, 1], [6, 6, 6], [3, 3, 2]]);
        assert_eq!(a.jackpot(), 2);
    }

    #[test]
    fn test_face_counts_per_roll() {
        let a = analyzer_for(&[[1, 1, 4], [4, 2, 1]]);
        let counts = a.face_counts_per_roll();
        assert_eq!(counts.columns(), &[1, 2, 4]);
        assert_eq!(counts.index(), &[1, 2]);
        assert_eq!(counts.row(0), Some(&[2, 0, 1][..]));
        assert_eq!(counts.row(1), Some(&[1, 1, 1][..]));
        assert!(counts.row_sums().iter().all(|&s| s == 3));
    }

    #[test]
    fn test_combo_count_ignores_order() {
        let a = analyzer_for(&[[1, 2, 3], [3, 2, 1], [2, 2, 5], [1, 3, 2]]);
        let combos = a.combo_count();
        assert_eq!(combos.columns(), &[COUNT_COLUMN]);
        assert_eq!(combos.num_rows(), 2);
        assert_eq!(combos.index()[0], Outcomes(vec![1, 2, 3]));
        assert_eq!(combos.row(0), Some(&[3][..]));
        assert_eq!(combos.lookup(&Outcomes(vec![2, 2, 5]), &COUNT_COLUMN), Some(&1));
        assert_eq!(combos.total(), 4);
    }

    #[test]
    fn test_permutation_count_keeps_order() {
        let a = analyzer_for(&[[1, 2, 3], [3, 2, 1], [1, 2, 3], [2, 2, 5]]);
        let perms = a.permutation_count();
        assert_eq!(perms.num_rows(), 3);
        assert_eq!(perms.index()[0], Outcomes(vec![1, 2, 3]));
        assert_eq!(perms.row(0), Some(&[2][..]));
        // Ties are ordered by key.
        assert_eq!(perms.index()[1], Outcomes(vec![2, 2, 5]));
        assert_eq!(perms.index()[2], Outcomes(vec![3, 2, 1]));
        assert_eq!(perms.total(), 4);
    }

    #[test]
    fn test_report() {
        let a = analyzer_for(&[[1, 1, 1], [1, 2, 3], [3, 2, 1], [2, 2, 2]]);
        let report = a.report(1);
        assert_eq!(report.num_rolls, 4);
        assert_eq!(report.num_dice, 3);
        assert_eq!(report.jackpots, 2);
        assert_eq!(report.jackpot_rate, 0.5);
        assert_eq!(report.distinct_combinations, 3);
        assert_eq!(report.distinct_permutations, 4);
        assert_eq!(
            report.top_combinations,
            vec![OutcomeCount {
                outcomes: vec!["1".into(), "2".into(), "3".into()],
                count: 2
            }]
        );
        let faces: Vec<(&str, usize)> = report
            .face_frequencies
            .iter()
            .map(|f| (f.face.as_str(), f.count))
            .collect();
        assert_eq!(faces, vec![("1", 5), ("2", 5), ("3", 2)]);
    }

    #[test]
    fn test_save_report_round_trips_json() {
        let a = analyzer_for(&[[1, 1, 1], [4, 5, 6]]);
        let report = a.report(5);
        let path = std::env::temp_dir()
            .join("montecarlo_test_report")
            .join("report.json");
        save_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["num_rolls"], 2);
        assert_eq!(parsed["jackpots"], 1);
        assert_eq!(parsed["top_combinations"].as_array().unwrap().len(), 2);

        let _ = std::fs::remove_file(&path);
    }
}
