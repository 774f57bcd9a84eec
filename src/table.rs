//! Ordered 2D container used for every tabular result.
//!
//! A [`Table`] has an ordered row index, ordered column keys and row-major
//! cells. Roll results, face counts and combination counts are all tables with
//! different key types:
//!
//! | Result | Row key | Column key | Cell |
//! |--------|---------|------------|------|
//! | wide results | roll number (1-based) | die index (0-based) | face |
//! | narrow results | [`StackedKey`] (roll, die) | `"Outcome"` | face |
//! | face counts | roll number | face | count |
//! | combo / permutation counts | [`Outcomes`] | `"Count"` | count |

use std::fmt;

/// Rows × columns table with ordered keys on both axes.
#[derive(Clone, Debug, PartialEq)]
pub struct Table<R, C, V> {
    index: Vec<R>,
    columns: Vec<C>,
    cells: Vec<V>,
}

impl<R, C, V> Table<R, C, V> {
    /// Build from an index, column keys and row-major cells.
    ///
    /// `cells.len()` must equal `index.len() * columns.len()`.
    pub(crate) fn from_cells(index: Vec<R>, columns: Vec<C>, cells: Vec<V>) -> Self {
        debug_assert_eq!(cells.len(), index.len() * columns.len());
        Self {
            index,
            columns,
            cells,
        }
    }

    /// (rows, columns), like a dataframe shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[R] {
        &self.index
    }

    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    /// Cells of the row at position `pos` (not the row key).
    pub fn row(&self, pos: usize) -> Option<&[V]> {
        if pos >= self.index.len() {
            return None;
        }
        let width = self.columns.len();
        Some(&self.cells[pos * width..(pos + 1) * width])
    }

    /// Iterate `(row key, row cells)` in index order.
    pub fn rows(&self) -> impl Iterator<Item = (&R, &[V])> + '_ {
        let width = self.columns.len();
        self.index
            .iter()
            .enumerate()
            .map(move |(pos, key)| (key, &self.cells[pos * width..(pos + 1) * width]))
    }

    /// Cells of column position `pos`, top to bottom.
    pub fn column(&self, pos: usize) -> impl Iterator<Item = &V> + '_ {
        let width = self.columns.len();
        let len = if pos < width { self.index.len() } else { 0 };
        self.cells.iter().skip(pos).step_by(width.max(1)).take(len)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&V> {
        if column >= self.columns.len() {
            return None;
        }
        self.row(row).map(|cells| &cells[column])
    }

    /// Every cell in row-major order.
    pub fn values(&self) -> &[V] {
        &self.cells
    }
}

impl<R: PartialEq, C: PartialEq, V> Table<R, C, V> {
    /// Look a cell up by row key and column key.
    pub fn lookup(&self, row: &R, column: &C) -> Option<&V> {
        let r = self.index.iter().position(|k| k == row)?;
        let c = self.columns.iter().position(|k| k == column)?;
        self.get(r, c)
    }
}

impl<R: Clone, C: Clone, V: Clone> Table<R, C, V> {
    /// First `n` rows (all rows if fewer).
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.index.len());
        Self {
            index: self.index[..n].to_vec(),
            columns: self.columns.clone(),
            cells: self.cells[..n * self.columns.len()].to_vec(),
        }
    }

    /// Reshape into one row per (row key, column key) pair holding a single
    /// value column named `name`. Rows come out row-major: every column of
    /// the first row, then the second row, and so on.
    pub fn stack(&self, name: &'static str) -> Table<StackedKey<R, C>, &'static str, V> {
        let mut index = Vec::with_capacity(self.cells.len());
        for (row, _) in self.rows() {
            for column in &self.columns {
                index.push(StackedKey {
                    row: row.clone(),
                    column: column.clone(),
                });
            }
        }
        Table::from_cells(index, vec![name], self.cells.clone())
    }
}

impl<R, C, V> Table<R, C, V>
where
    V: Copy + std::iter::Sum<V>,
{
    /// Sum of each row's cells.
    pub fn row_sums(&self) -> Vec<V> {
        self.rows().map(|(_, cells)| cells.iter().copied().sum()).collect()
    }

    /// Sum of every cell.
    pub fn total(&self) -> V {
        self.cells.iter().copied().sum()
    }
}

/// Row key of a stacked (narrow) table: the original row key paired with the
/// original column key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackedKey<R, C> {
    pub row: R,
    pub column: C,
}

impl<R: fmt::Display, C: fmt::Display> fmt::Display for StackedKey<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Tuple of one roll's outcomes, used as a combination or permutation key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Outcomes<F>(pub Vec<F>);

impl<F> Outcomes<F> {
    pub fn as_slice(&self) -> &[F] {
        &self.0
    }
}

impl<F: fmt::Display> fmt::Display for Outcomes<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, face) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{face}")?;
        }
        write!(f, ")")
    }
}

impl<R, C, V> fmt::Display for Table<R, C, V>
where
    R: fmt::Display,
    C: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index: Vec<String> = self.index.iter().map(ToString::to_string).collect();
        let header: Vec<String> = self.columns.iter().map(ToString::to_string).collect();
        let cells: Vec<String> = self.cells.iter().map(ToString::to_string).collect();
        let width = header.len();

        let index_width = index.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let widths: Vec<usize> = (0..width)
            .map(|c| {
                cells
                    .iter()
                    .skip(c)
                    .step_by(width)
                    .map(|s| s.chars().count())
                    .chain(std::iter::once(header[c].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:index_width$}", "")?;
        for (h, w) in header.iter().zip(&widths) {
            write!(f, "  {h:>w$}")?;
        }
        for (r, key) in index.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{key:<index_width$}")?;
            for (c, w) in widths.iter().enumerate() {
                write!(f, "  {:>w$}", cells[r * width + c])?;
            }
        }
        Ok(())
    }
}
