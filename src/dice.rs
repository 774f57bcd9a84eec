//! Weighted dice: face labels, weights and weighted sampling.
//!
//! A [`WeightedDie`] keeps its faces in construction order with one weight per
//! face (default 1.0). Rolling draws faces independently with probability
//! `weight_i / Σ weights` using [`WeightedIndex`].
//!
//! Sessions hold dice through [`SharedDie`] handles so that re-weighting a die
//! between plays is visible to every session that holds it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

use crate::error::{DiceError, Result};
use crate::table::Table;

/// Default weight given to every face at construction.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Column name of the [`WeightedDie::current_state`] table.
pub const WEIGHT_COLUMN: &str = "weight";

/// A die face label: integers, chars, strings, or any other ordered,
/// printable, thread-safe value.
pub trait Face: Clone + Ord + fmt::Debug + fmt::Display + Send + Sync {}

impl<T> Face for T where T: Clone + Ord + fmt::Debug + fmt::Display + Send + Sync {}

// ── Weight conversion ───────────────────────────────────────────────

/// Conversion of a caller-supplied weight into a real number.
///
/// Numeric types convert directly. Text and JSON values go through a float
/// parse and fail with [`DiceError::InvalidArgument`] when they are not a
/// numeric literal.
pub trait IntoWeight {
    fn into_weight(self) -> Result<f64>;
}

macro_rules! impl_numeric_weight {
    ($($t:ty),*) => {
        $(
            impl IntoWeight for $t {
                #[inline]
                fn into_weight(self) -> Result<f64> {
                    Ok(self as f64)
                }
            }
        )*
    };
}

impl_numeric_weight!(f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl IntoWeight for &str {
    fn into_weight(self) -> Result<f64> {
        self.trim().parse::<f64>().map_err(|_| {
            DiceError::invalid_argument(format!("weight must be numeric, got {self:?}"))
        })
    }
}

impl IntoWeight for &String {
    fn into_weight(self) -> Result<f64> {
        self.as_str().into_weight()
    }
}

impl IntoWeight for String {
    fn into_weight(self) -> Result<f64> {
        self.as_str().into_weight()
    }
}

impl IntoWeight for &serde_json::Value {
    fn into_weight(self) -> Result<f64> {
        match self {
            serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
                DiceError::invalid_argument(format!("weight {n} is not representable as f64"))
            }),
            serde_json::Value::String(s) => s.as_str().into_weight(),
            other => Err(DiceError::invalid_argument(format!(
                "weight must be numeric, got {other}"
            ))),
        }
    }
}

impl IntoWeight for serde_json::Value {
    fn into_weight(self) -> Result<f64> {
        (&self).into_weight()
    }
}

// ── WeightedDie ─────────────────────────────────────────────────────

/// A die with a fixed, ordered set of distinct faces and one mutable weight
/// per face.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedDie<F> {
    faces: Vec<F>,
    weights: Vec<f64>,
}

impl<F: Face> WeightedDie<F> {
    /// Create a die from its faces, every weight set to [`DEFAULT_WEIGHT`].
    ///
    /// Fails with [`DiceError::InvalidArgument`] when no faces are given and
    /// with [`DiceError::DuplicateFace`] when a label repeats.
    pub fn new<I>(faces: I) -> Result<Self>
    where
        I: IntoIterator<Item = F>,
    {
        let faces: Vec<F> = faces.into_iter().collect();
        if faces.is_empty() {
            return Err(DiceError::invalid_argument("a die needs at least one face"));
        }

        let mut seen = BTreeSet::new();
        for face in &faces {
            if !seen.insert(face) {
                return Err(DiceError::duplicate_face(face));
            }
        }

        let weights = vec![DEFAULT_WEIGHT; faces.len()];
        Ok(Self { faces, weights })
    }

    /// Replace the weight of one face.
    ///
    /// The die is untouched when the face is unknown or the weight is not
    /// numeric.
    pub fn set_weight<W: IntoWeight>(&mut self, face: &F, weight: W) -> Result<()> {
        let pos = self.position(face)?;
        let weight = weight.into_weight()?;
        tracing::debug!(
            "face {:?} weight {} -> {}",
            face,
            self.weights[pos],
            weight
        );
        self.weights[pos] = weight;
        Ok(())
    }

    pub fn weight(&self, face: &F) -> Option<f64> {
        self.faces
            .iter()
            .position(|f| f == face)
            .map(|pos| self.weights[pos])
    }

    /// Faces in construction order.
    pub fn faces(&self) -> &[F] {
        &self.faces
    }

    /// Weights aligned with [`faces`](Self::faces).
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// The set of face labels, for order-independent comparison.
    pub fn face_set(&self) -> BTreeSet<&F> {
        self.faces.iter().collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Probability of each face (aligned with [`faces`](Self::faces)).
    pub fn probabilities(&self) -> Result<Vec<f64>> {
        self.check_weights()?;
        let total = self.total_weight();
        Ok(self.weights.iter().map(|w| w / total).collect())
    }

    /// Roll the die `n` times with the thread-local RNG.
    pub fn roll(&self, n: usize) -> Result<Vec<F>> {
        self.roll_with(n, &mut rand::rng())
    }

    /// Roll the die `n` times drawing from `rng`.
    ///
    /// Draws are independent and with replacement. Fails with
    /// [`DiceError::InvalidWeights`] when the weights do not form a
    /// distribution.
    pub fn roll_with<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<F>> {
        let dist = self.distribution()?;
        Ok((0..n)
            .map(|_| self.faces[dist.sample(rng)].clone())
            .collect())
    }

    /// Snapshot of the face → weight mapping in face order, as a one-column
    /// table named [`WEIGHT_COLUMN`].
    pub fn current_state(&self) -> Table<F, &'static str, f64> {
        Table::from_cells(self.faces.clone(), vec![WEIGHT_COLUMN], self.weights.clone())
    }

    fn position(&self, face: &F) -> Result<usize> {
        self.faces
            .iter()
            .position(|f| f == face)
            .ok_or_else(|| DiceError::unknown_face(face))
    }

    fn check_weights(&self) -> Result<()> {
        if let Some((face, w)) = self
            .faces
            .iter()
            .zip(&self.weights)
            .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
        {
            return Err(DiceError::InvalidWeights {
                message: format!("face {face:?} has weight {w}; weights must be finite and non-negative"),
            });
        }
        let total = self.total_weight();
        if total == 0.0 {
            return Err(DiceError::InvalidWeights {
                message: "all weights are zero".to_string(),
            });
        }
        if !total.is_finite() {
            return Err(DiceError::InvalidWeights {
                message: "sum of weights overflows".to_string(),
            });
        }
        Ok(())
    }

    fn distribution(&self) -> Result<WeightedIndex<f64>> {
        self.check_weights()?;
        WeightedIndex::new(self.weights.iter().copied()).map_err(|e| DiceError::InvalidWeights {
            message: e.to_string(),
        })
    }
}

impl<F: Face> fmt::Display for WeightedDie<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.current_state(), f)
    }
}

// ── SharedDie ───────────────────────────────────────────────────────

/// Shared handle to a [`WeightedDie`].
///
/// Clones point at the same die. Rolls take a read lock and weight updates a
/// write lock, so an update never interleaves with an in-flight roll.
#[derive(Debug)]
pub struct SharedDie<F>(Arc<RwLock<WeightedDie<F>>>);

impl<F> Clone for SharedDie<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: Face> From<WeightedDie<F>> for SharedDie<F> {
    fn from(die: WeightedDie<F>) -> Self {
        Self(Arc::new(RwLock::new(die)))
    }
}

impl<F: Face> SharedDie<F> {
    pub fn new<I>(faces: I) -> Result<Self>
    where
        I: IntoIterator<Item = F>,
    {
        WeightedDie::new(faces).map(Self::from)
    }

    pub fn set_weight<W: IntoWeight>(&self, face: &F, weight: W) -> Result<()> {
        self.0.write().set_weight(face, weight)
    }

    pub fn roll(&self, n: usize) -> Result<Vec<F>> {
        self.0.read().roll(n)
    }

    pub fn roll_with<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<F>> {
        self.0.read().roll_with(n, rng)
    }

    pub fn current_state(&self) -> Table<F, &'static str, f64> {
        self.0.read().current_state()
    }

    /// Read access to the underlying die.
    pub fn read(&self) -> RwLockReadGuard<'_, WeightedDie<F>> {
        self.0.read()
    }

    /// Whether both handles point at the same die.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<F: Face> fmt::Display for SharedDie<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0.read(), f)
    }
}
