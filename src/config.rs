//! JSON session description.
//!
//! ```json
//! {
//!   "faces": [1, 2, 3, 4, 5, 6],
//!   "dice": [
//!     { "weights": [{ "face": 6, "weight": 5 }] },
//!     {},
//!     { "faces": [6, 5, 4, 3, 2, 1], "weights": [{ "face": 1, "weight": "0.5" }] }
//!   ],
//!   "rolls": 1000,
//!   "seed": 42
//! }
//! ```
//!
//! `faces` at the top level is the default for every die; a die may list its
//! own. Faces must be all numbers or all strings. Weights may be numbers or
//! numeric strings.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::dice::{SharedDie, WeightedDie};
use crate::error::DiceError;
use crate::session::DiceSession;

/// Rolls per play when neither the command line nor the config sets one.
pub const DEFAULT_ROLLS: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session config: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Dice(#[from] DiceError),
}

/// A face label read from JSON.
///
/// Integral numbers become [`Label::Number`]; other numbers become
/// [`Label::Real`]. Numbers order by value across both variants and sort
/// before text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    Number(i64),
    Real(Real),
    Text(String),
}

/// A non-integral numeric face, totally ordered by [`f64::total_cmp`].
#[derive(Clone, Copy, Debug)]
pub struct Real(pub f64);

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Real {}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Label {
    fn is_numeric(&self) -> bool {
        !matches!(self, Self::Text(_))
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Real(a), Self::Real(b)) => a.cmp(b),
            // Never equal: a Real is not integral or lies outside i64.
            (Self::Number(a), Self::Real(b)) => (*a as f64).total_cmp(&b.0).then(Ordering::Less),
            (Self::Real(a), Self::Number(b)) => {
                a.0.total_cmp(&(*b as f64)).then(Ordering::Greater)
            }
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Text(_), _) => Ordering::Greater,
            (_, Self::Text(_)) => Ordering::Less,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Real(r) => write!(f, "{}", r.0),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl TryFrom<&Value> for Label {
    type Error = DiceError;

    fn try_from(value: &Value) -> Result<Self, DiceError> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Self::Number(i));
                }
                match n.as_f64() {
                    Some(x) if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 => {
                        Ok(Self::Number(x as i64))
                    }
                    Some(x) => Ok(Self::Real(Real(x))),
                    None => Err(DiceError::invalid_argument(format!(
                        "face {n} is not representable as a number"
                    ))),
                }
            }
            Value::String(s) => Ok(Self::Text(s.clone())),
            other => Err(DiceError::invalid_argument(format!(
                "face must be a number or a string, got {other}"
            ))),
        }
    }
}

/// Parse a face list, requiring every label to be of the same kind.
pub fn parse_faces(values: &[Value]) -> Result<Vec<Label>, DiceError> {
    let labels = values
        .iter()
        .map(Label::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let numeric = labels.iter().filter(|l| l.is_numeric()).count();
    if numeric != 0 && numeric != labels.len() {
        return Err(DiceError::invalid_argument(
            "faces must be all numbers or all strings",
        ));
    }
    Ok(labels)
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub faces: Option<Vec<Value>>,
    pub dice: Vec<DieConfig>,
    #[serde(default)]
    pub rolls: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DieConfig {
    #[serde(default)]
    pub faces: Option<Vec<Value>>,
    #[serde(default)]
    pub weights: Vec<WeightConfig>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightConfig {
    pub face: Value,
    pub weight: Value,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Build every die, applying its weights in order.
    pub fn build_dice(&self) -> Result<Vec<SharedDie<Label>>, DiceError> {
        self.dice
            .iter()
            .enumerate()
            .map(|(i, die)| {
                let faces = die.faces.as_ref().or(self.faces.as_ref()).ok_or_else(|| {
                    DiceError::invalid_argument(format!(
                        "die {i} lists no faces and no default faces are given"
                    ))
                })?;
                let mut built = WeightedDie::new(parse_faces(faces)?)?;
                for w in &die.weights {
                    built.set_weight(&Label::try_from(&w.face)?, &w.weight)?;
                }
                Ok(SharedDie::from(built))
            })
            .collect()
    }

    /// Build the session. `seed` takes precedence over the config's own seed;
    /// with neither the session is seeded from OS entropy.
    pub fn build_session(&self, seed: Option<u64>) -> Result<DiceSession<Label>, DiceError> {
        let dice = self.build_dice()?;
        match seed.or(self.seed) {
            Some(seed) => DiceSession::with_seed(dice, seed),
            None => DiceSession::new(dice),
        }
    }
}
