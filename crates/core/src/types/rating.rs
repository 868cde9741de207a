//! Review scores and the running rating summary of an item.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Score`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// The value is outside `1..=5`.
    #[error("score must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// The rejected value.
        value: i64,
        /// Smallest allowed score.
        min: u8,
        /// Largest allowed score.
        max: u8,
    },
}

/// A review score from 1 to 5.
///
/// ```
/// use bookstore_core::Score;
///
/// assert!(Score::new(5).is_ok());
/// assert!(Score::new(0).is_err());
/// assert!(Score::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    /// Lowest score.
    pub const MIN: u8 = 1;
    /// Highest score.
    pub const MAX: u8 = 5;

    /// Validate a score.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::OutOfRange`] unless `1 <= value <= 5`.
    pub fn new(value: i64) -> Result<Self, ScoreError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(ScoreError::OutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Score {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Score {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Score {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&i16::from(self.0), buf)
    }
}

/// Running mean and count of an item's review scores.
///
/// The mean is updated incrementally and never recomputed from review
/// history, so it only depends on the multiset of recorded scores (up to
/// floating point rounding).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean score, `None` until the first review.
    pub average: Option<f64>,
    /// Number of scores folded into `average`.
    pub count: i32,
}

impl RatingSummary {
    /// Summary of an item with no reviews.
    #[must_use]
    pub const fn unrated() -> Self {
        Self {
            average: None,
            count: 0,
        }
    }

    /// Fold one more score into the summary.
    ///
    /// Uses `mean + (score - mean) / (count + 1)`, which equals
    /// `(mean * count + score) / (count + 1)` without growing an
    /// intermediate sum.
    #[must_use]
    pub fn record(self, score: Score) -> Self {
        let score = f64::from(score.get());
        match self.average {
            None => Self {
                average: Some(score),
                count: 1,
            },
            Some(mean) => {
                let count = self.count.saturating_add(1);
                Self {
                    average: Some(mean + (score - mean) / f64::from(count)),
                    count,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fold(scores: &[i64]) -> RatingSummary {
        scores
            .iter()
            .map(|s| Score::new(*s).unwrap())
            .fold(RatingSummary::unrated(), RatingSummary::record)
    }

    #[test]
    fn test_score_bounds() {
        assert!(Score::new(1).is_ok());
        assert!(Score::new(5).is_ok());
        assert!(matches!(
            Score::new(0),
            Err(ScoreError::OutOfRange { value: 0, .. })
        ));
        assert!(Score::new(-3).is_err());
        assert!(Score::new(300).is_err());
    }

    #[test]
    fn test_score_deserialize_validates() {
        assert_eq!(serde_json::from_str::<Score>("4").unwrap().get(), 4);
        assert!(serde_json::from_str::<Score>("9").is_err());
    }

    #[test]
    fn test_first_score_sets_mean() {
        let summary = fold(&[4]);
        assert_eq!(summary.average, Some(4.0));
        assert_eq!(summary.count, 1);
    }

    #[test]
    fn test_mean_is_order_independent() {
        let a = fold(&[5, 3, 4]);
        let b = fold(&[3, 4, 5]);
        assert_eq!(a.count, 3);
        assert_eq!(b.count, 3);
        assert!((a.average.unwrap() - 4.0).abs() < 1e-12);
        assert!((b.average.unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_stays_stable_over_many_scores() {
        let mut summary = RatingSummary::unrated();
        let five = Score::new(5).unwrap();
        let one = Score::new(1).unwrap();
        for i in 0..1_000_000 {
            summary = summary.record(if i % 2 == 0 { five } else { one });
        }
        assert_eq!(summary.count, 1_000_000);
        assert!((summary.average.unwrap() - 3.0).abs() < 1e-9);
    }
}
