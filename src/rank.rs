use crate::models::{CalibrationEntry, RankComparison, YearRank};

/// How a rank was obtained from a calibration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankEstimate {
    /// The score sits inside a bucket.
    Exact(i64),
    /// The score sits in the gap between two buckets.
    Interpolated(i64),
    /// Below every bucket; carries the last row's rank.
    BelowRange(i64),
    /// Above every bucket; carries the first row's rank.
    AboveRange(i64),
    /// No rows for this year and exam type.
    NoCalibrationData,
}

impl RankEstimate {
    /// Numeric rank; a missing table reports `0`.
    pub fn rank(&self) -> i64 {
        match *self {
            RankEstimate::Exact(rank)
            | RankEstimate::Interpolated(rank)
            | RankEstimate::BelowRange(rank)
            | RankEstimate::AboveRange(rank) => rank,
            RankEstimate::NoCalibrationData => 0,
        }
    }

    pub fn has_data(&self) -> bool {
        !matches!(self, RankEstimate::NoCalibrationData)
    }
}

/// Looks up `score` in rows sorted ascending by `score_range_min`.
pub fn estimate_rank(rows: &[CalibrationEntry], score: f64) -> RankEstimate {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return RankEstimate::NoCalibrationData;
    };

    for (i, row) in rows.iter().enumerate() {
        if score >= row.score_range_min && score <= row.score_range_max {
            return RankEstimate::Exact(row.estimated_rank);
        }

        if let Some(next) = rows.get(i + 1) {
            if score > row.score_range_max && score < next.score_range_min {
                let ratio =
                    (score - row.score_range_max) / (next.score_range_min - row.score_range_max);
                let rank = row.estimated_rank as f64
                    + ratio * (next.estimated_rank - row.estimated_rank) as f64;
                return RankEstimate::Interpolated(rank.round() as i64);
            }
        }
    }

    if score < first.score_range_min {
        RankEstimate::BelowRange(last.estimated_rank)
    } else {
        RankEstimate::AboveRange(first.estimated_rank)
    }
}

/// Calibration rows for the two years a comparison looks at.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSet {
    pub current_year: i32,
    pub current: Vec<CalibrationEntry>,
    pub previous_year: i32,
    pub previous: Vec<CalibrationEntry>,
}

impl CalibrationSet {
    pub fn compare(&self, score: f64) -> RankComparison {
        let current = estimate_rank(&self.current, score).rank();
        let previous = estimate_rank(&self.previous, score).rank();
        RankComparison {
            current_year: YearRank {
                year: self.current_year,
                rank: current,
            },
            previous_year: YearRank {
                year: self.previous_year,
                rank: previous,
            },
            change: current - previous,
        }
    }
}

#[cfg(test)]
pub(crate) fn bucket(min: f64, max: f64, rank: i64) -> CalibrationEntry {
    CalibrationEntry {
        year: 2025,
        exam_type: "TYT".to_string(),
        score_range_min: min,
        score_range_max: max,
        estimated_rank: rank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn table() -> Vec<CalibrationEntry> {
        vec![
            bucket(300.0, 350.0, 150_000),
            bucket(350.0, 400.0, 50_000),
            bucket(400.0, 450.0, 10_000),
        ]
    }

    fn gapped() -> Vec<CalibrationEntry> {
        vec![bucket(200.0, 250.0, 400_000), bucket(300.0, 350.0, 100_000)]
    }

    #[rstest]
    #[case(375.0, RankEstimate::Exact(50_000))]
    #[case(402.0, RankEstimate::Exact(10_000))]
    #[case(350.0, RankEstimate::Exact(150_000))]
    #[case(120.0, RankEstimate::BelowRange(10_000))]
    #[case(499.0, RankEstimate::AboveRange(150_000))]
    fn contiguous_table(#[case] score: f64, #[case] expected: RankEstimate) {
        assert_eq!(estimate_rank(&table(), score), expected);
    }

    #[rstest]
    #[case(275.0, RankEstimate::Interpolated(250_000))]
    #[case(260.0, RankEstimate::Interpolated(340_000))]
    #[case(299.5, RankEstimate::Interpolated(103_000))]
    fn gaps_are_interpolated(#[case] score: f64, #[case] expected: RankEstimate) {
        assert_eq!(estimate_rank(&gapped(), score), expected);
    }

    #[test]
    fn empty_table_reports_zero() {
        let estimate = estimate_rank(&[], 380.0);
        assert_eq!(estimate, RankEstimate::NoCalibrationData);
        assert!(!estimate.has_data());
        assert_eq!(estimate.rank(), 0);
    }

    #[test]
    fn comparison_subtracts_previous_rank() {
        let set = CalibrationSet {
            current_year: 2025,
            current: table(),
            previous_year: 2024,
            previous: vec![bucket(350.0, 400.0, 45_000)],
        };

        let comparison = set.compare(375.0);
        assert_eq!(comparison.current_year, YearRank { year: 2025, rank: 50_000 });
        assert_eq!(comparison.previous_year, YearRank { year: 2024, rank: 45_000 });
        assert_eq!(comparison.change, 5_000);
    }

    #[test]
    fn missing_previous_year_compares_against_zero() {
        let set = CalibrationSet {
            current_year: 2025,
            current: table(),
            previous_year: 2024,
            previous: Vec::new(),
        };
        assert_eq!(set.compare(420.0).change, 10_000);
    }
}
