use crate::config::LessonCoefficients;
use crate::models::{ExamResultRecord, PriorityLevel, WhatIfProjection};
use crate::rank::CalibrationSet;

/// Projects the score and rank if every wrong answer in topics persisted at `target`
/// had been correct. Empty answers stay empty.
pub fn project(
    result: &ExamResultRecord,
    coefficients: &LessonCoefficients,
    target: PriorityLevel,
    calibration: &CalibrationSet,
) -> WhatIfProjection {
    let current_score = result.score;
    let mut projected_score = current_score;
    let mut affected_topics = Vec::new();

    for detail in &result.details {
        let coefficient = coefficients.coefficient(&detail.lesson_name);
        for topic in &detail.topic_analyses {
            if topic.priority_level == Some(target) {
                projected_score += topic.wrong.max(0) as f64 * coefficient;
                affected_topics.push(topic.topic_name.clone());
            }
        }
    }

    let current_rank = calibration.compare(current_score).current_year.rank;
    let projected_rank = calibration.compare(projected_score).current_year.rank;

    WhatIfProjection {
        current_score,
        projected_score,
        score_difference: projected_score - current_score,
        current_rank,
        projected_rank,
        rank_improvement: current_rank - projected_rank,
        affected_topics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::rank::bucket;

    fn calibration() -> CalibrationSet {
        CalibrationSet {
            current_year: 2025,
            current: vec![
                bucket(300.0, 350.0, 150_000),
                bucket(350.0, 400.0, 50_000),
                bucket(400.0, 450.0, 10_000),
            ],
            previous_year: 2024,
            previous: Vec::new(),
        }
    }

    fn sample() -> ExamResultRecord {
        result(
            9,
            4,
            340.0,
            vec![
                lesson(
                    "Matematik",
                    vec![
                        leveled(topic("Problemler", 10, 2, 6, 2), PriorityLevel::One),
                        leveled(topic("Olasılık", 5, 4, 1, 0), PriorityLevel::Three),
                    ],
                ),
                lesson(
                    "Türkçe",
                    vec![
                        leveled(topic("Paragraf", 10, 3, 4, 3), PriorityLevel::One),
                        topic("Yazım Kuralları", 4, 2, 2, 0),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn converts_wrong_answers_of_target_tier() {
        let coefficients = LessonCoefficients::new([("Matematik", 3.0), ("Türkçe", 2.0)]);

        let projection = project(&sample(), &coefficients, PriorityLevel::One, &calibration());

        assert_eq!(projection.current_score, 340.0);
        assert_eq!(projection.projected_score, 340.0 + 6.0 * 3.0 + 4.0 * 2.0);
        assert_eq!(projection.score_difference, 26.0);
        assert_eq!(projection.affected_topics, vec!["Problemler", "Paragraf"]);
        assert_eq!(projection.current_rank, 150_000);
        assert_eq!(projection.projected_rank, 50_000);
        assert_eq!(projection.rank_improvement, 100_000);
    }

    #[test]
    fn unleveled_topics_are_never_affected() {
        let projection = project(
            &sample(),
            &LessonCoefficients::default(),
            PriorityLevel::Two,
            &calibration(),
        );
        assert!(projection.affected_topics.is_empty());
        assert_eq!(projection.projected_score, projection.current_score);
        assert_eq!(projection.rank_improvement, 0);
    }

    #[test]
    fn no_calibration_means_zero_ranks() {
        let projection = project(
            &sample(),
            &LessonCoefficients::default(),
            PriorityLevel::Three,
            &CalibrationSet::default(),
        );
        assert_eq!(projection.projected_score, 341.0);
        assert_eq!(projection.current_rank, 0);
        assert_eq!(projection.projected_rank, 0);
    }
}
