use crate::models::{ExamResultRecord, PriorityLevel, TopicPerformance};

/// Four wrong answers cancel one correct answer.
pub const WRONG_PENALTY: f64 = 0.25;

pub fn net(correct: i32, wrong: i32) -> f64 {
    correct as f64 - wrong as f64 * WRONG_PENALTY
}

/// Percentage of questions answered correctly, `0` for an empty topic.
pub fn success_ratio(correct: i32, total_questions: i32) -> f64 {
    if total_questions <= 0 {
        return 0.0;
    }
    correct as f64 / total_questions as f64 * 100.0
}

/// Share of questions answered wrong or left empty, in `[0, 1]`.
pub fn error_ratio(wrong: i32, empty: i32, total_questions: i32) -> f64 {
    if total_questions <= 0 {
        return 0.0;
    }
    (wrong + empty) as f64 / total_questions as f64
}

/// Provisional absolute level: under 30% success is ONE, under 60% is TWO.
pub fn level_from_success_ratio(ratio: f64) -> PriorityLevel {
    if ratio < 30.0 {
        PriorityLevel::One
    } else if ratio < 60.0 {
        PriorityLevel::Two
    } else {
        PriorityLevel::Three
    }
}

fn performance(
    lesson_name: &str,
    topic_name: &str,
    total_questions: i32,
    correct: i32,
    wrong: i32,
    empty: i32,
) -> TopicPerformance {
    let success = success_ratio(correct, total_questions);
    TopicPerformance {
        lesson_name: lesson_name.to_string(),
        topic_name: topic_name.to_string(),
        total_questions,
        correct,
        wrong,
        empty,
        net: net(correct, wrong),
        priority_level: level_from_success_ratio(success),
        success_ratio: success,
        error_ratio: error_ratio(wrong, empty, total_questions),
    }
}

/// One performance per stored topic record; lessons without a breakdown contribute nothing.
pub fn recorded_topic_performances(result: &ExamResultRecord) -> Vec<TopicPerformance> {
    result
        .details
        .iter()
        .flat_map(|detail| {
            detail.topic_analyses.iter().map(move |topic| {
                performance(
                    &detail.lesson_name,
                    &topic.topic_name,
                    topic.total_question.max(0),
                    topic.correct,
                    topic.wrong,
                    topic.empty,
                )
            })
        })
        .collect()
}

/// Flattens a result into one performance per topic.
///
/// When no lesson carries a topic breakdown, each lesson stands in as a pseudo-topic
/// named after itself and the returned flag is `false`.
pub fn topic_performances(result: &ExamResultRecord) -> (Vec<TopicPerformance>, bool) {
    let topics = recorded_topic_performances(result);
    if !topics.is_empty() {
        return (topics, true);
    }

    let lessons = result
        .details
        .iter()
        .map(|detail| {
            let total = detail.correct + detail.wrong + detail.empty;
            performance(
                &detail.lesson_name,
                &detail.lesson_name,
                total,
                detail.correct,
                detail.wrong,
                detail.empty,
            )
        })
        .collect();

    (lessons, false)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::models::{ExamInfo, ExamResultRecord, LessonDetail, PriorityLevel, TopicRecord};

    pub fn topic(name: &str, total: i32, correct: i32, wrong: i32, empty: i32) -> TopicRecord {
        TopicRecord {
            topic_name: name.to_string(),
            total_question: total,
            correct,
            wrong,
            empty,
            net: correct as f64 - wrong as f64 * 0.25,
            priority_level: None,
        }
    }

    pub fn leveled(mut record: TopicRecord, level: PriorityLevel) -> TopicRecord {
        record.priority_level = Some(level);
        record
    }

    pub fn lesson(name: &str, topics: Vec<TopicRecord>) -> LessonDetail {
        let correct = topics.iter().map(|t| t.correct).sum();
        let wrong = topics.iter().map(|t| t.wrong).sum();
        let empty = topics.iter().map(|t| t.empty).sum();
        LessonDetail {
            lesson_name: name.to_string(),
            correct,
            wrong,
            empty,
            net: correct as f64 - wrong as f64 * 0.25,
            topic_analyses: topics,
        }
    }

    pub fn bare_lesson(name: &str, correct: i32, wrong: i32, empty: i32) -> LessonDetail {
        LessonDetail {
            lesson_name: name.to_string(),
            correct,
            wrong,
            empty,
            net: correct as f64 - wrong as f64 * 0.25,
            topic_analyses: Vec::new(),
        }
    }

    pub fn result(id: i64, exam_id: i64, score: f64, details: Vec<LessonDetail>) -> ExamResultRecord {
        ExamResultRecord {
            id,
            student_id: "stu-1".to_string(),
            exam_id,
            total_net: details.iter().map(|d| d.net).sum(),
            score,
            percentile: 80.0,
            created_at: Utc.with_ymd_and_hms(2025, 1, exam_id as u32 % 28 + 1, 9, 0, 0).unwrap(),
            exam: ExamInfo {
                name: format!("Deneme {exam_id}"),
                exam_type: "TYT".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, exam_id as u32 % 28 + 1).unwrap(),
            },
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn net_applies_quarter_point_penalty() {
        assert_eq!(net(8, 2), 7.5);
        assert_eq!(net(0, 4), -1.0);
    }

    #[test]
    fn success_ratio_is_zero_for_empty_topics() {
        assert_eq!(success_ratio(3, 0), 0.0);
        assert_eq!(success_ratio(3, -2), 0.0);
        assert_eq!(success_ratio(8, 10), 80.0);
    }

    #[test]
    fn provisional_levels_follow_success_bands() {
        assert_eq!(level_from_success_ratio(10.0), PriorityLevel::One);
        assert_eq!(level_from_success_ratio(30.0), PriorityLevel::Two);
        assert_eq!(level_from_success_ratio(59.9), PriorityLevel::Two);
        assert_eq!(level_from_success_ratio(75.0), PriorityLevel::Three);
        assert_eq!(level_from_success_ratio(95.0), PriorityLevel::Three);
    }

    #[test]
    fn flattens_topic_records_across_lessons() {
        let record = result(
            1,
            1,
            300.0,
            vec![
                lesson("Matematik", vec![topic("Olasılık", 10, 8, 2, 0)]),
                lesson("Türkçe", vec![topic("Paragraf", 20, 10, 6, 4)]),
            ],
        );

        let (topics, detailed) = topic_performances(&record);
        assert!(detailed);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].lesson_name, "Matematik");
        assert_eq!(topics[0].net, 7.5);
        assert_eq!(topics[0].success_ratio, 80.0);
        assert!((topics[1].error_ratio - 0.5).abs() < 1e-9);
        assert_eq!(topics[1].priority_level, PriorityLevel::Two);
    }

    #[test]
    fn lessons_stand_in_when_no_topic_breakdown_exists() {
        let record = result(
            1,
            1,
            250.0,
            vec![bare_lesson("Fen Bilimleri", 5, 8, 7), bare_lesson("Tarih", 0, 0, 0)],
        );

        let (topics, detailed) = topic_performances(&record);
        assert!(!detailed);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].topic_name, "Fen Bilimleri");
        assert_eq!(topics[0].total_questions, 20);
        assert_eq!(topics[0].net, 3.0);
        assert_eq!(topics[1].success_ratio, 0.0);
        assert!(recorded_topic_performances(&record).is_empty());
    }
}
