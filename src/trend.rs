use std::collections::BTreeSet;

use crate::aggregate;
use crate::models::{
    BranchNetLessonStats, BranchNetRow, ExamResultRecord, MultiExamBranchTable, ProgressPoint,
    ProgressResponse,
};

/// Builds the per-exam, per-lesson net table from results ordered oldest first.
pub fn branch_table(results: &[ExamResultRecord]) -> MultiExamBranchTable {
    let mut lesson_names = BTreeSet::new();
    let mut rows = Vec::with_capacity(results.len());

    for result in results {
        let mut lessons: Vec<BranchNetLessonStats> = Vec::new();

        for detail in &result.details {
            let position = match lessons
                .iter()
                .position(|l| l.lesson_name == detail.lesson_name)
            {
                Some(position) => position,
                None => {
                    lessons.push(BranchNetLessonStats {
                        lesson_name: detail.lesson_name.clone(),
                        question_count: 0,
                        correct: 0,
                        wrong: 0,
                        empty: 0,
                        net: 0.0,
                    });
                    lessons.len() - 1
                }
            };

            let stats = &mut lessons[position];
            for topic in &detail.topic_analyses {
                stats.question_count += topic.total_question;
                stats.correct += topic.correct;
                stats.wrong += topic.wrong;
                stats.empty += topic.empty;
            }
            stats.net = aggregate::net(stats.correct, stats.wrong);
            lesson_names.insert(detail.lesson_name.clone());
        }

        rows.push(BranchNetRow {
            exam_id: result.exam_id,
            exam_name: result.exam.name.clone(),
            exam_type: result.exam.exam_type.clone(),
            date: result.exam.date,
            lessons,
        });
    }

    MultiExamBranchTable {
        rows,
        lesson_names: lesson_names.into_iter().collect(),
    }
}

/// Score and net series over the given results, re-sorted by exam date.
pub fn student_progress(student_id: &str, results: &[ExamResultRecord]) -> ProgressResponse {
    let mut exams: Vec<ProgressPoint> = results
        .iter()
        .map(|result| ProgressPoint {
            exam_id: result.exam_id,
            exam_name: result.exam.name.clone(),
            exam_type: result.exam.exam_type.clone(),
            date: result.exam.date,
            score: result.score,
            total_net: result.total_net,
        })
        .collect();
    exams.sort_by(|a, b| a.date.cmp(&b.date));

    let (average_score, average_net) = if exams.is_empty() {
        (0.0, 0.0)
    } else {
        let count = exams.len() as f64;
        (
            exams.iter().map(|e| e.score).sum::<f64>() / count,
            exams.iter().map(|e| e.total_net).sum::<f64>() / count,
        )
    };

    ProgressResponse {
        student_id: student_id.to_string(),
        exams,
        average_score,
        average_net,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;

    #[test]
    fn folds_topics_into_lessons_per_exam() {
        let results = vec![
            result(
                1,
                1,
                300.0,
                vec![
                    lesson(
                        "Matematik",
                        vec![topic("Olasılık", 10, 6, 4, 0), topic("Problemler", 10, 5, 3, 2)],
                    ),
                    lesson("Türkçe", vec![topic("Paragraf", 20, 15, 4, 1)]),
                ],
            ),
            result(
                2,
                2,
                320.0,
                vec![lesson("Fen Bilimleri", vec![topic("DNA ve Genetik", 8, 4, 4, 0)])],
            ),
        ];

        let table = branch_table(&results);

        assert_eq!(table.rows.len(), 2);
        let math = table.rows[0].lesson("Matematik").unwrap();
        assert_eq!(math.question_count, 20);
        assert_eq!(math.correct, 11);
        assert_eq!(math.wrong, 7);
        assert_eq!(math.empty, 2);
        assert_eq!(math.net, 11.0 - 7.0 * 0.25);
        assert!(table.rows[1].lesson("Matematik").is_none());
        assert_eq!(
            table.lesson_names,
            vec!["Fen Bilimleri", "Matematik", "Türkçe"]
        );
    }

    #[test]
    fn repeated_lesson_details_merge() {
        let results = vec![result(
            1,
            1,
            300.0,
            vec![
                lesson("Matematik", vec![topic("Olasılık", 10, 6, 4, 0)]),
                lesson("Matematik", vec![topic("Geometri", 10, 2, 8, 0)]),
            ],
        )];

        let table = branch_table(&results);
        assert_eq!(table.rows[0].lessons.len(), 1);
        assert_eq!(table.rows[0].lessons[0].wrong, 12);
        assert_eq!(table.rows[0].lessons[0].net, 5.0);
    }

    #[test]
    fn lessons_without_topics_report_zero_counts() {
        let results = vec![result(1, 1, 300.0, vec![bare_lesson("Tarih", 5, 3, 2)])];
        let table = branch_table(&results);
        let history = table.rows[0].lesson("Tarih").unwrap();
        assert_eq!(history.question_count, 0);
        assert_eq!(history.net, 0.0);
        assert_eq!(table.lesson_names, vec!["Tarih"]);
    }

    #[test]
    fn progress_is_sorted_by_date_with_averages() {
        let results = vec![
            result(1, 5, 400.0, vec![bare_lesson("Matematik", 30, 4, 6)]),
            result(2, 2, 300.0, vec![bare_lesson("Matematik", 20, 8, 12)]),
        ];

        let progress = student_progress("stu-1", &results);

        assert_eq!(progress.exams[0].exam_id, 2);
        assert_eq!(progress.exams[1].exam_id, 5);
        assert_eq!(progress.average_score, 350.0);
        assert_eq!(progress.average_net, (29.0 + 18.0) / 2.0);
    }

    #[test]
    fn empty_history_averages_to_zero() {
        let progress = student_progress("stu-1", &[]);
        assert!(progress.exams.is_empty());
        assert_eq!(progress.average_score, 0.0);
        assert_eq!(progress.average_net, 0.0);
    }
}
