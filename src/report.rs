use std::fmt::Write;

use crate::models::{
    ExamAnalysis, MultiExamBranchTable, PriorityLevel, ProgressResponse, TopicGroupAnalysis,
};

const NO_DATA: &str = "-";

fn level_label(level: PriorityLevel) -> &'static str {
    match level {
        PriorityLevel::One => "1st priority",
        PriorityLevel::Two => "2nd priority",
        PriorityLevel::Three => "3rd priority",
    }
}

pub fn build_report(
    student_id: &str,
    analysis: &ExamAnalysis,
    groups: &TopicGroupAnalysis,
    trend: &MultiExamBranchTable,
    progress: &ProgressResponse,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Exam Study Report");
    let _ = writeln!(
        output,
        "Generated for student {} on {} ({}, {})",
        student_id, analysis.exam_name, analysis.exam_type, analysis.date
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Score {:.2}, net {:.2}, percentile {:.1}",
        analysis.score, analysis.total_net, analysis.percentile
    );
    if !analysis.has_detailed_analysis {
        let _ = writeln!(
            output,
            "_No topic breakdown recorded; lessons are ranked as a whole._"
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Study Priorities");

    if analysis.topic_priorities.is_empty() {
        let _ = writeln!(output, "No topics recorded for this exam.");
    } else {
        let counts = analysis.priority_counts;
        let _ = writeln!(
            output,
            "{} first, {} second, {} third priority topics.",
            counts.one, counts.two, counts.three
        );
        let mut topics: Vec<_> = analysis.topic_priorities.iter().collect();
        topics.sort_by(|a, b| {
            a.priority_level
                .cmp(&b.priority_level)
                .then_with(|| a.lesson_name.cmp(&b.lesson_name))
        });
        for topic in topics {
            let _ = writeln!(
                output,
                "- [{}] {} / {}: {} correct, {} wrong, {} empty (net {:.2})",
                level_label(topic.priority_level),
                topic.lesson_name,
                topic.topic_name,
                topic.correct,
                topic.wrong,
                topic.empty,
                topic.net
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Topic Groups");

    if groups.rows.is_empty() {
        let _ = writeln!(output, "No topic groups for this exam.");
    } else {
        let _ = writeln!(output, "| Lesson | Group | Questions | Success % | Lost |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for row in &groups.rows {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {:.1} | {} |",
                row.lesson_name, row.group_name, row.question_count, row.success_percent, row.score_loss
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Net Trend");

    if trend.rows.is_empty() {
        let _ = writeln!(output, "No exam history for this student.");
    } else {
        let _ = writeln!(output, "| Exam | Date | {} |", trend.lesson_names.join(" | "));
        let _ = writeln!(
            output,
            "|---|---|{}",
            "---|".repeat(trend.lesson_names.len())
        );
        for row in &trend.rows {
            let cells: Vec<String> = trend
                .lesson_names
                .iter()
                .map(|name| match row.lesson(name) {
                    Some(stats) => format!("{:.2}", stats.net),
                    None => NO_DATA.to_string(),
                })
                .collect();
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                row.exam_name,
                row.date,
                cells.join(" | ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Progress");

    if progress.exams.is_empty() {
        let _ = writeln!(output, "No exams recorded.");
    } else {
        let _ = writeln!(
            output,
            "Average score {:.2} and net {:.2} across the last {} exams.",
            progress.average_score,
            progress.average_net,
            progress.exams.len()
        );
        for exam in &progress.exams {
            let _ = writeln!(
                output,
                "- {} ({}): score {:.2}, net {:.2}",
                exam.exam_name, exam.date, exam.score, exam.total_net
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::groups::analyze_groups;
    use crate::service::exam_analysis_from;
    use crate::trend::{branch_table, student_progress};

    #[test]
    fn renders_missing_lessons_as_no_data() {
        let first = result(
            1,
            1,
            300.0,
            vec![
                lesson("Matematik", vec![topic("Olasılık", 10, 6, 4, 0)]),
                lesson("Türkçe", vec![topic("Paragraf", 10, 8, 2, 0)]),
            ],
        );
        let second = result(
            2,
            2,
            320.0,
            vec![lesson("Matematik", vec![topic("Olasılık", 10, 8, 2, 0)])],
        );
        let analysis = exam_analysis_from(&first);
        let groups = analyze_groups(&analysis);
        let history = [first, second];
        let trend = branch_table(&history);
        let progress = student_progress("stu-1", &history);

        let report = build_report("stu-1", &analysis, &groups, &trend, &progress);

        assert!(report.contains("# Exam Study Report"));
        assert!(report.contains("| Exam | Date | Matematik | Türkçe |"));
        assert!(report.contains("| Deneme 2 | 2025-01-03 | 7.50 | - |"));
        assert!(report.contains("- [1st priority] Matematik / Olasılık"));
        assert!(report.contains("Average score 310.00"));
    }

    #[test]
    fn flags_lesson_level_fallback() {
        let record = result(1, 1, 250.0, vec![bare_lesson("Tarih", 5, 3, 2)]);
        let analysis = exam_analysis_from(&record);
        let groups = analyze_groups(&analysis);
        let trend = branch_table(&[]);
        let progress = student_progress("stu-1", &[]);

        let report = build_report("stu-1", &analysis, &groups, &trend, &progress);

        assert!(report.contains("No topic breakdown recorded"));
        assert!(report.contains("No exam history for this student."));
        assert!(report.contains("No exams recorded."));
    }
}
