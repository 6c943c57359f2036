use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Remediation tier for a topic. `One` is the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityLevel {
    One,
    Two,
    Three,
}

impl PriorityLevel {
    /// Maps the numeric tier used by callers (1, 2, 3) to a level.
    pub fn from_number(value: u8) -> Option<Self> {
        match value {
            1 => Some(PriorityLevel::One),
            2 => Some(PriorityLevel::Two),
            3 => Some(PriorityLevel::Three),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::One => "ONE",
            PriorityLevel::Two => "TWO",
            PriorityLevel::Three => "THREE",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ONE" | "1" => Ok(PriorityLevel::One),
            "TWO" | "2" => Ok(PriorityLevel::Two),
            "THREE" | "3" => Ok(PriorityLevel::Three),
            other => Err(format!("unknown priority level: {other}")),
        }
    }
}

// ----- records handed over by the persistence layer -----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub exam_type: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRecord {
    pub topic_name: String,
    pub total_question: i32,
    pub correct: i32,
    pub wrong: i32,
    pub empty: i32,
    pub net: f64,
    #[serde(default)]
    pub priority_level: Option<PriorityLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDetail {
    pub lesson_name: String,
    pub correct: i32,
    pub wrong: i32,
    pub empty: i32,
    pub net: f64,
    #[serde(default)]
    pub topic_analyses: Vec<TopicRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResultRecord {
    pub id: i64,
    pub student_id: String,
    pub exam_id: i64,
    pub total_net: f64,
    pub score: f64,
    pub percentile: f64,
    pub created_at: DateTime<Utc>,
    pub exam: ExamInfo,
    #[serde(default)]
    pub details: Vec<LessonDetail>,
}

/// One historical score bucket for a year and exam type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationEntry {
    pub year: i32,
    pub exam_type: String,
    pub score_range_min: f64,
    pub score_range_max: f64,
    pub estimated_rank: i64,
}

// ----- view objects -----

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPerformance {
    pub lesson_name: String,
    pub topic_name: String,
    #[serde(rename = "totalQuestion")]
    pub total_questions: i32,
    pub correct: i32,
    pub wrong: i32,
    pub empty: i32,
    pub net: f64,
    pub priority_level: PriorityLevel,
    #[serde(skip)]
    pub success_ratio: f64,
    #[serde(skip)]
    pub error_ratio: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub one: usize,
    pub two: usize,
    pub three: usize,
}

impl PriorityCounts {
    pub fn record(&mut self, level: PriorityLevel) {
        match level {
            PriorityLevel::One => self.one += 1,
            PriorityLevel::Two => self.two += 1,
            PriorityLevel::Three => self.three += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.one + self.two + self.three
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAnalysis {
    pub exam_id: i64,
    pub exam_name: String,
    pub exam_type: String,
    pub date: NaiveDate,
    pub total_net: f64,
    pub score: f64,
    pub percentile: f64,
    pub topic_priorities: Vec<TopicPerformance>,
    pub priority_counts: PriorityCounts,
    pub has_detailed_analysis: bool,
}

/// A topic as seen by the threshold classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedTopic {
    #[serde(flatten)]
    pub topic: TopicPerformance,
    pub wrong_rate: f64,
    pub lost_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityAnalysis {
    pub priority1: Vec<WeightedTopic>,
    pub priority2: Vec<WeightedTopic>,
    pub priority3: Vec<WeightedTopic>,
    pub total_lost_points: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRank {
    pub year: i32,
    pub rank: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankComparison {
    pub current_year: YearRank,
    pub previous_year: YearRank,
    /// Positive means the rank worsened.
    pub change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfProjection {
    pub current_score: f64,
    pub projected_score: f64,
    pub score_difference: f64,
    pub current_rank: i64,
    pub projected_rank: i64,
    pub rank_improvement: i64,
    pub affected_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfSet {
    pub priority1: WhatIfProjection,
    pub priority2: WhatIfProjection,
    pub priority3: WhatIfProjection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInsight {
    pub exam_result_id: i64,
    pub exam_name: String,
    pub exam_type: String,
    pub score: f64,
    pub priority_analysis: PriorityAnalysis,
    pub rank_comparison: RankComparison,
    pub what_if_projections: WhatIfSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchNetLessonStats {
    pub lesson_name: String,
    pub question_count: i32,
    pub correct: i32,
    pub wrong: i32,
    pub empty: i32,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchNetRow {
    pub exam_id: i64,
    pub exam_name: String,
    pub exam_type: String,
    pub date: NaiveDate,
    pub lessons: Vec<BranchNetLessonStats>,
}

impl BranchNetRow {
    pub fn lesson(&self, lesson_name: &str) -> Option<&BranchNetLessonStats> {
        self.lessons.iter().find(|l| l.lesson_name == lesson_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiExamBranchTable {
    pub rows: Vec<BranchNetRow>,
    /// Column headers for the trend table, sorted.
    pub lesson_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicGroupRow {
    pub lesson_name: String,
    pub group_name: String,
    pub question_count: i32,
    pub correct: i32,
    pub wrong: i32,
    pub empty: i32,
    pub success_percent: f64,
    pub score_loss: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicGroupAnalysis {
    pub exam_id: i64,
    pub exam_name: String,
    pub exam_type: String,
    pub date: NaiveDate,
    pub rows: Vec<TopicGroupRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub exam_id: i64,
    pub exam_name: String,
    pub exam_type: String,
    pub date: NaiveDate,
    pub score: f64,
    pub total_net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub student_id: String,
    pub exams: Vec<ProgressPoint>,
    pub average_score: f64,
    pub average_net: f64,
}
