//! Consumer paths: fetch through an [`ExamStore`], then hand the records to the engine.
//!
//! Nothing here is cached; every call rebuilds its view from the store.

use tracing::{debug, info};

use crate::aggregate;
use crate::config::EngineConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::groups;
use crate::models::{
    CalibrationEntry, ExamAnalysis, ExamInsight, ExamResultRecord, MultiExamBranchTable,
    PriorityAnalysis, PriorityLevel, ProgressResponse, RankComparison, TopicGroupAnalysis,
    WhatIfProjection, WhatIfSet,
};
use crate::priority::{self, PriorityStrategy};
use crate::rank::CalibrationSet;
use crate::store::{ExamStore, ResultOrder};
use crate::trend;
use crate::whatif;

pub const DEFAULT_TREND_LIMIT: usize = 10;
pub const DEFAULT_PROGRESS_LIMIT: usize = 5;

/// Single-exam analysis: aggregated topics ranked with the tertile strategy.
pub fn exam_analysis_from(result: &ExamResultRecord) -> ExamAnalysis {
    let (mut topics, has_detailed_analysis) = aggregate::topic_performances(result);
    let priority_counts = PriorityStrategy::Tertile.assign(&mut topics);

    ExamAnalysis {
        exam_id: result.exam_id,
        exam_name: result.exam.name.clone(),
        exam_type: result.exam.exam_type.clone(),
        date: result.exam.date,
        total_net: result.total_net,
        score: result.score,
        percentile: result.percentile,
        topic_priorities: topics,
        priority_counts,
        has_detailed_analysis,
    }
}

pub struct Analyzer<'a> {
    store: &'a dyn ExamStore,
    config: &'a EngineConfig,
}

impl<'a> Analyzer<'a> {
    pub fn new(store: &'a dyn ExamStore, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    async fn student_exam(&self, student_id: &str, exam_id: i64) -> AnalysisResult<ExamResultRecord> {
        self.store
            .exam_result_for_student(student_id, exam_id)
            .await?
            .ok_or_else(|| AnalysisError::StudentExamNotFound {
                student_id: student_id.to_string(),
                exam_id,
            })
    }

    async fn result_by_id(&self, result_id: i64) -> AnalysisResult<ExamResultRecord> {
        self.store
            .exam_result(result_id)
            .await?
            .ok_or(AnalysisError::ExamResultNotFound(result_id))
    }

    pub async fn exam_analysis(&self, student_id: &str, exam_id: i64) -> AnalysisResult<ExamAnalysis> {
        let result = self.student_exam(student_id, exam_id).await?;
        let analysis = exam_analysis_from(&result);
        debug!(
            student_id,
            exam_id,
            strategy = PriorityStrategy::Tertile.name(),
            topics = analysis.topic_priorities.len(),
            detailed = analysis.has_detailed_analysis,
            "built exam analysis"
        );
        Ok(analysis)
    }

    /// Threshold priorities for a stored result; `exam_type` defaults to the exam's own type.
    pub async fn priority_analysis(
        &self,
        result_id: i64,
        exam_type: Option<&str>,
    ) -> AnalysisResult<PriorityAnalysis> {
        let result = self.result_by_id(result_id).await?;
        let exam_type = exam_type.unwrap_or(result.exam.exam_type.as_str());
        let coefficients = self.config.coefficients.for_exam_type(exam_type);
        let (topics, _) = aggregate::topic_performances(&result);
        Ok(priority::analyze_priority(topics, &coefficients))
    }

    pub async fn calibration_set(&self, exam_type: &str) -> AnalysisResult<CalibrationSet> {
        let years = self.config.years;
        let (current, previous) = tokio::try_join!(
            self.store.calibration(years.current, exam_type),
            self.store.calibration(years.previous, exam_type),
        )?;
        if current.is_empty() {
            info!(year = years.current, exam_type, "no calibration rows, ranks report 0");
        }
        Ok(CalibrationSet {
            current_year: years.current,
            current,
            previous_year: years.previous,
            previous,
        })
    }

    /// Calibration listing; unset filters match every year or exam type.
    pub async fn calibration_rows(
        &self,
        year: Option<i32>,
        exam_type: Option<&str>,
    ) -> AnalysisResult<Vec<CalibrationEntry>> {
        self.store.calibration_listing(year, exam_type).await
    }

    pub async fn rank_comparison(&self, score: f64, exam_type: &str) -> AnalysisResult<RankComparison> {
        let calibration = self.calibration_set(exam_type).await?;
        Ok(calibration.compare(score))
    }

    pub async fn what_if(
        &self,
        result_id: i64,
        target: PriorityLevel,
        exam_type: Option<&str>,
    ) -> AnalysisResult<WhatIfProjection> {
        let result = self.result_by_id(result_id).await?;
        let exam_type = exam_type.unwrap_or(result.exam.exam_type.as_str());
        let coefficients = self.config.coefficients.for_exam_type(exam_type);
        let calibration = self.calibration_set(exam_type).await?;
        let projection = whatif::project(&result, &coefficients, target, &calibration);
        debug!(
            result_id,
            level = %target,
            affected = projection.affected_topics.len(),
            "projected what-if score"
        );
        Ok(projection)
    }

    /// Threshold priorities, rank comparison and all three what-if projections in one view.
    ///
    /// Only stored topic records are ranked, the same records the projections read, so a
    /// result without a topic breakdown yields empty tiers.
    pub async fn insight(&self, student_id: &str, exam_id: i64) -> AnalysisResult<ExamInsight> {
        let result = self.student_exam(student_id, exam_id).await?;
        let exam_type = result.exam.exam_type.as_str();
        let coefficients = self.config.coefficients.for_exam_type(exam_type);
        let calibration = self.calibration_set(exam_type).await?;

        let topics = aggregate::recorded_topic_performances(&result);
        let projection =
            |level: PriorityLevel| whatif::project(&result, &coefficients, level, &calibration);

        Ok(ExamInsight {
            exam_result_id: result.id,
            exam_name: result.exam.name.clone(),
            exam_type: exam_type.to_string(),
            score: result.score,
            priority_analysis: priority::analyze_priority(topics, &coefficients),
            rank_comparison: calibration.compare(result.score),
            what_if_projections: WhatIfSet {
                priority1: projection(PriorityLevel::One),
                priority2: projection(PriorityLevel::Two),
                priority3: projection(PriorityLevel::Three),
            },
        })
    }

    pub async fn branch_table(&self, student_id: &str, limit: usize) -> AnalysisResult<MultiExamBranchTable> {
        let results = self
            .store
            .student_results(student_id, limit, ResultOrder::OldestFirst)
            .await?;
        Ok(trend::branch_table(&results))
    }

    pub async fn topic_groups(&self, student_id: &str, exam_id: i64) -> AnalysisResult<TopicGroupAnalysis> {
        let analysis = self.exam_analysis(student_id, exam_id).await?;
        Ok(groups::analyze_groups(&analysis))
    }

    pub async fn progress(&self, student_id: &str, limit: usize) -> AnalysisResult<ProgressResponse> {
        let results = self
            .store
            .student_results(student_id, limit, ResultOrder::NewestFirst)
            .await?;
        Ok(trend::student_progress(student_id, &results))
    }
}
