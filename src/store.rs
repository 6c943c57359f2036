use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AnalysisResult;
use crate::models::{CalibrationEntry, ExamResultRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOrder {
    OldestFirst,
    NewestFirst,
}

/// Read-only access to ingested exam data.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn exam_result(&self, result_id: i64) -> AnalysisResult<Option<ExamResultRecord>>;

    async fn exam_result_for_student(
        &self,
        student_id: &str,
        exam_id: i64,
    ) -> AnalysisResult<Option<ExamResultRecord>>;

    /// Up to `limit` results, ordered by creation time.
    async fn student_results(
        &self,
        student_id: &str,
        limit: usize,
        order: ResultOrder,
    ) -> AnalysisResult<Vec<ExamResultRecord>>;

    /// Calibration rows ascending by `score_range_min`.
    async fn calibration(&self, year: i32, exam_type: &str)
        -> AnalysisResult<Vec<CalibrationEntry>>;

    /// Calibration rows matching whichever filters are set, newest year first, then
    /// ascending by `score_range_min`.
    async fn calibration_listing(
        &self,
        year: Option<i32>,
        exam_type: Option<&str>,
    ) -> AnalysisResult<Vec<CalibrationEntry>>;
}

/// Store backed by a JSON document, for offline runs and tests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStore {
    #[serde(default)]
    pub exam_results: Vec<ExamResultRecord>,
    #[serde(default)]
    pub calibration: Vec<CalibrationEntry>,
}

impl MemoryStore {
    pub fn new(exam_results: Vec<ExamResultRecord>, calibration: Vec<CalibrationEntry>) -> Self {
        Self {
            exam_results,
            calibration,
        }
    }

    pub fn from_json_path(path: &Path) -> AnalysisResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn exam_result(&self, result_id: i64) -> AnalysisResult<Option<ExamResultRecord>> {
        Ok(self.exam_results.iter().find(|r| r.id == result_id).cloned())
    }

    async fn exam_result_for_student(
        &self,
        student_id: &str,
        exam_id: i64,
    ) -> AnalysisResult<Option<ExamResultRecord>> {
        Ok(self
            .exam_results
            .iter()
            .find(|r| r.student_id == student_id && r.exam_id == exam_id)
            .cloned())
    }

    async fn student_results(
        &self,
        student_id: &str,
        limit: usize,
        order: ResultOrder,
    ) -> AnalysisResult<Vec<ExamResultRecord>> {
        let mut results: Vec<ExamResultRecord> = self
            .exam_results
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if order == ResultOrder::NewestFirst {
            results.reverse();
        }
        results.truncate(limit);
        Ok(results)
    }

    async fn calibration(
        &self,
        year: i32,
        exam_type: &str,
    ) -> AnalysisResult<Vec<CalibrationEntry>> {
        let mut rows: Vec<CalibrationEntry> = self
            .calibration
            .iter()
            .filter(|c| c.year == year && c.exam_type == exam_type)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.score_range_min
                .partial_cmp(&b.score_range_min)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows)
    }

    async fn calibration_listing(
        &self,
        year: Option<i32>,
        exam_type: Option<&str>,
    ) -> AnalysisResult<Vec<CalibrationEntry>> {
        let mut rows: Vec<CalibrationEntry> = self
            .calibration
            .iter()
            .filter(|c| year.map_or(true, |y| c.year == y))
            .filter(|c| exam_type.map_or(true, |t| c.exam_type == t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.year.cmp(&a.year).then_with(|| {
                a.score_range_min
                    .partial_cmp(&b.score_range_min)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        Ok(rows)
    }
}
