use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};

use crate::error::AnalysisResult;
use crate::models::{
    CalibrationEntry, ExamInfo, ExamResultRecord, LessonDetail, PriorityLevel, TopicRecord,
};
use crate::store::{ExamStore, ResultOrder};

const RESULT_COLUMNS: &str = "r.id, r.student_id, r.exam_id, r.total_net, r.score, \
     r.percentile, r.created_at, e.name AS exam_name, e.exam_type, e.exam_date \
     FROM exam_analysis.exam_results r \
     JOIN exam_analysis.exams e ON e.id = r.exam_id";

pub async fn init_db(pool: &PgPool) -> AnalysisResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn header(row: &PgRow) -> ExamResultRecord {
        let created_at: DateTime<Utc> = row.get("created_at");
        let exam_date: NaiveDate = row.get("exam_date");
        ExamResultRecord {
            id: row.get("id"),
            student_id: row.get("student_id"),
            exam_id: row.get("exam_id"),
            total_net: row.get("total_net"),
            score: row.get("score"),
            percentile: row.get("percentile"),
            created_at,
            exam: ExamInfo {
                name: row.get("exam_name"),
                exam_type: row.get("exam_type"),
                date: exam_date,
            },
            details: Vec::new(),
        }
    }

    /// Loads lesson details and their topic records for the given results.
    async fn attach_details(&self, results: &mut [ExamResultRecord]) -> AnalysisResult<()> {
        if results.is_empty() {
            return Ok(());
        }
        let result_ids: Vec<i64> = results.iter().map(|r| r.id).collect();

        let detail_rows = sqlx::query(
            r#"
            SELECT id, exam_result_id, lesson_name, correct, wrong, empty, net
            FROM exam_analysis.exam_result_details
            WHERE exam_result_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&result_ids)
        .fetch_all(&self.pool)
        .await?;

        let detail_ids: Vec<i64> = detail_rows.iter().map(|row| row.get("id")).collect();

        let topic_rows = sqlx::query(
            r#"
            SELECT detail_id, topic_name, total_question, correct, wrong, empty, net,
                   priority_level
            FROM exam_analysis.topic_analyses
            WHERE detail_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&detail_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut topics: HashMap<i64, Vec<TopicRecord>> = HashMap::new();
        for row in topic_rows {
            let stored_level: Option<String> = row.get("priority_level");
            let priority_level = match stored_level.as_deref().map(str::parse::<PriorityLevel>) {
                Some(Ok(level)) => Some(level),
                Some(Err(err)) => {
                    warn!("ignoring stored priority level: {err}");
                    None
                }
                None => None,
            };
            topics
                .entry(row.get("detail_id"))
                .or_default()
                .push(TopicRecord {
                    topic_name: row.get("topic_name"),
                    total_question: row.get("total_question"),
                    correct: row.get("correct"),
                    wrong: row.get("wrong"),
                    empty: row.get("empty"),
                    net: row.get("net"),
                    priority_level,
                });
        }

        let mut details: HashMap<i64, Vec<LessonDetail>> = HashMap::new();
        for row in detail_rows {
            let detail_id: i64 = row.get("id");
            details
                .entry(row.get("exam_result_id"))
                .or_default()
                .push(LessonDetail {
                    lesson_name: row.get("lesson_name"),
                    correct: row.get("correct"),
                    wrong: row.get("wrong"),
                    empty: row.get("empty"),
                    net: row.get("net"),
                    topic_analyses: topics.remove(&detail_id).unwrap_or_default(),
                });
        }

        for result in results.iter_mut() {
            result.details = details.remove(&result.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn single(
        &self,
        row: Option<PgRow>,
    ) -> AnalysisResult<Option<ExamResultRecord>> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut results = vec![Self::header(&row)];
        self.attach_details(&mut results).await?;
        Ok(results.pop())
    }
}

#[async_trait]
impl ExamStore for PgStore {
    async fn exam_result(&self, result_id: i64) -> AnalysisResult<Option<ExamResultRecord>> {
        let row = sqlx::query(&format!("SELECT {RESULT_COLUMNS} WHERE r.id = $1"))
            .bind(result_id)
            .fetch_optional(&self.pool)
            .await?;
        self.single(row).await
    }

    async fn exam_result_for_student(
        &self,
        student_id: &str,
        exam_id: i64,
    ) -> AnalysisResult<Option<ExamResultRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RESULT_COLUMNS} WHERE r.student_id = $1 AND r.exam_id = $2"
        ))
        .bind(student_id)
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;
        self.single(row).await
    }

    async fn student_results(
        &self,
        student_id: &str,
        limit: usize,
        order: ResultOrder,
    ) -> AnalysisResult<Vec<ExamResultRecord>> {
        let direction = match order {
            ResultOrder::OldestFirst => "ASC",
            ResultOrder::NewestFirst => "DESC",
        };
        let rows = sqlx::query(&format!(
            "SELECT {RESULT_COLUMNS} WHERE r.student_id = $1 \
             ORDER BY r.created_at {direction}, r.id {direction} LIMIT $2"
        ))
        .bind(student_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut results: Vec<ExamResultRecord> = rows.iter().map(Self::header).collect();
        self.attach_details(&mut results).await?;
        debug!(student_id, count = results.len(), "loaded exam history");
        Ok(results)
    }

    async fn calibration(
        &self,
        year: i32,
        exam_type: &str,
    ) -> AnalysisResult<Vec<CalibrationEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT year, exam_type, score_range_min, score_range_max, estimated_rank
            FROM exam_analysis.ranking_scales
            WHERE year = $1 AND exam_type = $2
            ORDER BY score_range_min ASC
            "#,
        )
        .bind(year)
        .bind(exam_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(calibration_entry).collect())
    }

    async fn calibration_listing(
        &self,
        year: Option<i32>,
        exam_type: Option<&str>,
    ) -> AnalysisResult<Vec<CalibrationEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT year, exam_type, score_range_min, score_range_max, estimated_rank
            FROM exam_analysis.ranking_scales
            WHERE ($1::INT IS NULL OR year = $1)
              AND ($2::TEXT IS NULL OR exam_type = $2)
            ORDER BY year DESC, score_range_min ASC
            "#,
        )
        .bind(year)
        .bind(exam_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(calibration_entry).collect())
    }
}

fn calibration_entry(row: &PgRow) -> CalibrationEntry {
    CalibrationEntry {
        year: row.get("year"),
        exam_type: row.get("exam_type"),
        score_range_min: row.get("score_range_min"),
        score_range_max: row.get("score_range_max"),
        estimated_rank: row.get("estimated_rank"),
    }
}

/// Upserts calibration buckets from a CSV file with a header row
/// `year,exam_type,score_range_min,score_range_max,estimated_rank`.
pub async fn import_calibration_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> AnalysisResult<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        year: i32,
        exam_type: String,
        score_range_min: f64,
        score_range_max: f64,
        estimated_rank: i64,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut written = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        if row.score_range_min > row.score_range_max {
            warn!(
                year = row.year,
                exam_type = %row.exam_type,
                "skipping bucket with min {} above max {}",
                row.score_range_min,
                row.score_range_max
            );
            continue;
        }

        let outcome = sqlx::query(
            r#"
            INSERT INTO exam_analysis.ranking_scales
            (year, exam_type, score_range_min, score_range_max, estimated_rank)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (year, exam_type, score_range_min) DO UPDATE
            SET score_range_max = EXCLUDED.score_range_max,
                estimated_rank = EXCLUDED.estimated_rank
            "#,
        )
        .bind(row.year)
        .bind(&row.exam_type)
        .bind(row.score_range_min)
        .bind(row.score_range_max)
        .bind(row.estimated_rank)
        .execute(pool)
        .await?;

        if outcome.rows_affected() > 0 {
            written += 1;
        }
    }

    info!(written, path = %csv_path.display(), "calibration import finished");
    Ok(written)
}
