use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("exam result {0} not found")]
    ExamResultNotFound(i64),

    #[error("no exam result for student {student_id} in exam {exam_id}")]
    StudentExamNotFound { student_id: String, exam_id: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Returns `true` when the requested exam result is absent; callers map this to a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AnalysisError::ExamResultNotFound(_) | AnalysisError::StudentExamNotFound { .. }
        )
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_results_count_as_not_found() {
        assert!(AnalysisError::ExamResultNotFound(7).is_not_found());
        assert!(AnalysisError::StudentExamNotFound {
            student_id: "s-1".to_string(),
            exam_id: 3,
        }
        .is_not_found());
        assert!(!AnalysisError::Config("bad table".to_string()).is_not_found());
    }

    #[test]
    fn messages_name_the_missing_record() {
        let err = AnalysisError::StudentExamNotFound {
            student_id: "s-1".to_string(),
            exam_id: 3,
        };
        assert_eq!(err.to_string(), "no exam result for student s-1 in exam 3");
    }
}
