use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

pub const DEFAULT_LESSON_KEY: &str = "default";
pub const FALLBACK_COEFFICIENT: f64 = 1.0;

/// Scoring weight per lesson for one exam type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonCoefficients(HashMap<String, f64>);

impl LessonCoefficients {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Lesson entry, then the `"default"` entry, then `1.0`.
    pub fn coefficient(&self, lesson_name: &str) -> f64 {
        self.0
            .get(lesson_name)
            .or_else(|| self.0.get(DEFAULT_LESSON_KEY))
            .copied()
            .unwrap_or(FALLBACK_COEFFICIENT)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoefficientTable(HashMap<String, LessonCoefficients>);

impl CoefficientTable {
    pub fn builtin() -> Self {
        let mut table = HashMap::new();
        table.insert(
            "TYT".to_string(),
            LessonCoefficients::new([
                ("Türkçe", 3.3),
                ("Matematik", 3.3),
                ("Fen Bilimleri", 3.3),
                ("Sosyal Bilimler", 3.3),
            ]),
        );
        table.insert(
            "AYT_SAY".to_string(),
            LessonCoefficients::new([
                ("Matematik", 3.0),
                ("Fizik", 2.5),
                ("Kimya", 2.5),
                ("Biyoloji", 2.5),
            ]),
        );
        table.insert(
            "AYT_SOZ".to_string(),
            LessonCoefficients::new([
                ("Türk Dili ve Edebiyatı", 3.0),
                ("Tarih", 3.0),
                ("Coğrafya", 3.0),
                ("Felsefe", 3.0),
            ]),
        );
        table.insert(
            "AYT_EA".to_string(),
            LessonCoefficients::new([
                ("Matematik", 2.5),
                ("Türk Dili ve Edebiyatı", 2.5),
                ("Tarih", 2.5),
                ("Coğrafya", 2.5),
            ]),
        );
        table.insert(
            "LGS".to_string(),
            LessonCoefficients::new([
                ("Türkçe", 1.0),
                ("Matematik", 1.0),
                ("Fen Bilimleri", 1.0),
                ("İnkılap Tarihi", 1.0),
                ("Din Kültürü", 1.0),
                ("İngilizce", 1.0),
            ]),
        );
        table.insert(
            "ARA_SINIF".to_string(),
            LessonCoefficients::new([(DEFAULT_LESSON_KEY, 1.0)]),
        );
        Self(table)
    }

    pub fn from_json_path(path: &Path) -> AnalysisResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let table: CoefficientTable = serde_json::from_str(&raw)?;
        if table.0.is_empty() {
            return Err(AnalysisError::Config(format!(
                "coefficient table {} has no exam types",
                path.display()
            )));
        }
        Ok(table)
    }

    /// Unknown exam types get an empty table, so every lesson falls back to `1.0`.
    pub fn for_exam_type(&self, exam_type: &str) -> LessonCoefficients {
        self.0.get(exam_type).cloned().unwrap_or_default()
    }
}

impl Default for CoefficientTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Which calibration years a rank comparison looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankYears {
    pub current: i32,
    pub previous: i32,
}

impl Default for RankYears {
    fn default() -> Self {
        Self {
            current: 2025,
            previous: 2024,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub coefficients: CoefficientTable,
    pub years: RankYears,
}

impl EngineConfig {
    pub fn load(
        coefficients_path: Option<&Path>,
        year: Option<i32>,
        previous_year: Option<i32>,
    ) -> AnalysisResult<Self> {
        let coefficients = match coefficients_path {
            Some(path) => CoefficientTable::from_json_path(path)?,
            None => CoefficientTable::builtin(),
        };
        let defaults = RankYears::default();
        let current = year.unwrap_or(defaults.current);
        let years = RankYears {
            current,
            previous: previous_year.unwrap_or(current - 1),
        };
        Ok(Self {
            coefficients,
            years,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lesson_lookup_falls_back_to_default_then_one() {
        let tyt = CoefficientTable::builtin().for_exam_type("TYT");
        assert_eq!(tyt.coefficient("Matematik"), 3.3);
        assert_eq!(tyt.coefficient("Resim"), 1.0);

        let ara = CoefficientTable::builtin().for_exam_type("ARA_SINIF");
        assert_eq!(ara.coefficient("Matematik"), 1.0);

        let custom = LessonCoefficients::new([("default", 2.0), ("Fizik", 4.0)]);
        assert_eq!(custom.coefficient("Fizik"), 4.0);
        assert_eq!(custom.coefficient("Kimya"), 2.0);
    }

    #[test]
    fn unknown_exam_type_is_empty() {
        let table = CoefficientTable::builtin().for_exam_type("DENEME");
        assert!(table.is_empty());
        assert_eq!(table.coefficient("Matematik"), FALLBACK_COEFFICIENT);
    }

    #[test]
    fn loads_table_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"TYT": {{"Matematik": 4.0, "default": 2.0}}}}"#).unwrap();

        let table = CoefficientTable::from_json_path(file.path()).unwrap();
        let tyt = table.for_exam_type("TYT");
        assert_eq!(tyt.coefficient("Matematik"), 4.0);
        assert_eq!(tyt.coefficient("Türkçe"), 2.0);
        assert!(table.for_exam_type("LGS").is_empty());
    }

    #[test]
    fn rejects_empty_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        let err = CoefficientTable::from_json_path(file.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn previous_year_follows_current_year() {
        let config = EngineConfig::load(None, Some(2026), None).unwrap();
        assert_eq!(config.years, RankYears { current: 2026, previous: 2025 });

        let config = EngineConfig::load(None, None, None).unwrap();
        assert_eq!(config.years, RankYears::default());
    }
}
