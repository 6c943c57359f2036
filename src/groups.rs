use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{ExamAnalysis, TopicGroupAnalysis, TopicGroupRow};

pub const FALLBACK_GROUP: &str = "Genel";

/// Checked in order; the first rule with a matching keyword wins.
const GROUP_RULES: &[(&[&str], &str)] = &[
    (&["paragraf"], "Paragraf"),
    (&["dil bilgisi", "fiilimsi", "yazım", "noktalama"], "Dil Bilgisi"),
    (&["1. dönem", "1.dönem", "1 donem"], "1. Dönem"),
    (&["2. dönem", "2.dönem", "2 donem"], "2. Dönem"),
    (&["mevsimler", "iklim"], "Mevsimler ve İklim"),
    (&["dna", "genetik"], "DNA ve Genetik"),
    (&["çarpanlar", "katlar"], "Çarpanlar ve Katlar"),
    (&["olasılık"], "Olasılık"),
];

/// Lowercase Turkish alphabet, with q/w/x placed where they fall in the Latin one.
const TURKISH_ALPHABET: &str = "abcçdefgğhıijklmnoöpqrsştuüvwxyz";

fn collation_key(text: &str) -> Vec<(u8, u32)> {
    text.chars()
        .map(|c| {
            let lower = match c {
                'I' => 'ı',
                'İ' => 'i',
                _ => c.to_lowercase().next().unwrap_or(c),
            };
            if let Some(pos) = TURKISH_ALPHABET.chars().position(|l| l == lower) {
                (2, pos as u32)
            } else if lower.is_alphabetic() {
                (2, 64 + lower as u32)
            } else if lower.is_numeric() {
                (1, lower as u32)
            } else {
                (0, lower as u32)
            }
        })
        .collect()
}

/// Case-insensitive ordering in Turkish alphabet order (`c < ç < d`, `ı < i`, ...).
/// Falls back to code point order so distinct strings never compare equal.
pub fn turkish_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

pub fn infer_topic_group(lesson_name: &str, topic_name: &str) -> &'static str {
    let combined = format!("{lesson_name} {topic_name}").to_lowercase();
    GROUP_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| combined.contains(k)))
        .map(|(_, group)| *group)
        .unwrap_or(FALLBACK_GROUP)
}

/// Sums an analysed exam's topics per `(lesson, group)`, sorted by lesson then group in
/// Turkish alphabet order.
///
/// `score_loss` is the raw `wrong + empty` count, without lesson coefficients.
pub fn analyze_groups(analysis: &ExamAnalysis) -> TopicGroupAnalysis {
    let mut groups: BTreeMap<(String, String), TopicGroupRow> = BTreeMap::new();

    for topic in &analysis.topic_priorities {
        let group_name = infer_topic_group(&topic.lesson_name, &topic.topic_name);
        let row = groups
            .entry((topic.lesson_name.clone(), group_name.to_string()))
            .or_insert_with(|| TopicGroupRow {
                lesson_name: topic.lesson_name.clone(),
                group_name: group_name.to_string(),
                question_count: 0,
                correct: 0,
                wrong: 0,
                empty: 0,
                success_percent: 0.0,
                score_loss: 0,
            });
        row.question_count += topic.total_questions;
        row.correct += topic.correct;
        row.wrong += topic.wrong;
        row.empty += topic.empty;
    }

    let mut rows: Vec<TopicGroupRow> = groups
        .into_values()
        .map(|mut row| {
            row.success_percent = if row.question_count > 0 {
                row.correct as f64 / row.question_count as f64 * 100.0
            } else {
                0.0
            };
            row.score_loss = row.wrong + row.empty;
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        turkish_cmp(&a.lesson_name, &b.lesson_name)
            .then_with(|| turkish_cmp(&a.group_name, &b.group_name))
    });

    TopicGroupAnalysis {
        exam_id: analysis.exam_id,
        exam_name: analysis.exam_name.clone(),
        exam_type: analysis.exam_type.clone(),
        date: analysis.date,
        rows,
    }
}
