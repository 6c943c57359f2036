//! Priority classification strategies.
//!
//! Two strategies exist side by side and are used by different consumer paths:
//!
//! * [`PriorityStrategy::Threshold`] grades every topic on its own absolute wrong rate;
//!   [`analyze_priority`] weights the damage by the lesson coefficient.
//! * [`PriorityStrategy::Tertile`] ranks the topics of one exam against each other by error
//!   rate and cuts the ranking into thirds, so at least one topic is always ONE.
//!
//! They can disagree on the same data. Keep them separate.

use std::cmp::Ordering;

use crate::config::LessonCoefficients;
use crate::models::{PriorityAnalysis, PriorityCounts, PriorityLevel, TopicPerformance, WeightedTopic};

pub const TIER_ONE_WRONG_RATE: f64 = 0.60;
pub const TIER_TWO_WRONG_RATE: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityStrategy {
    Threshold,
    Tertile,
}

impl PriorityStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            PriorityStrategy::Threshold => "threshold",
            PriorityStrategy::Tertile => "tertile",
        }
    }

    /// Overwrites `priority_level` on every topic and returns the bucket sizes.
    pub fn assign(&self, topics: &mut [TopicPerformance]) -> PriorityCounts {
        match self {
            PriorityStrategy::Threshold => assign_threshold(topics),
            PriorityStrategy::Tertile => assign_tertile(topics),
        }
    }
}

pub fn wrong_rate(topic: &TopicPerformance) -> f64 {
    if topic.total_questions <= 0 {
        return 0.0;
    }
    topic.wrong as f64 / topic.total_questions as f64
}

pub fn threshold_level(wrong_rate: f64) -> PriorityLevel {
    if wrong_rate > TIER_ONE_WRONG_RATE {
        PriorityLevel::One
    } else if wrong_rate >= TIER_TWO_WRONG_RATE {
        PriorityLevel::Two
    } else {
        PriorityLevel::Three
    }
}

fn assign_threshold(topics: &mut [TopicPerformance]) -> PriorityCounts {
    let mut counts = PriorityCounts::default();
    for topic in topics.iter_mut() {
        topic.priority_level = threshold_level(wrong_rate(topic));
        counts.record(topic.priority_level);
    }
    counts
}

/// Index boundaries of the ONE and TWO tiers for `n` ranked topics.
pub fn tertile_cuts(n: usize) -> (usize, usize) {
    let first_cut = (n / 3).max(1);
    let second_cut = (2 * n / 3).max(first_cut + 1);
    (first_cut, second_cut)
}

fn assign_tertile(topics: &mut [TopicPerformance]) -> PriorityCounts {
    let mut counts = PriorityCounts::default();
    if topics.is_empty() {
        return counts;
    }

    // Stable, so topics with equal error ratios keep their input order.
    let mut order: Vec<usize> = (0..topics.len()).collect();
    order.sort_by(|&a, &b| {
        topics[b]
            .error_ratio
            .partial_cmp(&topics[a].error_ratio)
            .unwrap_or(Ordering::Equal)
    });

    let (first_cut, second_cut) = tertile_cuts(topics.len());
    for (rank, index) in order.into_iter().enumerate() {
        let level = if rank < first_cut {
            PriorityLevel::One
        } else if rank < second_cut {
            PriorityLevel::Two
        } else {
            PriorityLevel::Three
        };
        topics[index].priority_level = level;
        counts.record(level);
    }
    counts
}

/// Threshold classification with lost points, each bucket worst offender first.
pub fn analyze_priority(
    mut topics: Vec<TopicPerformance>,
    coefficients: &LessonCoefficients,
) -> PriorityAnalysis {
    PriorityStrategy::Threshold.assign(&mut topics);

    let mut analysis = PriorityAnalysis {
        priority1: Vec::new(),
        priority2: Vec::new(),
        priority3: Vec::new(),
        total_lost_points: 0.0,
    };

    for topic in topics {
        let lost_points = topic.wrong as f64 * coefficients.coefficient(&topic.lesson_name);
        analysis.total_lost_points += lost_points;
        let weighted = WeightedTopic {
            wrong_rate: wrong_rate(&topic),
            lost_points,
            topic,
        };
        match weighted.topic.priority_level {
            PriorityLevel::One => analysis.priority1.push(weighted),
            PriorityLevel::Two => analysis.priority2.push(weighted),
            PriorityLevel::Three => analysis.priority3.push(weighted),
        }
    }

    for bucket in [
        &mut analysis.priority1,
        &mut analysis.priority2,
        &mut analysis.priority3,
    ] {
        bucket.sort_by(|a, b| {
            b.lost_points
                .partial_cmp(&a.lost_points)
                .unwrap_or(Ordering::Equal)
        });
    }

    analysis
}
