use super::prompt::WeightedAnswer;
use crate::evaluation::domain::{Answer, EvaluationResult, SemaphoreState};

const RED_MIN_RAW: u32 = 50;
const RED_MIN_HIGH_RATIO: f64 = 0.60;
const YELLOW_MIN_RAW: u32 = 35;
const YELLOW_MIN_HIGH_RATIO: f64 = 0.40;
const SOFT_YELLOW_MIN_RAW: u32 = 20;
const SOFT_YELLOW_MIN_HIGH_RATIO: f64 = 0.25;

/// Aggregates the deterministic classifier works from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackSignals {
    /// Σ value × weight.
    pub raw_score: u32,
    /// Share of answers at 4 or 5; 0 when there are no answers.
    pub high_ratio: f64,
    pub answered: usize,
}

impl FallbackSignals {
    pub(crate) fn collect(items: &[WeightedAnswer<'_>]) -> Self {
        let raw_score = items
            .iter()
            .map(WeightedAnswer::weighted_score)
            .fold(0u32, u32::saturating_add);
        let high = items
            .iter()
            .filter(|item| item.value >= Answer::HIGH_VALUE)
            .count();
        let high_ratio = if items.is_empty() {
            0.0
        } else {
            high as f64 / items.len() as f64
        };

        Self {
            raw_score,
            high_ratio,
            answered: items.len(),
        }
    }

    pub fn state(&self) -> SemaphoreState {
        if self.raw_score > RED_MIN_RAW && self.high_ratio > RED_MIN_HIGH_RATIO {
            SemaphoreState::Red
        } else if self.raw_score > YELLOW_MIN_RAW || self.high_ratio > YELLOW_MIN_HIGH_RATIO {
            // intensity or a wide spread of severe answers
            SemaphoreState::Yellow
        } else if self.raw_score > SOFT_YELLOW_MIN_RAW
            || self.high_ratio > SOFT_YELLOW_MIN_HIGH_RATIO
        {
            // milder indicators still warrant follow-up
            SemaphoreState::Yellow
        } else {
            SemaphoreState::Green
        }
    }

    /// `min(raw_score × 2, 100)`.
    pub fn score(&self) -> u8 {
        self.raw_score.saturating_mul(2).min(100) as u8
    }
}

pub(crate) fn evaluate(items: &[WeightedAnswer<'_>]) -> EvaluationResult {
    let signals = FallbackSignals::collect(items);

    EvaluationResult {
        state: signals.state(),
        score: signals.score(),
        observations: format!(
            "Assessment produced by the backup scoring system from {} answers. \
             Weighted score: {}, high-severity answers: {:.1}%.",
            signals.answered,
            signals.raw_score,
            signals.high_ratio * 100.0
        ),
        recommendations: [
            "Keep healthy sleep and exercise routines".to_string(),
            "Lean on family and close friends for support".to_string(),
            "Consider talking to a mental-health professional if the discomfort persists"
                .to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(u32, u8)]) -> Vec<WeightedAnswer<'static>> {
        pairs
            .iter()
            .map(|&(weight, value)| WeightedAnswer {
                text: "item",
                weight,
                value,
            })
            .collect()
    }

    #[test]
    fn empty_answers_are_green_without_dividing_by_zero() {
        let signals = FallbackSignals::collect(&[]);
        assert_eq!(signals.raw_score, 0);
        assert_eq!(signals.high_ratio, 0.0);
        assert_eq!(signals.state(), SemaphoreState::Green);
        assert_eq!(signals.score(), 0);
    }

    #[test]
    fn red_requires_intensity_and_spread() {
        // raw 70, ratio 1.0
        let signals = FallbackSignals::collect(&items(&[(5, 5), (3, 5), (3, 5), (3, 5)]));
        assert_eq!(signals.raw_score, 70);
        assert_eq!(signals.state(), SemaphoreState::Red);

        // raw 60, ratio 0.5: intensity alone is yellow
        let signals = FallbackSignals::collect(&items(&[(10, 5), (10, 1)]));
        assert_eq!(signals.raw_score, 60);
        assert_eq!(signals.state(), SemaphoreState::Yellow);
    }

    #[test]
    fn each_yellow_guard_triggers_independently() {
        // raw 36 with no severe answers
        let signals = FallbackSignals::collect(&items(&[(12, 3)]));
        assert_eq!(signals.high_ratio, 0.0);
        assert_eq!(signals.state(), SemaphoreState::Yellow);

        // ratio 0.5 with a small raw score
        let signals = FallbackSignals::collect(&items(&[(1, 4), (1, 1)]));
        assert_eq!(signals.raw_score, 5);
        assert_eq!(signals.state(), SemaphoreState::Yellow);

        // raw 21 only
        let signals = FallbackSignals::collect(&items(&[(7, 3)]));
        assert_eq!(signals.state(), SemaphoreState::Yellow);

        // ratio 0.3 only
        let mut pairs = vec![(1, 1); 7];
        pairs.extend([(1, 4); 3]);
        let signals = FallbackSignals::collect(&items(&pairs));
        assert_eq!(signals.raw_score, 19);
        assert!((signals.high_ratio - 0.3).abs() < f64::EPSILON);
        assert_eq!(signals.state(), SemaphoreState::Yellow);
    }

    #[test]
    fn boundaries_are_exclusive() {
        // raw exactly 20, ratio exactly 0.25
        let signals = FallbackSignals::collect(&items(&[(4, 4), (2, 1), (1, 1), (1, 1)]));
        assert_eq!(signals.raw_score, 20);
        assert_eq!(signals.high_ratio, 0.25);
        assert_eq!(signals.state(), SemaphoreState::Green);
    }

    #[test]
    fn score_doubles_and_caps_at_one_hundred() {
        assert_eq!(FallbackSignals::collect(&items(&[(3, 5)])).score(), 30);
        assert_eq!(FallbackSignals::collect(&items(&[(5, 5), (5, 5)])).score(), 100);
    }

    #[test]
    fn oversized_weights_saturate_instead_of_wrapping() {
        let signals = FallbackSignals::collect(&items(&[(800_000_000, 5), (800_000_000, 5)]));
        assert_eq!(signals.raw_score, u32::MAX);
        assert_eq!(signals.state(), SemaphoreState::Red);
        assert_eq!(signals.score(), 100);
    }

    #[test]
    fn result_reports_signals_and_fixed_recommendations() {
        let result = evaluate(&items(&[(3, 5), (2, 5)]));
        assert!(result.observations.contains("Weighted score: 25"));
        assert!(result.observations.contains("100.0%"));
        assert!(result.recommendations[0].contains("sleep"));
        assert!(result.recommendations[1].contains("friends"));
        assert!(result.recommendations[2].contains("professional"));
    }
}
