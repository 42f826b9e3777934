// src/quiz/scoring.rs

use crate::models::flash::Flash;

/// Scores below this get a warning instead of a congratulation.
pub const PASS_THRESHOLD: f64 = 50.0;

/// Question `order` ranges the results page splits scores into.
pub const SECTION_RANGES: [(i64, i64); 3] = [(1, 30), (31, 65), (66, 110)];

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Final score of an attempt: sum of the chosen answers' scores, rounded to
/// 2 decimal places.
pub fn total_score<I>(scores: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    round2(scores.into_iter().sum())
}

/// Progress percentage shown on the question page. Callers guarantee
/// `total > 0`: quizzes without questions never reach the quiz flow.
pub fn progress_percent(answered: i64, total: i64) -> i64 {
    ((answered as f64 / total as f64) * 100.0).round() as i64
}

/// Sums answer scores per section, given (question order, answer score)
/// pairs for one quiz. Orders outside every range are not counted.
pub fn section_scores(order_scores: &[(i64, f64)]) -> Vec<f64> {
    SECTION_RANGES
        .iter()
        .map(|&(start, end)| {
            order_scores
                .iter()
                .filter(|(order, _)| (start..=end).contains(order))
                .map(|(_, score)| score)
                .sum()
        })
        .collect()
}

/// Flash shown after finalization, keyed on the pass threshold.
pub fn result_flash(quiz_name: &str, score: f64) -> Flash {
    if score < PASS_THRESHOLD {
        Flash::warning(format!("Your score is {score}. Keep practicing!"))
    } else {
        Flash::success(format!(
            "Congratulations! You completed the quiz {quiz_name} with a score of {score}."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::flash::FlashLevel;

    #[test]
    fn total_is_rounded_sum() {
        assert_eq!(total_score([10.0, 20.5, 3.0]), 33.5);
        // 0.1 + 0.2 leaves float residue without the rounding step.
        assert_eq!(total_score([0.1, 0.2]), 0.3);
        assert_eq!(total_score([1.005, 2.005]), 3.01);
    }

    #[test]
    fn empty_attempt_scores_zero() {
        assert_eq!(total_score([]), 0.0);
    }

    #[test]
    fn progress_is_rounded_percentage() {
        assert_eq!(progress_percent(4, 10), 40);
        assert_eq!(progress_percent(0, 10), 0);
        assert_eq!(progress_percent(10, 10), 100);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
    }

    #[test]
    fn sections_partition_by_order_ranges() {
        let pairs = [(1, 5.0), (30, 5.0), (31, 2.0), (65, 2.0), (66, 1.0), (110, 1.0)];
        assert_eq!(section_scores(&pairs), vec![10.0, 4.0, 2.0]);
    }

    #[test]
    fn orders_outside_ranges_are_dropped() {
        let pairs = [(0, 9.0), (111, 9.0), (15, 1.0)];
        assert_eq!(section_scores(&pairs), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn result_flash_uses_threshold() {
        assert_eq!(result_flash("Algebra", 49.99).level, FlashLevel::Warning);
        assert_eq!(result_flash("Algebra", 50.0).level, FlashLevel::Success);
        let flash = result_flash("Algebra", 85.5);
        assert!(flash.message.contains("Algebra"));
        assert!(flash.message.contains("85.5"));
    }
}
