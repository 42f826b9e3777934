// src/quiz/navigation.rs

/// Action submitted from the question page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Finish,
    TimeoutFinish,
    Next,
    Skip,
    /// Jump straight to the given question id.
    Goto(i64),
}

impl Action {
    /// Parses the form `action` field. Anything unrecognized (including a
    /// malformed `goto_`) is `None` and leaves the student on the current
    /// question.
    pub fn parse(raw: &str) -> Option<Action> {
        match raw {
            "finish" => Some(Action::Finish),
            "timeout_finish" => Some(Action::TimeoutFinish),
            "next" => Some(Action::Next),
            "skip" => Some(Action::Skip),
            _ => raw
                .strip_prefix("goto_")
                .and_then(|id| id.parse().ok())
                .map(Action::Goto),
        }
    }

    /// Both the manual finish button and the client-side timeout submit end
    /// the attempt the same way.
    pub fn is_finish(&self) -> bool {
        matches!(self, Action::Finish | Action::TimeoutFinish)
    }
}

/// The question following `current`: smallest question id greater than the
/// current one. Selection is by identifier, not by the `order` field the
/// section scores use; `None` at the last question.
pub fn next_question_id(question_ids: &[i64], current: i64) -> Option<i64> {
    question_ids.iter().copied().filter(|&id| id > current).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        assert_eq!(Action::parse("finish"), Some(Action::Finish));
        assert_eq!(Action::parse("timeout_finish"), Some(Action::TimeoutFinish));
        assert_eq!(Action::parse("next"), Some(Action::Next));
        assert_eq!(Action::parse("skip"), Some(Action::Skip));
        assert_eq!(Action::parse("goto_17"), Some(Action::Goto(17)));
    }

    #[test]
    fn rejects_unknown_and_malformed_actions() {
        assert_eq!(Action::parse("restart"), None);
        assert_eq!(Action::parse("goto_"), None);
        assert_eq!(Action::parse("goto_seventeen"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn finish_variants() {
        assert!(Action::Finish.is_finish());
        assert!(Action::TimeoutFinish.is_finish());
        assert!(!Action::Next.is_finish());
        assert!(!Action::Goto(3).is_finish());
    }

    #[test]
    fn next_picks_smallest_greater_id() {
        // Ids need not be contiguous or sorted.
        let ids = [10, 3, 25, 7];
        assert_eq!(next_question_id(&ids, 3), Some(7));
        assert_eq!(next_question_id(&ids, 7), Some(10));
        assert_eq!(next_question_id(&ids, 11), Some(25));
    }

    #[test]
    fn next_at_last_question_goes_nowhere() {
        let ids = [10, 3, 25, 7];
        assert_eq!(next_question_id(&ids, 25), None);
        assert_eq!(next_question_id(&ids, 100), None);
    }

    #[test]
    fn next_in_empty_quiz_goes_nowhere() {
        assert_eq!(next_question_id(&[], 1), None);
    }
}
