use crate::serde::{Deserialize, Serialize};

/// Stars needed before the badge unlocks.
pub const BADGE_STARS: u32 = 5;

/// One child's progress across the games.
///
/// Missing fields read as their defaults; older writers left out `quiz_score`
/// and sometimes `badge_unlocked`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressRecord {
    pub last_activity: String,
    pub quiz_score: u32,
    pub stars: u32,
    pub badge_unlocked: bool,
}

impl ProgressRecord {
    /// The same record with `badge_unlocked` derived from `stars`.
    pub fn with_badge_recomputed(mut self) -> Self {
        self.badge_unlocked = self.stars >= BADGE_STARS;
        self
    }

    /// A finished game earns one star.
    pub fn award_star(&mut self, activity: &str) {
        self.stars = self.stars.saturating_add(1);
        self.last_activity = activity.to_string();
        self.badge_unlocked = self.stars >= BADGE_STARS;
    }

    /// A correct quiz answer counts toward the running quiz score and earns a star.
    pub fn award_quiz_point(&mut self, activity: &str) {
        self.quiz_score = self.quiz_score.saturating_add(1);
        self.award_star(activity);
    }

    /// A quiz always records its score but only a perfect one earns a star.
    pub fn record_quiz(&mut self, activity: &str, score: u32, out_of: u32) {
        self.quiz_score = score;
        if score == out_of {
            self.stars = self.stars.saturating_add(1);
        }
        self.last_activity = activity.to_string();
        self.badge_unlocked = self.stars >= BADGE_STARS;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let record = ProgressRecord::default();
        assert_eq!(0, record.stars);
        assert!(!record.badge_unlocked);
    }

    #[test]
    fn test_badge_unlocks_at_fifth_star() {
        let mut record = ProgressRecord::default();
        (0..4).for_each(|_| record.award_star("Matching Game"));
        assert_eq!(4, record.stars);
        assert!(!record.badge_unlocked);

        record.award_star("Face Match");
        assert_eq!(5, record.stars);
        assert!(record.badge_unlocked);
        assert_eq!("Face Match", record.last_activity);
    }

    #[test]
    fn test_quiz_star_needs_perfect_score() {
        let mut record = ProgressRecord::default();
        record.record_quiz("Quiz", 1, 2);
        assert_eq!(1, record.quiz_score);
        assert_eq!(0, record.stars);

        record.record_quiz("Quiz", 2, 2);
        assert_eq!(2, record.quiz_score);
        assert_eq!(1, record.stars);
        assert_eq!("Quiz", record.last_activity);
    }

    #[test]
    fn test_quiz_points_accumulate() {
        let mut record = ProgressRecord {
            stars: 4,
            quiz_score: 1,
            ..Default::default()
        };
        record.award_quiz_point("Quiz");
        assert_eq!(2, record.quiz_score);
        assert_eq!(5, record.stars);
        assert!(record.badge_unlocked);
        assert_eq!("Quiz", record.last_activity);
    }

    #[test]
    fn test_recompute_fixes_stale_badge() {
        let stale = ProgressRecord {
            stars: 7,
            badge_unlocked: false,
            ..Default::default()
        };
        assert!(stale.with_badge_recomputed().badge_unlocked);

        let premature = ProgressRecord {
            stars: 2,
            badge_unlocked: true,
            ..Default::default()
        };
        assert!(!premature.with_badge_recomputed().badge_unlocked);
    }

    #[test]
    fn test_partial_record_parses() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"last_activity":"Quiz","quiz_score":2,"stars":1}"#).unwrap();
        assert_eq!(1, record.stars);
        assert!(!record.badge_unlocked);
        assert!(serde_json::from_str::<ProgressRecord>(r#"{"stars":1,"level":3}"#).is_err());
    }
}
