//! Historical training habits
//!
//! Two signals feed the recommendation engine: which muscles the athlete
//! habitually trains on this weekday, and how long ago each exercise was
//! last performed.

use chrono::{DateTime, Datelike, Duration, FixedOffset, IsoWeek, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::fatigue::hours_between;
use crate::models::{normalize_exercise_key, ExerciseDefinition, ExerciseRecordSnapshot, MuscleGroup};

/// Muscles trained on the reference weekday in at least `min_weeks` distinct prior weeks
///
/// Only primary engagement counts. Records on the reference calendar day
/// or later are ignored. Weekdays are read after shifting timestamps by
/// `utc_offset_minutes`. Insufficient history yields an empty set.
pub fn weekday_patterns(
    records: &[ExerciseRecordSnapshot],
    reference: DateTime<Utc>,
    min_weeks: usize,
    utc_offset_minutes: i32,
) -> BTreeSet<MuscleGroup> {
    let Some(offset) = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)) else {
        tracing::warn!(utc_offset_minutes, "Invalid UTC offset, weekday patterns disabled");
        return BTreeSet::new();
    };

    let local_day = |date: DateTime<Utc>| -> NaiveDate { date.with_timezone(&offset).date_naive() };
    let today = local_day(reference);
    let weekday = today.weekday();

    let mut weeks_by_muscle: BTreeMap<MuscleGroup, HashSet<IsoWeek>> = BTreeMap::new();
    for record in records {
        let day = local_day(record.date);
        if day >= today || day.weekday() != weekday {
            continue;
        }
        for muscle in &record.primary_muscles {
            weeks_by_muscle.entry(*muscle).or_default().insert(day.iso_week());
        }
    }

    let patterns: BTreeSet<MuscleGroup> = weeks_by_muscle
        .into_iter()
        .filter(|(_, weeks)| weeks.len() >= min_weeks.max(1))
        .map(|(muscle, _)| muscle)
        .collect();

    tracing::debug!(weekday = %weekday, matches = patterns.len(), "Weekday patterns detected");
    patterns
}

/// Last time each exercise was performed
#[derive(Debug, Clone, Default)]
pub struct ExerciseStaleness {
    last_performed: HashMap<String, DateTime<Utc>>,
    reference: Option<DateTime<Utc>>,
}

impl ExerciseStaleness {
    /// Build from history; records after the reference time are ignored
    pub fn from_records(records: &[ExerciseRecordSnapshot], reference: DateTime<Utc>) -> Self {
        let mut last_performed: HashMap<String, DateTime<Utc>> = HashMap::new();

        for record in records.iter().filter(|r| r.date <= reference) {
            let Some(key) = record.exercise_key() else {
                continue;
            };
            last_performed
                .entry(key)
                .and_modify(|last| {
                    if record.date > *last {
                        *last = record.date;
                    }
                })
                .or_insert(record.date);
        }

        Self {
            last_performed,
            reference: Some(reference),
        }
    }

    /// Last time an exercise id or name was logged
    pub fn last_performed(&self, key: &str) -> Option<DateTime<Utc>> {
        self.last_performed.get(&normalize_exercise_key(key)).copied()
    }

    /// Most recent record of a catalog exercise, whether logged by id or by name
    pub fn last_performed_exercise(&self, exercise: &ExerciseDefinition) -> Option<DateTime<Utc>> {
        exercise
            .recency_keys()
            .iter()
            .filter_map(|k| self.last_performed.get(k).copied())
            .max()
    }

    /// Hours since the exercise was performed; `None` if never
    pub fn hours_since(&self, key: &str) -> Option<f64> {
        let reference = self.reference?;
        self.last_performed(key)
            .map(|date| hours_between(date, reference))
    }

    /// Keys of exercises performed within the given number of hours
    ///
    /// A window reaching past the earliest representable time covers everything.
    pub fn recent(&self, window_hours: f64) -> HashSet<String> {
        let Some(reference) = self.reference else {
            return HashSet::new();
        };
        let cutoff = Duration::try_milliseconds((window_hours.max(0.0) * 3_600_000.0) as i64)
            .and_then(|window| reference.checked_sub_signed(window));
        self.last_performed
            .iter()
            .filter(|(_, date)| cutoff.map_or(true, |cutoff| **date >= cutoff))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Ordering that puts the staler exercise first: never performed, then oldest
    pub fn compare(&self, a: &ExerciseDefinition, b: &ExerciseDefinition) -> Ordering {
        match (self.last_performed_exercise(a), self.last_performed_exercise(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(&y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Equipment;
    use chrono::TimeZone;

    // A Friday
    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()
    }

    fn trained_weeks_ago(weeks: i64, muscle: MuscleGroup) -> ExerciseRecordSnapshot {
        let mut record = ExerciseRecordSnapshot::new(reference() - Duration::weeks(weeks) - Duration::hours(2));
        record.primary_muscles.insert(muscle);
        record
    }

    fn named(name: &str, hours_ago: i64) -> ExerciseRecordSnapshot {
        let mut record = ExerciseRecordSnapshot::new(reference() - Duration::hours(hours_ago));
        record.exercise_id = Some(name.to_string());
        record
    }

    #[test]
    fn test_pattern_requires_four_weeks() {
        let three: Vec<_> = (1..=3).map(|w| trained_weeks_ago(w, MuscleGroup::Back)).collect();
        assert!(weekday_patterns(&three, reference(), 4, 0).is_empty());

        let four: Vec<_> = (1..=4).map(|w| trained_weeks_ago(w, MuscleGroup::Back)).collect();
        let patterns = weekday_patterns(&four, reference(), 4, 0);
        assert_eq!(patterns.len(), 1);
        assert!(patterns.contains(&MuscleGroup::Back));
    }

    #[test]
    fn test_same_week_counted_once() {
        let mut records: Vec<_> = (1..=3).map(|w| trained_weeks_ago(w, MuscleGroup::Chest)).collect();
        records.push(trained_weeks_ago(1, MuscleGroup::Chest));
        assert!(weekday_patterns(&records, reference(), 4, 0).is_empty());
    }

    #[test]
    fn test_other_weekdays_and_today_ignored() {
        let mut records: Vec<_> = (1..=4)
            .map(|w| {
                let mut r = trained_weeks_ago(w, MuscleGroup::Calves);
                r.date -= Duration::days(1);
                r
            })
            .collect();
        records.push(trained_weeks_ago(0, MuscleGroup::Calves));
        assert!(weekday_patterns(&records, reference(), 4, 0).is_empty());
    }

    #[test]
    fn test_secondary_muscles_do_not_form_patterns() {
        let records: Vec<_> = (1..=4)
            .map(|w| {
                let mut r = ExerciseRecordSnapshot::new(reference() - Duration::weeks(w));
                r.secondary_muscles.insert(MuscleGroup::Forearms);
                r
            })
            .collect();
        assert!(weekday_patterns(&records, reference(), 4, 0).is_empty());
    }

    fn exercise(id: &str, name: &str) -> ExerciseDefinition {
        ExerciseDefinition {
            id: id.to_string(),
            name: name.to_string(),
            primary_muscles: vec![MuscleGroup::Quadriceps],
            secondary_muscles: vec![],
            equipment: Equipment::Barbell,
        }
    }

    #[test]
    fn test_staleness_ordering() {
        let records = vec![named("squat", 100), named("squat", 30), named("lunge", 200)];
        let staleness = ExerciseStaleness::from_records(&records, reference());
        let squat = exercise("squat", "Back Squat");
        let lunge = exercise("lunge", "Walking Lunge");
        let deadlift = exercise("deadlift", "Deadlift");

        assert_eq!(staleness.hours_since("squat"), Some(30.0));
        assert_eq!(staleness.hours_since("deadlift"), None);
        assert_eq!(staleness.compare(&deadlift, &squat), Ordering::Less);
        assert_eq!(staleness.compare(&lunge, &squat), Ordering::Less);
        assert_eq!(staleness.compare(&squat, &lunge), Ordering::Greater);
    }

    #[test]
    fn test_staleness_matches_records_logged_by_name() {
        let mut by_name = ExerciseRecordSnapshot::new(reference() - Duration::hours(20));
        by_name.exercise_name = Some("Seated Calf Raise".to_string());
        let records = vec![by_name, named("standing_calf_raise", 90)];
        let staleness = ExerciseStaleness::from_records(&records, reference());

        let seated = exercise("seated_calf_raise", "Seated Calf Raise");
        let standing = exercise("standing_calf_raise", "Standing Calf Raise");

        assert_eq!(staleness.hours_since("Seated Calf Raise"), Some(20.0));
        assert_eq!(
            staleness.last_performed_exercise(&seated),
            Some(reference() - Duration::hours(20))
        );
        assert_eq!(staleness.compare(&standing, &seated), Ordering::Less);
        assert!(staleness.recent(48.0).contains("seated_calf_raise"));
    }

    #[test]
    fn test_recent_exercises() {
        let records = vec![named("squat", 10), named("lunge", 72)];
        let staleness = ExerciseStaleness::from_records(&records, reference());
        let recent = staleness.recent(48.0);

        assert!(recent.contains("squat"));
        assert!(!recent.contains("lunge"));
    }

    #[test]
    fn test_unbounded_recent_window_covers_everything() {
        let records = vec![named("squat", 10), named("lunge", 24 * 300)];
        let staleness = ExerciseStaleness::from_records(&records, reference());

        for window in [1e300, f64::INFINITY, f64::MAX] {
            let recent = staleness.recent(window);
            assert_eq!(recent.len(), 2);
        }
        assert!(staleness.recent(f64::NAN).is_empty());
    }
}
