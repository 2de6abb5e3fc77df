//! Facility ranking.
//!
//! Groups feedback by (facility, building) and orders the groups by mean
//! rating. The order is total, so identical input always ranks identically.

use crate::models::{FacilityRanking, FacilityScore, FeedbackRecord};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Rank facility groups by mean rating and keep the best `top_n`.
pub fn rank(feedback: &[FeedbackRecord], top_n: usize) -> FacilityRanking {
    if top_n == 0 {
        return FacilityRanking::default();
    }

    let mut scores = facility_scores(feedback);
    scores.sort_by(compare_scores);
    scores.truncate(top_n);

    FacilityRanking(scores)
}

/// Mean rating and sample count for every facility group, unordered.
pub fn facility_scores(feedback: &[FeedbackRecord]) -> Vec<FacilityScore> {
    let mut groups: HashMap<(&str, &str), (u64, usize)> = HashMap::new();

    for entry in feedback {
        let group = groups
            .entry((entry.facility.as_str(), entry.building.as_str()))
            .or_default();
        group.0 += u64::from(entry.rating);
        group.1 += 1;
    }

    groups
        .into_iter()
        .map(|((facility, building), (sum, count))| FacilityScore {
            facility: facility.to_string(),
            building: building.to_string(),
            mean_rating: sum as f64 / count as f64,
            sample_count: count,
        })
        .collect()
}

/// Mean rating desc, then sample count desc, then facility name asc.
///
/// Building asc breaks the last tie between same-named facilities in
/// different buildings.
pub fn compare_scores(a: &FacilityScore, b: &FacilityScore) -> Ordering {
    b.mean_rating
        .total_cmp(&a.mean_rating)
        .then_with(|| b.sample_count.cmp(&a.sample_count))
        .then_with(|| a.facility.cmp(&b.facility))
        .then_with(|| a.building.cmp(&b.building))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    fn feedback(facility: &str, building: &str, rating: u8) -> FeedbackRecord {
        FeedbackRecord {
            id: RecordId::Int(0),
            facility: facility.to_string(),
            building: building.to_string(),
            rating,
            category: "general".to_string(),
            comment: None,
            submitter: "Anonymous".to_string(),
            created_at: None,
        }
    }

    fn is_sorted(ranking: &FacilityRanking) -> bool {
        ranking
            .0
            .windows(2)
            .all(|w| compare_scores(&w[0], &w[1]) == Ordering::Less)
    }

    #[test]
    fn test_tie_on_mean_broken_by_sample_count() {
        let fb = vec![
            feedback("Library", "Main", 5),
            feedback("Library", "Main", 3),
            feedback("Cafeteria", "Student Center", 4),
        ];

        let ranking = rank(&fb, 2);

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking.0[0].facility, "Library");
        assert_eq!(ranking.0[0].building, "Main");
        assert_eq!(ranking.0[0].mean_rating, 4.0);
        assert_eq!(ranking.0[0].sample_count, 2);
        assert_eq!(ranking.0[1].facility, "Cafeteria");
        assert_eq!(ranking.0[1].mean_rating, 4.0);
        assert_eq!(ranking.0[1].sample_count, 1);
    }

    #[test]
    fn test_full_tie_broken_by_name() {
        let fb = vec![
            feedback("Gym", "Sports Wing", 4),
            feedback("Auditorium", "Admin Block", 4),
            feedback("Cafeteria", "Student Center", 4),
        ];

        let ranking = rank(&fb, 10);
        let names: Vec<&str> = ranking.iter().map(|f| f.facility.as_str()).collect();
        assert_eq!(names, vec!["Auditorium", "Cafeteria", "Gym"]);
    }

    #[test]
    fn test_same_facility_in_two_buildings_are_separate_groups() {
        let fb = vec![
            feedback("Library", "North", 5),
            feedback("Library", "South", 5),
            feedback("library", "North", 1),
        ];

        let ranking = rank(&fb, 10);
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking.0[0].building, "North");
        assert_eq!(ranking.0[1].building, "South");
        assert_eq!(ranking.0[2].facility, "library");
    }

    #[test]
    fn test_length_is_min_of_n_and_groups() {
        let fb = vec![
            feedback("A", "X", 3),
            feedback("B", "X", 4),
            feedback("C", "X", 5),
            feedback("C", "X", 1),
        ];

        assert_eq!(rank(&fb, 1).len(), 1);
        assert_eq!(rank(&fb, 3).len(), 3);
        assert_eq!(rank(&fb, 50).len(), 3);
        assert!(is_sorted(&rank(&fb, 50)));
    }

    #[test]
    fn test_zero_top_n_is_empty() {
        let fb = vec![feedback("Library", "Main", 5)];
        assert!(rank(&fb, 0).is_empty());
    }

    #[test]
    fn test_empty_feedback_is_empty() {
        assert!(rank(&[], 5).is_empty());
    }

    #[test]
    fn test_rank_is_idempotent() {
        let fb: Vec<FeedbackRecord> = (0..40u8)
            .map(|i| feedback(&format!("Facility {}", i % 7), "Main", i % 5 + 1))
            .collect();

        let first = rank(&fb, 5);
        let second = rank(&fb, 5);
        assert_eq!(first, second);
        assert!(is_sorted(&first));
    }
}
