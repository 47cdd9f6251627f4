//! Rating aggregation, place search ranking and the viewer-first review
//! ordering used by the detail page.
//!
//! Everything here is pure: the store loads rows, these functions shape them.
use std::cmp::{Ordering, Reverse};

use crate::models::{place::PlaceSummary, review::Review};

/// Arithmetic mean of the ratings, `0.0` when there are none.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u64 = reviews.iter().map(|r| u64::from(r.rating)).sum();
    total as f64 / reviews.len() as f64
}

/// Blank or unparsable thresholds are ignored rather than rejected.
pub fn parse_min_rating(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
}

/// Filters and orders places for a search.
///
/// A minimum rating keeps only places whose average is at least that value;
/// places without reviews have no average and never pass. A non-empty query
/// keeps names containing it case-insensitively, with exact (case-insensitive)
/// matches ranked ahead of the rest and each group ordered by name. Without a
/// query the incoming order is kept.
pub fn search(places: Vec<PlaceSummary>, query: Option<&str>, min_rating: Option<f64>) -> Vec<PlaceSummary> {
    let mut places: Vec<PlaceSummary> = match min_rating {
        Some(min) => places
            .into_iter()
            .filter(|p| p.average_rating.is_some_and(|avg| avg >= min))
            .collect(),
        None => places,
    };

    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return places;
    };

    let needle = query.to_lowercase();
    places.retain(|p| p.place.name.to_lowercase().contains(&needle));

    // Keyed sort: (exactness rank, folded name, raw name, id)
    places.sort_by_cached_key(|p| {
        let folded = p.place.name.to_lowercase();
        let rank = u8::from(folded != needle);
        (rank, folded, p.place.name.clone(), p.place.id)
    });
    places
}

fn newest_first(a: &Review, b: &Review) -> Ordering {
    (Reverse(a.created_at), Reverse(a.id)).cmp(&(Reverse(b.created_at), Reverse(b.id)))
}

/// The viewer's own reviews first, then everyone else's. Each group is
/// sorted newest-first on its own, so ownership always beats recency.
pub fn order_reviews(reviews: Vec<Review>, viewer_id: i64) -> Vec<Review> {
    let (mut mine, mut others): (Vec<Review>, Vec<Review>) =
        reviews.into_iter().partition(|r| r.user_id == viewer_id);

    mine.sort_by(newest_first);
    others.sort_by(newest_first);

    mine.extend(others);
    mine
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::models::place::Place;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(seconds)
    }

    fn review(id: i64, user_id: i64, rating: u8, created_at: DateTime<Utc>) -> Review {
        Review {
            id,
            place_id: 1,
            user_id,
            user_name: format!("User {user_id}"),
            rating,
            text: String::new(),
            created_at,
        }
    }

    fn summary(id: i64, name: &str, average_rating: Option<f64>) -> PlaceSummary {
        PlaceSummary {
            place: Place {
                id,
                name: name.to_string(),
                address: "123 Test St".to_string(),
            },
            average_rating,
        }
    }

    fn names(places: &[PlaceSummary]) -> Vec<&str> {
        places.iter().map(|p| p.place.name.as_str()).collect()
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[review(1, 1, 5, at(0)), review(2, 2, 3, at(1))]), 4.0);
        let thirds = average_rating(&[review(1, 1, 1, at(0)), review(2, 1, 1, at(1)), review(3, 1, 2, at(2))]);
        assert!((thirds - 4.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_min_rating() {
        assert_eq!(parse_min_rating(None), None);
        assert_eq!(parse_min_rating(Some("")), None);
        assert_eq!(parse_min_rating(Some("abc")), None);
        assert_eq!(parse_min_rating(Some("4.5")), Some(4.5));
        assert_eq!(parse_min_rating(Some(" 3 ")), Some(3.0));
    }

    #[test]
    fn test_exact_match_ranks_first() {
        let places = vec![
            summary(1, "Test Place 70", Some(4.0)),
            summary(2, "Another Test Place 7", Some(4.0)),
            summary(3, "Test Place 7", Some(4.0)),
            summary(4, "Unrelated", Some(4.0)),
        ];

        let result = search(places, Some("Test Place 7"), None);
        assert_eq!(names(&result), vec!["Test Place 7", "Another Test Place 7", "Test Place 70"]);
    }

    #[test]
    fn test_query_matching_is_case_insensitive() {
        let places = vec![
            summary(1, "zebra CAFE", None),
            summary(2, "Cafe", None),
            summary(3, "apple cafe", None),
            summary(4, "CAFE", None),
        ];

        let result = search(places, Some("cafe"), None);
        // Both exact matches first, by name then id
        assert_eq!(names(&result), vec!["CAFE", "Cafe", "apple cafe", "zebra CAFE"]);
    }

    #[test]
    fn test_min_rating_threshold() {
        let places = || vec![summary(1, "Four", Some(4.0)), summary(2, "Unrated", None)];

        assert!(search(places(), None, Some(4.5)).is_empty());
        assert_eq!(names(&search(places(), None, Some(3.5))), vec!["Four"]);
        assert_eq!(names(&search(places(), None, Some(4.0))), vec!["Four"]);
        // Unrated places are excluded even by a zero threshold
        assert_eq!(names(&search(places(), None, Some(0.0))), vec!["Four"]);
    }

    #[test]
    fn test_no_filters_keep_store_order() {
        let places = vec![summary(3, "C", None), summary(1, "A", Some(2.0)), summary(2, "B", None)];
        let result = search(places.clone(), None, None);
        assert_eq!(result, places);
        assert_eq!(search(places.clone(), Some(""), None), places);
    }

    #[test]
    fn test_filters_combine_and_keep_precomputed_average() {
        let places = vec![
            summary(1, "Pizza Palace", Some(4.5)),
            summary(2, "Pizza", Some(2.0)),
            summary(3, "Burger Barn", Some(5.0)),
        ];

        let result = search(places, Some("pizza"), Some(3.0));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].place.id, 1);
        assert_eq!(result[0].average_rating, Some(4.5));
    }

    #[test]
    fn test_empty_result_is_fine() {
        assert!(search(vec![], Some("anything"), Some(1.0)).is_empty());
    }

    #[test]
    fn test_viewer_reviews_come_first() {
        let a = review(1, 1, 5, at(0));
        let b = review(2, 2, 3, at(10));
        let reviews = vec![a.clone(), b.clone()];

        assert_eq!(order_reviews(reviews.clone(), 1), vec![a.clone(), b.clone()]);
        assert_eq!(order_reviews(reviews.clone(), 2), vec![b.clone(), a.clone()]);
        assert_eq!(order_reviews(reviews, 3), vec![b, a]);
    }

    #[test]
    fn test_each_group_is_newest_first() {
        let mine_old = review(1, 7, 2, at(0));
        let other_old = review(2, 8, 3, at(5));
        let mine_new = review(3, 7, 4, at(10));
        let other_new = review(4, 9, 5, at(20));

        let ordered = order_reviews(vec![mine_old.clone(), other_old.clone(), mine_new.clone(), other_new.clone()], 7);
        assert_eq!(ordered, vec![mine_new, mine_old, other_new, other_old]);
    }

    #[test]
    fn test_same_timestamp_falls_back_to_id() {
        let first = review(1, 1, 3, at(0));
        let second = review(2, 2, 3, at(0));
        assert_eq!(order_reviews(vec![first.clone(), second.clone()], 3), vec![second, first]);
    }
}
