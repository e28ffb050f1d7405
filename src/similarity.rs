//! User-user similarity.
//!
//! Two users are compared over the items both have rated:
//!
//! ```text
//! distance(a, b)   = sum over shared items of (a[i] - b[i])^2
//! similarity(a, b) = 1 / (1 + distance(a, b)), or 0 with no shared items
//! ```
//!
//! The score lies in `[0, 1]` and equals `1` only when every shared rating
//! is identical.
use std::cmp::Ordering;

use itertools::{EitherOrBoth, Itertools};
use rayon::prelude::*;
use tracing::debug;

use crate::data::{RatingStore, UserProfile};
use crate::ranking::{Ranked, RankedList};
use crate::{RecommendationError, Score, UserId};

/// Similarity of one neighbour to the target user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimilarityResult {
    /// The neighbour.
    pub user_id: UserId,
    /// The neighbour's display name.
    pub name: String,
    /// Similarity to the target, in `[0, 1]`.
    pub similarity: Score,
}

impl Ranked for SimilarityResult {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| self.user_id.cmp(&other.user_id))
    }
}

/// Inverse squared Euclidean distance over the items both users rated.
///
/// Shared items are visited in item id order whichever argument comes
/// first, so the result is bit-for-bit symmetric.
pub fn euclidean_similarity(a: &UserProfile, b: &UserProfile) -> Score {
    let (num_shared, distance) = a
        .ratings()
        .merge_join_by(b.ratings(), |(x, _), (y, _)| x.cmp(y))
        .filter_map(|pair| match pair {
            EitherOrBoth::Both((_, x), (_, y)) => Some(x.score - y.score),
            _ => None,
        })
        .fold((0_usize, 0.0), |(num_shared, distance), difference| {
            (num_shared + 1, distance + difference * difference)
        });

    if num_shared == 0 {
        0.0
    } else {
        1.0 / (1.0 + distance)
    }
}

/// Rank every other user by similarity to `target`, most similar first.
///
/// Ties are broken by ascending user id. The whole population is returned;
/// truncation is up to the caller.
pub fn rank_similar_users(
    store: &RatingStore,
    target: UserId,
) -> Result<Vec<SimilarityResult>, RecommendationError> {
    let target_profile = store.profile(target)?;

    let ranking: RankedList<SimilarityResult> = store
        .profiles()
        .filter(|profile| profile.user_id() != target)
        .collect::<Vec<_>>()
        .par_iter()
        .map(|profile| SimilarityResult {
            user_id: profile.user_id(),
            name: profile.name().to_owned(),
            similarity: euclidean_similarity(target_profile, profile),
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    debug!(user_id = target, num_neighbours = ranking.len(), "ranked neighbours");

    Ok(ranking.into_vec())
}
