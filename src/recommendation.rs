//! Item recommendations aggregated from a neighbour ranking.
//!
//! For each candidate item the score is the similarity-weighted mean of
//! the ratings given by the target's neighbours:
//!
//! ```text
//! score(i) = sum(sim(u) * r(u, i)) / sum(sim(u))
//! ```
//!
//! Only neighbours with a positive similarity and a positive weighted rating
//! contribute.
use std::cmp::Ordering;
use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::data::RatingStore;
use crate::ranking::{Ranked, RankedList};
use crate::similarity::SimilarityResult;
use crate::{ItemId, RecommendationError, Score, UserId};

/// A scored candidate item.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemRecommendation {
    /// The recommended item.
    pub item_id: ItemId,
    /// Sum of `similarity * rating` over contributing neighbours.
    pub weighted_score_sum: Score,
    /// Sum of similarities over contributing neighbours.
    pub similarity_score_sum: Score,
    /// `weighted_score_sum / similarity_score_sum`, or zero with no support.
    pub score: Score,
    /// Total number of ratings the item has received.
    pub num_ratings: usize,
}

impl ItemRecommendation {
    fn new(
        item_id: ItemId,
        weighted_score_sum: Score,
        similarity_score_sum: Score,
        num_ratings: usize,
    ) -> Self {
        let score = if similarity_score_sum == 0.0 {
            0.0
        } else {
            weighted_score_sum / similarity_score_sum
        };

        ItemRecommendation {
            item_id,
            weighted_score_sum,
            similarity_score_sum,
            score,
            num_ratings,
        }
    }
}

impl Ranked for ItemRecommendation {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.num_ratings.cmp(&self.num_ratings))
            .then_with(|| self.item_id.cmp(&other.item_id))
    }
}

fn score_item(
    store: &RatingStore,
    target: UserId,
    item_id: ItemId,
    similarities: &HashMap<UserId, Score>,
) -> Result<Option<ItemRecommendation>, RecommendationError> {
    let mut weighted_score_sum = 0.0;
    let mut similarity_score_sum = 0.0;

    for &user_id in store.raters(item_id) {
        if user_id == target {
            continue;
        }

        let similarity = *similarities
            .get(&user_id)
            .ok_or(RecommendationError::InconsistentState { user_id })?;
        let rating = store
            .profile(user_id)?
            .rating(item_id)
            .ok_or(RecommendationError::InconsistentState { user_id })?;
        let weighted = rating.score * similarity;

        if similarity > 0.0 && weighted > 0.0 {
            weighted_score_sum += weighted;
            similarity_score_sum += similarity;
        }
    }

    if similarity_score_sum == 0.0 {
        return Ok(None);
    }

    Ok(Some(ItemRecommendation::new(
        item_id,
        weighted_score_sum,
        similarity_score_sum,
        store.rating_count(item_id),
    )))
}

/// Score every catalog item the target has not rated, best first.
///
/// Items rated fewer than `min_ratings` times are skipped, as are items no
/// positively similar neighbour has rated. Ties on score go to the item with
/// more ratings, then to the lower item id. Every user who rated a
/// candidate must appear in `neighbours`.
pub fn recommend(
    store: &RatingStore,
    target: UserId,
    neighbours: &[SimilarityResult],
    min_ratings: usize,
) -> Result<Vec<ItemRecommendation>, RecommendationError> {
    let target_profile = store.profile(target)?;

    let similarities: HashMap<UserId, Score> = neighbours
        .iter()
        .map(|x| (x.user_id, x.similarity))
        .collect();

    let candidates: Vec<ItemId> = store
        .item_ids()
        .into_iter()
        .filter(|&item_id| store.rating_count(item_id) >= min_ratings)
        .filter(|&item_id| !target_profile.has_rated(item_id))
        .collect();

    let scored = candidates
        .par_iter()
        .map(|&item_id| score_item(store, target, item_id, &similarities))
        .collect::<Result<Vec<_>, _>>()?;

    let ranking: RankedList<ItemRecommendation> = scored.into_iter().flatten().collect();

    debug!(
        user_id = target,
        num_candidates = candidates.len(),
        num_recommendations = ranking.len(),
        "scored recommendations"
    );

    Ok(ranking.into_vec())
}
