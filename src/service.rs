//! Request-level operations, shaped for a network front end.
//!
//! Parameters are validated into a [`RequestParams`] before the engines run,
//! and responses carry scores rounded to four decimal places.
use tracing::debug;

use crate::data::RatingStore;
use crate::recommendation::recommend;
use crate::similarity::rank_similar_users;
use crate::{ItemId, RecommendationError, Score, UserId};

/// Number of result rows when a request does not say.
pub const DEFAULT_RESULTS: usize = 3;
/// Minimum ratings per recommended item when a request does not say.
pub const DEFAULT_MIN_RATINGS: usize = 1;

fn round4(value: Score) -> Score {
    (value * 10_000.0).round() / 10_000.0
}

fn parse_param(name: &'static str, value: &str) -> Result<usize, RecommendationError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| RecommendationError::InvalidParameter {
            name,
            value: value.to_owned(),
        })
}

/// Validated parameters of a single request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestParams {
    user_id: UserId,
    result_count: usize,
    min_ratings: usize,
}

impl RequestParams {
    /// Build request parameters. `result_count` must be positive.
    pub fn new(
        user_id: UserId,
        result_count: usize,
        min_ratings: usize,
    ) -> Result<Self, RecommendationError> {
        if result_count == 0 {
            return Err(RecommendationError::InvalidParameter {
                name: "results",
                value: result_count.to_string(),
            });
        }

        Ok(RequestParams {
            user_id,
            result_count,
            min_ratings,
        })
    }

    /// Parse raw query-string values. A missing `min_ratings` defaults to
    /// [`DEFAULT_MIN_RATINGS`].
    pub fn parse(
        user_id: &str,
        result_count: &str,
        min_ratings: Option<&str>,
    ) -> Result<Self, RecommendationError> {
        let user_id = parse_param("userId", user_id)?;
        let result_count = parse_param("results", result_count)?;
        let min_ratings = match min_ratings {
            Some(value) => parse_param("ratings", value)?,
            None => DEFAULT_MIN_RATINGS,
        };

        RequestParams::new(user_id, result_count, min_ratings)
    }

    /// The target user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Maximum number of rows in the response.
    pub fn result_count(&self) -> usize {
        self.result_count
    }

    /// Minimum number of ratings a recommended item must have.
    pub fn min_ratings(&self) -> usize {
        self.min_ratings
    }
}

/// A user listing row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserSummary {
    /// Display name.
    pub name: String,
    /// User id.
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

/// A similar-users response row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimilarUser {
    /// Display name.
    pub name: String,
    /// User id.
    #[serde(rename = "userId")]
    pub user_id: UserId,
    /// Similarity to the requested user, rounded to four decimals.
    pub similarity: Score,
}

/// A recommended-items response row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommendedItem {
    /// Item title.
    pub title: String,
    /// Item id.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Total number of ratings of the item.
    #[serde(rename = "numRatings")]
    pub num_ratings: usize,
    /// Aggregated score, rounded to four decimals.
    pub score: Score,
}

/// Response envelope echoing the request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Response<T> {
    /// The requested user.
    pub user: UserId,
    /// The requested number of rows.
    pub results: usize,
    /// Result rows, best first.
    pub data: Vec<T>,
}

/// Serves requests against an immutable [`RatingStore`].
#[derive(Debug)]
pub struct RecommendationService {
    store: RatingStore,
}

impl RecommendationService {
    /// Wrap a built store.
    pub fn new(store: RatingStore) -> Self {
        RecommendationService { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &RatingStore {
        &self.store
    }

    /// Every user with a profile, ascending by id.
    pub fn users(&self) -> Vec<UserSummary> {
        self.store
            .profiles()
            .map(|profile| UserSummary {
                name: profile.name().to_owned(),
                user_id: profile.user_id(),
            })
            .collect()
    }

    /// The users most similar to the requested one.
    pub fn similar_users(
        &self,
        params: &RequestParams,
    ) -> Result<Response<SimilarUser>, RecommendationError> {
        let data: Vec<SimilarUser> = rank_similar_users(&self.store, params.user_id)?
            .into_iter()
            .take(params.result_count)
            .map(|neighbour| SimilarUser {
                name: neighbour.name,
                user_id: neighbour.user_id,
                similarity: round4(neighbour.similarity),
            })
            .collect();

        debug!(user_id = params.user_id, num_rows = data.len(), "similar users");

        Ok(Response {
            user: params.user_id,
            results: params.result_count,
            data,
        })
    }

    /// The best-scoring items the requested user has not rated.
    pub fn recommended_items(
        &self,
        params: &RequestParams,
    ) -> Result<Response<RecommendedItem>, RecommendationError> {
        let neighbours = rank_similar_users(&self.store, params.user_id)?;
        let data = recommend(&self.store, params.user_id, &neighbours, params.min_ratings)?
            .into_iter()
            .take(params.result_count)
            .map(|recommendation| {
                let item = self.store.item(recommendation.item_id)?;

                Ok(RecommendedItem {
                    title: item.title().to_owned(),
                    item_id: recommendation.item_id,
                    num_ratings: recommendation.num_ratings,
                    score: round4(recommendation.score),
                })
            })
            .collect::<Result<Vec<_>, RecommendationError>>()?;

        debug!(user_id = params.user_id, num_rows = data.len(), "recommended items");

        Ok(Response {
            user: params.user_id,
            results: params.result_count,
            data,
        })
    }
}
