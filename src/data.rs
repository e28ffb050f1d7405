//! Item catalog, raw ratings, and the per-user profiles derived from them.
use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use tracing::{info, warn};

use crate::{ItemId, RecommendationError, Score, UserId};

/// A catalog entry.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Item {
    #[serde(rename = "movieId")]
    id: ItemId,
    title: String,
}

impl Item {
    /// Build a new catalog entry.
    pub fn new<T: Into<String>>(id: ItemId, title: T) -> Self {
        Item {
            id,
            title: title.into(),
        }
    }

    /// The item id.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The item title.
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// A single observed rating, as read from the ratings source.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    item_id: ItemId,
    #[serde(rename = "rating")]
    score: Score,
}

impl RatingRecord {
    /// Build a new rating record.
    pub fn new(user_id: UserId, item_id: ItemId, score: Score) -> Self {
        RatingRecord {
            user_id,
            item_id,
            score,
        }
    }

    /// The rating user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The rated item.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// The rating value.
    pub fn score(&self) -> Score {
        self.score
    }
}

/// A rating inside a user profile, with the item title resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Rating {
    /// The rated item.
    pub item_id: ItemId,
    /// Title of the rated item.
    pub title: String,
    /// The rating value.
    pub score: Score,
}

/// All ratings given by one user, keyed by item id.
#[derive(Clone, Debug)]
pub struct UserProfile {
    user_id: UserId,
    name: String,
    ratings: BTreeMap<ItemId, Rating>,
}

impl UserProfile {
    fn new(user_id: UserId) -> Self {
        UserProfile {
            user_id,
            name: format!("User {}", user_id),
            ratings: BTreeMap::new(),
        }
    }

    /// The profile's user id.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Display name of the user.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate over the user's ratings in increasing item id order.
    pub fn ratings(&self) -> btree_map::Iter<ItemId, Rating> {
        self.ratings.iter()
    }

    /// The user's rating for `item_id`, if any.
    pub fn rating(&self, item_id: ItemId) -> Option<&Rating> {
        self.ratings.get(&item_id)
    }

    /// Whether the user has rated `item_id`.
    pub fn has_rated(&self, item_id: ItemId) -> bool {
        self.ratings.contains_key(&item_id)
    }

    /// Number of distinct items rated.
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    /// Whether the user has no ratings.
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

/// Which user ids get a profile when the store is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserIdPolicy {
    /// Every id in `1..=max(user id)` gets a profile, even if the user has
    /// no ratings. A user id of zero extends the range down to zero. Building
    /// fails if the gaps would need more than 16 empty profiles per rating
    /// user (plus 1024).
    Contiguous,
    /// Only users that appear in the ratings get a profile.
    Observed,
}

impl Default for UserIdPolicy {
    fn default() -> Self {
        UserIdPolicy::Contiguous
    }
}

// Bound on the empty profiles the contiguous policy may create.
const MAX_EMPTY_PROFILES_PER_USER: usize = 16;
const MIN_EMPTY_PROFILES: usize = 1024;

/// Accumulates the catalog and the raw ratings before the profiles are built.
#[derive(Debug, Default)]
pub struct RatingStoreBuilder {
    items: BTreeMap<ItemId, Item>,
    items_loaded: bool,
    ratings: Vec<RatingRecord>,
    policy: UserIdPolicy,
}

impl RatingStoreBuilder {
    /// Set the user id policy.
    pub fn user_id_policy(&mut self, policy: UserIdPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Add catalog entries. Fails if an item id is already present.
    pub fn load_items<I>(&mut self, items: I) -> Result<&mut Self, RecommendationError>
    where
        I: IntoIterator<Item = Item>,
    {
        for item in items {
            if self.items.contains_key(&item.id) {
                return Err(RecommendationError::DuplicateItem { item_id: item.id });
            }
            self.items.insert(item.id, item);
        }

        self.items_loaded = true;

        Ok(self)
    }

    /// Add raw rating records. The catalog must already be loaded, every
    /// record must reference a catalog item and every score must be finite.
    pub fn load_ratings<I>(&mut self, records: I) -> Result<&mut Self, RecommendationError>
    where
        I: IntoIterator<Item = RatingRecord>,
    {
        if !self.items_loaded {
            return Err(RecommendationError::RatingsBeforeItems);
        }

        for record in records {
            if !self.items.contains_key(&record.item_id) {
                return Err(RecommendationError::UnknownItem {
                    item_id: record.item_id,
                });
            }
            if !record.score.is_finite() {
                return Err(RecommendationError::InvalidRating {
                    user_id: record.user_id,
                    item_id: record.item_id,
                });
            }
            self.ratings.push(record);
        }

        Ok(self)
    }

    fn user_ids(&self) -> Result<Vec<UserId>, RecommendationError> {
        let observed: Vec<UserId> = self
            .ratings
            .iter()
            .map(|x| x.user_id)
            .sorted()
            .dedup()
            .collect();

        match (self.policy, observed.first(), observed.last()) {
            (UserIdPolicy::Contiguous, Some(&min_user_id), Some(&max_user_id)) => {
                let first = min_user_id.min(1);
                let num_empty = (max_user_id - first) - (observed.len() - 1);
                let max_empty = MAX_EMPTY_PROFILES_PER_USER * observed.len() + MIN_EMPTY_PROFILES;

                if num_empty > max_empty {
                    return Err(RecommendationError::UserIdRangeTooLarge {
                        max_user_id,
                        num_observed: observed.len(),
                    });
                }
                if num_empty > 0 {
                    warn!(num_empty, max_user_id, "gaps in user ids get empty profiles");
                }

                Ok((first..=max_user_id).collect())
            }
            _ => Ok(observed),
        }
    }

    /// Derive the user profiles and per-item rating counts, consuming the builder.
    pub fn build(self) -> Result<RatingStore, RecommendationError> {
        let user_ids = self.user_ids()?;

        let mut profiles: BTreeMap<UserId, UserProfile> = user_ids
            .iter()
            .map(|&user_id| (user_id, UserProfile::new(user_id)))
            .collect();
        let mut rating_counts: HashMap<ItemId, usize> = HashMap::new();
        let mut raters: HashMap<ItemId, Vec<UserId>> = HashMap::new();

        for record in self.ratings.iter().sorted_by_key(|x| x.user_id) {
            let item = self
                .items
                .get(&record.item_id)
                .ok_or(RecommendationError::UnknownItem {
                    item_id: record.item_id,
                })?;
            let profile = profiles
                .get_mut(&record.user_id)
                .ok_or(RecommendationError::UnknownUser {
                    user_id: record.user_id,
                })?;

            *rating_counts.entry(item.id).or_insert(0) += 1;

            let previous = profile.ratings.insert(
                item.id,
                Rating {
                    item_id: item.id,
                    title: item.title.clone(),
                    score: record.score,
                },
            );

            if previous.is_none() {
                raters.entry(item.id).or_insert_with(Vec::new).push(record.user_id);
            }
        }

        info!(
            num_users = profiles.len(),
            num_items = self.items.len(),
            num_ratings = self.ratings.len(),
            "rating store built"
        );

        Ok(RatingStore {
            items: self.items,
            profiles,
            rating_counts,
            raters,
            num_ratings: self.ratings.len(),
        })
    }
}

/// Immutable catalog and user profiles.
///
/// Once built the store is never mutated and can be shared freely between
/// threads.
#[derive(Debug)]
pub struct RatingStore {
    items: BTreeMap<ItemId, Item>,
    profiles: BTreeMap<UserId, UserProfile>,
    rating_counts: HashMap<ItemId, usize>,
    raters: HashMap<ItemId, Vec<UserId>>,
    num_ratings: usize,
}

impl RatingStore {
    /// Start building a new store.
    pub fn builder() -> RatingStoreBuilder {
        RatingStoreBuilder::default()
    }

    /// Build a store in one go from a catalog and its ratings.
    pub fn from_records(
        items: Vec<Item>,
        ratings: Vec<RatingRecord>,
        policy: UserIdPolicy,
    ) -> Result<Self, RecommendationError> {
        let mut builder = RatingStore::builder();
        builder
            .user_id_policy(policy)
            .load_items(items)?
            .load_ratings(ratings)?;

        builder.build()
    }

    /// The profile of `user_id`.
    pub fn profile(&self, user_id: UserId) -> Result<&UserProfile, RecommendationError> {
        self.profiles
            .get(&user_id)
            .ok_or(RecommendationError::UnknownUser { user_id })
    }

    /// All profiles in increasing user id order.
    pub fn profiles(&self) -> btree_map::Values<UserId, UserProfile> {
        self.profiles.values()
    }

    /// The catalog entry for `item_id`.
    pub fn item(&self, item_id: ItemId) -> Result<&Item, RecommendationError> {
        self.items
            .get(&item_id)
            .ok_or(RecommendationError::UnknownItem { item_id })
    }

    /// All catalog entries in increasing item id order.
    pub fn items(&self) -> btree_map::Values<ItemId, Item> {
        self.items.values()
    }

    /// Number of rating records referencing `item_id`; zero if never rated.
    pub fn rating_count(&self, item_id: ItemId) -> usize {
        self.rating_counts.get(&item_id).cloned().unwrap_or(0)
    }

    /// Users who rated `item_id`, in increasing user id order.
    pub fn raters(&self, item_id: ItemId) -> &[UserId] {
        self.raters
            .get(&item_id)
            .map(|x| x.as_slice())
            .unwrap_or(&[])
    }

    /// All user ids with a profile, ascending.
    pub fn user_ids(&self) -> Vec<UserId> {
        self.profiles.keys().cloned().collect()
    }

    /// All catalog item ids, ascending.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.keys().cloned().collect()
    }

    /// Number of users with a profile.
    pub fn num_users(&self) -> usize {
        self.profiles.len()
    }

    /// Number of catalog items.
    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// Number of raw rating records.
    pub fn num_ratings(&self) -> usize {
        self.num_ratings
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Three users and three items with hand-checkable similarities.
    pub(crate) fn small_store() -> RatingStore {
        RatingStore::from_records(
            vec![
                Item::new(1, "Alien"),
                Item::new(2, "Heat"),
                Item::new(3, "Ran"),
            ],
            vec![
                RatingRecord::new(1, 1, 5.0),
                RatingRecord::new(1, 2, 3.0),
                RatingRecord::new(2, 1, 4.0),
                RatingRecord::new(2, 2, 2.0),
                RatingRecord::new(2, 3, 5.0),
                RatingRecord::new(3, 1, 1.0),
                RatingRecord::new(3, 3, 3.0),
            ],
            UserIdPolicy::Contiguous,
        )
        .unwrap()
    }

    fn gappy_records() -> (Vec<Item>, Vec<RatingRecord>) {
        (
            vec![Item::new(10, "Alien"), Item::new(20, "Heat")],
            vec![
                RatingRecord::new(4, 10, 4.0),
                RatingRecord::new(1, 20, 2.5),
                RatingRecord::new(1, 10, 3.0),
            ],
        )
    }

    #[test]
    fn builds_profiles_with_titles() {
        let store = small_store();

        assert_eq!(store.num_users(), 3);
        assert_eq!(store.num_items(), 3);
        assert_eq!(store.num_ratings(), 7);

        let profile = store.profile(2).unwrap();
        assert_eq!(profile.name(), "User 2");
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.rating(3).unwrap().title, "Ran");
        assert_eq!(profile.rating(3).unwrap().score, 5.0);
        assert!(!profile.has_rated(4));
    }

    #[test]
    fn counts_ratings_per_item() {
        let store = small_store();

        assert_eq!(store.rating_count(1), 3);
        assert_eq!(store.rating_count(2), 2);
        assert_eq!(store.rating_count(3), 2);
        assert_eq!(store.rating_count(99), 0);
        assert_eq!(store.raters(3), &[2, 3]);
        assert!(store.raters(99).is_empty());
    }

    #[test]
    fn contiguous_policy_fills_gaps() {
        let (items, ratings) = gappy_records();
        let store = RatingStore::from_records(items, ratings, UserIdPolicy::Contiguous).unwrap();

        assert_eq!(store.user_ids(), vec![1, 2, 3, 4]);
        assert!(store.profile(2).unwrap().is_empty());
        assert!(store.profile(3).unwrap().is_empty());
        assert_eq!(store.profile(4).unwrap().len(), 1);
    }

    #[test]
    fn observed_policy_skips_gaps() {
        let (items, ratings) = gappy_records();
        let store = RatingStore::from_records(items, ratings, UserIdPolicy::Observed).unwrap();

        assert_eq!(store.user_ids(), vec![1, 4]);
        assert_eq!(
            store.profile(2).unwrap_err(),
            RecommendationError::UnknownUser { user_id: 2 }
        );
    }

    #[test]
    fn rejects_duplicate_items() {
        let mut builder = RatingStore::builder();
        let result = builder.load_items(vec![Item::new(1, "Alien"), Item::new(1, "Aliens")]);

        assert_eq!(
            result.unwrap_err(),
            RecommendationError::DuplicateItem { item_id: 1 }
        );
    }

    #[test]
    fn rejects_ratings_for_unknown_items() {
        let mut builder = RatingStore::builder();
        builder.load_items(vec![Item::new(1, "Alien")]).unwrap();
        let result = builder.load_ratings(vec![RatingRecord::new(1, 2, 4.0)]);

        assert_eq!(
            result.unwrap_err(),
            RecommendationError::UnknownItem { item_id: 2 }
        );
    }

    #[test]
    fn rejects_non_finite_ratings() {
        for &score in &[std::f64::NAN, std::f64::INFINITY, std::f64::NEG_INFINITY] {
            let mut builder = RatingStore::builder();
            builder.load_items(vec![Item::new(1, "Alien")]).unwrap();
            let result = builder.load_ratings(vec![
                RatingRecord::new(1, 1, 4.0),
                RatingRecord::new(3, 1, score),
            ]);

            let error = result.unwrap_err();
            assert_eq!(
                error,
                RecommendationError::InvalidRating {
                    user_id: 3,
                    item_id: 1,
                }
            );
            assert!(!error.is_client_error());
        }
    }

    #[test]
    fn rejects_huge_contiguous_user_range() {
        let ratings = vec![
            RatingRecord::new(1, 10, 4.0),
            RatingRecord::new(1_000_000_000, 10, 3.0),
        ];

        let error = RatingStore::from_records(
            vec![Item::new(10, "Alien")],
            ratings.clone(),
            UserIdPolicy::Contiguous,
        )
        .unwrap_err();
        assert_eq!(
            error,
            RecommendationError::UserIdRangeTooLarge {
                max_user_id: 1_000_000_000,
                num_observed: 2,
            }
        );

        let store = RatingStore::from_records(
            vec![Item::new(10, "Alien")],
            ratings,
            UserIdPolicy::Observed,
        )
        .unwrap();
        assert_eq!(store.user_ids(), vec![1, 1_000_000_000]);
    }

    #[test]
    fn small_contiguous_gaps_are_filled() {
        let store = RatingStore::from_records(
            vec![Item::new(10, "Alien")],
            vec![RatingRecord::new(1, 10, 4.0), RatingRecord::new(1000, 10, 3.0)],
            UserIdPolicy::Contiguous,
        )
        .unwrap();

        assert_eq!(store.num_users(), 1000);
    }

    #[test]
    fn rejects_ratings_before_items() {
        let mut builder = RatingStore::builder();
        let result = builder.load_ratings(vec![RatingRecord::new(1, 1, 4.0)]);

        assert_eq!(result.unwrap_err(), RecommendationError::RatingsBeforeItems);
    }

    #[test]
    fn unknown_lookups_fail() {
        let store = small_store();

        assert_eq!(
            store.profile(0).unwrap_err(),
            RecommendationError::UnknownUser { user_id: 0 }
        );
        assert_eq!(
            store.item(7).unwrap_err(),
            RecommendationError::UnknownItem { item_id: 7 }
        );
        assert_eq!(store.item(2).unwrap().title(), "Heat");
        assert_eq!(store.item_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_ratings_give_no_users() {
        let store =
            RatingStore::from_records(vec![Item::new(1, "Alien")], vec![], UserIdPolicy::Contiguous)
                .unwrap();

        assert_eq!(store.num_users(), 0);
        assert_eq!(store.rating_count(1), 0);
    }
}
