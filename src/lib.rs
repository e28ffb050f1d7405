#![deny(missing_docs)]
//! # cfrec
//!
//! `cfrec` implements neighbourhood-based collaborative filtering over
//! explicit ratings: given the ratings a user has given, it finds the users
//! with the most similar taste and recommends the items those neighbours
//! rated highly.
//!
//! Similarity between two users is the inverse squared Euclidean distance
//! over the items both have rated. A recommendation score is the
//! similarity-weighted average of the neighbours' ratings for an item.
//!
//! ## Example
//!
//! ```rust
//! # extern crate cfrec;
//! use cfrec::data::{Item, RatingRecord, RatingStore};
//! use cfrec::{recommendation, similarity};
//!
//! let mut builder = RatingStore::builder();
//! builder
//!     .load_items(vec![Item::new(1, "Alien"), Item::new(2, "Heat"), Item::new(3, "Ran")])
//!     .unwrap();
//! builder
//!     .load_ratings(vec![
//!         RatingRecord::new(1, 1, 5.0),
//!         RatingRecord::new(1, 2, 3.0),
//!         RatingRecord::new(2, 1, 4.0),
//!         RatingRecord::new(2, 2, 2.0),
//!         RatingRecord::new(2, 3, 5.0),
//!         RatingRecord::new(3, 1, 1.0),
//!         RatingRecord::new(3, 3, 3.0),
//!     ])
//!     .unwrap();
//! let store = builder.build().unwrap();
//!
//! let neighbours = similarity::rank_similar_users(&store, 1).unwrap();
//! assert_eq!(neighbours[0].user_id, 2);
//!
//! let recommended = recommendation::recommend(&store, 1, &neighbours, 1).unwrap();
//! assert_eq!(recommended[0].item_id, 3);
//! assert!((recommended[0].score - 4.7).abs() < 1e-4);
//! ```
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate failure;

pub mod config;
pub mod data;
#[cfg(feature = "datasets")]
pub mod datasets;
pub mod ranking;
pub mod recommendation;
pub mod service;
pub mod similarity;

pub use crate::config::Config;
pub use crate::data::{RatingStore, UserIdPolicy};
pub use crate::service::{RecommendationService, RequestParams};

/// Alias for user identifiers.
pub type UserId = usize;
/// Alias for item identifiers.
pub type ItemId = usize;
/// Alias for rating values and derived scores.
pub type Score = f64;

/// Errors raised while building the rating store or serving a request.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum RecommendationError {
    /// The requested user has no profile in the store.
    #[fail(display = "Unknown user: {}.", user_id)]
    UnknownUser {
        /// The requested user.
        user_id: UserId,
    },
    /// An item id does not resolve to a catalog entry.
    #[fail(display = "Unknown item: {}.", item_id)]
    UnknownItem {
        /// The unresolved item.
        item_id: ItemId,
    },
    /// Two catalog records share the same item id.
    #[fail(display = "Duplicate item id in catalog: {}.", item_id)]
    DuplicateItem {
        /// The repeated item id.
        item_id: ItemId,
    },
    /// A rating value is NaN or infinite.
    #[fail(display = "Invalid rating by user {} for item {}.", user_id, item_id)]
    InvalidRating {
        /// The rating user.
        user_id: UserId,
        /// The rated item.
        item_id: ItemId,
    },
    /// The contiguous user id range is far larger than the number of users
    /// that actually rated something.
    #[fail(
        display = "User id {} spans too many empty profiles for {} rating users; \
                   use the observed user id policy.",
        max_user_id, num_observed
    )]
    UserIdRangeTooLarge {
        /// The largest user id in the ratings.
        max_user_id: UserId,
        /// Number of distinct users in the ratings.
        num_observed: usize,
    },
    /// Ratings were loaded before the item catalog.
    #[fail(display = "Ratings must be loaded after the item catalog.")]
    RatingsBeforeItems,
    /// A request parameter is missing, non-numeric or out of range.
    #[fail(display = "Invalid value for parameter `{}`: {:?}.", name, value)]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The raw value that was rejected.
        value: String,
    },
    /// A user who rated an item is absent from the neighbour ranking.
    #[fail(display = "User {} is missing from the neighbour ranking.", user_id)]
    InconsistentState {
        /// The user that could not be found.
        user_id: UserId,
    },
}

impl RecommendationError {
    /// Whether the error was caused by the request rather than by the
    /// data or the engine.
    pub fn is_client_error(&self) -> bool {
        match self {
            RecommendationError::UnknownUser { .. }
            | RecommendationError::InvalidParameter { .. } => true,
            _ => false,
        }
    }
}
