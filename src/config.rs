//! Runtime configuration.
use std::path::{Path, PathBuf};

use crate::data::UserIdPolicy;
use crate::service::{DEFAULT_MIN_RATINGS, DEFAULT_RESULTS};

/// Where the data lives and the request defaults used when a caller
/// leaves a parameter out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    data_dir: PathBuf,
    user_id_policy: UserIdPolicy,
    default_results: usize,
    default_min_ratings: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            user_id_policy: UserIdPolicy::Contiguous,
            default_results: DEFAULT_RESULTS,
            default_min_ratings: DEFAULT_MIN_RATINGS,
        }
    }
}

impl Config {
    /// Set the data folder.
    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the user id policy.
    pub fn with_user_id_policy(mut self, policy: UserIdPolicy) -> Self {
        self.user_id_policy = policy;
        self
    }

    /// Set the default number of result rows.
    pub fn with_default_results(mut self, default_results: usize) -> Self {
        self.default_results = default_results;
        self
    }

    /// Set the default minimum number of ratings per recommended item.
    pub fn with_default_min_ratings(mut self, default_min_ratings: usize) -> Self {
        self.default_min_ratings = default_min_ratings;
        self
    }

    /// The data folder.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The user id policy.
    pub fn user_id_policy(&self) -> UserIdPolicy {
        self.user_id_policy
    }

    /// The default number of result rows.
    pub fn default_results(&self) -> usize {
        self.default_results
    }

    /// The default minimum number of ratings.
    pub fn default_min_ratings(&self) -> usize {
        self.default_min_ratings
    }

    /// Load the configured data folder into a rating store.
    #[cfg(feature = "datasets")]
    pub fn load_store(&self) -> Result<crate::data::RatingStore, failure::Error> {
        crate::datasets::load_dir(&self.data_dir, self.user_id_policy)
    }
}
