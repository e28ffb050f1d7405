//! Loading catalogs and ratings from CSV data folders.
//!
//! A data folder holds two files with header rows:
//!
//! - `movies.csv`: `movieId,title[,...]`
//! - `ratings.csv`: `userId,movieId,rating[,timestamp]`
//!
//! Extra columns are ignored.
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::{Item, RatingRecord, RatingStore, UserIdPolicy};

/// File name of the item catalog inside a data folder.
pub const ITEMS_FILE: &str = "movies.csv";
/// File name of the ratings inside a data folder.
pub const RATINGS_FILE: &str = "ratings.csv";

/// Dataset error types.
#[derive(Debug, Fail)]
pub enum DatasetError {
    /// A required data file does not exist.
    #[fail(display = "Missing data file: {}.", _0)]
    MissingFile(String),
}

fn existing(path: PathBuf) -> Result<PathBuf, DatasetError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(DatasetError::MissingFile(path.display().to_string()))
    }
}

/// Read catalog entries from a CSV file.
pub fn read_items<P: AsRef<Path>>(path: P) -> Result<Vec<Item>, failure::Error> {
    let path = existing(path.as_ref().to_owned())?;
    let mut reader = csv::Reader::from_path(path)?;
    let items = reader.deserialize().collect::<Result<Vec<Item>, _>>()?;

    Ok(items)
}

/// Read rating records from a CSV file.
pub fn read_ratings<P: AsRef<Path>>(path: P) -> Result<Vec<RatingRecord>, failure::Error> {
    let path = existing(path.as_ref().to_owned())?;
    let mut reader = csv::Reader::from_path(path)?;
    let ratings = reader
        .deserialize()
        .collect::<Result<Vec<RatingRecord>, _>>()?;

    Ok(ratings)
}

/// Load a data folder and build the rating store from it.
pub fn load_dir<P: AsRef<Path>>(
    dir: P,
    policy: UserIdPolicy,
) -> Result<RatingStore, failure::Error> {
    let dir = dir.as_ref();

    let items = read_items(dir.join(ITEMS_FILE))?;
    let ratings = read_ratings(dir.join(RATINGS_FILE))?;

    info!(
        dir = %dir.display(),
        num_items = items.len(),
        num_ratings = ratings.len(),
        "read data folder"
    );

    let mut builder = RatingStore::builder();
    builder
        .user_id_policy(policy)
        .load_items(items)?
        .load_ratings(ratings)?;

    Ok(builder.build()?)
}
