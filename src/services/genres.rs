use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::clients::{TmdbClient, TmdbError};
use crate::db::repositories::{CacheRepository, GENRE_CACHE};
use crate::domain::GenreId;
use crate::models::{Genre, Movie};

#[derive(Clone)]
pub struct GenreService {
    client: TmdbClient,
    cache: CacheRepository,
}

impl GenreService {
    #[must_use]
    pub const fn new(client: TmdbClient, cache: CacheRepository) -> Self {
        Self { client, cache }
    }

    pub async fn fetch_genres(&self) -> Result<Vec<Genre>, TmdbError> {
        if let Some(cached) = self.cache.read::<Vec<Genre>>(GENRE_CACHE) {
            debug!(count = cached.len(), "Using cached genres");
            return Ok(cached);
        }

        self.refresh_genres().await
    }

    pub async fn refresh_genres(&self) -> Result<Vec<Genre>, TmdbError> {
        let genres = self.client.genres().await?;

        if let Err(e) = self.cache.write(GENRE_CACHE, &genres) {
            warn!(error = %e, "Failed to cache genres");
        }

        info!(count = genres.len(), "Fetched genre list");
        Ok(genres)
    }
}

/// Genre selection for the gallery view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Only(GenreId),
}

/// Movies tagged with the selected genre, in input order.
#[must_use]
pub fn filter_by_genre(movies: &[Movie], filter: GenreFilter) -> Vec<Movie> {
    match filter {
        GenreFilter::All => movies.to_vec(),
        GenreFilter::Only(id) => movies
            .iter()
            .filter(|m| m.genre_ids.contains(&id))
            .cloned()
            .collect(),
    }
}

/// Resolves genre ids to names at query time.
#[derive(Debug, Clone, Default)]
pub struct GenreIndex {
    names: HashMap<GenreId, String>,
}

impl GenreIndex {
    #[must_use]
    pub fn new(genres: &[Genre]) -> Self {
        Self {
            names: genres.iter().map(|g| (g.id, g.name.clone())).collect(),
        }
    }

    #[must_use]
    pub fn name(&self, id: GenreId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Names for the movie's genres; unknown ids are skipped.
    #[must_use]
    pub fn names_for(&self, movie: &Movie) -> Vec<&str> {
        movie.genre_ids.iter().filter_map(|id| self.name(*id)).collect()
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<GenreId> {
        let wanted = name.trim().to_lowercase();
        self.names
            .iter()
            .find(|(_, n)| n.to_lowercase() == wanted)
            .map(|(id, _)| *id)
    }
}
