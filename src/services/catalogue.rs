use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::clients::{TmdbClient, TmdbError};
use crate::config::CatalogueConfig;
use crate::db::repositories::{CacheRepository, MOVIE_CACHE};
use crate::models::Movie;

/// Acquires the top-rated catalogue through the expiring cache.
///
/// Concurrent cold-cache calls are not coalesced: each one hits the network
/// and writes the cache, and the last write wins.
#[derive(Clone)]
pub struct CatalogueService {
    client: TmdbClient,
    cache: CacheRepository,
    target_count: usize,
    page_size: usize,
}

impl CatalogueService {
    #[must_use]
    pub fn new(client: TmdbClient, cache: CacheRepository, config: &CatalogueConfig) -> Self {
        Self {
            client,
            cache,
            target_count: config.target_count,
            page_size: config.page_size.max(1),
        }
    }

    /// Cached catalogue when fresh, otherwise a full paginated fetch.
    pub async fn fetch_top_movies(&self) -> Result<Vec<Movie>, TmdbError> {
        if let Some(cached) = self.cache.read::<Vec<Movie>>(MOVIE_CACHE) {
            debug!(count = cached.len(), "Using cached top-rated movies");
            return Ok(cached);
        }

        self.refresh_top_movies().await
    }

    /// Fetches from the API and overwrites the cache, ignoring any fresh entry.
    ///
    /// A failed page fails the whole call; nothing partial is cached.
    pub async fn refresh_top_movies(&self) -> Result<Vec<Movie>, TmdbError> {
        let max_pages = self.target_count.div_ceil(self.page_size);
        let mut movies = Vec::with_capacity(self.target_count);

        for page in 1..=max_pages {
            let results = self.client.top_rated(page).await?;
            if results.is_empty() {
                debug!(page, "Top-rated listing exhausted");
                break;
            }

            movies.extend(results);
            if movies.len() >= self.target_count {
                break;
            }
        }

        movies.truncate(self.target_count);
        let movies = deduplicate(movies);

        if let Err(e) = self.cache.write(MOVIE_CACHE, &movies) {
            warn!(error = %e, "Failed to cache top-rated movies");
        }

        info!(count = movies.len(), "Fetched top-rated movies");
        Ok(movies)
    }

    /// Last stored catalogue regardless of age, empty when nothing usable is stored.
    #[must_use]
    pub fn cached_sequence(&self) -> Vec<Movie> {
        self.cache
            .read_stale::<Vec<Movie>>(MOVIE_CACHE)
            .unwrap_or_default()
    }
}

/// Drops repeated ids, keeping the first occurrence in order.
#[must_use]
pub fn deduplicate(movies: Vec<Movie>) -> Vec<Movie> {
    let mut seen = HashSet::with_capacity(movies.len());
    let mut duplicates = Vec::new();

    let deduped: Vec<Movie> = movies
        .into_iter()
        .filter(|movie| {
            if seen.insert(movie.id) {
                true
            } else {
                duplicates.push(movie.id);
                false
            }
        })
        .collect();

    if !duplicates.is_empty() {
        warn!(
            count = duplicates.len(),
            ids = ?duplicates,
            "Removed duplicate movie ids before caching"
        );
    }

    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MovieId;

    fn movie(id: i64) -> Movie {
        serde_json::from_value(serde_json::json!({ "id": id, "title": format!("Movie {id}") }))
            .unwrap()
    }

    #[test]
    fn deduplicate_keeps_first_occurrence_order() {
        let mut second_three = movie(3);
        second_three.title = "later copy".to_string();

        let result = deduplicate(vec![movie(3), movie(1), second_three, movie(2), movie(1)]);
        let ids: Vec<MovieId> = result.iter().map(|m| m.id).collect();

        assert_eq!(ids, vec![MovieId::new(3), MovieId::new(1), MovieId::new(2)]);
        assert_eq!(result[0].title, "Movie 3");
    }

    #[test]
    fn deduplicate_without_repeats_is_identity() {
        let input = vec![movie(1), movie(2)];
        assert_eq!(deduplicate(input.clone()), input);
    }
}
