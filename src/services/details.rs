use std::fmt;
use tracing::{debug, error};

use crate::clients::TmdbClient;
use crate::domain::MovieId;
use crate::models::{Movie, MovieDetails};
use crate::services::CatalogueService;

/// Loading/error/ready state handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> FetchState<T> {
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// A failed fetch can be re-triggered with the same call.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Adjacent movies within the cached top-N sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub previous: Option<MovieId>,
    pub next: Option<MovieId>,
}

#[must_use]
pub fn neighbors(sequence: &[Movie], id: MovieId) -> Neighbors {
    let Some(index) = sequence.iter().position(|m| m.id == id) else {
        return Neighbors::default();
    };

    Neighbors {
        previous: index
            .checked_sub(1)
            .and_then(|i| sequence.get(i))
            .map(|m| m.id),
        next: sequence.get(index + 1).map(|m| m.id),
    }
}

/// Single-movie detail pages.
///
/// Details are fetched live on every call and never cached. An in-flight
/// fetch is not cancelled when a newer one starts; each caller gets the
/// response to its own request.
#[derive(Clone)]
pub struct DetailsService {
    client: TmdbClient,
    catalogue: CatalogueService,
}

impl DetailsService {
    #[must_use]
    pub const fn new(client: TmdbClient, catalogue: CatalogueService) -> Self {
        Self { client, catalogue }
    }

    pub async fn load(&self, id: MovieId) -> FetchState<MovieDetails> {
        debug!(%id, "Fetching movie details");
        let result = self.client.movie_details(id).await;
        if let Err(e) = &result {
            error!(%id, error = %e, "Failed to fetch movie details");
        }
        FetchState::from_result(result)
    }

    #[must_use]
    pub fn neighbors(&self, id: MovieId) -> Neighbors {
        neighbors(&self.catalogue.cached_sequence(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(ids: &[i64]) -> Vec<Movie> {
        ids.iter()
            .map(|id| serde_json::from_value(serde_json::json!({ "id": id })).unwrap())
            .collect()
    }

    #[test]
    fn neighbors_in_middle() {
        let movies = sequence(&[10, 20, 30]);
        let n = neighbors(&movies, MovieId::new(20));
        assert_eq!(n.previous, Some(MovieId::new(10)));
        assert_eq!(n.next, Some(MovieId::new(30)));
    }

    #[test]
    fn neighbors_at_edges() {
        let movies = sequence(&[10, 20, 30]);
        assert_eq!(neighbors(&movies, MovieId::new(10)).previous, None);
        assert_eq!(neighbors(&movies, MovieId::new(30)).next, None);
    }

    #[test]
    fn neighbors_for_unknown_id() {
        let movies = sequence(&[10, 20]);
        assert_eq!(neighbors(&movies, MovieId::new(99)), Neighbors::default());
        assert_eq!(neighbors(&[], MovieId::new(10)), Neighbors::default());
    }

    #[test]
    fn fetch_state_from_result() {
        let ok: FetchState<u32> = FetchState::from_result(Ok::<_, String>(3));
        assert_eq!(ok.ready(), Some(&3));
        assert!(!ok.is_retryable());

        let failed: FetchState<u32> = FetchState::from_result(Err("boom"));
        assert_eq!(failed, FetchState::Failed("boom".to_string()));
        assert!(failed.is_retryable());
        assert!(FetchState::<u32>::Loading.is_loading());
    }
}
