pub mod cache;

pub use cache::{CacheNamespace, CacheRepository, GENRE_CACHE, MOVIE_CACHE};
