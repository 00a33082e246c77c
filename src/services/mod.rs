pub mod catalogue;
pub use catalogue::{CatalogueService, deduplicate};

pub mod details;
pub use details::{DetailsService, FetchState, Neighbors, neighbors};

pub mod genres;
pub use genres::{GenreFilter, GenreIndex, GenreService, filter_by_genre};

pub mod input;
pub use input::{Committed, Debounce, SearchPipeline};

pub mod query;
pub use query::{MatchTier, QueryOptions, collate_titles, normalize, query, run_query};
