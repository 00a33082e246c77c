pub mod movie;

pub use movie::{Genre, Movie, MovieDetails, format_release_date, format_runtime, poster_url};
