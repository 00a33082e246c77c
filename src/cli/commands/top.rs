//! Top-rated catalogue listing

use crate::models::Movie;
use crate::services::{GenreFilter, GenreIndex, filter_by_genre};
use crate::state::AppState;

pub async fn cmd_top(
    state: &AppState,
    refresh: bool,
    genre: Option<&str>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let movies = if refresh {
        state.catalogue.refresh_top_movies().await?
    } else {
        state.catalogue.fetch_top_movies().await?
    };

    if movies.is_empty() {
        println!("The top-rated listing is empty.");
        return Ok(());
    }

    let genres = GenreIndex::new(&state.genres.fetch_genres().await?);

    let filter = match genre {
        Some(name) => match genres.find(name) {
            Some(id) => GenreFilter::Only(id),
            None => {
                println!("Unknown genre '{name}'");
                println!("Use 'cinelist genres' to list genre names");
                return Ok(());
            }
        },
        None => GenreFilter::All,
    };

    let shown = filter_by_genre(&movies, filter);
    let limit = limit.unwrap_or(shown.len());

    println!("Top Rated Movies ({} of {} shown)", shown.len().min(limit), movies.len());
    println!("{:-<70}", "");

    for movie in shown.iter().take(limit) {
        let rank = movies.iter().position(|m| m.id == movie.id).unwrap_or_default() + 1;
        println!("{rank:>3}. {}", format_row(movie, Some(&genres)));
    }

    Ok(())
}

/// One-line summary used by the listing commands.
pub(crate) fn format_row(movie: &Movie, genres: Option<&GenreIndex>) -> String {
    let mut row = movie.title.clone();
    if let Some(year) = movie.release_year() {
        row.push_str(&format!(" ({year})"));
    }
    row.push_str(&format!(
        "  ★ {:.1} | {} votes | ID: {}",
        movie.rating(),
        movie.votes(),
        movie.id
    ));

    if let Some(index) = genres {
        let names = index.names_for(movie);
        if !names.is_empty() {
            row.push_str(&format!(" | {}", names.join(", ")));
        }
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GenreId;
    use crate::models::Genre;

    #[test]
    fn row_includes_year_rating_and_genres() {
        let movie: Movie = serde_json::from_value(serde_json::json!({
            "id": 238,
            "title": "The Godfather",
            "release_date": "1972-03-14",
            "vote_average": 8.7,
            "vote_count": 21000,
            "genre_ids": [18, 80]
        }))
        .unwrap();
        let genres = GenreIndex::new(&[
            Genre {
                id: GenreId::new(18),
                name: "Drama".to_string(),
            },
            Genre {
                id: GenreId::new(80),
                name: "Crime".to_string(),
            },
        ]);

        assert_eq!(
            format_row(&movie, Some(&genres)),
            "The Godfather (1972)  ★ 8.7 | 21000 votes | ID: 238 | Drama, Crime"
        );
    }

    #[test]
    fn row_without_optional_fields() {
        let movie: Movie =
            serde_json::from_value(serde_json::json!({ "id": 1, "title": "Untitled" })).unwrap();
        assert_eq!(format_row(&movie, None), "Untitled  ★ 0.0 | 0 votes | ID: 1");
    }
}
