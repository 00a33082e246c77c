use super::top::format_row;
use crate::domain::{SortKey, SortOrder};
use crate::services::{GenreIndex, QueryOptions, run_query};
use crate::state::AppState;

pub async fn cmd_search(
    state: &AppState,
    query: &str,
    sort: Option<SortKey>,
    order: Option<SortOrder>,
) -> anyhow::Result<()> {
    let options = QueryOptions::new(
        sort.unwrap_or(state.config.search.default_sort),
        order.unwrap_or(state.config.search.default_order),
    );

    let movies = state.catalogue.fetch_top_movies().await?;
    let results = run_query(&movies, query, options);

    if results.is_empty() {
        println!("No movies found matching '{query}'");
        return Ok(());
    }

    let genres = GenreIndex::new(&state.genres.fetch_genres().await?);

    println!(
        "Search Results for '{query}' (by {}, {})",
        options.sort_key, options.sort_order
    );
    println!("{:-<70}", "");
    for movie in &results {
        println!("• {}", format_row(movie, Some(&genres)));
    }

    Ok(())
}
