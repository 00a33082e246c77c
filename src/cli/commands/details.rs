//! Movie details command handler

use crate::domain::MovieId;
use crate::models::poster_url;
use crate::services::FetchState;
use crate::state::AppState;

pub async fn cmd_details(state: &AppState, id: i64) -> anyhow::Result<()> {
    let id = MovieId::new(id);

    let details = match state.details.load(id).await {
        FetchState::Ready(details) => details,
        FetchState::Failed(message) => {
            anyhow::bail!("Could not load movie {id}: {message}")
        }
        FetchState::Loading => return Ok(()),
    };

    println!("{}", details.title);
    if let Some(tagline) = details.tagline() {
        println!("  \"{tagline}\"");
    }
    println!("{:-<60}", "");
    println!("Released: {}", details.release_label());
    println!("Runtime:  {}", details.runtime_label());
    println!("Rating:   {}", details.rating_label());

    if !details.genres.is_empty() {
        let names: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        println!("Genres:   {}", names.join(", "));
    }

    if let Some(url) = poster_url(
        &state.config.tmdb.image_base_url,
        "w500",
        details.poster_path.as_deref(),
    ) {
        println!("Poster:   {url}");
    }

    if let Some(overview) = details.overview.as_deref().filter(|o| !o.is_empty()) {
        println!();
        println!("{overview}");
    }

    let neighbors = state.details.neighbors(id);
    if neighbors.previous.is_some() || neighbors.next.is_some() {
        println!();
        if let Some(previous) = neighbors.previous {
            println!("Previous: cinelist details {previous}");
        }
        if let Some(next) = neighbors.next {
            println!("Next:     cinelist details {next}");
        }
    }

    Ok(())
}
