use crate::state::AppState;

pub async fn cmd_genres(state: &AppState, refresh: bool) -> anyhow::Result<()> {
    let genres = if refresh {
        state.genres.refresh_genres().await?
    } else {
        state.genres.fetch_genres().await?
    };

    if genres.is_empty() {
        println!("No genres available.");
        return Ok(());
    }

    println!("Genres ({} total)", genres.len());
    println!("{:-<40}", "");
    for genre in &genres {
        println!("{:>6}  {}", genre.id, genre.name);
    }

    Ok(())
}
