//! Live search over stdin.
//!
//! Each line replaces the whole search box. Lines starting with `:sort`
//! change the ordering, e.g. `:sort rank desc`.

use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::top::format_row;
use crate::services::{Committed, QueryOptions, SearchPipeline};
use crate::state::AppState;

pub async fn cmd_interactive(state: &AppState) -> anyhow::Result<()> {
    let movies = state.catalogue.fetch_top_movies().await?;
    let search = &state.config.search;
    let mut options = QueryOptions::new(search.default_sort, search.default_order);

    println!(
        "Searching {} movies. Type to search, ':sort <title|rank> [asc|desc]' to reorder.",
        movies.len()
    );

    let pipeline = SearchPipeline::spawn(Arc::new(movies), options, search.debounce());
    let mut committed = pipeline.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                if let Some(args) = line.strip_prefix(":sort") {
                    match parse_sort(args, options) {
                        Ok(updated) => {
                            options = updated;
                            pipeline.set_options(options);
                        }
                        Err(e) => println!("{e}"),
                    }
                } else {
                    pipeline.input(line);
                }
            }
            changed = committed.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = committed.borrow_and_update().clone();
                print_committed(&current);
                printed = current.revision;
            }
        }
    }

    let last = pipeline.raw();
    let current = committed
        .wait_for(|c| c.search == last && c.options == options)
        .await
        .context("Search pipeline stopped")?
        .clone();
    if current.revision > printed {
        print_committed(&current);
    }

    Ok(())
}

fn parse_sort(args: &str, current: QueryOptions) -> Result<QueryOptions, String> {
    let mut parts = args.split_whitespace();
    let sort_key = match parts.next() {
        Some(key) => key.parse()?,
        None => return Err("Usage: :sort <title|rank> [asc|desc]".to_string()),
    };
    let sort_order = match parts.next() {
        Some(order) => order.parse()?,
        None => current.sort_order,
    };
    Ok(QueryOptions::new(sort_key, sort_order))
}

fn print_committed(committed: &Committed) {
    if committed.search.trim().is_empty() {
        return;
    }
    println!(
        "{} result(s) for '{}' (by {}, {})",
        committed.results.len(),
        committed.search.trim(),
        committed.options.sort_key,
        committed.options.sort_order
    );
    for movie in committed.results.iter() {
        println!("  • {}", format_row(movie, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SortKey, SortOrder};

    #[test]
    fn sort_command_keeps_order_when_omitted() {
        let current = QueryOptions::new(SortKey::Title, SortOrder::Descending);
        assert_eq!(
            parse_sort(" rank", current).unwrap(),
            QueryOptions::new(SortKey::Rank, SortOrder::Descending)
        );
        assert_eq!(
            parse_sort(" title asc", current).unwrap(),
            QueryOptions::new(SortKey::Title, SortOrder::Ascending)
        );
    }

    #[test]
    fn sort_command_rejects_bad_input() {
        let current = QueryOptions::default();
        assert!(parse_sort("", current).is_err());
        assert!(parse_sort(" year", current).is_err());
        assert!(parse_sort(" rank sideways", current).is_err());
    }
}
