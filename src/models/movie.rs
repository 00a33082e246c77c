use crate::domain::{GenreId, MovieId};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A catalogue entry as returned by the top-rated listing.
///
/// Numeric fields stay optional so a record missing its rating round-trips
/// through the cache unchanged; comparisons read them through the accessors,
/// which substitute zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<GenreId>,
}

impl Movie {
    #[must_use]
    pub fn rating(&self) -> f64 {
        self.vote_average.unwrap_or_default()
    }

    #[must_use]
    pub fn votes(&self) -> i64 {
        self.vote_count.unwrap_or_default()
    }

    /// Four-digit release year, if the release date carries one.
    #[must_use]
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .get(..4)
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Full record from the single-movie endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetails {
    pub id: MovieId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl MovieDetails {
    /// Rating with one decimal, or `N/A` when absent.
    #[must_use]
    pub fn rating_label(&self) -> String {
        self.vote_average
            .map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"))
    }

    #[must_use]
    pub fn runtime_label(&self) -> String {
        format_runtime(self.runtime)
    }

    #[must_use]
    pub fn release_label(&self) -> String {
        format_release_date(self.release_date.as_deref().unwrap_or_default())
    }

    /// Non-empty tagline, if any.
    #[must_use]
    pub fn tagline(&self) -> Option<&str> {
        self.tagline.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Formats a runtime in minutes as `2h 22m`, `45m`, or `N/A`.
#[must_use]
pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        None | Some(0) => "N/A".to_string(),
        Some(total) => {
            let hours = total / 60;
            let mins = total % 60;
            if hours > 0 {
                format!("{hours}h {mins}m")
            } else {
                format!("{mins}m")
            }
        }
    }
}

/// Formats an ISO `YYYY-MM-DD` date as `September 23, 1994`.
#[must_use]
pub fn format_release_date(date: &str) -> String {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_or_else(|_| "N/A".to_string(), |d| d.format("%B %-d, %Y").to_string())
}

/// Joins an image base URL, a size bucket (`w500`, `original`) and a poster path.
#[must_use]
pub fn poster_url(image_base_url: &str, size: &str, poster_path: Option<&str>) -> Option<String> {
    let path = poster_path.filter(|p| !p.is_empty())?;
    let base = image_base_url.trim_end_matches('/');
    if path.starts_with('/') {
        Some(format!("{base}/{size}{path}"))
    } else {
        Some(format!("{base}/{size}/{path}"))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
