//! Final column selection, ordering and renaming for the consolidated movie table.

use crate::domain::{CellValue, MergedMovieRecord, Table};
use crate::pipeline::processing::ratings::RatingHistogram;

/// Where an output column takes its value from.
#[derive(Debug, Clone, Copy)]
enum Field {
    ImdbId,
    KaggleId,
    Title,
    OriginalTitle,
    Tagline,
    BelongsToCollection,
    Runtime,
    Budget,
    Revenue,
    ReleaseDate,
    Popularity,
    VoteAverage,
    VoteCount,
    Genres,
    OriginalLanguage,
    Overview,
    SpokenLanguages,
    ProductionCompanies,
    ProductionCountries,
    /// A scraped attribute, by its canonical name.
    Scraped(&'static str),
}

const OUTPUT_COLUMNS: [(&str, Field); 31] = [
    ("imdb_id", Field::ImdbId),
    ("kaggle_id", Field::KaggleId),
    ("title", Field::Title),
    ("original_title", Field::OriginalTitle),
    ("tagline", Field::Tagline),
    ("belongs_to_collection", Field::BelongsToCollection),
    ("wikipedia_url", Field::Scraped("url")),
    ("imdb_link", Field::Scraped("imdb_link")),
    ("runtime", Field::Runtime),
    ("budget", Field::Budget),
    ("revenue", Field::Revenue),
    ("release_date", Field::ReleaseDate),
    ("popularity", Field::Popularity),
    ("vote_average", Field::VoteAverage),
    ("vote_count", Field::VoteCount),
    ("genres", Field::Genres),
    ("original_language", Field::OriginalLanguage),
    ("overview", Field::Overview),
    ("spoken_languages", Field::SpokenLanguages),
    ("country", Field::Scraped("Country")),
    ("production_companies", Field::ProductionCompanies),
    ("production_countries", Field::ProductionCountries),
    ("distributor", Field::Scraped("Distributor")),
    ("producers", Field::Scraped("Producer(s)")),
    ("director", Field::Scraped("Director")),
    ("starring", Field::Scraped("Starring")),
    ("cinematography", Field::Scraped("Cinematography")),
    ("editors", Field::Scraped("Editor(s)")),
    ("writers", Field::Scraped("Writer(s)")),
    ("composers", Field::Scraped("Composer(s)")),
    ("based_on", Field::Scraped("Based on")),
];

impl Field {
    fn cell(self, movie: &MergedMovieRecord) -> CellValue {
        let catalog = &movie.catalog;
        match self {
            Field::ImdbId => CellValue::Text(movie.imdb_id.clone()),
            Field::KaggleId => CellValue::Integer(catalog.id),
            Field::Title => catalog.title.clone().into(),
            Field::OriginalTitle => catalog.original_title.clone().into(),
            Field::Tagline => catalog.tagline.clone().into(),
            Field::BelongsToCollection => catalog.belongs_to_collection.clone().into(),
            Field::Runtime => movie.runtime.into(),
            Field::Budget => movie.budget.into(),
            Field::Revenue => movie.revenue.into(),
            Field::ReleaseDate => catalog.release_date.into(),
            Field::Popularity => catalog.popularity.into(),
            Field::VoteAverage => catalog.vote_average.into(),
            Field::VoteCount => catalog.vote_count.into(),
            Field::Genres => catalog.genres.clone().into(),
            Field::OriginalLanguage => catalog.original_language.clone().into(),
            Field::Overview => catalog.overview.clone().into(),
            Field::SpokenLanguages => catalog.spoken_languages.clone().into(),
            Field::ProductionCompanies => catalog.production_companies.clone().into(),
            Field::ProductionCountries => catalog.production_countries.clone().into(),
            Field::Scraped(key) => CellValue::from_json(movie.attributes.get(key)),
        }
    }
}

/// Names of the fixed (non-rating) output columns, in order.
pub fn fixed_columns() -> Vec<String> {
    OUTPUT_COLUMNS.iter().map(|(name, _)| name.to_string()).collect()
}

/// Left-joins the histogram onto the merged movies (on the catalog's internal id) and
/// projects the consolidated table. Movies without ratings get zero in every rating column.
pub fn project(movies: &[MergedMovieRecord], histogram: &RatingHistogram) -> Table {
    let mut columns = fixed_columns();
    columns.extend(histogram.column_labels());

    let mut table = Table::new(columns);
    for movie in movies {
        let mut row: Vec<CellValue> = OUTPUT_COLUMNS
            .iter()
            .map(|(_, field)| field.cell(movie))
            .collect();
        row.extend(
            histogram
                .row_for(movie.catalog.id)
                .into_iter()
                .map(|count| CellValue::Integer(count as i64)),
        );
        table.rows.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogRecord, Rating, RatingValue};
    use chrono::NaiveDate;
    use serde_json::{json, Map};

    fn merged(id: i64, imdb_id: &str) -> MergedMovieRecord {
        let mut attributes = Map::new();
        attributes.insert("Director".into(), json!("Kathryn Bigelow"));
        attributes.insert("Starring".into(), json!(["Keanu Reeves", "Patrick Swayze"]));
        attributes.insert("url".into(), json!("https://en.wikipedia.org/wiki/Point_Break"));
        MergedMovieRecord {
            imdb_id: imdb_id.into(),
            catalog: CatalogRecord {
                id,
                imdb_id: Some(imdb_id.into()),
                title: Some("Point Break".into()),
                original_title: Some("Point Break".into()),
                tagline: None,
                belongs_to_collection: None,
                homepage: None,
                poster_path: None,
                status: Some("Released".into()),
                genres: None,
                original_language: Some("en".into()),
                overview: None,
                spoken_languages: None,
                production_companies: None,
                production_countries: None,
                budget: 24_000_000,
                revenue: Some(83_531_958.0),
                runtime: Some(122.0),
                popularity: Some(9.2),
                vote_average: Some(6.8),
                vote_count: Some(600.0),
                release_date: NaiveDate::from_ymd_opt(1991, 7, 12),
                video: false,
            },
            attributes,
            runtime: Some(122.0),
            budget: Some(24_000_000.0),
            revenue: Some(83_531_958.0),
        }
    }

    fn rating(movie_id: i64, value: f64) -> Rating {
        Rating {
            user_id: 1,
            movie_id,
            rating: RatingValue(value),
            rated_at: None,
        }
    }

    #[test]
    fn test_columns_ordered_and_renamed() {
        let histogram = RatingHistogram::from_ratings(&[rating(1, 2.5), rating(1, 5.0)]);
        let table = project(&[merged(1, "tt0102685")], &histogram);

        assert_eq!(table.columns.len(), 33);
        assert_eq!(table.columns[0], "imdb_id");
        assert_eq!(table.columns[1], "kaggle_id");
        assert_eq!(table.columns[6], "wikipedia_url");
        assert_eq!(&table.columns[31..], ["rating_2.5", "rating_5.0"]);

        assert_eq!(table.cell(0, "kaggle_id"), Some(&CellValue::Integer(1)));
        assert_eq!(table.cell(0, "title"), Some(&CellValue::Text("Point Break".into())));
        assert_eq!(
            table.cell(0, "director"),
            Some(&CellValue::Text("Kathryn Bigelow".into()))
        );
        assert_eq!(
            table.cell(0, "starring"),
            Some(&CellValue::Json(json!(["Keanu Reeves", "Patrick Swayze"])))
        );
        assert_eq!(
            table.cell(0, "release_date"),
            Some(&CellValue::Date(NaiveDate::from_ymd_opt(1991, 7, 12).unwrap()))
        );
        assert_eq!(table.cell(0, "rating_5.0"), Some(&CellValue::Integer(1)));
    }

    #[test]
    fn test_missing_scraped_attribute_is_null() {
        let table = project(&[merged(1, "tt0102685")], &RatingHistogram::default());
        assert_eq!(table.cell(0, "based_on"), Some(&CellValue::Null));
        assert_eq!(table.columns.len(), 31);
    }

    #[test]
    fn test_unrated_movie_gets_zero_counts() {
        let histogram = RatingHistogram::from_ratings(&[rating(1, 4.0)]);
        let table = project(&[merged(1, "tt0000001"), merged(2, "tt0000002")], &histogram);
        assert_eq!(table.cell(0, "rating_4.0"), Some(&CellValue::Integer(1)));
        assert_eq!(table.cell(1, "rating_4.0"), Some(&CellValue::Integer(0)));
    }
}
