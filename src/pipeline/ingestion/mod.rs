// Pipeline ingestion: source presence checks and readers for the three inputs

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{DeserializeRecordsIntoIter, ReaderBuilder};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SourcesConfig;
use crate::domain::{RawCatalogRow, RawMovieRecord, RawRatingRow};
use crate::error::{EtlError, Result};

pub const SCRAPED_SOURCE: &str = "scraped";
pub const CATALOG_SOURCE: &str = "catalog";
pub const RATINGS_SOURCE: &str = "ratings";

fn require(kind: &'static str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(EtlError::MissingSource {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Fails on the first absent source; nothing is transformed with partial inputs.
pub fn ensure_sources_exist(sources: &SourcesConfig) -> Result<()> {
    require(SCRAPED_SOURCE, &sources.scraped)?;
    require(CATALOG_SOURCE, &sources.catalog)?;
    require(RATINGS_SOURCE, &sources.ratings)?;
    debug!("All sources present");
    Ok(())
}

/// Reads the scraped dump: a JSON array with one object per page.
pub fn read_scraped_movies(path: &Path) -> Result<Vec<RawMovieRecord>> {
    require(SCRAPED_SOURCE, path)?;
    let reader = BufReader::new(File::open(path)?);
    let values: Vec<Value> = serde_json::from_reader(reader)?;

    let total = values.len();
    let records: Vec<RawMovieRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match value {
            Value::Object(map) => Some(map),
            other => {
                warn!("Skipping scraped entry {} that is not an object: {}", idx, other);
                None
            }
        })
        .collect();

    info!("Read {} scraped records ({} entries) from {}", records.len(), total, path.display());
    Ok(records)
}

/// Reads the catalog CSV. Short rows are tolerated; missing trailing fields read as empty.
pub fn read_catalog(path: &Path) -> Result<Vec<RawCatalogRow>> {
    require(CATALOG_SOURCE, path)?;
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<RawCatalogRow>() {
        rows.push(result?);
    }
    info!("Read {} catalog rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Opens the ratings CSV as a stream of fixed-size chunks.
pub fn read_rating_chunks(path: &Path, chunk_size: usize) -> Result<RatingChunks> {
    require(RATINGS_SOURCE, path)?;
    if chunk_size == 0 {
        return Err(EtlError::Config("ratings chunk size must be positive".to_string()));
    }
    let reader = ReaderBuilder::new().from_path(path)?;
    Ok(RatingChunks {
        rows: reader.into_deserialize(),
        chunk_size,
        done: false,
    })
}

/// Yields the ratings source `chunk_size` rows at a time. The last chunk may be shorter;
/// an empty source yields nothing. Iteration stops after the first error.
pub struct RatingChunks {
    rows: DeserializeRecordsIntoIter<File, RawRatingRow>,
    chunk_size: usize,
    done: bool,
}

impl Iterator for RatingChunks {
    type Item = Result<Vec<RawRatingRow>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = Vec::with_capacity(self.chunk_size.min(64 * 1024));
        while chunk.len() < self.chunk_size {
            match self.rows.next() {
                Some(Ok(row)) => chunk.push(row),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_scraped_non_objects_are_skipped() {
        let file = file_with(r#"[{"title": "Heat"}, "junk", {"title": "Ronin"}]"#);
        let records = read_scraped_movies(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("title"), Some(&Value::String("Ronin".into())));
    }

    #[test]
    fn test_missing_source_is_reported() {
        let err = read_catalog(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, EtlError::MissingSource { kind: "catalog", .. }));
    }

    #[test]
    fn test_catalog_short_rows_tolerated() {
        let file = file_with("adult,budget,id,imdb_id,title\nFalse,0,862,tt0114709,Toy Story\nFalse,5\n");
        let rows = read_catalog(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Toy Story");
        assert_eq!(rows[1].id, "");
    }

    #[test]
    fn test_rating_chunks() {
        let mut body = String::from("userId,movieId,rating,timestamp\n");
        for i in 0..5 {
            body.push_str(&format!("{i},31,2.5,1260759144\n"));
        }
        let file = file_with(&body);

        let sizes: Vec<usize> = read_rating_chunks(file.path(), 2)
            .unwrap()
            .map(|chunk| chunk.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_rating_chunks_stop_at_bad_row() {
        let file = file_with("userId,movieId,rating,timestamp\n1,31,2.5,1\nx,31,2.5,1\n1,32,3.0,1\n");
        let results: Vec<_> = read_rating_chunks(file.path(), 10).unwrap().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(EtlError::Csv(_))));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let file = file_with("userId,movieId,rating,timestamp\n");
        assert!(read_rating_chunks(file.path(), 0).is_err());
    }
}
