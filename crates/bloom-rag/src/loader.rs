//! Catalogue file loaders
//!
//! Each catalogue row becomes one raw document whose page content is the
//! row rendered as `header: value` lines, with the source file and 1-based
//! row number carried as metadata.

use std::path::{Path, PathBuf};

use bloom_core::{CatalogueRecord, Error, RawDocument, Result};

/// Loads a single catalogue CSV file, one document per row.
pub struct CsvCatalogueLoader {
    path: PathBuf,
}

impl CsvCatalogueLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<RawDocument>> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            Error::Ingestion(format!("failed to open {}: {}", self.path.display(), e))
        })?;

        let source = self.path.to_string_lossy().to_string();
        let mut documents = Vec::new();

        for (index, row) in reader.deserialize().enumerate() {
            let record: CatalogueRecord = row.map_err(|e| {
                Error::Serialization(format!(
                    "invalid catalogue row {} in {}: {}",
                    index + 1,
                    self.path.display(),
                    e
                ))
            })?;

            documents.push(RawDocument {
                page_content: record.to_page_content(),
                metadata: serde_json::json!({
                    "source": source,
                    "row": index + 1,
                }),
            });
        }

        Ok(documents)
    }
}

/// Loads every catalogue CSV file found in a directory.
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn load_all(&self) -> Result<Vec<RawDocument>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if is_catalogue_file(&path) {
                paths.push(path);
            }
        }
        // Deterministic ingestion order regardless of filesystem order.
        paths.sort();

        if paths.is_empty() {
            return Err(Error::NoResults(format!(
                "no catalogue files found in {}",
                self.dir.display()
            )));
        }

        let mut documents = Vec::new();
        for path in paths {
            tracing::info!("loading catalogue file {}", path.display());
            documents.extend(CsvCatalogueLoader::new(path).load()?);
        }

        Ok(documents)
    }
}

fn is_catalogue_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOGUE: &str = "\
title,description,rating,price,delivery mode
Intro to Go,A first course on the Go language,4.5,49,Self-paced
Advanced Rust,Ownership and async in depth,4.8,99,Instructor-led
";

    #[test]
    fn loads_one_document_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.csv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(CATALOGUE.as_bytes())
            .unwrap();

        let documents = CsvCatalogueLoader::new(&path).load().unwrap();
        assert_eq!(documents.len(), 2);

        assert!(documents[0].page_content.contains("title: Intro to Go"));
        assert!(documents[0].page_content.contains("price: 49"));
        assert_eq!(documents[0].metadata["row"], 1);
        assert!(documents[1].page_content.contains("delivery mode: Instructor-led"));
        assert_eq!(documents[1].metadata["row"], 2);
    }

    #[test]
    fn directory_loader_skips_non_catalogue_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("catalogue.csv"))
            .unwrap()
            .write_all(CATALOGUE.as_bytes())
            .unwrap();
        std::fs::File::create(dir.path().join("notes.txt"))
            .unwrap()
            .write_all(b"not a catalogue")
            .unwrap();

        let documents = DirectoryLoader::new(dir.path()).load_all().unwrap();
        assert_eq!(documents.len(), 2);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectoryLoader::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(err, Error::NoResults(_)));
    }

    #[test]
    fn malformed_rows_abort_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"title,description\nonly two columns here,oops\n")
            .unwrap();

        let err = CsvCatalogueLoader::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
