use std::fs;
use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use crate::errors::PersistError;
use crate::models::forecast::ForecastDocument;

/// Path of the forecast document for a city
///
/// # Arguments
///
/// * 'docs_dir' - directory documents are kept in
/// * 'city' - name of the city
pub fn document_path(docs_dir: &str, city: &str) -> PathBuf {
    Path::new(docs_dir).join(format!("{}_forecast.json", city.to_lowercase()))
}

/// Saves a forecast document as pretty printed json, replacing any earlier document for the
/// same city. The directory is created if missing.
///
/// # Arguments
///
/// * 'docs_dir' - directory to save the document in
/// * 'doc' - the document to save
pub fn save_document(docs_dir: &str, doc: &ForecastDocument) -> Result<PathBuf, PersistError> {
    fs::create_dir_all(docs_dir)?;
    let path = document_path(docs_dir, &doc.city);

    let json = serde_json::to_string_pretty(doc)?;
    fs::write(&path, json)?;

    Ok(path)
}

/// Loads the forecast document for a city
///
/// # Arguments
///
/// * 'docs_dir' - directory the document is kept in
/// * 'city' - name of the city
pub fn load_document(docs_dir: &str, city: &str) -> Result<ForecastDocument, PersistError> {
    let path = document_path(docs_dir, city);
    if !path.exists() {
        return Err(PersistError::NotFound(path.display().to_string()));
    }

    let json = fs::read_to_string(&path)?;
    let doc: ForecastDocument = serde_json::from_str(&json)?;

    Ok(doc)
}

/// Loads the forecast document for a city and checks that it is for the given date
///
/// # Arguments
///
/// * 'docs_dir' - directory the document is kept in
/// * 'city' - name of the city
/// * 'date' - the forecast date the document must carry
pub fn load_document_for(docs_dir: &str, city: &str, date: NaiveDate) -> Result<ForecastDocument, PersistError> {
    let doc = load_document(docs_dir, city)?;
    if doc.date != date {
        return Err(PersistError::Stale { found: doc.date, expected: date });
    }

    Ok(doc)
}

/// Removes the forecast document for a city, returns true if there was one
///
/// # Arguments
///
/// * 'docs_dir' - directory the document is kept in
/// * 'city' - name of the city
pub fn remove_document(docs_dir: &str, city: &str) -> Result<bool, PersistError> {
    let path = document_path(docs_dir, city);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path)?;

    Ok(true)
}
