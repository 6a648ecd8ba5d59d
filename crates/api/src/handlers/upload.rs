//! Multipart form reading shared by every upload endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Multipart;
use kana_core::types::SourceFile;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// A fully-buffered multipart form: file parts in order, plus text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: Vec<(String, Arc<SourceFile>)>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Buffer every part. A part with a file name is a file; empty file
    /// parts (a file input left blank) are skipped.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let mime_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if bytes.is_empty() && file_name.is_empty() {
                        continue;
                    }
                    let file = SourceFile::new(file_name, mime_type, bytes.to_vec());
                    form.files.push((name, file.shared()));
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// All uploaded files, whatever their field name.
    pub fn into_files(self) -> Vec<Arc<SourceFile>> {
        self.files.into_iter().map(|(_, file)| file).collect()
    }

    /// The first file uploaded under `name`.
    pub fn file(&self, name: &str) -> Option<Arc<SourceFile>> {
        self.files
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, file)| Arc::clone(file))
    }

    /// Like [`UploadForm::file`] but required.
    pub fn require_file(&self, name: &str) -> AppResult<Arc<SourceFile>> {
        self.file(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing file field '{name}'")))
    }

    /// Every file uploaded under `name`, in order.
    pub fn files_named(&self, name: &str) -> Vec<Arc<SourceFile>> {
        self.files
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, file)| Arc::clone(file))
            .collect()
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Parse an optional enum field by its wire name, e.g. `"TikTok"`.
    pub fn choice<T: DeserializeOwned + Default>(&self, name: &str) -> AppResult<T> {
        match self.text(name).map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(T::default()),
            Some(value) => serde_json::from_value(serde_json::Value::String(value.to_string()))
                .map_err(|_| AppError::BadRequest(format!("Invalid value '{value}' for '{name}'"))),
        }
    }
}
