use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;

use agriconnect_core::DomainError;

use crate::app::dto::Upload;
use crate::app::errors::ApiError;

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse()?)
}

/// A fully buffered `multipart/form-data` body.
///
/// Parts with a file name become uploads; everything else is a text field.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed form data: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::validation(format!("Upload failed: {e}")))?;
                    form.files.insert(
                        name,
                        Upload {
                            file_name,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(format!("Malformed form data: {e}")))?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// Text field value, empty when absent.
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Take a non-empty upload out of the form.
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name).filter(|u| !u.is_empty())
    }
}
