//! Parsing of the `multipart/form-data` hologram upload
//!
//! Parts:
//! - `hologramFile`: the binary
//! - `author`, `patient`: JSON records
//! - flat hologram fields: `title`, `description`, `contentType`,
//!   `fileSizeInKb`, `bodySite`, `dateOfImaging`, `creationDate`,
//!   `creationMode`, `creationDescription`

use crate::orchestrator::{NewHologram, DEFAULT_CONTENT_TYPE};
use crate::ApiError;
use axum::extract::multipart::{Field, Multipart};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use holo_core::BYTES_PER_KB;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Name of the binary part
pub const FILE_FIELD: &str = "hologramFile";

/// Read an upload into a [`NewHologram`], checking required parts
pub async fn parse_upload(mut multipart: Multipart) -> Result<NewHologram, ApiError> {
    let mut new = NewHologram::default();
    let mut file: Option<(Bytes, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Unable to parse multipart/form-data: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            FILE_FIELD => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    ApiError::validation(format!("Unable to read {FILE_FIELD}: {e}"))
                })?;
                file = Some((data, content_type));
            }
            "author" => new.author = json_field(&name, field).await?,
            "patient" => new.patient = json_field(&name, field).await?,
            _ => {
                let value = text_field(&name, field).await?;
                set_hologram_field(&mut new, &name, value)?;
            }
        }
    }

    let (data, part_type) =
        file.ok_or_else(|| ApiError::validation(format!("{FILE_FIELD} is required")))?;

    let hologram = &mut new.hologram;
    if hologram.content_type.as_deref().map_or(true, str::is_empty) {
        hologram.content_type = Some(
            part_type
                .filter(|t| !t.is_empty() && t != "application/octet-stream")
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        );
    }
    if hologram.file_size_in_kb.is_none() {
        let kb = data.len() as u64 / BYTES_PER_KB;
        hologram.file_size_in_kb = Some(u32::try_from(kb).unwrap_or(u32::MAX));
    }
    new.file = data;

    if new.author.aid.as_deref().map_or(true, str::is_empty) {
        return Err(ApiError::validation("author.aid is required"));
    }
    if new.patient.pid.as_deref().map_or(true, str::is_empty) {
        return Err(ApiError::validation("patient.pid is required"));
    }
    if new.hologram.title.as_deref().map_or(true, str::is_empty) {
        return Err(ApiError::validation("title is required"));
    }
    Ok(new)
}

async fn text_field(name: &str, field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(format!("Unable to read field '{name}': {e}")))
}

async fn json_field<T: DeserializeOwned>(name: &str, field: Field<'_>) -> Result<T, ApiError> {
    let text = text_field(name, field).await?;
    serde_json::from_str(&text)
        .map_err(|e| ApiError::validation(format!("Field '{name}' is not valid JSON: {e}")))
}

fn set_hologram_field(new: &mut NewHologram, name: &str, value: String) -> Result<(), ApiError> {
    let hologram = &mut new.hologram;
    let value = Some(value).filter(|v| !v.is_empty());
    match name {
        "title" => hologram.title = value,
        "description" => hologram.description = value,
        "contentType" => hologram.content_type = value,
        "bodySite" => hologram.body_site = value,
        "creationMode" => hologram.creation_mode = value,
        "creationDescription" => hologram.creation_description = value,
        "fileSizeInKb" => {
            hologram.file_size_in_kb = value
                .map(|v| {
                    v.trim().parse::<u32>().map_err(|_| {
                        ApiError::validation(format!("fileSizeInKb '{v}' is not a valid size"))
                    })
                })
                .transpose()?;
        }
        "dateOfImaging" => hologram.date_of_imaging = parse_timestamp(name, value)?,
        "creationDate" => hologram.creation_date = parse_timestamp(name, value)?,
        other => debug!(field = other, "Ignoring unknown upload field"),
    }
    Ok(())
}

fn parse_timestamp(name: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>, ApiError> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    ApiError::validation(format!("{name} '{v}' is not an RFC 3339 timestamp: {e}"))
                })
        })
        .transpose()
}
