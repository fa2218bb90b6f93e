//! Flat domain records served by the REST API
//!
//! Every field is optional and omitted from JSON when absent, so a blank
//! record (`Default::default()`) serializes to `{}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of a hologram
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hologram {
    /// Hologram id (assigned by the backend on creation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hid: Option<String>,
    /// Display title, also used as the download filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the hologram file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// File size in kilobytes (floor of bytes / 1024)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_in_kb: Option<u32>,
    /// Body site the hologram depicts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_site: Option<String>,
    /// When the source imaging study was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_imaging: Option<DateTime<Utc>>,
    /// When the hologram was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    /// How the hologram was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_mode: Option<String>,
    /// Free-text notes on the creation process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_description: Option<String>,
    /// Author id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid: Option<String>,
    /// Patient id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
}

/// Basic patient information
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<PersonName>,
}

/// Author (practitioner) information
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<PersonName>,
}

/// A person's name split into its parts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    /// Honorific, e.g. "Dr"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Full name as it should be displayed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full: Option<String>,
}

impl PersonName {
    /// Check if every part is absent or empty
    pub fn is_empty(&self) -> bool {
        [&self.title, &self.given, &self.family, &self.full]
            .iter()
            .all(|part| part.as_deref().map_or(true, str::is_empty))
    }
}

impl Hologram {
    /// Check if this is a blank record
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_hologram_serializes_empty() {
        let json = serde_json::to_string(&Hologram::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_hologram_camel_case() {
        let hologram: Hologram = serde_json::from_str(
            r#"{"hid":"h1","fileSizeInKb":12,"creationMode":"GENERATE_FROM_IMAGING_STUDY","dateOfImaging":"2020-01-02T03:04:05Z"}"#,
        )
        .unwrap();

        assert_eq!(hologram.hid.as_deref(), Some("h1"));
        assert_eq!(hologram.file_size_in_kb, Some(12));
        assert_eq!(hologram.creation_mode.as_deref(), Some("GENERATE_FROM_IMAGING_STUDY"));
        assert!(hologram.date_of_imaging.is_some());
    }

    #[test]
    fn test_person_name_is_empty() {
        assert!(PersonName::default().is_empty());
        assert!(PersonName {
            given: Some(String::new()),
            ..Default::default()
        }
        .is_empty());
        assert!(!PersonName {
            family: Some("Curie".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
