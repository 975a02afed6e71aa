use crate::models::ImageRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Representation of an image document stored in the search index. The
/// document is keyed by `identifier` in the bulk action metadata, so
/// re-submitting the same identifier overwrites the prior document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDocument {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_landing_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Maps an image row to its search document. `tags` is `None` when the
/// relational tag lookup was deferred (as during a large batch run), which
/// yields a document with an empty tag list; callers accept that such
/// documents are tag-incomplete until a later enrichment pass.
///
/// The identifier is copied through verbatim, never synthesized. An empty
/// identifier is rejected per-document by the engine and surfaces in the
/// bulk report rather than being masked here.
pub fn map_image(image: &ImageRow, tags: Option<&[String]>) -> ImageDocument {
    ImageDocument {
        identifier: image.identifier.clone(),
        title: image.title.clone(),
        creator: image.creator.clone(),
        creator_url: image.creator_url.clone(),
        url: image.url.clone(),
        provider: image.provider.clone(),
        source: image.source.clone(),
        license: image.license.clone(),
        foreign_landing_url: image.foreign_landing_url.clone(),
        tags: tags.map(|names| names.to_vec()).unwrap_or_default(),
        created_at: image.created_on,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn sample_image() -> ImageRow {
        ImageRow {
            id: 7,
            identifier: "img-0007".to_string(),
            title: Some("Sleeping cat".to_string()),
            creator: Some("A. Photographer".to_string()),
            creator_url: Some("https://example.org/ap".to_string()),
            url: Some("https://images.example.org/0007.jpg".to_string()),
            provider: Some("example".to_string()),
            source: Some("example-commons".to_string()),
            license: Some("CC0".to_string()),
            foreign_landing_url: Some("https://example.org/photos/0007".to_string()),
            created_on: Some(Utc.with_ymd_and_hms(2017, 3, 14, 9, 26, 53).unwrap()),
        }
    }

    #[test]
    fn deferred_tags_yield_empty_tag_list() {
        let document = map_image(&sample_image(), None);
        assert!(document.tags.is_empty());
    }

    #[test]
    fn resolved_tags_are_carried_verbatim() {
        let tags = vec!["cat".to_string(), "animal".to_string()];
        let document = map_image(&sample_image(), Some(&tags));

        let expected: HashSet<&str> = ["cat", "animal"].into_iter().collect();
        let actual: HashSet<&str> = document.tags.iter().map(String::as_str).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn scalar_fields_round_trip() {
        let image = sample_image();
        let document = map_image(&image, None);

        assert_eq!(document.identifier, image.identifier);
        assert_eq!(document.title, image.title);
        assert_eq!(document.creator, image.creator);
        assert_eq!(document.creator_url, image.creator_url);
        assert_eq!(document.url, image.url);
        assert_eq!(document.provider, image.provider);
        assert_eq!(document.source, image.source);
        assert_eq!(document.license, image.license);
        assert_eq!(document.foreign_landing_url, image.foreign_landing_url);
        assert_eq!(document.created_at, image.created_on);
    }

    #[test]
    fn missing_optionals_are_absent_from_json() {
        let mut image = sample_image();
        image.creator_url = None;
        image.license = None;
        image.created_on = None;

        let value = serde_json::to_value(map_image(&image, None)).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["identifier"], "img-0007");
        assert!(!object.contains_key("creator_url"));
        assert!(!object.contains_key("license"));
        assert!(!object.contains_key("created_at"));
    }

    #[test]
    fn empty_identifier_passes_through_unmodified() {
        let mut image = sample_image();
        image.identifier = String::new();

        let document = map_image(&image, None);
        assert!(document.identifier.is_empty());
    }
}
