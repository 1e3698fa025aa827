//! Wire types of the catalog API.
//!
//! Deserialization checks the structural shape of a response,
//! [Validate] covers the constraints serde cannot express.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use url::Url;

/// Constraints on a response beyond its structure.
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A searchable entry of the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// Location of the detail record.
    pub url: Url,
}

/// Response of `GET {base}/{resource}-form?limit={n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogListResponse {
    pub results: Vec<CatalogEntry>,
}

impl Validate for CatalogListResponse {}

/// Detail record of a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDetail {
    pub id: NonZeroU32,
    pub name: String,
    pub sprites: Sprites,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeSlot>,
}

impl EntityDetail {
    /// The front sprite, or the official artwork if there is none.
    pub fn image_url(&self) -> Option<&Url> {
        self.sprites.front_default.as_ref().or_else(|| {
            self.sprites
                .other
                .as_ref()
                .and_then(|other| other.official_artwork.front_default.as_ref())
        })
    }
}

impl Validate for EntityDetail {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork")]
    pub official_artwork: Artwork,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub front_default: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn detail_ignores_unknown_fields() {
        let detail: EntityDetail = serde_json::from_value(json!({
            "id": 25,
            "name": "pikachu",
            "form_name": "",
            "sprites": {
                "front_default": "https://img.example/25.png",
                "back_default": null,
            },
            "types": [{ "slot": 1, "type": { "name": "electric", "url": "https://x.example/13/" } }],
        }))
        .unwrap();

        assert_eq!(detail.id.get(), 25);
        assert_eq!(detail.types[0].kind.name, "electric");
        assert_eq!(
            detail.image_url().map(Url::as_str),
            Some("https://img.example/25.png")
        );
        assert!(detail.validate().is_ok());
    }

    #[test]
    fn image_falls_back_to_official_artwork() {
        let detail: EntityDetail = serde_json::from_value(json!({
            "id": 1,
            "name": "bulbasaur",
            "sprites": {
                "front_default": null,
                "other": { "official-artwork": { "front_default": "https://img.example/art/1.png" } },
            },
        }))
        .unwrap();
        assert_eq!(
            detail.image_url().map(Url::as_str),
            Some("https://img.example/art/1.png")
        );
    }

    #[test]
    fn zero_id_is_rejected() {
        let result = serde_json::from_value::<EntityDetail>(json!({
            "id": 0,
            "name": "missingno",
            "sprites": { "front_default": null },
        }));
        assert!(result.is_err());
    }

    #[test]
    fn empty_name_fails_validation() {
        let detail: EntityDetail = serde_json::from_value(json!({
            "id": 3,
            "name": "",
            "sprites": { "front_default": null },
        }))
        .unwrap();
        assert!(detail.validate().is_err());
    }

    #[test]
    fn listing_requires_valid_urls() {
        let result = serde_json::from_value::<CatalogListResponse>(json!({
            "results": [{ "name": "pikachu", "url": "not a url" }],
        }));
        assert!(result.is_err());
    }
}
