//! Display-friendly representation of search results.

use std::fmt;

use dex_catalog::types::EntityDetail;

pub const DEFAULT_FALLBACK_IMAGE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/items/poke-ball.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDisplay {
    /// `mr-mime` becomes `Mr Mime`
    pub display_name: String,
    /// `#0025`
    pub display_id: String,
    pub image_url: String,
}

impl EntityDisplay {
    pub fn from_detail(detail: &EntityDetail, fallback_image: &str) -> Self {
        Self {
            display_name: display_name(&detail.name),
            display_id: format!("#{:04}", detail.id),
            image_url: detail
                .image_url()
                .map(|url| url.to_string())
                .unwrap_or_else(|| fallback_image.to_string()),
        }
    }
}

impl fmt::Display for EntityDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display_id, self.display_name)
    }
}

fn display_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use dex_catalog::testing::mock_detail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn formats_name_and_id() {
        let display = EntityDisplay::from_detail(&mock_detail(122, "mr-mime"), DEFAULT_FALLBACK_IMAGE);
        assert_eq!(display.display_name, "Mr Mime");
        assert_eq!(display.display_id, "#0122");
        assert_eq!(display.to_string(), "#0122 Mr Mime");
    }

    #[test]
    fn large_ids_are_not_truncated() {
        let display = EntityDisplay::from_detail(&mock_detail(10091, "rattata-alola"), DEFAULT_FALLBACK_IMAGE);
        assert_eq!(display.display_id, "#10091");
        assert_eq!(display.display_name, "Rattata Alola");
    }

    #[test]
    fn missing_image_uses_fallback() {
        let mut detail = mock_detail(25, "pikachu");
        detail.sprites.front_default = None;
        let display = EntityDisplay::from_detail(&detail, DEFAULT_FALLBACK_IMAGE);
        assert_eq!(display.image_url, DEFAULT_FALLBACK_IMAGE);
    }

    #[test]
    fn sprite_is_preferred() {
        let display = EntityDisplay::from_detail(&mock_detail(25, "pikachu"), DEFAULT_FALLBACK_IMAGE);
        assert_eq!(display.image_url, "https://img.example/25.png");
    }
}
