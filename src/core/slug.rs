//! Slug derivation for portable entities
//!
//! Slugs are lowercase, ASCII, hyphen separated and never empty.

use crate::core::entity::EntityType;
use regex::Regex;
use std::sync::OnceLock;

/// Utility for turning names into URL-safe slugs
pub struct Slugifier;

impl Slugifier {
    /// Convert free text to a slug
    ///
    /// # Examples
    ///
    /// ```
    /// use confport::core::slug::Slugifier;
    ///
    /// assert_eq!(Slugifier::slugify("Petstore API"), "petstore-api");
    /// assert_eq!(Slugifier::slugify("  Zaak -> Case (v2) "), "zaak-case-v2");
    /// assert_eq!(Slugifier::slugify("Één café"), "een-cafe");
    /// ```
    pub fn slugify(text: &str) -> String {
        static SEPARATORS: OnceLock<Regex> = OnceLock::new();
        let separators =
            SEPARATORS.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"));

        let folded: String = text
            .chars()
            .map(Self::fold_char)
            .collect::<String>()
            .to_lowercase();

        separators
            .replace_all(&folded, "-")
            .trim_matches('-')
            .to_string()
    }

    /// Derive a slug for an entity from its name, falling back to
    /// `<type>-<id>` when the name yields nothing usable
    pub fn for_entity(entity_type: EntityType, name: &str, id: Option<i64>) -> String {
        let slug = Self::slugify(name);
        if !slug.is_empty() {
            return slug;
        }

        match id {
            Some(id) => format!("{}-{}", entity_type, id),
            None => entity_type.to_string(),
        }
    }

    // Strip the most common Latin diacritics; anything else non-ASCII
    // becomes a separator.
    fn fold_char(c: char) -> char {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
            'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'i',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
            'ç' | 'Ç' => 'c',
            'ñ' | 'Ñ' => 'n',
            'ý' | 'ÿ' | 'Ý' => 'y',
            c if c.is_ascii() => c,
            _ => ' ',
        }
    }
}
