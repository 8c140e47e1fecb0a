use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::Validate;

use crate::core::tags::derive_tags;
use crate::models::requests::{ClearableField, ListingPatch, NewListing};

/// Derived tag set. Ordered so that serialized output is deterministic.
pub type TagSet = BTreeSet<String>;

/// Cities accepted on the write path
pub const KNOWN_CITIES: &[&str] = &[
    "Lisboa",
    "Porto",
    "Faro",
    "Coimbra",
    "Braga",
    "Aveiro",
    "Setúbal",
    "Funchal",
    "Albufeira",
    "Cascais",
    "Sintra",
    "Leiria",
    "Évora",
    "Viseu",
    "Portimão",
];

/// Case-insensitive lookup against [`KNOWN_CITIES`], returning the canonical spelling
pub fn canonical_city(city: &str) -> Option<&'static str> {
    let needle = city.trim().to_lowercase();
    KNOWN_CITIES
        .iter()
        .copied()
        .find(|known| known.to_lowercase() == needle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Nationality {
    Brasileira,
    Portuguesa,
    Angolana,
    #[serde(rename = "Cabo-verdiana")]
    CaboVerdiana,
    Espanhola,
    Francesa,
    Italiana,
    Colombiana,
    Venezuelana,
    Romena,
    Russa,
    Ucraniana,
}

impl Nationality {
    pub fn as_str(self) -> &'static str {
        match self {
            Nationality::Brasileira => "Brasileira",
            Nationality::Portuguesa => "Portuguesa",
            Nationality::Angolana => "Angolana",
            Nationality::CaboVerdiana => "Cabo-verdiana",
            Nationality::Espanhola => "Espanhola",
            Nationality::Francesa => "Francesa",
            Nationality::Italiana => "Italiana",
            Nationality::Colombiana => "Colombiana",
            Nationality::Venezuelana => "Venezuelana",
            Nationality::Romena => "Romena",
            Nationality::Russa => "Russa",
            Nationality::Ucraniana => "Ucraniana",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HairColor {
    Loira,
    Morena,
    Ruiva,
    Castanha,
    Preta,
    Colorida,
}

impl HairColor {
    pub fn as_str(self) -> &'static str {
        match self {
            HairColor::Loira => "Loira",
            HairColor::Morena => "Morena",
            HairColor::Ruiva => "Ruiva",
            HairColor::Castanha => "Castanha",
            HairColor::Preta => "Preta",
            HairColor::Colorida => "Colorida",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Service {
    Acompanhamento,
    #[serde(rename = "Jantar Romântico")]
    JantarRomantico,
    Massagem,
    Viagens,
    Pernoite,
    Festas,
    Webcam,
    #[serde(rename = "BDSM")]
    Bdsm,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Acompanhamento => "Acompanhamento",
            Service::JantarRomantico => "Jantar Romântico",
            Service::Massagem => "Massagem",
            Service::Viagens => "Viagens",
            Service::Pernoite => "Pernoite",
            Service::Festas => "Festas",
            Service::Webcam => "Webcam",
            Service::Bdsm => "BDSM",
        }
    }
}

/// Every listing field that participates in tag derivation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyingAttributes {
    #[serde(default)]
    pub nationality: Option<Nationality>,
    #[serde(default)]
    pub hair_color: Option<HairColor>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    #[validate(range(min = 18, max = 99))]
    pub age: Option<u8>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100000.0))]
    pub price: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    #[validate(range(min = 120, max = 230))]
    pub height_cm: Option<u16>,
    #[serde(default)]
    #[validate(range(min = 35, max = 200))]
    pub weight_kg: Option<u16>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool { true }

/// A classified listing together with its derived tags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub attributes: ClassifyingAttributes,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub tags: TagSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: i64,
}

impl Listing {
    /// Build a listing from a create payload. Tags are derived here, before
    /// the listing ever reaches a repository.
    pub fn new(draft: NewListing, now: DateTime<Utc>) -> Self {
        let tags = derive_tags(&draft.attributes);

        Self {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            images: draft.images,
            attributes: draft.attributes,
            is_online: draft.is_online,
            rating: draft.rating.unwrap_or(0.0),
            tags,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Apply a partial update and recompute the whole tag set.
    ///
    /// Repositories call this while holding the row lock, so attributes and
    /// tags are always written together.
    pub fn apply_patch(&mut self, patch: ListingPatch, now: DateTime<Utc>) {
        for &field in &patch.clear {
            self.clear_field(field);
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(is_online) = patch.is_online {
            self.is_online = is_online;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }

        let attrs = &mut self.attributes;
        if let Some(nationality) = patch.nationality {
            attrs.nationality = Some(nationality);
        }
        if let Some(hair_color) = patch.hair_color {
            attrs.hair_color = Some(hair_color);
        }
        if let Some(services) = patch.services {
            attrs.services = services;
        }
        if let Some(age) = patch.age {
            attrs.age = Some(age);
        }
        if let Some(price) = patch.price {
            attrs.price = Some(price);
        }
        if let Some(city) = patch.city {
            attrs.city = Some(city);
        }
        if let Some(height_cm) = patch.height_cm {
            attrs.height_cm = Some(height_cm);
        }
        if let Some(weight_kg) = patch.weight_kg {
            attrs.weight_kg = Some(weight_kg);
        }
        if let Some(is_verified) = patch.is_verified {
            attrs.is_verified = is_verified;
        }
        if let Some(is_active) = patch.is_active {
            attrs.is_active = is_active;
        }

        self.tags = derive_tags(&self.attributes);
        self.updated_at = now;
        self.version += 1;
    }

    fn clear_field(&mut self, field: ClearableField) {
        let attrs = &mut self.attributes;
        match field {
            ClearableField::Description => self.description = None,
            ClearableField::Nationality => attrs.nationality = None,
            ClearableField::HairColor => attrs.hair_color = None,
            ClearableField::Age => attrs.age = None,
            ClearableField::Price => attrs.price = None,
            ClearableField::City => attrs.city = None,
            ClearableField::HeightCm => attrs.height_cm = None,
            ClearableField::WeightKg => attrs.weight_kg = None,
        }
    }

    /// Recompute tags from the current attributes. Returns true if the stored
    /// set was stale, in which case the version is bumped.
    pub fn refresh_tags(&mut self) -> bool {
        let derived = derive_tags(&self.attributes);
        if derived == self.tags {
            return false;
        }
        self.tags = derived;
        self.version += 1;
        true
    }

    /// True when the stored tags are exactly what the current attributes derive
    pub fn tags_are_current(&self) -> bool {
        self.tags == derive_tags(&self.attributes)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Fields the free-text facet can search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchableField {
    Name,
    Description,
    City,
    Tags,
}
