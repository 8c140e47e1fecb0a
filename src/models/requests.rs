use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

use crate::core::validation::ValidationError;
use crate::models::domain::{ClassifyingAttributes, HairColor, Nationality, Service};

/// Payload for creating a listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub attributes: ClassifyingAttributes,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
}

/// Optional attributes a patch can reset to unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClearableField {
    Description,
    Nationality,
    HairColor,
    Age,
    Price,
    City,
    HeightCm,
    WeightKg,
}

/// Partial update. A present field replaces the stored value; a field named
/// in `clear` is reset to unset. Naming a field in both is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_clear_list"))]
pub struct ListingPatch {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_online: Option<bool>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    pub nationality: Option<Nationality>,
    pub hair_color: Option<HairColor>,
    pub services: Option<Vec<Service>>,
    #[validate(range(min = 18, max = 99))]
    pub age: Option<u8>,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub price: Option<f64>,
    pub city: Option<String>,
    #[validate(range(min = 120, max = 230))]
    pub height_cm: Option<u16>,
    #[validate(range(min = 35, max = 200))]
    pub weight_kg: Option<u16>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub clear: Vec<ClearableField>,
}

impl ListingPatch {
    /// True when the patch also supplies a value for `field`
    pub fn sets(&self, field: ClearableField) -> bool {
        match field {
            ClearableField::Description => self.description.is_some(),
            ClearableField::Nationality => self.nationality.is_some(),
            ClearableField::HairColor => self.hair_color.is_some(),
            ClearableField::Age => self.age.is_some(),
            ClearableField::Price => self.price.is_some(),
            ClearableField::City => self.city.is_some(),
            ClearableField::HeightCm => self.height_cm.is_some(),
            ClearableField::WeightKg => self.weight_kg.is_some(),
        }
    }

    pub fn clears(&self, field: ClearableField) -> bool {
        self.clear.contains(&field)
    }

    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Default::default()
        }
    }
}

fn validate_clear_list(patch: &ListingPatch) -> Result<(), validator::ValidationError> {
    if patch.clear.iter().any(|&field| patch.sets(field)) {
        return Err(validator::ValidationError::new("clear_conflicts_with_value"));
    }
    Ok(())
}

/// Structured search request evaluated by the facet engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub min_age: Option<u8>,
    #[serde(default)]
    pub max_age: Option<u8>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub is_online: Option<bool>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for FilterRequest {
    fn default() -> Self {
        Self {
            query: None,
            city: None,
            tags: Vec::new(),
            min_price: None,
            max_price: None,
            min_age: None,
            max_age: None,
            is_verified: None,
            is_online: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// Page-size defaults applied when translating HTTP parameters
#[derive(Debug, Clone, Copy)]
pub struct PageDefaults {
    pub page_size: i64,
    pub max_page_size: i64,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: 100,
        }
    }
}

/// Raw search query string, as received by the listing search handlers
///
/// Every value is kept as a string so that malformed numbers surface as
/// validation errors instead of opaque deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub city: Option<String>,
    /// Comma-separated tag list
    pub tags: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub is_verified: Option<String>,
    pub is_online: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl SearchParams {
    pub fn into_filter_request(self, defaults: PageDefaults) -> Result<FilterRequest, ValidationError> {
        let page = parse_number::<i64>("page", self.page.as_deref())?.unwrap_or(1);
        let page_size = parse_number::<i64>("pageSize", self.page_size.as_deref())?
            .unwrap_or(defaults.page_size);
        // Cap page length; non-positive sizes are left for pagination validation
        let page_size = if page_size > 0 {
            page_size.min(defaults.max_page_size)
        } else {
            page_size
        };

        let tags = self
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(FilterRequest {
            query: non_blank(self.q),
            city: non_blank(self.city),
            tags,
            min_price: parse_price("minPrice", self.min_price.as_deref())?,
            max_price: parse_price("maxPrice", self.max_price.as_deref())?,
            min_age: parse_number("minAge", self.min_age.as_deref())?,
            max_age: parse_number("maxAge", self.max_age.as_deref())?,
            is_verified: parse_bool("isVerified", self.is_verified.as_deref())?,
            is_online: parse_bool("isOnline", self.is_online.as_deref())?,
            page,
            page_size,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(field: &'static str, raw: Option<&str>) -> Result<Option<T>, ValidationError> {
    present(raw)
        .map(|v| {
            v.parse::<T>().map_err(|_| ValidationError::Malformed {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}

fn parse_price(field: &'static str, raw: Option<&str>) -> Result<Option<f64>, ValidationError> {
    match parse_number::<f64>(field, raw)? {
        Some(price) if !price.is_finite() => Err(ValidationError::Malformed {
            field,
            value: price.to_string(),
        }),
        other => Ok(other),
    }
}

fn parse_bool(field: &'static str, raw: Option<&str>) -> Result<Option<bool>, ValidationError> {
    match present(raw) {
        None => Ok(None),
        Some(v) => match v.to_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(ValidationError::Malformed {
                field,
                value: v.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SearchParams {
        SearchParams::default()
    }

    #[test]
    fn test_empty_params_use_defaults() {
        let request = params().into_filter_request(PageDefaults::default()).unwrap();

        assert_eq!(request, FilterRequest::default());
    }

    #[test]
    fn test_full_params_parsed() {
        let raw = SearchParams {
            q: Some("  simpática ".to_string()),
            city: Some("Lisboa".to_string()),
            tags: Some("Loira, VIP,,".to_string()),
            min_price: Some("100".to_string()),
            max_price: Some("250.5".to_string()),
            min_age: Some("18".to_string()),
            max_age: Some("30".to_string()),
            is_verified: Some("true".to_string()),
            is_online: Some("0".to_string()),
            page: Some("2".to_string()),
            page_size: Some("15".to_string()),
        };

        let request = raw.into_filter_request(PageDefaults::default()).unwrap();

        assert_eq!(request.query.as_deref(), Some("simpática"));
        assert_eq!(request.tags, vec!["Loira", "VIP"]);
        assert_eq!(request.min_price, Some(100.0));
        assert_eq!(request.max_price, Some(250.5));
        assert_eq!(request.min_age, Some(18));
        assert_eq!(request.max_age, Some(30));
        assert_eq!(request.is_verified, Some(true));
        assert_eq!(request.is_online, Some(false));
        assert_eq!(request.page, 2);
        assert_eq!(request.page_size, 15);
    }

    #[test]
    fn test_malformed_number_rejected() {
        let raw = SearchParams {
            min_price: Some("cem".to_string()),
            ..params()
        };

        let err = raw.into_filter_request(PageDefaults::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Malformed { field: "minPrice", value: "cem".to_string() }
        );
    }

    #[test]
    fn test_non_finite_price_rejected() {
        let raw = SearchParams {
            max_price: Some("NaN".to_string()),
            ..params()
        };

        assert!(raw.into_filter_request(PageDefaults::default()).is_err());
    }

    #[test]
    fn test_malformed_bool_rejected() {
        let raw = SearchParams {
            is_online: Some("maybe".to_string()),
            ..params()
        };

        assert!(matches!(
            raw.into_filter_request(PageDefaults::default()),
            Err(ValidationError::Malformed { field: "isOnline", .. })
        ));
    }

    #[test]
    fn test_page_size_capped() {
        let raw = SearchParams {
            page_size: Some("500".to_string()),
            ..params()
        };

        let request = raw.into_filter_request(PageDefaults::default()).unwrap();
        assert_eq!(request.page_size, 100);
    }

    #[test]
    fn test_non_positive_page_passes_through() {
        let raw = SearchParams {
            page: Some("0".to_string()),
            page_size: Some("-5".to_string()),
            ..params()
        };

        let request = raw.into_filter_request(PageDefaults::default()).unwrap();
        assert_eq!(request.page, 0);
        assert_eq!(request.page_size, -5);
    }

    #[test]
    fn test_clear_list_parsed() {
        let patch: ListingPatch =
            serde_json::from_str(r#"{"clear": ["price", "hairColor", "heightCm"]}"#).unwrap();

        assert!(patch.clears(ClearableField::Price));
        assert!(patch.clears(ClearableField::HairColor));
        assert!(patch.clears(ClearableField::HeightCm));
        assert!(!patch.clears(ClearableField::Age));
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_clear_and_set_same_field_rejected() {
        let patch = ListingPatch {
            price: Some(120.0),
            clear: vec![ClearableField::Price],
            ..Default::default()
        };

        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_listing_patch_validation() {
        let patch = ListingPatch {
            age: Some(17),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = ListingPatch {
            age: Some(18),
            price: Some(250.0),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }
}
