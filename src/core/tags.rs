use crate::models::domain::{ClassifyingAttributes, HairColor, Nationality, Service, TagSet};

/// A named derivation rule. Every rule in [`TAG_RULES`] is evaluated; none
/// short-circuits another and the derived set is the union of their output.
pub struct TagRule {
    pub name: &'static str,
    derive: fn(&ClassifyingAttributes) -> Vec<String>,
}

impl TagRule {
    pub fn apply(&self, attrs: &ClassifyingAttributes) -> Vec<String> {
        (self.derive)(attrs)
    }
}

/// Rule table, in evaluation order
pub const TAG_RULES: &[TagRule] = &[
    TagRule { name: "nationality", derive: nationality_tags },
    TagRule { name: "hair_color", derive: hair_color_tags },
    TagRule { name: "services", derive: service_tags },
    TagRule { name: "age_bracket", derive: age_bracket_tags },
    TagRule { name: "price_tier", derive: price_tier_tags },
    TagRule { name: "city", derive: city_tags },
    TagRule { name: "body_type", derive: body_type_tags },
    TagRule { name: "availability", derive: availability_tags },
    TagRule { name: "verification", derive: verification_tags },
];

struct AgeBracket {
    min: u8,
    max: u8,
    tags: &'static [&'static str],
}

/// Mutually exclusive, covering every age from 18 up
const AGE_BRACKETS: &[AgeBracket] = &[
    AgeBracket { min: 18, max: 25, tags: &["Jovem", "Jovens", "Universitária", "Universitárias"] },
    AgeBracket { min: 26, max: 35, tags: &["Madura", "Maduras"] },
    AgeBracket { min: 36, max: u8::MAX, tags: &["MILF", "MILFs"] },
];

#[derive(Debug, Clone, Copy)]
enum PriceBound {
    AtLeast(f64),
    AtMost(f64),
}

impl PriceBound {
    fn contains(self, price: f64) -> bool {
        match self {
            PriceBound::AtLeast(floor) => price >= floor,
            PriceBound::AtMost(ceiling) => price <= ceiling,
        }
    }
}

struct PriceTier {
    bound: PriceBound,
    tags: &'static [&'static str],
}

/// Cumulative tiers: every tier whose bound holds contributes its tags
const PRICE_TIERS: &[PriceTier] = &[
    PriceTier { bound: PriceBound::AtLeast(200.0), tags: &["VIP", "VIP em Portugal"] },
    PriceTier {
        bound: PriceBound::AtLeast(500.0),
        tags: &["Elite", "Elite em Portugal", "Acompanhante de Luxo"],
    },
    PriceTier { bound: PriceBound::AtMost(100.0), tags: &["Econômica", "Acessível"] },
];

struct BmiBand {
    min: f64,
    /// Exclusive
    max: f64,
    tags: &'static [&'static str],
}

// BMI >= 30 has no band and derives no tag.
const BMI_BANDS: &[BmiBand] = &[
    BmiBand { min: 0.0, max: 18.5, tags: &["Magra", "Magras"] },
    BmiBand { min: 18.5, max: 25.0, tags: &["Normal"] },
    BmiBand { min: 25.0, max: 30.0, tags: &["Gordinha", "Gordinhas"] },
];

const AVAILABLE_TAGS: &[&str] = &["Disponível", "Disponível Agora"];
const VERIFIED_TAGS: &[&str] = &["Verificada", "Perfil Verificado"];

/// Derive the complete tag set for a listing's classifying attributes.
///
/// Total and deterministic: unset attributes simply contribute nothing.
pub fn derive_tags(attrs: &ClassifyingAttributes) -> TagSet {
    TAG_RULES
        .iter()
        .flat_map(|rule| rule.apply(attrs))
        .collect()
}

/// Evaluate a single rule by name
pub fn derive_rule(name: &str, attrs: &ClassifyingAttributes) -> Option<TagSet> {
    TAG_RULES
        .iter()
        .find(|rule| rule.name == name)
        .map(|rule| rule.apply(attrs).into_iter().collect())
}

pub fn rule_names() -> impl Iterator<Item = &'static str> {
    TAG_RULES.iter().map(|rule| rule.name)
}

/// Body mass index from height (cm) and weight (kg)
#[inline]
pub fn calculate_bmi(height_cm: u16, weight_kg: u16) -> Option<f64> {
    if height_cm == 0 || weight_kg == 0 {
        return None;
    }

    let height_m = height_cm as f64 / 100.0;
    Some(weight_kg as f64 / (height_m * height_m))
}

fn in_portugal(label: &str) -> String {
    format!("{} em Portugal", label)
}

/// Literal, localized, and optionally plural + localized plural
fn labelled(label: &str, plural: Option<&str>) -> Vec<String> {
    let mut tags = vec![label.to_string(), in_portugal(label)];
    if let Some(plural) = plural {
        tags.push(plural.to_string());
        tags.push(in_portugal(plural));
    }
    tags
}

fn fixed(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

fn nationality_plural(nationality: Nationality) -> Option<&'static str> {
    match nationality {
        Nationality::Brasileira => Some("Brasileiras"),
        Nationality::Portuguesa => Some("Portuguesas"),
        Nationality::Angolana
        | Nationality::CaboVerdiana
        | Nationality::Espanhola
        | Nationality::Francesa
        | Nationality::Italiana
        | Nationality::Colombiana
        | Nationality::Venezuelana
        | Nationality::Romena
        | Nationality::Russa
        | Nationality::Ucraniana => None,
    }
}

fn hair_color_plural(color: HairColor) -> Option<&'static str> {
    match color {
        HairColor::Loira => Some("Loiras"),
        HairColor::Morena => Some("Morenas"),
        HairColor::Ruiva => Some("Ruivas"),
        HairColor::Castanha | HairColor::Preta | HairColor::Colorida => None,
    }
}

fn service_synonyms(service: Service) -> &'static [&'static str] {
    match service {
        Service::Webcam => &["Videochamada", "Cam Girl"],
        Service::Bdsm => &["Dominação", "Fetiche"],
        Service::Acompanhamento
        | Service::JantarRomantico
        | Service::Massagem
        | Service::Viagens
        | Service::Pernoite
        | Service::Festas => &[],
    }
}

fn nationality_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    attrs
        .nationality
        .map(|n| labelled(n.as_str(), nationality_plural(n)))
        .unwrap_or_default()
}

fn hair_color_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    attrs
        .hair_color
        .map(|c| labelled(c.as_str(), hair_color_plural(c)))
        .unwrap_or_default()
}

fn service_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    attrs
        .services
        .iter()
        .flat_map(|&service| {
            let mut tags = labelled(service.as_str(), None);
            tags.extend(fixed(service_synonyms(service)));
            tags
        })
        .collect()
}

fn age_bracket_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    let Some(age) = attrs.age else {
        return Vec::new();
    };

    AGE_BRACKETS
        .iter()
        .find(|bracket| age >= bracket.min && age <= bracket.max)
        .map(|bracket| fixed(bracket.tags))
        .unwrap_or_default()
}

fn price_tier_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    let Some(price) = attrs.price else {
        return Vec::new();
    };

    PRICE_TIERS
        .iter()
        .filter(|tier| tier.bound.contains(price))
        .flat_map(|tier| fixed(tier.tags))
        .collect()
}

fn city_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    match attrs.city.as_deref().map(str::trim) {
        Some(city) if !city.is_empty() => vec![
            format!("Acompanhante em {}", city),
            city.to_string(),
            format!("Acompanhantes em {}", city),
        ],
        _ => Vec::new(),
    }
}

fn body_type_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    let bmi = match (attrs.height_cm, attrs.weight_kg) {
        (Some(height), Some(weight)) => calculate_bmi(height, weight),
        _ => None,
    };

    bmi.and_then(|bmi| BMI_BANDS.iter().find(|band| bmi >= band.min && bmi < band.max))
        .map(|band| fixed(band.tags))
        .unwrap_or_default()
}

fn availability_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    if attrs.is_active { fixed(AVAILABLE_TAGS) } else { Vec::new() }
}

fn verification_tags(attrs: &ClassifyingAttributes) -> Vec<String> {
    if attrs.is_verified { fixed(VERIFIED_TAGS) } else { Vec::new() }
}
