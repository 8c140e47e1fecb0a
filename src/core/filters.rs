use crate::models::{FilterRequest, Listing, SearchableField};

/// Check a listing against every facet supplied in the request (logical AND)
#[inline]
pub fn matches_request(
    listing: &Listing,
    request: &FilterRequest,
    searchable: &[SearchableField],
) -> bool {
    matches_text(listing, request.query.as_deref(), searchable)
        && matches_city(listing, request.city.as_deref())
        && matches_tags(listing, &request.tags)
        && matches_price(listing, request.min_price, request.max_price)
        && matches_age(listing, request.min_age, request.max_age)
        && matches_flag(listing.attributes.is_verified, request.is_verified)
        && matches_flag(listing.is_online, request.is_online)
}

/// Free-text facet: trimmed, case-insensitive containment in any searchable field
#[inline]
pub fn matches_text(listing: &Listing, query: Option<&str>, searchable: &[SearchableField]) -> bool {
    let needle = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return true,
    };

    let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

    searchable.iter().any(|field| match field {
        SearchableField::Name => contains(&listing.name),
        SearchableField::Description => listing.description.as_deref().is_some_and(contains),
        SearchableField::City => listing.attributes.city.as_deref().is_some_and(contains),
        SearchableField::Tags => listing.tags.iter().any(|tag| contains(tag)),
    })
}

/// City facet: exact, case-insensitive
#[inline]
pub fn matches_city(listing: &Listing, city: Option<&str>) -> bool {
    let wanted = match city.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_lowercase(),
        _ => return true,
    };

    listing
        .attributes
        .city
        .as_deref()
        .is_some_and(|c| c.trim().to_lowercase() == wanted)
}

/// Tag facet: the listing must carry every selected tag
#[inline]
pub fn matches_tags(listing: &Listing, tags: &[String]) -> bool {
    tags.iter().all(|tag| listing.tags.contains(tag))
}

/// Price facet. Filters only when both bounds are supplied; a single bound
/// is ignored.
#[inline]
pub fn matches_price(listing: &Listing, min: Option<f64>, max: Option<f64>) -> bool {
    let (Some(min), Some(max)) = (min, max) else {
        return true;
    };

    listing
        .attributes
        .price
        .is_some_and(|price| price >= min && price <= max)
}

/// Age facet. Same both-bounds rule as price.
#[inline]
pub fn matches_age(listing: &Listing, min: Option<u8>, max: Option<u8>) -> bool {
    let (Some(min), Some(max)) = (min, max) else {
        return true;
    };

    listing
        .attributes
        .age
        .is_some_and(|age| age >= min && age <= max)
}

#[inline]
pub fn matches_flag(value: bool, wanted: Option<bool>) -> bool {
    wanted.map_or(true, |w| w == value)
}
