//! Static vocabulary tables for intent normalization. English plus the
//! Swedish spellings seen in the menu corpus.

use dishcovery_protocol::TagType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Dietary/diet-style terms, longest first so multi-word terms strip before
/// their single-word prefixes ("gluten free" before "gluten").
pub const DIETARY_TERMS: &[&str] = &[
    "gluten-free",
    "gluten free",
    "glutenfri",
    "glutenfritt",
    "lactose-free",
    "lactose free",
    "laktosfri",
    "laktosfritt",
    "nut-free",
    "nut free",
    "nötfri",
    "plant-based",
    "plant based",
    "vegetarian",
    "vegetarisk",
    "vegetariskt",
    "veggie",
    "vegansk",
    "veganskt",
    "vegan",
    "halal",
    "kosher",
    "organic",
    "ekologisk",
    "ekologiskt",
];

/// Allergen phrasing that signals an allergy rather than a preference.
pub const ALLERGEN_TERMS: &[&str] = &[
    "no nuts",
    "without nuts",
    "nut allergy",
    "nötallergi",
    "no gluten",
    "without gluten",
    "gluten allergy",
    "no lactose",
    "without lactose",
    "no dairy",
    "dairy-free",
    "dairy free",
    "no shellfish",
    "shellfish allergy",
    "skaldjursallergi",
];

/// Meat/protein words that make inherited vegan/vegetarian tags nonsense.
pub const MEAT_TERMS: &[&str] = &[
    "chicken", "kyckling", "lamb", "lamm", "beef", "nötkött", "biff", "pork", "fläsk", "bacon",
    "fish", "fisk", "salmon", "lax", "tuna", "tonfisk", "shrimp", "räkor", "prawn", "duck",
    "anka", "meat", "kött", "steak", "sausage", "korv",
];

/// Words that explicitly ask for vegetarian/vegan food; their presence
/// disables the meat-term safety rule.
pub const EXPLICIT_VEG_TERMS: &[&str] = &[
    "vegan",
    "vegansk",
    "veganskt",
    "vegetarian",
    "vegetarisk",
    "vegetariskt",
    "veggie",
    "plant-based",
    "plant based",
];

/// Filler words that normalize to "no dish query".
pub const FILLER_WORDS: &[&str] = &[
    "anything", "something", "whatever", "food", "mat", "något", "nåt", "vad som helst",
    "dinner", "lunch", "middag",
];

/// Request boilerplate stripped before the remaining tokens become the
/// dish query ("find me vegan pizza" -> "pizza").
pub const REQUEST_STOPWORDS: &[&str] = &[
    "find", "show", "give", "get", "me", "i", "i'm", "im", "want", "would", "like", "love",
    "please", "can", "could", "you", "do", "does", "have", "any", "some", "a", "an", "the",
    "they", "at", "looking", "for", "craving", "hungry", "hitta", "visa", "ge", "mig", "jag",
    "vill", "ha", "finns", "det", "har", "ni", "en", "ett", "på", "tack",
];

/// Marker words for Swedish-language detection.
pub const SWEDISH_MARKERS: &[&str] = &[
    "jag", "vill", "har", "finns", "vad", "något", "nåt", "och", "eller", "med", "utan",
    "hela", "menyn", "visa", "mer", "tack",
];

/// Cities the corpus covers; city extraction only accepts these.
pub const KNOWN_CITIES: &[&str] = &[
    "stockholm",
    "gothenburg",
    "göteborg",
    "malmö",
    "malmo",
    "uppsala",
    "lund",
];

/// Phrases that mean "show me the whole menu".
pub const FULL_MENU_PHRASES: &[&str] = &[
    "show the menu",
    "show menu",
    "full menu",
    "whole menu",
    "see the menu",
    "visa menyn",
    "hela menyn",
];

/// Last-resort canonical map: well-known loose spellings to catalog slugs,
/// used only after alias, slug, and fuzzy lookups all miss.
pub const CANONICAL_TAGS: &[(&str, &str, TagType)] = &[
    ("vegan", "vegan", TagType::Diet),
    ("vegansk", "vegan", TagType::Diet),
    ("veggie", "vegetarian", TagType::Diet),
    ("vegetarian", "vegetarian", TagType::Diet),
    ("halal", "halal", TagType::Religious),
    ("kosher", "kosher", TagType::Religious),
    ("gf", "gluten-free", TagType::Allergen),
    ("gluten free", "gluten-free", TagType::Allergen),
    ("glutenfri", "gluten-free", TagType::Allergen),
    ("lactose free", "lactose-free", TagType::Allergen),
    ("laktosfri", "lactose-free", TagType::Allergen),
    ("nut free", "nut-free", TagType::Allergen),
    ("organic", "organic", TagType::Dietary),
];

fn boundary_regex(terms: &[&str]) -> Regex {
    let mut escaped: Vec<String> = terms.iter().map(|t| regex::escape(t)).collect();
    // Longest alternative first, otherwise "vegan" wins over "vegansk".
    escaped.sort_by_key(|t| std::cmp::Reverse(t.len()));
    Regex::new(&format!(r"(?i)\b({})\b", escaped.join("|"))).expect("static vocab regex")
}

pub static DIETARY_RE: Lazy<Regex> = Lazy::new(|| boundary_regex(DIETARY_TERMS));
pub static ALLERGEN_RE: Lazy<Regex> = Lazy::new(|| boundary_regex(ALLERGEN_TERMS));
pub static MEAT_RE: Lazy<Regex> = Lazy::new(|| boundary_regex(MEAT_TERMS));
pub static EXPLICIT_VEG_RE: Lazy<Regex> = Lazy::new(|| boundary_regex(EXPLICIT_VEG_TERMS));
pub static FULL_MENU_RE: Lazy<Regex> = Lazy::new(|| boundary_regex(FULL_MENU_PHRASES));

/// `in Stockholm` / `i Göteborg`; the captured city is validated against
/// [`KNOWN_CITIES`].
pub static CITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:in|i)\s+([\p{L}]+)\b").expect("static city regex"));

/// `from Indian Bites` / `på Indian Bites` / quoted names.
pub static RESTAURANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:\bfrom\s+|\bpå\s+|\bat\s+|")([\p{L}\d][\p{L}\d\s'&-]*?)(?:"|\?|$)"#)
        .expect("static restaurant regex")
});

pub fn mentions_meat(text: &str) -> bool {
    MEAT_RE.is_match(text)
}

pub fn mentions_explicit_veg(text: &str) -> bool {
    EXPLICIT_VEG_RE.is_match(text)
}

pub fn is_known_city(word: &str) -> bool {
    KNOWN_CITIES.contains(&word.to_lowercase().as_str())
}

/// Normalize corpus city spellings to one canonical form.
pub fn canonical_city(word: &str) -> String {
    match word.to_lowercase().as_str() {
        "göteborg" => "Gothenburg".to_string(),
        "malmo" => "Malmö".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}
