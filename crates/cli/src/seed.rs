//! Seed data for the in-memory store: a JSON fixture file, or the
//! built-in demo corpus when none is given.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dishcovery_protocol::TagType;
use dishcovery_store::{Dish, Restaurant, Tag};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

pub fn load(path: &Path) -> Result<(Vec<Restaurant>, Vec<Tag>)> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let seed: SeedFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed file {}", path.display()))?;
    log::info!(
        "loaded {} restaurants and {} tags from {}",
        seed.restaurants.len(),
        seed.tags.len(),
        path.display()
    );
    Ok((seed.restaurants, seed.tags))
}

/// Small built-in corpus so `dishcovery chat` works out of the box.
pub fn demo() -> (Vec<Restaurant>, Vec<Tag>) {
    let tags = vec![
        tag(1, "vegan", TagType::Diet, "Vegan", &["vegansk", "plant-based"]),
        tag(2, "vegetarian", TagType::Diet, "Vegetarian", &["veggie", "vegetarisk"]),
        tag(3, "halal", TagType::Religious, "Halal", &[]),
        tag(4, "gluten-free", TagType::Allergen, "Gluten free", &["glutenfri", "gf"]),
        tag(5, "lactose-free", TagType::Allergen, "Lactose free", &["laktosfri"]),
    ];

    let restaurants = vec![
        Restaurant {
            id: 1,
            name: "Green Garden".into(),
            city: "Stockholm".into(),
            address: Some("Odengatan 12".into()),
            delivery: true,
            takeaway: true,
            searchable: true,
            dishes: vec![
                dish(101, "Vegan Pizza", Some("tomato, basil and cashew cheese"), 13900, "Pizza", &["vegan", "vegetarian"]),
                dish(102, "Vegan Burger", Some("smoky bean patty with pickled onion"), 14900, "Mains", &["vegan", "vegetarian"]),
                dish(103, "Buddha Bowl", Some("quinoa, roasted vegetables, tahini"), 12900, "Bowls", &["vegan", "vegetarian", "gluten-free"]),
            ],
        },
        Restaurant {
            id: 2,
            name: "Indian Bites".into(),
            city: "Gothenburg".into(),
            address: Some("Avenyn 44".into()),
            delivery: true,
            takeaway: false,
            searchable: true,
            dishes: vec![
                dish(201, "Butter Chicken", Some("mild creamy tomato curry"), 15900, "Mains", &["halal", "gluten-free"]),
                dish(202, "Chicken Vindaloo", Some("hot and tangy Goan curry"), 15900, "Mains", &["halal"]),
                dish(203, "Daal Tadka", Some("yellow lentils with fried spices"), 11900, "Mains", &["vegan", "vegetarian", "gluten-free"]),
                dish(204, "Garlic Naan", Some("buttered flatbread"), 3900, "Sides", &["vegetarian"]),
            ],
        },
        Restaurant {
            id: 3,
            name: "Pizza Panorama".into(),
            city: "Stockholm".into(),
            address: Some("Hornsgatan 3".into()),
            delivery: false,
            takeaway: true,
            searchable: true,
            dishes: vec![
                dish(301, "Margherita", Some("tomato, mozzarella, basil"), 11900, "Pizza", &["vegetarian"]),
                dish(302, "Calzone", Some("folded pizza with ham and cheese"), 13900, "Pizza", &[]),
                dish(303, "Quattro Formaggi", Some("four-cheese pizza"), 14900, "Pizza", &["vegetarian"]),
                dish(304, "Marinara", Some("tomato, garlic, oregano, no cheese"), 10900, "Pizza", &["vegan", "vegetarian"]),
                dish(305, "Kebab Pizza", Some("kebab meat, onion, kebab sauce"), 13900, "Pizza", &[]),
            ],
        },
        Restaurant {
            id: 4,
            name: "Sushi Harbor".into(),
            city: "Malmö".into(),
            address: Some("Hamngatan 9".into()),
            delivery: true,
            takeaway: true,
            searchable: true,
            dishes: vec![
                dish(401, "Salmon Nigiri", Some("eight pieces, soy and wasabi"), 12900, "Sushi", &["lactose-free"]),
                dish(402, "Avocado Maki", Some("avocado, sesame, sushi rice"), 9900, "Sushi", &["vegan", "vegetarian", "lactose-free"]),
            ],
        },
    ];

    (restaurants, tags)
}

fn tag(id: i64, slug: &str, tag_type: TagType, name: &str, aliases: &[&str]) -> Tag {
    Tag {
        id,
        slug: slug.to_string(),
        tag_type,
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn dish(
    id: i64,
    name: &str,
    desc: Option<&str>,
    price_minor: i64,
    section: &str,
    tags: &[&str],
) -> Dish {
    Dish {
        id,
        name: name.to_string(),
        description: desc.map(str::to_string),
        price_minor: Some(price_minor),
        section: Some(section.to_string()),
        tag_slugs: tags.iter().map(|t| t.to_string()).collect(),
        embedding: Vec::new(),
    }
}
