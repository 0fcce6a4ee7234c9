use std::collections::HashMap;

use async_trait::async_trait;
use dishcovery_protocol::TagType;
use ndarray::ArrayView1;

use crate::error::{Result, StoreError};
use crate::store::MenuStore;
use crate::text::{best_field_similarity, trigram_similarity};
use crate::types::{
    AliasHit, MenuPage, MenuRow, Restaurant, RestaurantCandidate, RestaurantSummary, Tag,
};

const NAME_LOOKUP_MIN_SIMILARITY: f32 = 0.3;
const TAG_NAME_MIN_SIMILARITY: f32 = 0.4;

/// Reference implementation of [`MenuStore`] over plain vectors. Backs the
/// CLI demo and every test suite in the workspace.
pub struct MemoryStore {
    restaurants: Vec<Restaurant>,
    tags: Vec<Tag>,
    alias_index: HashMap<String, AliasHit>,
    slug_by_id: HashMap<i64, String>,
}

impl MemoryStore {
    pub fn new(restaurants: Vec<Restaurant>, tags: Vec<Tag>) -> Self {
        let mut alias_index = HashMap::new();
        let mut slug_by_id = HashMap::new();
        for tag in &tags {
            slug_by_id.insert(tag.id, tag.slug.clone());
            alias_index.insert(
                tag.slug.to_lowercase(),
                AliasHit {
                    tag_type: tag.tag_type,
                    tag_slug: tag.slug.clone(),
                },
            );
            for alias in &tag.aliases {
                alias_index.insert(
                    alias.to_lowercase(),
                    AliasHit {
                        tag_type: tag.tag_type,
                        tag_slug: tag.slug.clone(),
                    },
                );
            }
        }
        Self {
            restaurants,
            tags,
            alias_index,
            slug_by_id,
        }
    }

    fn required_slugs(&self, tag_ids: &[i64]) -> Vec<&str> {
        tag_ids
            .iter()
            .filter_map(|id| self.slug_by_id.get(id).map(String::as_str))
            .collect()
    }

    fn city_matches(restaurant: &Restaurant, city: Option<&str>) -> bool {
        match city {
            Some(city) => restaurant.city.eq_ignore_ascii_case(city),
            None => true,
        }
    }

    fn sort_rows(mut rows: Vec<MenuRow>) -> Vec<MenuRow> {
        rows.sort_by(|a, b| a.dish_name.cmp(&b.dish_name));
        rows
    }
}

fn dish_text_matches(row: &MenuRow, query: &str) -> bool {
    let needle = query.to_lowercase();
    let mut haystacks = vec![row.dish_name.to_lowercase()];
    if let Some(desc) = &row.description {
        haystacks.push(desc.to_lowercase());
    }
    if let Some(section) = &row.section {
        haystacks.push(section.to_lowercase());
    }
    haystacks.iter().any(|h| h.contains(&needle))
}

fn cosine(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);
    let denom = a.dot(&a).sqrt() * b.dot(&b).sqrt();
    (denom > 0.0).then(|| a.dot(&b) / denom)
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn search_by_tags_strict(
        &self,
        tag_ids: &[i64],
        query: Option<&str>,
        city: Option<&str>,
    ) -> Result<Vec<MenuRow>> {
        let required = self.required_slugs(tag_ids);
        let mut rows = Vec::new();
        for restaurant in &self.restaurants {
            if !Self::city_matches(restaurant, city) {
                continue;
            }
            for dish in &restaurant.dishes {
                let has_all = required
                    .iter()
                    .all(|slug| dish.tag_slugs.iter().any(|s| s == slug));
                if !has_all {
                    continue;
                }
                let row = restaurant.row_for(dish);
                if let Some(q) = query {
                    if !dish_text_matches(&row, q) {
                        continue;
                    }
                }
                rows.push(row);
            }
        }
        log::debug!(
            "tags_strict: {} tags, query={:?}, city={:?} -> {} rows",
            tag_ids.len(),
            query,
            city,
            rows.len()
        );
        Ok(Self::sort_rows(rows))
    }

    async fn search_fuzzy(
        &self,
        text: &str,
        city: Option<&str>,
        threshold: f32,
    ) -> Result<Vec<MenuRow>> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(StoreError::InvalidThreshold(threshold));
        }
        let mut rows = Vec::new();
        for restaurant in &self.restaurants {
            if !Self::city_matches(restaurant, city) {
                continue;
            }
            for dish in &restaurant.dishes {
                let mut best = best_field_similarity(text, &dish.name);
                if let Some(desc) = &dish.description {
                    best = best.max(best_field_similarity(text, desc));
                }
                if let Some(section) = &dish.section {
                    best = best.max(best_field_similarity(text, section));
                }
                if best >= threshold {
                    rows.push(restaurant.row_for(dish));
                }
            }
        }
        log::debug!(
            "fuzzy: text='{}', city={:?}, threshold={} -> {} rows",
            text,
            city,
            threshold,
            rows.len()
        );
        Ok(Self::sort_rows(rows))
    }

    async fn search_semantic(
        &self,
        embedding: &[f32],
        city: Option<&str>,
        tag_ids: &[i64],
    ) -> Result<Vec<MenuRow>> {
        let required = self.required_slugs(tag_ids);
        let mut scored: Vec<(f32, MenuRow)> = Vec::new();
        for restaurant in &self.restaurants {
            if !Self::city_matches(restaurant, city) {
                continue;
            }
            for dish in &restaurant.dishes {
                if !required
                    .iter()
                    .all(|slug| dish.tag_slugs.iter().any(|s| s == slug))
                {
                    continue;
                }
                if let Some(score) = cosine(embedding, &dish.embedding) {
                    scored.push((score, restaurant.row_for(dish)));
                }
            }
        }
        // Semantic rows are the one exception to name ordering: callers
        // want them by similarity.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().map(|(_, row)| row).collect())
    }

    async fn search_restaurant_by_name(&self, text: &str) -> Result<Vec<RestaurantCandidate>> {
        let mut candidates: Vec<RestaurantCandidate> = self
            .restaurants
            .iter()
            .filter_map(|r| {
                let score = trigram_similarity(text, &r.name)
                    .max(best_field_similarity(text, &r.name));
                (score >= NAME_LOOKUP_MIN_SIMILARITY).then(|| RestaurantCandidate {
                    id: r.id,
                    name: r.name.clone(),
                    city: r.city.clone(),
                    score,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(candidates)
    }

    async fn restaurant_menu(
        &self,
        restaurant_id: i64,
        offset: usize,
        limit: usize,
    ) -> Result<MenuPage> {
        let restaurant = self
            .restaurants
            .iter()
            .find(|r| r.id == restaurant_id)
            .ok_or(StoreError::RestaurantNotFound(restaurant_id))?;
        let total = restaurant.dishes.len();
        let rows = restaurant
            .dishes
            .iter()
            .skip(offset)
            .take(limit)
            .map(|dish| restaurant.row_for(dish))
            .collect();
        Ok(MenuPage {
            rows,
            total,
            offset,
        })
    }

    async fn resolve_alias(&self, term: &str) -> Result<Option<AliasHit>> {
        Ok(self.alias_index.get(&term.to_lowercase()).cloned())
    }

    async fn tag_by_slug(&self, slug: &str, allowed: &[TagType]) -> Result<Option<Tag>> {
        Ok(self
            .tags
            .iter()
            .find(|t| t.slug.eq_ignore_ascii_case(slug) && allowed.contains(&t.tag_type))
            .cloned())
    }

    async fn search_tags_fuzzy(&self, name: &str) -> Result<Vec<Tag>> {
        let mut scored: Vec<(f32, Tag)> = self
            .tags
            .iter()
            .filter_map(|t| {
                let score = trigram_similarity(name, &t.name);
                (score >= TAG_NAME_MIN_SIMILARITY).then(|| (score, t.clone()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().map(|(_, t)| t).collect())
    }

    async fn list_restaurants_alpha(&self, limit: usize) -> Result<Vec<RestaurantSummary>> {
        let mut summaries: Vec<RestaurantSummary> = self
            .restaurants
            .iter()
            .filter(|r| r.searchable)
            .map(|r| RestaurantSummary {
                id: r.id,
                name: r.name.clone(),
                city: r.city.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries.truncate(limit);
        Ok(summaries)
    }
}
