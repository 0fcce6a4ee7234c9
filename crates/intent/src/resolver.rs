use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use dishcovery_protocol::{ResolvedTag, TagType};
use dishcovery_store::MenuStore;
use lru::LruCache;

use crate::vocab::CANONICAL_TAGS;

const CACHE_CAPACITY: usize = 256;

/// Resolves loose dietary/allergen terms to canonical catalog tags.
///
/// Per term, in order: exact alias lookup, alias with spaces and hyphens
/// swapped, direct slug match against the resolvable tag types, fuzzy name
/// lookup, and finally a small static canonical map. First hit wins.
/// Resolution never errors outward; a term that survives no step is
/// dropped so the search degrades to broader recall.
pub struct TagResolver {
    store: Arc<dyn MenuStore>,
    cache: Mutex<LruCache<String, Option<ResolvedTag>>>,
}

impl TagResolver {
    pub fn new(store: Arc<dyn MenuStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("nonzero cache capacity"),
            )),
        }
    }

    /// Resolve every term, deduplicated by resolved tag id.
    pub async fn resolve_terms(&self, terms: &[String]) -> Vec<ResolvedTag> {
        let mut resolved: Vec<ResolvedTag> = Vec::new();
        for term in terms {
            let Some(tag) = self.resolve_term(term).await else {
                log::debug!("tag resolution: no catalog match for '{term}', dropping");
                continue;
            };
            if !resolved.iter().any(|t| t.id == tag.id) {
                resolved.push(tag);
            }
        }
        resolved
    }

    pub async fn resolve_term(&self, term: &str) -> Option<ResolvedTag> {
        let key = term.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        if let Some(cached) = self.cache.lock().ok()?.get(&key) {
            return cached.clone();
        }

        let result = self.resolve_uncached(&key).await;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, result.clone());
        }
        result
    }

    async fn resolve_uncached(&self, term: &str) -> Option<ResolvedTag> {
        if let Some(tag) = self.by_alias(term).await {
            return Some(tag);
        }
        if let Some(tag) = self.by_alias(&swap_separators(term)).await {
            return Some(tag);
        }
        if let Some(tag) = self.by_slug(&slugify(term)).await {
            return Some(tag);
        }
        if let Some(tag) = self.by_fuzzy_name(term).await {
            return Some(tag);
        }
        self.by_canonical_map(term).await
    }

    async fn by_alias(&self, term: &str) -> Option<ResolvedTag> {
        let hit = match self.store.resolve_alias(term).await {
            Ok(hit) => hit?,
            Err(err) => {
                log::warn!("alias lookup failed for '{term}': {err}");
                return None;
            }
        };
        self.by_slug(&hit.tag_slug).await
    }

    async fn by_slug(&self, slug: &str) -> Option<ResolvedTag> {
        match self.store.tag_by_slug(slug, &TagType::RESOLVABLE).await {
            Ok(tag) => tag.map(|t| ResolvedTag {
                id: t.id,
                slug: t.slug,
                tag_type: t.tag_type,
                name: t.name,
            }),
            Err(err) => {
                log::warn!("slug lookup failed for '{slug}': {err}");
                None
            }
        }
    }

    async fn by_fuzzy_name(&self, term: &str) -> Option<ResolvedTag> {
        let tags = match self.store.search_tags_fuzzy(term).await {
            Ok(tags) => tags,
            Err(err) => {
                log::warn!("fuzzy tag lookup failed for '{term}': {err}");
                return None;
            }
        };
        tags.into_iter()
            .find(|t| TagType::RESOLVABLE.contains(&t.tag_type))
            .map(|t| ResolvedTag {
                id: t.id,
                slug: t.slug,
                tag_type: t.tag_type,
                name: t.name,
            })
    }

    async fn by_canonical_map(&self, term: &str) -> Option<ResolvedTag> {
        let (_, slug, _) = CANONICAL_TAGS
            .iter()
            .find(|(alias, _, _)| *alias == term)?;
        self.by_slug(slug).await
    }
}

fn slugify(term: &str) -> String {
    term.trim().to_lowercase().replace([' ', '_'], "-")
}

/// "gluten free" <-> "gluten-free".
fn swap_separators(term: &str) -> String {
    if term.contains('-') {
        term.replace('-', " ")
    } else {
        term.replace(' ', "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dishcovery_store::{MemoryStore, Tag};

    fn store_with_tags() -> Arc<dyn MenuStore> {
        let tags = vec![
            Tag {
                id: 1,
                slug: "vegan".into(),
                tag_type: TagType::Diet,
                name: "Vegan".into(),
                aliases: vec!["vegansk".into()],
            },
            Tag {
                id: 2,
                slug: "gluten-free".into(),
                tag_type: TagType::Allergen,
                name: "Gluten free".into(),
                aliases: vec![],
            },
            Tag {
                id: 3,
                slug: "spicy".into(),
                tag_type: TagType::Other,
                name: "Spicy".into(),
                aliases: vec![],
            },
        ];
        Arc::new(MemoryStore::new(Vec::new(), tags))
    }

    #[tokio::test]
    async fn alias_lookup_wins_first() {
        let resolver = TagResolver::new(store_with_tags());
        let tag = resolver.resolve_term("vegansk").await.unwrap();
        assert_eq!(tag.slug, "vegan");
    }

    #[tokio::test]
    async fn separator_swap_recovers_hyphenated_slug() {
        let resolver = TagResolver::new(store_with_tags());
        let tag = resolver.resolve_term("gluten free").await.unwrap();
        assert_eq!(tag.slug, "gluten-free");
    }

    #[tokio::test]
    async fn non_resolvable_types_are_excluded() {
        let resolver = TagResolver::new(store_with_tags());
        assert!(resolver.resolve_term("spicy").await.is_none());
    }

    #[tokio::test]
    async fn canonical_map_is_the_last_resort() {
        let resolver = TagResolver::new(store_with_tags());
        // "gf" has no alias, no slug, and fuzzy misses; the static map
        // routes it to gluten-free.
        let tag = resolver.resolve_term("gf").await.unwrap();
        assert_eq!(tag.slug, "gluten-free");
    }

    #[tokio::test]
    async fn duplicate_terms_dedupe_by_tag_id() {
        let resolver = TagResolver::new(store_with_tags());
        let tags = resolver
            .resolve_terms(&["vegan".into(), "vegansk".into()])
            .await;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, 1);
    }

    #[tokio::test]
    async fn unknown_terms_are_dropped_silently() {
        let resolver = TagResolver::new(store_with_tags());
        let tags = resolver
            .resolve_terms(&["vegan".into(), "astronaut".into()])
            .await;
        assert_eq!(tags.len(), 1);
    }
}
