use dishcovery_protocol::Intent;

use crate::vocab::{mentions_explicit_veg, mentions_meat};

const VEG_SLUGS: [&str; 2] = ["vegan", "vegetarian"];

/// Pure safety transform: when the raw query mentions a meat/protein term
/// and does not explicitly ask for vegetarian/vegan food, inherited
/// vegan/vegetarian tags are dropped. Prevents "lamb vindaloo" from
/// silently carrying a "vegan" filter forward from the prior turn.
///
/// Takes and returns the intent by value so safety rules compose
/// left-to-right and each stays independently testable.
pub fn sanitize(mut intent: Intent, raw_text: &str) -> Intent {
    if !mentions_meat(raw_text) || mentions_explicit_veg(raw_text) {
        return intent;
    }

    let before = intent.hard_tags.len();
    intent
        .hard_tags
        .retain(|tag| !VEG_SLUGS.contains(&tag.slug.as_str()));
    intent
        .dietary
        .retain(|term| !VEG_SLUGS.contains(&term.as_str()));
    if intent.hard_tags.len() != before {
        log::debug!(
            "sanitize: dropped inherited veg tags for meat query '{}'",
            raw_text
        );
    }
    intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use dishcovery_protocol::{ResolvedTag, TagType};

    fn veg_tag() -> ResolvedTag {
        ResolvedTag {
            id: 1,
            slug: "vegan".into(),
            tag_type: TagType::Diet,
            name: "Vegan".into(),
        }
    }

    fn halal_tag() -> ResolvedTag {
        ResolvedTag {
            id: 2,
            slug: "halal".into(),
            tag_type: TagType::Religious,
            name: "Halal".into(),
        }
    }

    #[test]
    fn meat_query_drops_inherited_veg_tags() {
        let intent = Intent {
            dish_query: Some("lamb vindaloo".into()),
            dietary: vec!["vegan".into()],
            hard_tags: vec![veg_tag(), halal_tag()],
            ..Intent::default()
        };
        let out = sanitize(intent, "lamb vindaloo");
        assert_eq!(out.hard_tags.len(), 1);
        assert_eq!(out.hard_tags[0].slug, "halal");
        assert!(out.dietary.is_empty());
    }

    #[test]
    fn explicit_veg_word_disables_the_rule() {
        let intent = Intent {
            dish_query: Some("chicken".into()),
            hard_tags: vec![veg_tag()],
            ..Intent::default()
        };
        // "vegan chicken burger" is a deliberate ask; keep the tag.
        let out = sanitize(intent, "vegan chicken burger");
        assert_eq!(out.hard_tags.len(), 1);
    }

    #[test]
    fn non_meat_query_is_untouched() {
        let intent = Intent {
            dish_query: Some("daal".into()),
            hard_tags: vec![veg_tag()],
            ..Intent::default()
        };
        let out = sanitize(intent.clone(), "vegan daal");
        assert_eq!(out, intent);
    }
}
