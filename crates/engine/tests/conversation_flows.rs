//! End-to-end conversational flows against the in-memory store and the
//! phrasebook model: search laddering, grounding, follow-ups, pagination,
//! restaurant focus, and the error boundary.

use std::sync::Arc;

use dishcovery_engine::{Engine, PhrasebookModel};
use dishcovery_protocol::{
    ChatMessage, ChatRequest, ChatResponse, ConversationState, MessageKind, Mode, TagType,
    UiAction,
};
use dishcovery_store::{Dish, MemoryStore, Restaurant, Tag};
use pretty_assertions::assert_eq;

fn tag(id: i64, slug: &str, tag_type: TagType, name: &str, aliases: &[&str]) -> Tag {
    Tag {
        id,
        slug: slug.to_string(),
        tag_type,
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn dish(id: i64, name: &str, desc: Option<&str>, section: &str, tags: &[&str]) -> Dish {
    Dish {
        id,
        name: name.to_string(),
        description: desc.map(str::to_string),
        price_minor: Some(12900),
        section: Some(section.to_string()),
        tag_slugs: tags.iter().map(|t| t.to_string()).collect(),
        embedding: Vec::new(),
    }
}

fn restaurant(id: i64, name: &str, city: &str, dishes: Vec<Dish>) -> Restaurant {
    Restaurant {
        id,
        name: name.to_string(),
        city: city.to_string(),
        address: Some(format!("{name} street 1")),
        delivery: true,
        takeaway: true,
        searchable: true,
        dishes,
    }
}

fn fixture_engine() -> Engine {
    let tags = vec![
        tag(1, "vegan", TagType::Diet, "Vegan", &["vegansk", "plant-based"]),
        tag(2, "halal", TagType::Religious, "Halal", &[]),
        tag(3, "gluten-free", TagType::Allergen, "Gluten free", &["glutenfri"]),
    ];
    let restaurants = vec![
        restaurant(
            1,
            "Green Garden",
            "Stockholm",
            vec![
                dish(101, "Vegan Pizza", Some("tomato, basil and cashew cheese"), "Pizza", &["vegan"]),
                dish(102, "Vegan Burger", Some("smoky bean patty"), "Mains", &["vegan"]),
            ],
        ),
        restaurant(
            2,
            "Indian Bites",
            "Gothenburg",
            vec![
                dish(201, "Butter Chicken", Some("mild creamy tomato curry"), "Mains", &["halal"]),
                dish(202, "Lamb Korma", Some("slow-cooked yoghurt curry"), "Mains", &["halal"]),
            ],
        ),
        restaurant(
            3,
            "Pizza Panorama",
            "Stockholm",
            vec![
                dish(301, "Arrabbiata Pizza", None, "Pizza", &["vegan"]),
                dish(302, "Funghi Pizza", None, "Pizza", &["vegan"]),
                dish(303, "Marinara Pizza", None, "Pizza", &["vegan"]),
                dish(304, "Primavera Pizza", None, "Pizza", &["vegan"]),
                dish(305, "Rustica Pizza", None, "Pizza", &["vegan"]),
                dish(306, "Verdura Pizza", None, "Pizza", &["vegan"]),
            ],
        ),
    ];
    let store = Arc::new(MemoryStore::new(restaurants, tags));
    Engine::new(store, Arc::new(PhrasebookModel))
}

fn text_request(text: &str, state: ConversationState) -> ChatRequest {
    ChatRequest {
        messages: vec![ChatMessage::user(text)],
        state,
        ui_action: None,
    }
}

fn ui_request(action: UiAction, state: ConversationState) -> ChatRequest {
    ChatRequest {
        messages: Vec::new(),
        state,
        ui_action: Some(action),
    }
}

async fn turn(engine: &Engine, text: &str, state: ConversationState) -> ChatResponse {
    engine.handle(text_request(text, state)).await
}

#[tokio::test]
async fn tagged_search_hits_the_strict_ladder_step_and_grounds_results() {
    let engine = fixture_engine();
    let response = turn(&engine, "vegan pizza", ConversationState::default()).await;

    assert_eq!(response.message.kind, MessageKind::Results);
    let meta = response.meta.unwrap();
    assert_eq!(meta.ladder_step, Some('A'));
    assert!(meta.was_tag_filtered);

    // Panorama has the most matches, so it leads, truncated to four dishes.
    assert_eq!(response.message.restaurants.len(), 2);
    let lead = &response.message.restaurants[0];
    assert_eq!(lead.name, "Pizza Panorama");
    assert_eq!(lead.dishes.len(), 4);
    assert_eq!(lead.total, Some(6));
    assert_eq!(lead.next_offset, Some(4));

    let grounded = response.grounded.unwrap();
    assert_eq!(grounded.last_query.as_deref(), Some("pizza"));
    assert_eq!(grounded.last_dietary, vec!["vegan".to_string()]);
    assert_eq!(response.state.last_results.len(), 5);
    assert!(response.state.last_search_params.is_some());
}

#[tokio::test]
async fn city_filter_keeps_results_in_that_city() {
    let engine = fixture_engine();
    let response = turn(&engine, "vegan pizza in Stockholm", ConversationState::default()).await;

    assert_eq!(response.message.kind, MessageKind::Results);
    assert!(!response.message.restaurants.is_empty());
    for card in &response.message.restaurants {
        assert_eq!(card.city, "Stockholm");
    }
}

#[tokio::test]
async fn misspelled_query_lands_on_the_tag_only_step_and_stays_relevant() {
    let engine = fixture_engine();
    let response = turn(&engine, "vegan piza in Stockholm", ConversationState::default()).await;

    assert_eq!(response.message.kind, MessageKind::Results);
    let meta = response.meta.unwrap();
    assert_eq!(meta.ladder_step, Some('B'));
    assert!(meta.was_tag_filtered);

    // The tag-only step pulled in every vegan dish in town; the relevance
    // re-filter keeps only the pizza-shaped ones.
    for card in &response.message.restaurants {
        assert_eq!(card.city, "Stockholm");
        for d in &card.dishes {
            assert!(d.name.contains("Pizza"), "irrelevant dish kept: {}", d.name);
        }
    }
}

#[tokio::test]
async fn filler_query_reports_missing_tags_instead_of_fabricating() {
    let engine = fixture_engine();
    let response = turn(&engine, "anything", ConversationState::default()).await;

    assert_eq!(response.message.kind, MessageKind::NoResults);
    assert!(response.message.content.contains("no explicit dishes or dietary tags"));
    // Browsable suggestions still come back, without dishes.
    assert!(!response.message.restaurants.is_empty());
    assert!(response.message.restaurants.iter().all(|c| c.dishes.is_empty()));
}

#[tokio::test]
async fn meat_query_drops_the_inherited_veg_filter() {
    let engine = fixture_engine();
    let first = turn(&engine, "vegan pizza", ConversationState::default()).await;
    assert_eq!(first.message.kind, MessageKind::Results);

    // Without the safety rule the inherited vegan tag would hide this dish.
    let second = turn(&engine, "butter chicken", first.state).await;
    assert_eq!(second.message.kind, MessageKind::Results);
    assert_eq!(second.meta.unwrap().ladder_step, Some('C'));
    let names: Vec<&str> = second
        .message
        .restaurants
        .iter()
        .flat_map(|c| c.dishes.iter().map(|d| d.name.as_str()))
        .collect();
    assert!(names.contains(&"Butter Chicken"));
}

#[tokio::test]
async fn pronoun_followup_cites_the_grounded_description() {
    let engine = fixture_engine();
    let first = turn(&engine, "butter chicken", ConversationState::default()).await;
    assert_eq!(first.state.last_results.len(), 1);

    let second = turn(&engine, "is it spicy?", first.state).await;
    assert_eq!(second.message.kind, MessageKind::Answer);
    assert!(second.message.content.contains("mild creamy tomato curry"));
}

#[tokio::test]
async fn tag_followup_answers_yes_from_the_stored_tag_set() {
    let engine = fixture_engine();
    let first = turn(&engine, "butter chicken", ConversationState::default()).await;

    let second = turn(&engine, "is the butter chicken halal?", first.state).await;
    assert_eq!(second.message.kind, MessageKind::Answer);
    assert!(second.message.content.starts_with("Yes"));
    assert!(second.message.content.contains("halal"));
}

#[tokio::test]
async fn hopeless_search_falls_to_restaurant_suggestions() {
    let engine = fixture_engine();
    let response = turn(&engine, "zorblat fruit soup", ConversationState::default()).await;

    assert_eq!(response.message.kind, MessageKind::NoResults);
    assert_eq!(response.meta.unwrap().ladder_step, Some('E'));
    // Alphabetical suggestions, no dishes attached.
    assert_eq!(response.message.restaurants.len(), 3);
    assert_eq!(response.message.restaurants[0].name, "Green Garden");
    assert!(response.message.restaurants.iter().all(|c| c.dishes.is_empty()));

    let grounded = response.grounded.unwrap();
    assert!(grounded.no_results);
    assert_eq!(grounded.match_count, 0);
}

#[tokio::test]
async fn repeating_a_failed_search_skips_the_ladder() {
    let engine = fixture_engine();
    let first = turn(&engine, "zorblat fruit soup", ConversationState::default()).await;

    let second = turn(&engine, "zorblat fruit soup", first.state).await;
    assert_eq!(second.message.kind, MessageKind::NoResults);
    // No ladder run this time, so no step in the meta.
    assert_eq!(second.meta.unwrap().ladder_step, None);
    assert!(second.message.content.contains("Still nothing"));
}

#[tokio::test]
async fn changing_the_city_reruns_a_failed_search() {
    let engine = fixture_engine();
    let first = turn(&engine, "zorblat fruit soup in Gothenburg", ConversationState::default()).await;
    assert_eq!(first.message.kind, MessageKind::NoResults);

    // Same dish words, different city: a fresh ladder run, not a refusal.
    let second = turn(&engine, "zorblat fruit soup in Stockholm", first.state).await;
    assert_eq!(second.meta.unwrap().ladder_step, Some('E'));
    assert!(!second.message.content.contains("Still nothing"));
}

#[tokio::test]
async fn unscoped_retry_after_a_scoped_miss_is_not_blocked() {
    let engine = fixture_engine();
    let first = turn(
        &engine,
        "do they have vegan pizza at Indian Bites?",
        ConversationState::default(),
    )
    .await;
    assert_eq!(first.message.kind, MessageKind::NoResults);

    // Dropping the restaurant scope is a new search over the full corpus.
    let second = turn(&engine, "vegan pizza", first.state).await;
    assert_eq!(second.message.kind, MessageKind::Results);
    assert_eq!(second.meta.unwrap().ladder_step, Some('A'));
}

#[tokio::test]
async fn restaurant_show_more_never_repeats_dishes() {
    let engine = fixture_engine();
    let first = turn(&engine, "vegan pizza", ConversationState::default()).await;
    let page_one: Vec<i64> = first.message.restaurants[0]
        .dishes
        .iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(page_one.len(), 4);

    let second = engine
        .handle(ui_request(
            UiAction::ShowMoreRestaurant { restaurant_id: 3 },
            first.state,
        ))
        .await;
    assert_eq!(second.message.kind, MessageKind::Results);
    let card = &second.message.restaurants[0];
    assert_eq!(card.id, 3);
    assert_eq!(card.dishes.len(), 2);
    for d in &card.dishes {
        assert!(!page_one.contains(&d.id), "dish {} repeated across pages", d.id);
    }
    assert_eq!(card.shown, Some(6));
    assert_eq!(card.next_offset, None);
    assert!(second.state.cursor_for(3).unwrap().exhausted());

    // A third tap finds the cursor exhausted and changes nothing.
    let third = engine
        .handle(ui_request(
            UiAction::ShowMoreRestaurant { restaurant_id: 3 },
            second.state.clone(),
        ))
        .await;
    assert_eq!(third.message.kind, MessageKind::Answer);
    assert!(third.message.restaurants.is_empty());
    assert_eq!(third.state, second.state);
}

#[tokio::test]
async fn show_more_without_a_prior_search_explains_itself() {
    let engine = fixture_engine();
    let response = engine
        .handle(ui_request(UiAction::ShowMore, ConversationState::default()))
        .await;
    assert_eq!(response.message.kind, MessageKind::Answer);
    assert!(response.message.content.contains("no earlier search"));
}

#[tokio::test]
async fn bare_restaurant_name_reroutes_to_a_profile() {
    let engine = fixture_engine();
    let response = turn(&engine, "indian bites", ConversationState::default()).await;

    assert_eq!(response.message.kind, MessageKind::RestaurantProfile);
    assert_eq!(response.message.restaurants[0].name, "Indian Bites");
    // Focus candidate only; the mode flips on the explicit phrase.
    assert_eq!(response.state.current_restaurant_id, Some(2));
    assert_eq!(response.state.mode, Mode::Discovery);
}

#[tokio::test]
async fn enter_phrase_menu_and_exit_walk_the_restaurant_mode() {
    let engine = fixture_engine();
    let profile = turn(&engine, "indian bites", ConversationState::default()).await;

    let entered = turn(&engine, "ask about this restaurant", profile.state).await;
    assert_eq!(entered.message.kind, MessageKind::Answer);
    assert_eq!(entered.state.mode, Mode::Restaurant);
    assert!(entered.message.content.contains("Indian Bites"));

    let menu = turn(&engine, "show the menu", entered.state).await;
    assert_eq!(menu.message.kind, MessageKind::Menu);
    let card = &menu.message.restaurants[0];
    assert_eq!(card.dishes.len(), 2);
    assert_eq!(card.total, Some(2));
    assert!(menu.message.content.contains("Indian Bites"));
    assert_eq!(menu.state.last_results.len(), 2);

    let followup = turn(&engine, "is the lamb korma halal?", menu.state.clone()).await;
    assert_eq!(followup.message.kind, MessageKind::Answer);
    assert!(followup.message.content.starts_with("Yes"));

    let exited = turn(&engine, "back to all restaurants", menu.state).await;
    assert_eq!(exited.message.kind, MessageKind::Answer);
    assert_eq!(exited.state.mode, Mode::Discovery);
    assert_eq!(exited.state.current_restaurant_id, None);
}

#[tokio::test]
async fn focused_mode_never_leaks_other_restaurants() {
    let engine = fixture_engine();
    let profile = turn(&engine, "indian bites", ConversationState::default()).await;
    let entered = turn(&engine, "ask about this restaurant", profile.state).await;

    // Vegan pizza exists elsewhere, but not at the focused restaurant.
    let response = turn(&engine, "vegan pizza", entered.state).await;
    assert_eq!(response.message.kind, MessageKind::NoResults);
    assert!(response
        .message
        .restaurants
        .iter()
        .all(|c| c.dishes.is_empty()));
}

#[tokio::test]
async fn availability_question_scopes_the_search_to_the_named_restaurant() {
    let engine = fixture_engine();
    let response = turn(
        &engine,
        "do they have butter chicken at Indian Bites?",
        ConversationState::default(),
    )
    .await;

    assert_eq!(response.message.kind, MessageKind::Results);
    assert_eq!(response.message.restaurants.len(), 1);
    assert_eq!(response.message.restaurants[0].id, 2);
    assert_eq!(response.message.restaurants[0].dishes[0].name, "Butter Chicken");
}

#[tokio::test]
async fn scoped_search_with_no_match_reports_no_results() {
    let engine = fixture_engine();
    let response = turn(
        &engine,
        "do they have vegan pizza at Indian Bites?",
        ConversationState::default(),
    )
    .await;

    assert_eq!(response.message.kind, MessageKind::NoResults);
    assert!(response.message.restaurants.is_empty());
}

#[tokio::test]
async fn definition_question_is_answered_and_translatable() {
    let engine = fixture_engine();
    let explained = turn(&engine, "what is halal?", ConversationState::default()).await;
    assert_eq!(explained.message.kind, MessageKind::Answer);
    assert!(explained.message.content.contains("Islamic"));
    assert_eq!(
        explained.state.last_explain.as_deref(),
        Some(explained.message.content.as_str())
    );

    let translated = turn(&engine, "translate that", explained.state.clone()).await;
    assert_eq!(translated.message.kind, MessageKind::Answer);
    // The phrasebook model translates by identity.
    assert_eq!(translated.message.content, explained.message.content);
}

#[tokio::test]
async fn definition_annotates_grounded_menu_hits() {
    let engine = fixture_engine();
    let first = turn(&engine, "vegan pizza", ConversationState::default()).await;

    let explained = turn(&engine, "what is vegan?", first.state).await;
    assert_eq!(explained.message.kind, MessageKind::Answer);
    assert!(explained.message.content.contains("animal products"));
    assert!(explained.message.content.contains("also appears on this menu"));
}

#[tokio::test]
async fn unknown_term_hits_the_error_boundary_and_rolls_back() {
    let engine = fixture_engine();
    let first = turn(&engine, "vegan pizza", ConversationState::default()).await;
    let pre_state = first.state.clone();

    let response = turn(&engine, "what is zorblat?", first.state).await;
    assert_eq!(response.message.kind, MessageKind::Error);
    assert!(response.message.content.contains("Sorry"));
    assert_eq!(response.state, pre_state);
    assert!(response.grounded.is_none());
}

#[tokio::test]
async fn empty_turn_asks_for_clarification() {
    let engine = fixture_engine();
    let response = turn(&engine, "   ", ConversationState::default()).await;
    assert_eq!(response.message.kind, MessageKind::Clarify);
    assert!(response.message.followup_chips.is_empty());
}

#[tokio::test]
async fn ambiguous_followup_asks_instead_of_guessing() {
    let engine = fixture_engine();
    let first = turn(&engine, "halal food in Gothenburg", ConversationState::default()).await;
    assert!(first.state.last_results.len() >= 2);

    // Both grounded descriptions mention "curry".
    let second = turn(&engine, "is the curry spicy?", first.state).await;
    assert_eq!(second.message.kind, MessageKind::Clarify);
    assert!(second.message.content.contains("Which one"));
}
