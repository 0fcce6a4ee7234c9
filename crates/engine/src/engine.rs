//! The per-turn orchestrator.
//!
//! One entry point, [`Engine::handle`], consumes a [`ChatRequest`] and
//! returns a [`ChatResponse`]. The engine holds no conversation memory:
//! everything it knows about the session arrives in the request's
//! [`ConversationState`] and leaves in the response's replacement state.
//!
//! Failure discipline: advisory model calls degrade to heuristics, store
//! and content-producing model failures stop at the error boundary in
//! `handle`, which rolls the state back to the pre-turn snapshot and
//! answers with an apology. A caller never sees an `Err`.

use std::sync::Arc;

use dishcovery_intent::{sanitize, IntentNormalizer};
use dishcovery_protocol::{
    Action, AssistantMessage, ChatRequest, ChatResponse, ConversationState, GroundedRestaurant,
    GroundedState, Intent, Language, MessageKind, Mode, ResponseMeta, RestaurantCard,
    RestaurantCursor, SearchParams, UiAction, MAX_DISHES_PER_RESTAURANT,
    MAX_RESTAURANTS_PER_PAGE,
};
use dishcovery_search::{finalize, finalize_page, group_rows, restaurant_matches, FallbackChain};
use dishcovery_store::MenuStore;

use crate::error::Result;
use crate::explain::{self, ExplainQuestion};
use crate::followup::{self, FollowupOutcome};
use crate::llm::LanguageModel;
use crate::messages;
use crate::overrides::{self, ForcedAction, OverrideRule, RuleContext};
use crate::planner::Planner;
use crate::trace::RequestTrace;

/// Menu paging uses the restaurant page shape, not the dish-per-card one.
const MENU_PAGE_SIZE: usize = 8;

/// Minimal name-lookup score before a failed search reroutes to a profile.
const REROUTE_MIN_SCORE: f32 = 0.55;

/// Minimal name-lookup score for an explicit profile request.
const PROFILE_MIN_SCORE: f32 = 0.45;

struct TurnOutput {
    message: AssistantMessage,
    state: ConversationState,
    ladder_step: Option<char>,
    was_tag_filtered: bool,
}

impl TurnOutput {
    fn new(message: AssistantMessage, state: ConversationState) -> Self {
        Self {
            message,
            state,
            ladder_step: None,
            was_tag_filtered: false,
        }
    }
}

pub struct Engine {
    store: Arc<dyn MenuStore>,
    model: Arc<dyn LanguageModel>,
    normalizer: IntentNormalizer,
    chain: FallbackChain,
    planner: Planner,
    rules: Vec<OverrideRule>,
}

impl Engine {
    pub fn new(store: Arc<dyn MenuStore>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            normalizer: IntentNormalizer::new(Arc::clone(&store)),
            chain: FallbackChain::new(Arc::clone(&store)),
            planner: Planner::new(Arc::clone(&model)),
            rules: overrides::default_rules(),
            store,
            model,
        }
    }

    /// Run one conversational turn. Infallible at this boundary: any error
    /// below becomes an apology message with the pre-turn state echoed
    /// back untouched, so the caller can simply retry.
    pub async fn handle(&self, request: ChatRequest) -> ChatResponse {
        let pre_state = request.state.clone();
        let mut trace = RequestTrace::start();

        match self.handle_inner(&request, &mut trace).await {
            Ok(output) => {
                let grounded = output.state.grounded.clone();
                let (notes, elapsed) = trace.finish();
                ChatResponse {
                    message: output.message,
                    state: output.state,
                    grounded,
                    meta: Some(ResponseMeta {
                        ladder_step: output.ladder_step,
                        was_tag_filtered: output.was_tag_filtered,
                        elapsed_ms: elapsed,
                        trace: notes,
                    }),
                }
            }
            Err(err) => {
                log::error!("turn failed, rolling state back: {err}");
                trace.note(format!("error: {err}"));
                let (notes, elapsed) = trace.finish();
                ChatResponse {
                    message: AssistantMessage::new(MessageKind::Error, messages::apology()),
                    state: pre_state,
                    grounded: None,
                    meta: Some(ResponseMeta {
                        ladder_step: None,
                        was_tag_filtered: false,
                        elapsed_ms: elapsed,
                        trace: notes,
                    }),
                }
            }
        }
    }

    async fn handle_inner(
        &self,
        request: &ChatRequest,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let state = &request.state;

        // Structured chip taps skip text understanding entirely.
        if let Some(action) = &request.ui_action {
            trace.note(format!("ui action {action:?}"));
            let lang = Language::default();
            return match action {
                UiAction::ShowMore => self.paginate(lang, state, trace).await,
                UiAction::ShowMoreRestaurant { restaurant_id } => {
                    self.show_more_restaurant(lang, *restaurant_id, state, trace).await
                }
                UiAction::EnterRestaurant { restaurant_id } => {
                    let mut focused = state.clone();
                    focused.current_restaurant_id = Some(*restaurant_id);
                    self.enter_restaurant(lang, &focused).await
                }
                UiAction::ExitRestaurant => Ok(exit_restaurant(lang, state)),
            };
        }

        let text = request.latest_user_text();

        // Advisory extraction: a model failure only costs us the hint.
        let hint = match self.model.extract_intent(text, &request.messages).await {
            Ok(hint) => Some(hint),
            Err(err) => {
                log::warn!("intent extraction unavailable, using heuristics only: {err}");
                trace.note("extraction fell back to heuristics");
                None
            }
        };

        let intent = self
            .normalizer
            .normalize(text, &request.messages, state, hint.as_ref())
            .await;
        let intent = sanitize(intent, text);
        let lang = intent.language;

        if let Some((name, forced)) = overrides::evaluate(
            &self.rules,
            &RuleContext {
                text,
                intent: &intent,
                state,
            },
        ) {
            trace.note(format!("override {name}"));
            return match forced {
                ForcedAction::RestaurantScopedSearch { restaurant_name } => {
                    self.scoped_search(&restaurant_name, &intent, state, trace).await
                }
                ForcedAction::EnterRestaurantMode => self.enter_restaurant(lang, state).await,
            };
        }

        // Pagination and translate cues resolve before the planner; the
        // remaining follow-up outcomes wait for the planner to choose
        // Followup, so a fresh search mentioning a grounded dish name is
        // not hijacked.
        match followup::resolve(text, &intent, state) {
            FollowupOutcome::Paginate => {
                trace.note("followup paginate");
                return self.paginate(lang, state, trace).await;
            }
            FollowupOutcome::ShowMoreRestaurant { restaurant_id } => {
                trace.note("followup show-more-restaurant");
                return self.show_more_restaurant(lang, restaurant_id, state, trace).await;
            }
            FollowupOutcome::TranslateLast => {
                trace.note("followup translate-last");
                return self.translate_last(lang, state).await;
            }
            _ => {}
        }

        let plan = self.planner.plan(text, &intent, state).await;
        trace.note(format!(
            "planned {:?} at {:.2}",
            plan.action, plan.confidence
        ));

        let mut intent = intent;
        let mut scope = None;
        if let Some(over) = &plan.search_override {
            if over.clear_dish_query {
                intent.dish_query = None;
            }
            scope = over.restaurant_id;
        }
        let mut state = state.clone();
        if let Some(patch) = &plan.prefs_patch {
            state.prefs.apply(patch);
        }
        let state = &state;

        match plan.action {
            Action::Search => self.run_search(&intent, state, scope, false, trace).await,
            Action::Followup => self.run_followup(text, &intent, state, trace).await,
            Action::Explain => self.run_explain(text, &intent, state, trace).await,
            Action::Reshow => self.reshow(lang, state, trace).await,
            Action::ExitRestaurant => Ok(exit_restaurant(lang, state)),
            Action::ShowMenu => self.show_menu(&intent, state, trace).await,
            Action::Clarify => Ok(TurnOutput::new(
                AssistantMessage::new(MessageKind::Clarify, messages::clarify_generic(lang)),
                state.clone(),
            )),
            Action::RestaurantLookup => {
                let name = intent
                    .restaurant_name
                    .clone()
                    .unwrap_or_else(|| text.trim().to_string());
                self.lookup_restaurant(&name, &intent, state, false, trace).await
            }
        }
    }

    /// The search pipeline: fallback ladder, finalizer, grounding.
    ///
    /// `rerouted` caps profile/search rerouting at one hop in either
    /// direction.
    async fn run_search(
        &self,
        intent: &Intent,
        state: &ConversationState,
        scope: Option<i64>,
        rerouted: bool,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let lang = intent.language;
        let tag_ids = intent.tag_ids();
        let query = intent.dish_query.as_deref();
        let city = intent.city.as_deref();

        // Don't re-run the identical search the user just watched fail.
        // Changing any parameter (city, tags, scope) is a new search.
        if let (Some(grounded), Some(prior)) = (&state.grounded, &state.last_search_params) {
            if grounded.no_results
                && query.is_some()
                && prior.query.as_deref() == query
                && prior.tag_ids == tag_ids
                && prior.city.as_deref() == city
                && prior.restaurant_id == scope
            {
                trace.note("repeat of a failed search, skipping the ladder");
                return Ok(TurnOutput::new(
                    AssistantMessage::new(MessageKind::NoResults, messages::still_no_results(lang)),
                    state.clone(),
                ));
            }
        }

        let mut outcome = self.chain.search(&tag_ids, query, city).await?;
        trace.note(format!("ladder step {}", outcome.step.as_char()));
        if let Some(id) = scope {
            outcome.cards.retain(|card| card.id == id);
        }

        if outcome.no_results {
            // Before giving up, check whether the "dish" was a restaurant.
            if !rerouted {
                if let Some(q) = query {
                    match self.store.search_restaurant_by_name(q).await {
                        Ok(candidates) => {
                            if let Some(best) = candidates
                                .into_iter()
                                .next()
                                .filter(|c| c.score >= REROUTE_MIN_SCORE)
                            {
                                trace.note(format!("rerouting to profile '{}'", best.name));
                                // Boxed: the profile handler can call back
                                // into the search pipeline.
                                return Box::pin(
                                    self.lookup_restaurant(&best.name, intent, state, true, trace),
                                )
                                .await;
                            }
                        }
                        Err(err) => log::warn!("name lookup during reroute failed: {err}"),
                    }
                }
            }
            return Ok(no_results_output(
                lang,
                intent,
                state,
                outcome.cards,
                &tag_ids,
                scope,
            ));
        }

        let step = outcome.step.as_char();
        let was_tag_filtered = outcome.was_tag_filtered;
        let finalized = finalize(outcome.cards, state, intent, was_tag_filtered);

        // The relevance re-filter can empty a page that the ladder
        // considered a hit; the user still sees that as "no results".
        if finalized.cards.is_empty() {
            trace.note("relevance re-filter emptied the page");
            return Ok(no_results_output(lang, intent, state, Vec::new(), &tag_ids, scope));
        }

        let mut next = state.clone();
        next.ground(&finalized.cards, query, &intent.dietary);
        next.last_search_params = Some(SearchParams {
            query: query.map(str::to_string),
            tag_ids,
            city: city.map(str::to_string),
            restaurant_id: scope,
        });
        next.restaurant_cursors.clear();
        for card in &finalized.cards {
            if let (Some(shown), Some(total)) = (card.shown, card.total) {
                next.upsert_cursor(RestaurantCursor {
                    restaurant_id: card.id,
                    shown_count: shown,
                    total_matches: total,
                    next_offset: card.next_offset,
                });
            }
        }
        // A full page may have more restaurants behind it.
        next.next_offset =
            (finalized.cards.len() == MAX_RESTAURANTS_PER_PAGE).then_some(MAX_RESTAURANTS_PER_PAGE);

        let dishes: usize = finalized.cards.iter().map(|c| c.dishes.len()).sum();
        let message =
            AssistantMessage::new(MessageKind::Results, messages::results(lang, dishes, finalized.cards.len()))
                .with_restaurants(finalized.cards);
        Ok(TurnOutput {
            message,
            state: next,
            ladder_step: Some(step),
            was_tag_filtered,
        })
    }

    async fn scoped_search(
        &self,
        restaurant_name: &str,
        intent: &Intent,
        state: &ConversationState,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let candidates = self.store.search_restaurant_by_name(restaurant_name).await?;
        let scope = candidates
            .into_iter()
            .next()
            .filter(|c| c.score >= PROFILE_MIN_SCORE)
            .map(|c| c.id);
        if scope.is_none() {
            trace.note("scoped search target not found, searching everywhere");
        }
        self.run_search(intent, state, scope, false, trace).await
    }

    async fn run_followup(
        &self,
        text: &str,
        intent: &Intent,
        state: &ConversationState,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let lang = intent.language;
        match followup::resolve(text, intent, state) {
            FollowupOutcome::Resolved { answer, .. } => {
                let mut next = state.clone();
                next.last_explain = Some(answer.clone());
                Ok(TurnOutput::new(
                    AssistantMessage::new(MessageKind::Answer, answer),
                    next,
                ))
            }
            FollowupOutcome::Clarify { candidates } => Ok(TurnOutput::new(
                AssistantMessage::new(
                    MessageKind::Clarify,
                    messages::clarify_candidates(lang, &candidates),
                ),
                state.clone(),
            )),
            FollowupOutcome::Paginate => self.paginate(lang, state, trace).await,
            FollowupOutcome::ShowMoreRestaurant { restaurant_id } => {
                self.show_more_restaurant(lang, restaurant_id, state, trace).await
            }
            FollowupOutcome::TranslateLast => self.translate_last(lang, state).await,
            FollowupOutcome::Pass => {
                trace.note("followup had no grounded candidate, searching");
                self.run_search(intent, state, None, false, trace).await
            }
        }
    }

    async fn run_explain(
        &self,
        text: &str,
        intent: &Intent,
        state: &ConversationState,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let lang = intent.language;
        match explain::classify(text) {
            ExplainQuestion::Definition { term } => {
                // A content-producing call; its failure crosses the error
                // boundary instead of guessing an answer.
                let mut answer = self.model.explain(&term, lang).await?;
                let hits = explain::menu_hits(&term, &state.last_results);
                if !hits.is_empty() {
                    answer.push_str(&messages::also_on_menu(lang, &hits));
                }
                let mut next = state.clone();
                next.last_explain = Some(answer.clone());
                Ok(TurnOutput::new(
                    AssistantMessage::new(MessageKind::Answer, answer),
                    next,
                ))
            }
            ExplainQuestion::MenuFact => match followup::resolve(text, intent, state) {
                FollowupOutcome::Resolved { answer, .. } => {
                    let mut next = state.clone();
                    next.last_explain = Some(answer.clone());
                    Ok(TurnOutput::new(
                        AssistantMessage::new(MessageKind::Answer, answer),
                        next,
                    ))
                }
                FollowupOutcome::Clarify { candidates } => Ok(TurnOutput::new(
                    AssistantMessage::new(
                        MessageKind::Clarify,
                        messages::clarify_candidates(lang, &candidates),
                    ),
                    state.clone(),
                )),
                _ => {
                    trace.note("menu-fact question had no grounded dish");
                    Ok(TurnOutput::new(
                        AssistantMessage::new(MessageKind::Clarify, messages::clarify_generic(lang)),
                        state.clone(),
                    ))
                }
            },
        }
    }

    /// Re-render the last finalized page by re-running the stored search.
    /// The whole pipeline is deterministic, so this reproduces what the
    /// user saw without the state having to carry card payloads.
    async fn reshow(
        &self,
        lang: Language,
        state: &ConversationState,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let Some(params) = state.last_search_params.clone() else {
            return Ok(TurnOutput::new(
                AssistantMessage::new(MessageKind::Answer, messages::nothing_to_reshow(lang)),
                state.clone(),
            ));
        };
        let mut outcome = self
            .chain
            .search(&params.tag_ids, params.query.as_deref(), params.city.as_deref())
            .await?;
        if let Some(id) = params.restaurant_id {
            outcome.cards.retain(|card| card.id == id);
        }
        trace.note("reshowing the previous page");
        let intent = intent_from_params(&params, state);
        let finalized = finalize(outcome.cards, state, &intent, outcome.was_tag_filtered);
        let message = AssistantMessage::new(MessageKind::Results, messages::reshow(lang))
            .with_restaurants(finalized.cards);
        Ok(TurnOutput::new(message, state.clone()))
    }

    /// Global "show more": re-run the stored search and cut the page that
    /// starts past the restaurants already shown.
    async fn paginate(
        &self,
        lang: Language,
        state: &ConversationState,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let Some(params) = state.last_search_params.clone() else {
            return Ok(TurnOutput::new(
                AssistantMessage::new(MessageKind::Answer, messages::nothing_to_page(lang)),
                state.clone(),
            ));
        };
        let Some(offset) = state.next_offset else {
            return Ok(TurnOutput::new(
                AssistantMessage::new(MessageKind::Answer, messages::no_more_results(lang)),
                state.clone(),
            ));
        };

        let mut outcome = self
            .chain
            .search(&params.tag_ids, params.query.as_deref(), params.city.as_deref())
            .await?;
        if let Some(id) = params.restaurant_id {
            outcome.cards.retain(|card| card.id == id);
        }
        let intent = intent_from_params(&params, state);
        let finalized = finalize_page(outcome.cards, state, &intent, outcome.was_tag_filtered, offset);
        trace.note(format!(
            "paged {} restaurants from offset {offset}",
            finalized.cards.len()
        ));

        if finalized.cards.is_empty() {
            let mut next = state.clone();
            next.next_offset = None;
            return Ok(TurnOutput::new(
                AssistantMessage::new(MessageKind::Answer, messages::no_more_results(lang)),
                next,
            ));
        }

        let mut next = state.clone();
        let dietary = next
            .grounded
            .as_ref()
            .map(|g| g.last_dietary.clone())
            .unwrap_or_default();
        next.ground(&finalized.cards, params.query.as_deref(), &dietary);
        for card in &finalized.cards {
            if let (Some(shown), Some(total)) = (card.shown, card.total) {
                next.upsert_cursor(RestaurantCursor {
                    restaurant_id: card.id,
                    shown_count: shown,
                    total_matches: total,
                    next_offset: card.next_offset,
                });
            }
        }
        next.next_offset = (finalized.cards.len() == MAX_RESTAURANTS_PER_PAGE)
            .then_some(offset + MAX_RESTAURANTS_PER_PAGE);

        let message = AssistantMessage::new(MessageKind::Results, messages::more_results(lang))
            .with_restaurants(finalized.cards);
        Ok(TurnOutput::new(message, next))
    }

    /// Per-restaurant "show more": slice the next dishes out of that
    /// restaurant's full (untruncated) match list.
    async fn show_more_restaurant(
        &self,
        lang: Language,
        restaurant_id: i64,
        state: &ConversationState,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let name = restaurant_display_name(state, restaurant_id);

        let Some(cursor) = state.cursor_for(restaurant_id).cloned() else {
            // No cursor means nothing was held back.
            return Ok(exhausted_output(lang, state, name.as_deref()));
        };
        let Some(offset) = cursor.next_offset else {
            trace.note("cursor exhausted, no state patch");
            return Ok(exhausted_output(lang, state, name.as_deref()));
        };

        let Some(params) = state.last_search_params.clone() else {
            // The cursor came from menu paging, not a search.
            return self.menu_page(lang, restaurant_id, offset, state, trace).await;
        };

        let outcome = self
            .chain
            .search(&params.tag_ids, params.query.as_deref(), params.city.as_deref())
            .await?;
        let intent = intent_from_params(&params, state);
        let identity = outcome.cards.iter().find(|c| c.id == restaurant_id).cloned();
        let all = restaurant_matches(outcome.cards, &intent, outcome.was_tag_filtered, restaurant_id);
        let page: Vec<_> = all
            .iter()
            .skip(offset)
            .take(MAX_DISHES_PER_RESTAURANT)
            .cloned()
            .collect();

        let (Some(identity), false) = (identity, page.is_empty()) else {
            trace.note("restaurant matches exhausted");
            let mut next = state.clone();
            next.upsert_cursor(RestaurantCursor {
                restaurant_id,
                shown_count: cursor.shown_count,
                total_matches: cursor.total_matches,
                next_offset: None,
            });
            return Ok(exhausted_output(lang, &next, name.as_deref()));
        };

        let total = all.len();
        let shown_count = (offset + page.len()).min(total);
        let next_off = (shown_count < total).then_some(shown_count);
        trace.note(format!(
            "restaurant {restaurant_id} page {offset}..{shown_count} of {total}"
        ));

        let card = RestaurantCard {
            dishes: page,
            shown: Some(shown_count),
            total: Some(total),
            next_offset: next_off,
            ..identity
        };

        let mut next = state.clone();
        next.upsert_cursor(RestaurantCursor {
            restaurant_id,
            shown_count,
            total_matches: total,
            next_offset: next_off,
        });
        let dietary = next
            .grounded
            .as_ref()
            .map(|g| g.last_dietary.clone())
            .unwrap_or_default();
        next.ground(&[card.clone()], params.query.as_deref(), &dietary);

        let message =
            AssistantMessage::new(MessageKind::Results, messages::more_from(lang, &card.name))
                .with_restaurants(vec![card]);
        Ok(TurnOutput::new(message, next))
    }

    async fn show_menu(
        &self,
        intent: &Intent,
        state: &ConversationState,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let lang = intent.language;
        let restaurant_id = match (&intent.restaurant_name, state.current_restaurant_id) {
            (Some(name), _) => {
                let candidates = self.store.search_restaurant_by_name(name).await?;
                match candidates
                    .into_iter()
                    .next()
                    .filter(|c| c.score >= PROFILE_MIN_SCORE)
                {
                    Some(best) => best.id,
                    None => {
                        return Ok(TurnOutput::new(
                            AssistantMessage::new(
                                MessageKind::Answer,
                                messages::restaurant_not_found(lang, name),
                            ),
                            state.clone(),
                        ))
                    }
                }
            }
            (None, Some(id)) => id,
            (None, None) => {
                return Ok(TurnOutput::new(
                    AssistantMessage::new(MessageKind::Clarify, messages::clarify_generic(lang)),
                    state.clone(),
                ))
            }
        };
        self.menu_page(lang, restaurant_id, 0, state, trace).await
    }

    async fn menu_page(
        &self,
        lang: Language,
        restaurant_id: i64,
        offset: usize,
        state: &ConversationState,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let page = self
            .store
            .restaurant_menu(restaurant_id, offset, MENU_PAGE_SIZE)
            .await?;
        trace.note(format!(
            "menu page {offset}..{} of {}",
            offset + page.rows.len(),
            page.total
        ));

        let next_off = page.next_offset();
        let Some(mut card) = group_rows(page.rows).into_iter().next() else {
            let name = restaurant_display_name(state, restaurant_id)
                .unwrap_or_else(|| "This restaurant".to_string());
            let content = if offset > 0 {
                messages::exhausted(lang, &name)
            } else {
                messages::menu_empty(lang, &name)
            };
            return Ok(TurnOutput::new(
                AssistantMessage::new(MessageKind::Answer, content),
                state.clone(),
            ));
        };

        let shown_count = offset + card.dishes.len();
        card.shown = Some(shown_count);
        card.total = Some(page.total);
        card.next_offset = next_off;

        let mut next = state.clone();
        next.upsert_cursor(RestaurantCursor {
            restaurant_id,
            shown_count,
            total_matches: page.total,
            next_offset: next_off,
        });
        // Menu pages are grounded like results so follow-ups can cite them,
        // but they do not become a resumable search.
        next.ground(&[card.clone()], None, &[]);
        next.last_search_params = None;
        next.next_offset = None;

        let content = messages::menu_intro(lang, &card.name, shown_count, page.total);
        let message =
            AssistantMessage::new(MessageKind::Menu, content).with_restaurants(vec![card]);
        Ok(TurnOutput::new(message, next))
    }

    /// Restaurant profile. Leaves a focus candidate in
    /// `current_restaurant_id` but keeps mode Discovery; only the explicit
    /// enter phrase (or chip) flips the mode.
    async fn lookup_restaurant(
        &self,
        name: &str,
        intent: &Intent,
        state: &ConversationState,
        rerouted: bool,
        trace: &mut RequestTrace,
    ) -> Result<TurnOutput> {
        let lang = intent.language;
        let candidates = self.store.search_restaurant_by_name(name).await?;
        let best = candidates
            .into_iter()
            .next()
            .filter(|c| c.score >= PROFILE_MIN_SCORE);

        let Some(best) = best else {
            if !rerouted {
                trace.note("no profile match, falling back to dish search");
                return Box::pin(self.run_search(intent, state, None, true, trace)).await;
            }
            return Ok(TurnOutput::new(
                AssistantMessage::new(
                    MessageKind::Answer,
                    messages::restaurant_not_found(lang, name),
                ),
                state.clone(),
            ));
        };
        trace.note(format!("profile for restaurant {}", best.id));

        // Identity details live on the menu rows.
        let first_row = self
            .store
            .restaurant_menu(best.id, 0, 1)
            .await
            .ok()
            .and_then(|page| page.rows.into_iter().next());
        let (address, delivery, takeaway) = first_row
            .map(|row| (row.address, row.delivery, row.takeaway))
            .unwrap_or((None, false, false));

        let card = RestaurantCard {
            id: best.id,
            name: best.name.clone(),
            city: best.city.clone(),
            address,
            delivery,
            takeaway,
            dishes: Vec::new(),
            shown: None,
            total: None,
            next_offset: None,
        };

        let mut next = state.clone();
        next.current_restaurant_id = Some(best.id);
        next.last_results.clear();
        next.grounded = Some(GroundedState {
            restaurants: vec![GroundedRestaurant {
                id: best.id,
                name: best.name.clone(),
                dish_ids: Vec::new(),
            }],
            last_query: None,
            last_dietary: Vec::new(),
            match_count: 0,
            no_results: false,
        });

        let content = messages::profile(lang, &best.name, &best.city);
        let message = AssistantMessage::new(MessageKind::RestaurantProfile, content)
            .with_restaurants(vec![card]);
        Ok(TurnOutput::new(message, next))
    }

    async fn enter_restaurant(
        &self,
        lang: Language,
        state: &ConversationState,
    ) -> Result<TurnOutput> {
        let Some(id) = state.current_restaurant_id else {
            return Ok(TurnOutput::new(
                AssistantMessage::new(MessageKind::Clarify, messages::clarify_generic(lang)),
                state.clone(),
            ));
        };
        let name = match restaurant_display_name(state, id) {
            Some(name) => name,
            None => self
                .store
                .restaurant_menu(id, 0, 1)
                .await
                .ok()
                .and_then(|page| page.rows.into_iter().next())
                .map(|row| row.restaurant_name)
                .unwrap_or_else(|| "this restaurant".to_string()),
        };
        let mut next = state.clone();
        next.mode = Mode::Restaurant;
        next.current_restaurant_id = Some(id);
        Ok(TurnOutput::new(
            AssistantMessage::new(MessageKind::Answer, messages::entered_restaurant(lang, &name)),
            next,
        ))
    }

    /// Re-render the previous explain/follow-up answer via the model's
    /// translate call. Content-producing: failures cross the boundary.
    async fn translate_last(
        &self,
        lang: Language,
        state: &ConversationState,
    ) -> Result<TurnOutput> {
        let Some(source) = state.last_explain.clone() else {
            return Ok(TurnOutput::new(
                AssistantMessage::new(MessageKind::Answer, messages::nothing_to_translate(lang)),
                state.clone(),
            ));
        };
        let translated = self.model.translate(&source, lang).await?;
        let mut next = state.clone();
        next.last_explain = Some(translated.clone());
        Ok(TurnOutput::new(
            AssistantMessage::new(MessageKind::Answer, translated),
            next,
        ))
    }
}

fn exit_restaurant(lang: Language, state: &ConversationState) -> TurnOutput {
    let mut next = state.clone();
    next.mode = Mode::Discovery;
    next.current_restaurant_id = None;
    TurnOutput::new(
        AssistantMessage::new(MessageKind::Answer, messages::exited_restaurant(lang)),
        next,
    )
}

/// Step E (or an emptied page): restaurant suggestions with `no_results`
/// grounding, so the next identical query is answered without the ladder.
fn no_results_output(
    lang: Language,
    intent: &Intent,
    state: &ConversationState,
    suggestions: Vec<RestaurantCard>,
    tag_ids: &[i64],
    scope: Option<i64>,
) -> TurnOutput {
    let mut next = state.clone();
    next.last_results.clear();
    next.grounded = Some(GroundedState {
        restaurants: suggestions
            .iter()
            .map(|c| GroundedRestaurant {
                id: c.id,
                name: c.name.clone(),
                dish_ids: Vec::new(),
            })
            .collect(),
        last_query: intent.dish_query.clone(),
        last_dietary: intent.dietary.clone(),
        match_count: 0,
        no_results: true,
    });
    next.last_search_params = Some(SearchParams {
        query: intent.dish_query.clone(),
        tag_ids: tag_ids.to_vec(),
        city: intent.city.clone(),
        restaurant_id: scope,
    });
    next.next_offset = None;
    next.restaurant_cursors.clear();

    let content = if intent.vague && intent.hard_tags.is_empty() {
        messages::no_tags_found(lang)
    } else {
        messages::no_results(lang)
    };
    let message =
        AssistantMessage::new(MessageKind::NoResults, content).with_restaurants(suggestions);
    TurnOutput {
        message,
        state: next,
        ladder_step: Some('E'),
        was_tag_filtered: false,
    }
}

fn exhausted_output(lang: Language, state: &ConversationState, name: Option<&str>) -> TurnOutput {
    let content = match name {
        Some(name) => messages::exhausted(lang, name),
        None => messages::no_more_results(lang),
    };
    TurnOutput::new(
        AssistantMessage::new(MessageKind::Answer, content),
        state.clone(),
    )
}

fn restaurant_display_name(state: &ConversationState, restaurant_id: i64) -> Option<String> {
    if let Some(grounded) = &state.grounded {
        if let Some(r) = grounded.restaurants.iter().find(|r| r.id == restaurant_id) {
            return Some(r.name.clone());
        }
    }
    state
        .last_results
        .iter()
        .find(|d| d.restaurant_id == restaurant_id)
        .map(|d| d.restaurant_name.clone())
}

/// Rebuild the intent a stored search ran with, enough to drive the
/// finalizer's relevance re-filter the same way the original turn did.
fn intent_from_params(params: &SearchParams, state: &ConversationState) -> Intent {
    Intent {
        dish_query: params.query.clone(),
        city: params.city.clone(),
        dietary: state
            .grounded
            .as_ref()
            .map(|g| g.last_dietary.clone())
            .unwrap_or_default(),
        ..Intent::default()
    }
}
