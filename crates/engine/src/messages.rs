//! User-facing message templates, English and Swedish. Raw internal errors
//! never reach these; the boundary only ever emits [`apology`].

use dishcovery_protocol::Language;

pub fn results(lang: Language, dishes: usize, restaurants: usize) -> String {
    match lang {
        Language::En => format!(
            "Here's what I found — {dishes} dishes across {restaurants} restaurants."
        ),
        Language::Sv => format!(
            "Här är vad jag hittade — {dishes} rätter på {restaurants} restauranger."
        ),
    }
}

/// Vague query with no resolvable tags: say that nothing was filtered
/// rather than fabricating a match list.
pub fn no_tags_found(lang: Language) -> String {
    match lang {
        Language::En => "I found no explicit dishes or dietary tags in your request, \
                         so here are some restaurants you could browse instead."
            .to_string(),
        Language::Sv => "Jag hittade inga tydliga rätter eller kosttaggar i din förfrågan, \
                         så här är några restauranger du kan titta på istället."
            .to_string(),
    }
}

pub fn no_results(lang: Language) -> String {
    match lang {
        Language::En => "I couldn't find any matching dishes. \
                         Here are some restaurants you could browse:"
            .to_string(),
        Language::Sv => "Jag hittade inga matchande rätter. \
                         Här är några restauranger du kan titta på:"
            .to_string(),
    }
}

pub fn still_no_results(lang: Language) -> String {
    match lang {
        Language::En => "Still nothing for that search, I'm afraid. \
                         Try different words or drop a filter?"
            .to_string(),
        Language::Sv => "Fortfarande inget för den sökningen, tyvärr. \
                         Prova andra ord eller ta bort ett filter?"
            .to_string(),
    }
}

pub fn apology() -> String {
    "Sorry — something went wrong on my side. Please try again.".to_string()
}

pub fn exhausted(lang: Language, restaurant: &str) -> String {
    match lang {
        Language::En => format!("That's everything from {restaurant} — no more matches to show."),
        Language::Sv => format!("Det var allt från {restaurant} — inga fler träffar att visa."),
    }
}

pub fn nothing_to_page(lang: Language) -> String {
    match lang {
        Language::En => "There's no earlier search to continue — ask me for something first."
            .to_string(),
        Language::Sv => "Det finns ingen tidigare sökning att fortsätta — be mig om något först."
            .to_string(),
    }
}

pub fn more_results(lang: Language) -> String {
    match lang {
        Language::En => "Here are more results:".to_string(),
        Language::Sv => "Här är fler resultat:".to_string(),
    }
}

pub fn no_more_results(lang: Language) -> String {
    match lang {
        Language::En => "That's everything I found — no more results to show.".to_string(),
        Language::Sv => "Det var allt jag hittade — inga fler resultat att visa.".to_string(),
    }
}

pub fn more_from(lang: Language, restaurant: &str) -> String {
    match lang {
        Language::En => format!("More from {restaurant}:"),
        Language::Sv => format!("Mer från {restaurant}:"),
    }
}

pub fn nothing_to_translate(lang: Language) -> String {
    match lang {
        Language::En => "There's nothing from this conversation to translate yet.".to_string(),
        Language::Sv => "Det finns inget från det här samtalet att översätta än.".to_string(),
    }
}

pub fn menu_empty(lang: Language, name: &str) -> String {
    match lang {
        Language::En => format!("{name} hasn't published a menu here yet."),
        Language::Sv => format!("{name} har inte publicerat någon meny här än."),
    }
}

pub fn profile(lang: Language, name: &str, city: &str) -> String {
    match lang {
        Language::En => format!(
            "{name} is in {city}. Say \"ask about this restaurant\" to focus on it, \
             or ask for a dish."
        ),
        Language::Sv => format!(
            "{name} ligger i {city}. Säg \"fråga om restaurangen\" för att fokusera på den, \
             eller fråga efter en rätt."
        ),
    }
}

pub fn entered_restaurant(lang: Language, name: &str) -> String {
    match lang {
        Language::En => format!("You're now asking about {name}. What would you like to know?"),
        Language::Sv => format!("Du frågar nu om {name}. Vad vill du veta?"),
    }
}

pub fn exited_restaurant(lang: Language) -> String {
    match lang {
        Language::En => "Back to searching across all restaurants.".to_string(),
        Language::Sv => "Tillbaka till att söka bland alla restauranger.".to_string(),
    }
}

pub fn menu_intro(lang: Language, name: &str, shown: usize, total: usize) -> String {
    match lang {
        Language::En => format!("Menu for {name} ({shown} of {total} dishes):"),
        Language::Sv => format!("Meny för {name} ({shown} av {total} rätter):"),
    }
}

pub fn reshow(lang: Language) -> String {
    match lang {
        Language::En => "Here's what I showed you:".to_string(),
        Language::Sv => "Här är vad jag visade dig:".to_string(),
    }
}

pub fn nothing_to_reshow(lang: Language) -> String {
    match lang {
        Language::En => "I haven't shown you any results yet — ask me for a dish!".to_string(),
        Language::Sv => "Jag har inte visat några resultat än — fråga mig om en rätt!".to_string(),
    }
}

pub fn clarify_generic(lang: Language) -> String {
    match lang {
        Language::En => "Could you tell me a bit more about what you're looking for? \
                         A dish, a cuisine, or a dietary need all work."
            .to_string(),
        Language::Sv => "Kan du berätta lite mer om vad du letar efter? \
                         En rätt, ett kök eller ett kostbehov funkar."
            .to_string(),
    }
}

pub fn clarify_candidates(lang: Language, candidates: &[String]) -> String {
    let list = candidates.join(", ");
    match lang {
        Language::En => format!("Which one do you mean: {list}?"),
        Language::Sv => format!("Vilken menar du: {list}?"),
    }
}

pub fn also_on_menu(lang: Language, hits: &[String]) -> String {
    let list = hits.join(", ");
    match lang {
        Language::En => format!(" This term also appears on this menu in: {list}."),
        Language::Sv => format!(" Termen förekommer också på menyn i: {list}."),
    }
}

pub fn restaurant_not_found(lang: Language, name: &str) -> String {
    match lang {
        Language::En => format!("I couldn't find a restaurant called \"{name}\"."),
        Language::Sv => format!("Jag hittade ingen restaurang som heter \"{name}\"."),
    }
}
