use std::collections::HashMap;

use once_cell::sync::Lazy;

/// French renderings of the site's interface strings, keyed by the English
/// message. Missing entries and other languages fall back to English.
static FRENCH: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Program", "Programme"),
        ("Program for theme {theme}", "Programme du thème {theme}"),
        ("Program for room {room}", "Programme de la salle {room}"),
        ("Talks", "Interventions"),
        ("Rooms", "Salles"),
        ("Speakers", "Intervenants"),
        ("Schedule", "Planning"),
        ("Day 1 - Plenary session", "Jour 1 - Session plénière"),
        ("Day {day} - At a glance", "Jour {day} - En un coup d'œil"),
        ("Page not found", "Page introuvable"),
    ])
});

pub fn gettext(lang: &str, message: &'static str) -> &'static str {
    match lang {
        "fr" => FRENCH.get(message).copied().unwrap_or(message),
        _ => message,
    }
}

/// Translates `message`, then substitutes each `{name}` placeholder.
pub fn gettext_with(lang: &str, message: &'static str, args: &[(&str, &str)]) -> String {
    args.iter()
        .fold(gettext(lang, message).to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
}
