use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tera::{Context, Tera};
use tracing::error;

use crate::error::SiteError;
use crate::i18n::gettext;

macro_rules! templates {
    ($($name:literal),* $(,)?) => {
        [$(($name, include_str!(concat!("../templates/", $name)))),*]
    };
}

static TEMPLATES: OnceCell<Tera> = OnceCell::new();

fn registry() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    let sources = templates!(
        "base.html",
        "index.html",
        "program.html",
        "talks.html",
        "rooms.html",
        "track.html",
        "speakers.html",
        "speaker.html",
        "day1.html",
        "day23.html",
        "404.html",
    );

    tera.add_raw_templates(sources)?;
    Ok(tera)
}

/// The compiled page templates, registered on first use.
pub fn templates() -> Result<&'static Tera, tera::Error> {
    TEMPLATES.get_or_try_init(registry)
}

/// Query parameters understood by every view.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Return the template context as JSON instead of HTML.
    #[serde(default)]
    pub json: bool,
    pub theme: Option<String>,
}

fn context(lang: &str, title: &str, data: Value) -> Value {
    let mut context = match data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    context.insert("lang".to_string(), json!(lang));
    context.insert("page".to_string(), json!({ "title": title }));
    Value::Object(context)
}

/// Header links, labelled in the page's language.
fn navigation(lang: &str) -> Value {
    json!({
        "program": gettext(lang, "Program"),
        "schedule": gettext(lang, "Schedule"),
        "speakers": gettext(lang, "Speakers"),
        "rooms": gettext(lang, "Rooms"),
    })
}

pub fn render(lang: &str, template: &str, context: &Value) -> Result<String, SiteError> {
    let mut context = Context::from_serialize(context)?;
    context.insert("nav", &navigation(lang));
    Ok(templates()?.render(template, &context)?)
}

pub fn page(
    lang: &str,
    template: &'static str,
    title: &str,
    data: Value,
    as_json: bool,
) -> Result<Response, SiteError> {
    let context = context(lang, title, data);

    if as_json {
        return Ok(Json(context).into_response());
    }

    Ok(Html(render(lang, template, &context)?).into_response())
}

pub fn not_found(lang: &str) -> Response {
    let context = context(lang, gettext(lang, "Page not found"), json!({}));

    match render(lang, "404.html", &context) {
        Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Err(err) => {
            error!("Template rendering error: {err}");
            (StatusCode::NOT_FOUND, "Page not found").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_register() {
        assert_eq!(templates().unwrap().get_template_names().count(), 11);
    }

    #[test]
    fn context_carries_language_and_title() {
        let context = context("fr", "Salles", json!({ "rooms": [] }));
        assert_eq!(context["lang"], "fr");
        assert_eq!(context["page"]["title"], "Salles");
        assert_eq!(context["rooms"], json!([]));
    }

    #[test]
    fn not_found_page_is_localized() {
        let response = not_found("fr");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let html = render(
            "fr",
            "404.html",
            &context("fr", gettext("fr", "Page not found"), json!({})),
        )
        .unwrap();
        assert!(html.contains("Page introuvable"));
        assert!(html.contains(">Intervenants</a>"));
        assert!(html.contains(">Planning</a>"));
    }
}
