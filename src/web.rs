use crate::model::{DailyMenu, Day};
use crate::service::LunchService;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub type AppState = Arc<LunchService>;

#[derive(Deserialize)]
pub struct PageParams {
    pub day: Option<String>,
    pub images: Option<String>,
}

#[derive(Deserialize)]
pub struct MenuParams {
    pub day: Option<String>,
    pub provider: Option<String>,
    pub images: Option<String>,
}

#[derive(Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub url: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/menu", get(menu))
        .route("/api/providers", get(providers))
        .route("/health", get(health))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// `1/true/on` and `0/false/off`; anything else keeps the default.
pub fn parse_toggle(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "on" | "yes") => true,
        Some("0" | "false" | "off" | "no") => false,
        _ => default,
    }
}

fn parse_day(value: Option<&str>) -> Result<Day, Response> {
    match value.filter(|v| !v.trim().is_empty()) {
        None => Ok(Day::today()),
        Some(name) => name
            .parse()
            .map_err(|err| (StatusCode::BAD_REQUEST, format!("{err}")).into_response()),
    }
}

async fn index(State(state): State<AppState>, Query(params): Query<PageParams>) -> Html<String> {
    let day = params
        .day
        .as_deref()
        .and_then(Day::from_name)
        .unwrap_or_else(Day::today);
    let with_images = parse_toggle(params.images.as_deref(), state.images_enabled());
    let menus = state.menus(day, with_images).await;
    Html(render_page(&state, day, with_images, &menus))
}

async fn menu(State(state): State<AppState>, Query(params): Query<MenuParams>) -> Response {
    let day = match parse_day(params.day.as_deref()) {
        Ok(day) => day,
        Err(resp) => return resp,
    };
    let with_images = parse_toggle(params.images.as_deref(), state.images_enabled());

    let menus = match params.provider.as_deref().filter(|p| !p.is_empty()) {
        None => state.menus(day, with_images).await,
        Some(name) => match state.provider(name) {
            Some(provider) => vec![
                state
                    .provider_menu(provider.as_ref(), day, with_images)
                    .await,
            ],
            None => {
                return (StatusCode::NOT_FOUND, format!("Unknown provider '{name}'"))
                    .into_response();
            }
        },
    };
    Json(menus).into_response()
}

async fn providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(
        state
            .providers()
            .iter()
            .map(|provider| ProviderInfo {
                name: provider.name().to_string(),
                url: provider.url().to_string(),
            })
            .collect(),
    )
}

async fn health() -> &'static str {
    "ok"
}

pub fn render_page(
    state: &LunchService,
    day: Day,
    with_images: bool,
    menus: &[DailyMenu],
) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Lunch Finder</title>\n<style>\n\
         body{font-family:sans-serif;margin:0;display:flex}\n\
         main{flex:1;padding:1.5rem}\naside{width:16rem;padding:1.5rem;background:#f4f4f4}\n\
         .dish{display:flex;gap:1rem;padding:.5rem 0;border-bottom:1px solid #ddd}\n\
         .dish img{width:96px;height:64px;object-fit:cover}\n\
         .english{color:#555}\n.price{font-weight:bold}\n</style>\n</head>\n<body>\n<main>\n\
         <h1>Lunch Finder</h1>\n",
    );

    html.push_str(
        "<form method=\"get\" action=\"/\">\n\
         <select name=\"day\" onchange=\"this.form.submit()\">\n",
    );
    for option in Day::ALL {
        let selected = if option == day { " selected" } else { "" };
        let _ = writeln!(
            html,
            "<option value=\"{}\"{selected}>{}</option>",
            option.english(),
            text(&option.label())
        );
    }
    let _ = writeln!(
        html,
        "</select>\n<input type=\"hidden\" name=\"images\" value=\"{}\">\n</form>",
        if with_images { "1" } else { "0" }
    );
    let _ = writeln!(
        html,
        "<p><a href=\"/?day={}&amp;images={}\">{}</a></p>",
        day.english(),
        if with_images { "0" } else { "1" },
        if with_images { "Hide images" } else { "Show images" }
    );

    let _ = writeln!(html, "<h2>{}</h2>", text(&day.label()));
    for menu in menus {
        let _ = writeln!(html, "<section>\n<h3>{}</h3>", text(&menu.provider_name));
        if menu.items.is_empty() {
            let _ = writeln!(
                html,
                "<p class=\"empty\">No menu from {} for this day</p>",
                text(&menu.provider_name)
            );
        }
        for item in &menu.items {
            html.push_str("<div class=\"dish\">\n");
            if let Some(url) = item.image_url.as_deref().filter(|_| with_images) {
                let _ = writeln!(
                    html,
                    "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                    attr(url),
                    attr(&item.name_german)
                );
            }
            let _ = writeln!(
                html,
                "<div>\n<div class=\"german\">{}</div>",
                text(&item.name_german)
            );
            if !item.name_english.is_empty() && item.name_english != item.name_german {
                let _ = writeln!(html, "<div class=\"english\">{}</div>", text(&item.name_english));
            }
            if let Some(description) = &item.description {
                let _ = writeln!(html, "<div class=\"description\">{}</div>", text(description));
            }
            let _ = writeln!(
                html,
                "<div class=\"meta\">{} <span class=\"price\">{}</span></div>\n</div>\n</div>",
                text(&menu.provider_name),
                text(item.price.as_deref().unwrap_or(""))
            );
        }
        html.push_str("</section>\n");
    }

    html.push_str("</main>\n<aside>\n<h2>Restaurants</h2>\n<ul>\n");
    for provider in state.providers() {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            attr(provider.url()),
            text(provider.name())
        );
    }
    html.push_str("</ul>\n</aside>\n</body>\n</html>\n");
    html
}
