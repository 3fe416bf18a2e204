use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use lunch_finder::fetch::build_client;
use lunch_finder::images::ImageSearch;
use lunch_finder::translate::Translator;
use lunch_finder::web::router;
use lunch_finder::{DailyMenu, Day, LunchService, MenuCache, MenuItem, MenuProvider, WeeklyMenu};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticProvider {
    name: &'static str,
    items: Vec<MenuItem>,
    cache: MenuCache,
}

#[async_trait]
impl MenuProvider for StaticProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn url(&self) -> &str {
        "https://example.com/lunch"
    }

    fn cache(&self) -> &MenuCache {
        &self.cache
    }

    async fn load_weekly_menu(&self) -> anyhow::Result<WeeklyMenu> {
        let mut week = WeeklyMenu::empty(self.name);
        week.set_items(Day::Monday, self.items.clone());
        Ok(week)
    }
}

async fn app() -> (axum::Router, MockServer) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/m"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="result-container">Boiled beef &amp; apple horseradish</div>"#,
        ))
        .mount(&server)
        .await;

    let client = build_client(Duration::from_secs(5)).unwrap();
    let providers: Vec<Arc<dyn MenuProvider>> = vec![
        Arc::new(StaticProvider {
            name: "Beisl <Eck>",
            items: vec![MenuItem::new("Tafelspitz & Apfelkren").with_price("€12.50")],
            cache: MenuCache::new(Duration::from_secs(60)),
        }),
        Arc::new(StaticProvider {
            name: "Leer",
            items: Vec::new(),
            cache: MenuCache::new(Duration::from_secs(60)),
        }),
    ];
    let service = LunchService::new(
        providers,
        Translator::new(client.clone(), server.uri()),
        ImageSearch::new(client, server.uri()),
    )
    .with_images(false);
    (router(Arc::new(service)), server)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _server) = app().await;
    assert_eq!(get(app, "/health").await, (StatusCode::OK, "ok".to_string()));
}

#[tokio::test]
async fn menu_api_returns_translated_items() {
    let (app, _server) = app().await;
    let (status, body) = get(app, "/api/menu?day=Montag").await;
    assert_eq!(status, StatusCode::OK);

    let menus: Vec<DailyMenu> = serde_json::from_str(&body).unwrap();
    assert_eq!(menus.len(), 2);
    assert_eq!(menus[0].day, Day::Monday);
    assert_eq!(menus[0].items[0].name_german, "Tafelspitz & Apfelkren");
    assert_eq!(menus[0].items[0].name_english, "Boiled beef & apple horseradish");
    assert_eq!(menus[0].items[0].image_url, None);
    assert!(menus[1].items.is_empty());
}

#[tokio::test]
async fn menu_api_filters_by_provider() {
    let (app, _server) = app().await;
    let (status, body) = get(app.clone(), "/api/menu?day=monday&provider=leer").await;
    assert_eq!(status, StatusCode::OK);
    let menus: Vec<DailyMenu> = serde_json::from_str(&body).unwrap();
    assert_eq!(menus.len(), 1);
    assert_eq!(menus[0].provider_name, "Leer");

    let (status, _) = get(app, "/api/menu?day=monday&provider=Nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_day_is_a_bad_request() {
    let (app, _server) = app().await;
    let (status, body) = get(app, "/api/menu?day=Sunday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Sunday"));
}

#[tokio::test]
async fn providers_endpoint_lists_names() {
    let (app, _server) = app().await;
    let (_, body) = get(app, "/api/providers").await;
    let list: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(list[0]["name"], "Beisl <Eck>");
    assert_eq!(list[1]["url"], "https://example.com/lunch");
}

#[tokio::test]
async fn page_escapes_and_reports_empty_restaurants() {
    let (app, _server) = app().await;
    let (status, html) = get(app, "/?day=Monday").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<option value=\"Monday\" selected>Monday / Montag</option>"));
    assert!(html.contains("Tafelspitz &amp; Apfelkren"));
    assert!(html.contains("Beisl &lt;Eck&gt;"));
    assert!(!html.contains("Beisl <Eck>"));
    assert!(html.contains("No menu from Leer for this day"));
    assert!(html.contains("€12.50"));
}
