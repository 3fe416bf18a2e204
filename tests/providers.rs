use lunch_finder::fetch::{Fetcher, build_client};
use lunch_finder::ocr::OcrSettings;
use lunch_finder::providers::{
    FoodGardenProvider, NiceGuysProvider, TMarxProvider, default_providers,
};
use lunch_finder::{Config, Day, MenuProvider};
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> Fetcher {
    Fetcher::new(build_client(Duration::from_secs(5)).unwrap(), 1)
}

#[tokio::test]
async fn missing_menu_gives_empty_day_and_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let provider = NiceGuysProvider::new(fetcher(), Duration::from_secs(3600))
        .with_menu_url(format!("{}/wochenmenue.pdf", server.uri()));

    let menu = provider.get_menu(Day::Wednesday).await;
    assert_eq!(menu.day, Day::Wednesday);
    assert_eq!(menu.provider_name, "The Nice Guys");
    assert!(menu.items.is_empty());

    provider.get_menu(Day::Wednesday).await;
}

#[tokio::test]
async fn ocr_providers_degrade_on_upstream_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let ttl = Duration::from_secs(60);
    let food_garden = FoodGardenProvider::new(fetcher(), OcrSettings::default(), ttl)
        .with_menu_url(format!("{}/foodgarden.pdf", server.uri()));
    let t_marx = TMarxProvider::new(fetcher(), OcrSettings::default(), ttl)
        .with_menu_url(format!("{}/t-marx.pdf", server.uri()));

    assert!(food_garden.load_weekly_menu().await.is_err());
    let week = t_marx.fetch_weekly_menu().await;
    assert_eq!(week.provider_name, "T-Marx by Eurest");
    assert!(week.is_empty());
}

#[test]
fn default_providers_in_display_order() {
    let providers = default_providers(&fetcher(), &Config::default());
    let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
    assert_eq!(names, ["The Nice Guys", "Food Garden", "T-Marx by Eurest"]);
}
