use lunch_finder::fetch::build_client;
use lunch_finder::images::{ImageSearch, placeholder_image};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn search(server: &MockServer) -> ImageSearch {
    ImageSearch::new(build_client(Duration::from_secs(5)).unwrap(), server.uri())
}

#[tokio::test]
async fn returns_first_result_and_caches_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", "Tafelspitz Gericht Essen"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<script>vqd=\"4-777\";</script>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/i.js"))
        .and(query_param("vqd", "4-777"))
        .and(query_param("o", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "image": "https://img.example/tafelspitz.jpg" },
                { "image": "https://img.example/other.jpg" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = search(&server);
    for _ in 0..2 {
        assert_eq!(
            search.search_image("Tafelspitz").await,
            "https://img.example/tafelspitz.jpg"
        );
    }
}

#[tokio::test]
async fn falls_back_to_placeholder_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let search = search(&server);
    // placeholders are not cached, so the second call searches again
    assert_eq!(search.search_image("Strudel").await, placeholder_image("Strudel"));
    assert_eq!(search.search_image("Strudel").await, placeholder_image("Strudel"));
}

#[tokio::test]
async fn empty_results_and_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("vqd='4-1'"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/i.js"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let search = search(&server);
    let urls = search
        .search_images_batch(&["Knödel".to_string(), String::new()])
        .await;
    assert_eq!(urls["Knödel"], placeholder_image("Knödel"));
    assert_eq!(urls[""], "");
}
