use lunch_finder::fetch::build_client;
use lunch_finder::translate::Translator;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn translator(server: &MockServer) -> Translator {
    Translator::new(build_client(Duration::from_secs(5)).unwrap(), server.uri())
}

fn result_page(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        r#"<html><body><div class="result-container">{text}</div></body></html>"#
    ))
}

#[tokio::test]
async fn translates_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/m"))
        .and(query_param("sl", "de"))
        .and(query_param("tl", "en"))
        .and(query_param("q", "Rindsgulasch mit Semmelknödel"))
        .respond_with(result_page("Beef goulash with bread dumplings"))
        .expect(1)
        .mount(&server)
        .await;

    let translator = translator(&server);
    for _ in 0..2 {
        assert_eq!(
            translator.translate("Rindsgulasch mit Semmelknödel").await,
            "Beef goulash with bread dumplings"
        );
    }
}

#[tokio::test]
async fn failures_return_the_original() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let translator = translator(&server);
    assert_eq!(translator.translate("Kaiserschmarrn").await, "Kaiserschmarrn");
    assert_eq!(translator.translate("").await, "");
}

#[tokio::test]
async fn batch_keeps_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "Suppe"))
        .respond_with(result_page("Soup"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("q", "Salat"))
        .respond_with(result_page("Salad"))
        .mount(&server)
        .await;

    let texts = vec!["Salat".to_string(), "Suppe".to_string(), String::new()];
    assert_eq!(
        translator(&server).translate_batch(&texts).await,
        vec!["Salad".to_string(), "Soup".to_string(), String::new()]
    );
}
