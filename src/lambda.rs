use crate::model::Day;
use crate::service::LunchService;
use crate::web::parse_toggle;
use anyhow::anyhow;
use lambda_runtime::LambdaEvent;
use serde_json::{Value, json};
use tracing::info;

/// Reads `key` from the payload root, then `queryStringParameters`, then `pathParameters`.
pub fn parse_payload<T>(payload: &Value, key: &str) -> Option<T>
where
    T: for<'de> serde::Deserialize<'de>,
{
    payload
        .get(key)
        .or_else(|| payload.get("queryStringParameters").and_then(|qs| qs.get(key)))
        .or_else(|| payload.get("pathParameters").and_then(|pp| pp.get(key)))
        .and_then(|v| {
            // Gateway parameters always arrive as strings
            if let Some(s) = v.as_str() {
                if let Ok(result) = serde_json::from_str::<T>(s) {
                    return Some(result);
                }
                if let Ok(result) = serde_json::from_value::<T>(Value::String(s.to_string())) {
                    return Some(result);
                }
            }
            serde_json::from_value(v.clone()).ok()
        })
}

pub async fn handle_event(
    service: &LunchService,
    event: LambdaEvent<Value>,
) -> Result<Value, lambda_runtime::Error> {
    let payload = &event.payload;
    let day = match parse_payload::<String>(payload, "day") {
        Some(name) => name.parse::<Day>()?,
        None => Day::today(),
    };
    let with_images = parse_toggle(
        parse_payload::<String>(payload, "images").as_deref(),
        service.images_enabled(),
    );
    info!(%day, "lambda menu request");

    let menus = match parse_payload::<String>(payload, "provider") {
        Some(name) => {
            let provider = service
                .provider(&name)
                .ok_or_else(|| anyhow!("unknown provider '{name}'"))?;
            vec![service.provider_menu(provider.as_ref(), day, with_images).await]
        }
        None => service.menus(day, with_images).await,
    };
    Ok(json!({ "day": day, "menus": menus }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::build_client;
    use crate::images::{ImageSearch, placeholder_image};
    use crate::model::{MenuItem, WeeklyMenu};
    use crate::provider::{MenuCache, MenuProvider};
    use crate::translate::Translator;
    use async_trait::async_trait;
    use lambda_runtime::Context;
    use std::sync::Arc;
    use std::time::Duration;

    // Nothing listens here, so lookups fail fast and fall back.
    const OFFLINE: &str = "http://127.0.0.1:1";

    struct Kantine {
        cache: MenuCache,
    }

    #[async_trait]
    impl MenuProvider for Kantine {
        fn name(&self) -> &str {
            "Kantine"
        }

        fn url(&self) -> &str {
            "https://example.com/kantine"
        }

        fn cache(&self) -> &MenuCache {
            &self.cache
        }

        async fn load_weekly_menu(&self) -> anyhow::Result<WeeklyMenu> {
            let mut week = WeeklyMenu::empty(self.name());
            week.set_items(
                Day::Thursday,
                vec![
                    MenuItem::new("Linsensuppe")
                        .with_english("Lentil soup")
                        .with_price("€4.50"),
                ],
            );
            Ok(week)
        }
    }

    fn service() -> LunchService {
        let client = build_client(Duration::from_secs(2)).unwrap();
        let providers: Vec<Arc<dyn MenuProvider>> = vec![Arc::new(Kantine {
            cache: MenuCache::new(Duration::from_secs(60)),
        })];
        LunchService::new(
            providers,
            Translator::new(client.clone(), OFFLINE),
            ImageSearch::new(client, OFFLINE),
        )
    }

    fn event(payload: Value) -> LambdaEvent<Value> {
        LambdaEvent::new(payload, Context::default())
    }

    #[tokio::test]
    async fn responds_with_day_and_menus() {
        let payload = json!({ "queryStringParameters": { "day": "Donnerstag", "images": "0" } });
        let response = handle_event(&service(), event(payload)).await.unwrap();

        assert_eq!(response["day"], "Thursday");
        let menus = response["menus"].as_array().unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0]["provider_name"], "Kantine");
        assert_eq!(menus[0]["items"][0]["name_german"], "Linsensuppe");
        assert_eq!(menus[0]["items"][0]["name_english"], "Lentil soup");
        assert!(menus[0]["items"][0]["image_url"].is_null());
    }

    #[tokio::test]
    async fn images_toggle_adds_thumbnails() {
        let payload = json!({ "day": "Thursday", "provider": "kantine", "images": "on" });
        let response = handle_event(&service(), event(payload)).await.unwrap();

        assert_eq!(
            response["menus"][0]["items"][0]["image_url"],
            placeholder_image("Linsensuppe")
        );
    }

    #[tokio::test]
    async fn other_days_are_empty() {
        let payload = json!({ "pathParameters": { "day": "Monday" }, "images": "0" });
        let response = handle_event(&service(), event(payload)).await.unwrap();
        assert_eq!(response["menus"][0]["items"], json!([]));
    }

    #[tokio::test]
    async fn rejects_unknown_day() {
        let payload = json!({ "day": "Samstag" });
        let err = handle_event(&service(), event(payload)).await.unwrap_err();
        assert!(err.to_string().contains("Samstag"));
    }

    #[tokio::test]
    async fn rejects_unknown_provider() {
        let payload = json!({ "day": "Monday", "provider": "Mensa" });
        let err = handle_event(&service(), event(payload)).await.unwrap_err();
        assert!(err.to_string().contains("unknown provider 'Mensa'"));
    }

    #[test]
    fn finds_keys_in_every_location() {
        let root = json!({ "day": "Tuesday" });
        let query = json!({ "queryStringParameters": { "day": "Mittwoch" } });
        let path = json!({ "pathParameters": { "provider": "Food Garden" } });

        assert_eq!(parse_payload::<String>(&root, "day").as_deref(), Some("Tuesday"));
        assert_eq!(parse_payload::<String>(&query, "day").as_deref(), Some("Mittwoch"));
        assert_eq!(
            parse_payload::<String>(&path, "provider").as_deref(),
            Some("Food Garden")
        );
        assert_eq!(parse_payload::<String>(&path, "day"), None);
    }

    #[test]
    fn deserializes_typed_values_from_strings() {
        let payload = json!({ "queryStringParameters": { "day": "Friday" } });
        assert_eq!(parse_payload::<Day>(&payload, "day"), Some(Day::Friday));
    }
}
