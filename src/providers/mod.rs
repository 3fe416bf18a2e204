pub mod food_garden;
pub mod nice_guys;
pub mod t_marx;

pub use food_garden::FoodGardenProvider;
pub use nice_guys::NiceGuysProvider;
pub use t_marx::TMarxProvider;

use crate::config::Config;
use crate::fetch::Fetcher;
use crate::provider::MenuProvider;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static PRICES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"€\s*(\d+[.,]\d{2})").unwrap(),
        Regex::new(r"(\d+[.,]\d{2})\s*€").unwrap(),
        Regex::new(r"EUR\s*(\d+[.,]\d{2})").unwrap(),
    ]
});

/// Removes the first recognised price format from `line` and returns it normalized to `€12.50`.
pub fn split_price(line: &str) -> (String, Option<String>) {
    for re in PRICES.iter() {
        if let Some(caps) = re.captures(line) {
            let price = format!("€{}", caps[1].replace(',', "."));
            let name = re.replace_all(line, "").trim().to_string();
            return (name, Some(price));
        }
    }
    (line.to_string(), None)
}

/// All restaurants in display order.
pub fn default_providers(fetcher: &Fetcher, config: &Config) -> Vec<Arc<dyn MenuProvider>> {
    let ttl = config.cache_ttl();
    vec![
        Arc::new(NiceGuysProvider::new(fetcher.clone(), ttl)),
        Arc::new(FoodGardenProvider::new(fetcher.clone(), config.ocr(), ttl)),
        Arc::new(TMarxProvider::new(fetcher.clone(), config.ocr(), ttl)),
    ]
}
