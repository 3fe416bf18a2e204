//! The Nice Guys: weekly menu published as a text PDF.

use super::split_price;
use crate::fetch::Fetcher;
use crate::model::{Day, MenuItem, WeeklyMenu};
use crate::pdf;
use crate::provider::{MenuCache, MenuProvider};
use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::info;

pub const NAME: &str = "The Nice Guys";
pub const HOMEPAGE: &str = "https://www.theniceguys.at";
pub const MENU_URL: &str = "https://www.theniceguys.at/data/wochenmenue.pdf";

const DAILY_PRICE: &str = "€11.20";
const VEGETARIAN_PRICE: &str = "€10.30";

const SKIP_WORDS: &[&str] = &[
    "wochenmenu",
    "weekly",
    "menu",
    "nice guys",
    "www.",
    "http",
    "tel:",
    "fax:",
    "email",
    "@",
    "reservierung",
    "öffnungszeiten",
    "opening",
    "closed",
    "geschlossen",
    "allergene",
    "allergen",
    "enthält",
    "contains",
];

static DAY_NAMES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)montag|dienstag|mittwoch|donnerstag|freitag").unwrap());

static ALLERGEN_LINES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\b[A-R]\s+(Gluten|Krebstiere|Eier|Fisch|Erdnüsse|Sojabohnen|Milch|Schalenfrüchte|Sellerie|Senf|Sesam|Sulfite|Lupinen|Weichtiere)").unwrap(),
        Regex::new(r"(?i)^[A-R](\s+[A-R]){2,}\b").unwrap(),
        Regex::new(r"(?i)^([A-R]\s+\w+\s+){2,}").unwrap(),
    ]
});

static ALLERGEN_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-R]\s+\w+").unwrap());

pub struct NiceGuysProvider {
    fetcher: Fetcher,
    menu_url: String,
    cache: MenuCache,
}

impl NiceGuysProvider {
    pub fn new(fetcher: Fetcher, ttl: Duration) -> Self {
        Self {
            fetcher,
            menu_url: MENU_URL.to_string(),
            cache: MenuCache::new(ttl),
        }
    }

    pub fn with_menu_url(mut self, url: impl Into<String>) -> Self {
        self.menu_url = url.into();
        self
    }
}

#[async_trait]
impl MenuProvider for NiceGuysProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn url(&self) -> &str {
        HOMEPAGE
    }

    fn cache(&self) -> &MenuCache {
        &self.cache
    }

    async fn load_weekly_menu(&self) -> anyhow::Result<WeeklyMenu> {
        let bytes = self.fetcher.fetch_bytes(&self.menu_url).await?;
        let text = pdf::extract_text(&bytes).context("reading Nice Guys menu PDF")?;
        let week = parse_menu_text(&text);
        info!(provider = NAME, items = week.item_count(), "parsed weekly menu");
        Ok(week)
    }
}

/// Splits the PDF text at German day names and parses the lines in between.
pub fn parse_menu_text(text: &str) -> WeeklyMenu {
    let mut week = WeeklyMenu::empty(NAME);
    let mut current: Option<(Day, Vec<MenuItem>)> = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let lower = line.to_lowercase();
        let day_found = Day::ALL
            .into_iter()
            .find(|day| lower.contains(&day.german().to_lowercase()));

        match day_found {
            Some(day) => {
                if let Some((previous, mut items)) = current.take() {
                    assign_prices(&mut items);
                    week.set_items(previous, items);
                }
                let mut items = Vec::new();
                let remaining = DAY_NAMES.replace_all(line, "");
                let remaining = remaining.trim();
                if remaining.chars().count() > 3 {
                    items.extend(parse_menu_item(remaining));
                }
                current = Some((day, items));
            }
            None => {
                if let Some((_, items)) = current.as_mut() {
                    items.extend(parse_menu_item(line));
                }
            }
        }
    }

    if let Some((day, mut items)) = current {
        assign_prices(&mut items);
        week.set_items(day, items);
    }
    week
}

/// First dish is the Tagesteller, second the vegetarian one.
pub fn assign_prices(items: &mut [MenuItem]) {
    for (i, item) in items.iter_mut().enumerate() {
        if item.price.is_none() {
            let price = if i == 1 { VEGETARIAN_PRICE } else { DAILY_PRICE };
            item.price = Some(price.to_string());
        }
    }
}

pub fn is_allergen_line(line: &str) -> bool {
    if ALLERGEN_LINES.iter().any(|re| re.is_match(line)) {
        return true;
    }
    ALLERGEN_CODE.find_iter(line).count() >= 3
}

pub fn parse_menu_item(line: &str) -> Option<MenuItem> {
    if is_allergen_line(line) {
        return None;
    }
    let lower = line.to_lowercase();
    if SKIP_WORDS.iter().any(|word| lower.contains(word)) {
        return None;
    }
    if line.chars().count() < 4 {
        return None;
    }

    let (name, price) = split_price(line);
    let name = name.trim_matches(|c| matches!(c, ' ' | '-' | '–' | '|' | '/'));
    if name.chars().filter(|c| c.is_alphabetic()).count() < 3 {
        return None;
    }

    let mut item = MenuItem::new(name);
    item.price = price;
    Some(item)
}
