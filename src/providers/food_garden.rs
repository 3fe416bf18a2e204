//! Food Garden: the weekly menu is a scanned table, one column per day.

use super::split_price;
use crate::fetch::Fetcher;
use crate::model::{Day, MenuItem, WeeklyMenu};
use crate::ocr::{self, DayColumn, OcrLine, OcrPage, OcrSettings, OcrWord};
use crate::pdf::{self, PdfKind};
use crate::provider::{MenuCache, MenuProvider};
use async_trait::async_trait;
use regex::RegexBuilder;
use std::time::Duration;
use tracing::{debug, info};

pub const NAME: &str = "Food Garden";
pub const HOMEPAGE: &str = "https://foodgarden.wien";
pub const MENU_URL: &str = "https://foodgarden.wien/wp-content/uploads/Foodgarden-Aloha-Bowl-Menu.pdf";

const DEFAULT_PRICE: &str = "€8.90";

struct KnownDish {
    pattern: &'static str,
    day: Day,
    name: &'static str,
    ingredients: &'static str,
}

const KNOWN_DISHES: &[KnownDish] = &[
    KnownDish {
        pattern: r"Linsen.?Kokos.?Curry",
        day: Day::Monday,
        name: "Linsen-Kokos-Curry",
        ingredients: "Rote Linsen, Süßkartoffel, Basmatireis, Koriander",
    },
    KnownDish {
        pattern: r"Rotkrautstrudel",
        day: Day::Tuesday,
        name: "Rotkrautstrudel",
        ingredients: "Ziegenkäse, Schnittlauch-Rahm-Dip, frischer Rucola",
    },
    KnownDish {
        pattern: r"Vegane\s*Ravioli|Triangolo\s*Portobello",
        day: Day::Wednesday,
        name: "Vegane Ravioli Triangolo",
        ingredients: "Portobello, leichte Kräutersauce, Grana Padano",
    },
    KnownDish {
        pattern: r"Kürbis.?Spinat.?Lasagne",
        day: Day::Thursday,
        name: "Kürbis-Spinat-Lasagne",
        ingredients: "Schafkäse, Kürbiskerne, Blattsalat, Hausdressing",
    },
    KnownDish {
        pattern: r"Ebly.?Gemüse.?Risotto",
        day: Day::Friday,
        name: "Ebly-Gemüse-Risotto",
        ingredients: "Wurzelgemüse, Kürbis, getrocknete Paradeiser",
    },
    KnownDish {
        pattern: r"Spaghetti\s*Carbonara",
        day: Day::Monday,
        name: "Spaghetti Carbonara",
        ingredients: "Zwiebel, Speck, Ei, Grana Padano, frische Petersilie",
    },
    KnownDish {
        pattern: r"Cordon\s*Bleu",
        day: Day::Tuesday,
        name: "Cordon Bleu von der Pute",
        ingredients: "Petersilerdäpfel, Preiselbeeren, Bio-Zitrone",
    },
    KnownDish {
        pattern: r"[CĆČ]evap[ceč]i[cč]i",
        day: Day::Wednesday,
        name: "Cevapcici",
        ingredients: "Potato Wedges, Ajvar, Zwiebelsenf, Minz-Dip",
    },
    KnownDish {
        pattern: r"Chicken\s*Tikka\s*Masala",
        day: Day::Thursday,
        name: "Chicken Tikka Masala",
        ingredients: "Jasminreis, Kichererbsen, gehackte Cashewnüsse",
    },
    KnownDish {
        pattern: r"Sayadiya|[Ss]eehechtfil",
        day: Day::Friday,
        name: "Sayadiya - gebratenes Seehechtfilet",
        ingredients: "orientalischer Gewürzreis, karamellisierte Zwiebeln",
    },
];

const WEEKLY_SPECIAL_PATTERN: &str = r"Hirschragout";
const WEEKLY_SPECIAL: &str = "Hirschragout (Weekly Special) (Serviettenknödel, Preiselbeeren)";
const WEEKLY_SPECIAL_PRICE: &str = "€9.80";

pub struct FoodGardenProvider {
    fetcher: Fetcher,
    menu_url: String,
    ocr: OcrSettings,
    cache: MenuCache,
}

impl FoodGardenProvider {
    pub fn new(fetcher: Fetcher, ocr: OcrSettings, ttl: Duration) -> Self {
        Self {
            fetcher,
            menu_url: MENU_URL.to_string(),
            ocr,
            cache: MenuCache::new(ttl),
        }
    }

    pub fn with_menu_url(mut self, url: impl Into<String>) -> Self {
        self.menu_url = url.into();
        self
    }
}

#[async_trait]
impl MenuProvider for FoodGardenProvider {
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
        let doc = pdf::load_document(&bytes);
        let week = if doc.kind == PdfKind::TextBased {
            debug!(provider = NAME, "menu has a text layer, skipping OCR");
            parse_known_dishes(&doc.text)
        } else {
            let pages = ocr::ocr_pages(&bytes, &self.ocr).await?;
            parse_ocr_pages(&pages)
        };
        info!(provider = NAME, items = week.item_count(), "parsed weekly menu");
        Ok(week)
    }
}

/// Reads the first page with a detectable day table, else falls back to known dishes.
pub fn parse_ocr_pages(pages: &[OcrPage]) -> WeeklyMenu {
    for page in pages {
        if let Some(columns) = ocr::detect_day_columns(page) {
            let (table, has_special) = strip_weekly_special(page);
            let mut week = parse_columns(&table, &columns);
            if has_special {
                add_weekly_special(&mut week);
            }
            if !week.is_empty() {
                return week;
            }
        }
    }
    debug!(provider = NAME, "no day table found, matching known dishes");
    let text = pages
        .iter()
        .map(OcrPage::text)
        .collect::<Vec<_>>()
        .join("\n");
    parse_known_dishes(&text)
}

/// Removes the weekly special's row, which spans several day columns.
fn strip_weekly_special(page: &OcrPage) -> (OcrPage, bool) {
    let anchors: Vec<&OcrWord> = page
        .words
        .iter()
        .filter(|word| contains_pattern(&word.text, WEEKLY_SPECIAL_PATTERN))
        .collect();
    let words = page
        .words
        .iter()
        .filter(|word| !anchors.iter().any(|anchor| ocr::same_row(anchor, word)))
        .cloned()
        .collect();
    let table = OcrPage {
        width: page.width,
        height: page.height,
        words,
    };
    (table, !anchors.is_empty())
}

/// The special is served every day at its own price.
fn add_weekly_special(week: &mut WeeklyMenu) {
    for menu in week.days.values_mut() {
        menu.items
            .push(MenuItem::new(WEEKLY_SPECIAL).with_price(WEEKLY_SPECIAL_PRICE));
    }
}

pub fn parse_columns(page: &OcrPage, columns: &[DayColumn]) -> WeeklyMenu {
    let mut week = WeeklyMenu::empty(NAME);
    for column in columns {
        let lines = ocr::column_lines(page, column);
        let items = ocr::split_rows(&lines)
            .iter()
            .filter_map(|block| block_to_item(block))
            .collect();
        week.set_items(column.day, items);
    }
    week
}

fn block_to_item(block: &[OcrLine]) -> Option<MenuItem> {
    let (_, price) = split_price(&ocr::lines_text(block));
    let cleaned: Vec<String> = block
        .iter()
        .map(|line| clean_line(&line.text))
        .filter(|line| !line.is_empty())
        .collect();
    let (name, rest) = cleaned.split_first()?;
    if name.chars().filter(|c| c.is_alphabetic()).count() < 3 {
        return None;
    }

    let mut item =
        MenuItem::new(name.as_str()).with_price(price.as_deref().unwrap_or(DEFAULT_PRICE));
    if !rest.is_empty() {
        item = item.with_description(rest.join(", "));
    }
    Some(item)
}

/// Drops prices and trailing allergen codes such as `NF` or `A,C,G`.
fn clean_line(text: &str) -> String {
    let (text, _) = split_price(text);
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    while tokens.len() > 1 {
        let Some(last) = tokens.last() else { break };
        let is_code = last.len() <= 8
            && last.chars().all(|c| matches!(c, 'A'..='R' | ','));
        if !is_code {
            break;
        }
        tokens.pop();
    }
    tokens
        .join(" ")
        .trim_matches(|c| matches!(c, ' ' | '-' | '–' | '|' | '/'))
        .to_string()
}

fn contains_pattern(text: &str, pattern: &str) -> bool {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Matches the known dishes anywhere in the OCR text.
pub fn parse_known_dishes(text: &str) -> WeeklyMenu {
    let dishes: Vec<(Day, MenuItem)> = KNOWN_DISHES
        .iter()
        .filter(|dish| contains_pattern(text, dish.pattern))
        .map(|dish| {
            let item = MenuItem::new(format!("{} ({})", dish.name, dish.ingredients))
                .with_price(DEFAULT_PRICE);
            (dish.day, item)
        })
        .collect();

    let mut week = WeeklyMenu::empty(NAME);
    for day in Day::ALL {
        let items = dishes
            .iter()
            .filter(|(dish_day, _)| *dish_day == day)
            .map(|(_, item)| item.clone())
            .collect();
        week.set_items(day, items);
    }
    if contains_pattern(text, WEEKLY_SPECIAL_PATTERN) {
        add_weekly_special(&mut week);
    }
    week
}
