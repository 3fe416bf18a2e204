//! T-Marx by Eurest: bilingual scanned menu, one column per day.

use crate::error::ExtractError;
use crate::fetch::Fetcher;
use crate::model::{Day, MenuItem, WeeklyMenu};
use crate::ocr::{self, DayColumn, OcrPage, OcrSettings};
use crate::provider::{MenuCache, MenuProvider};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

pub const NAME: &str = "T-Marx by Eurest";
pub const MENU_URL: &str = "https://menu.mitarbeiterrestaurant.at/menu/t-marx-by-eurest.pdf";

const SOUP_PRICE: &str = "€2,50";
const DAILY_PRICE: &str = "€8,00 - €9,10";
const VEGGIE_PRICE: &str = "€7,50 - €8,30";
const BOWL_PRICE: &str = "€7,80 - €8,70";
const PASTA_PRICE: &str = "€8,20 - €9,60";

/// Column x ranges at 300 DPI, used when the header row cannot be read.
const FIXED_COLUMNS: [(Day, u32, u32); 5] = [
    (Day::Monday, 650, 1060),
    (Day::Tuesday, 1060, 1625),
    (Day::Wednesday, 1625, 2175),
    (Day::Thursday, 2175, 2770),
    (Day::Friday, 2770, 3508),
];
const FIXED_CONTENT_Y: (u32, u32) = (500, 1900);

const SOUPS: &[&str] = &[
    r"(Klare,?\s*kräftige\s*Rindssuppe)",
    r"(Bohnensuppe)",
    r"(Paradeisercremesuppe)",
    r"(Grießnockerlsuppe)",
    r"(Frittatensuppe)",
    r"(Gemüsesuppe)",
    r"(\w+suppe)",
    r"(Chef'?s?\s*choice)",
];

const DAILY_DISHES: &[(&str, &str)] = &[
    (
        r"Gratinierte?\s*Schinkenfleckerl(?:\s*\(Schwein\))?",
        "Gratinierte Schinkenfleckerl (Schwein) mit Blattsalat",
    ),
    (r"Gebackene[sr]?\s*Hühnerschnitzel", "Gebackenes Hühnerschnitzel mit Beilage nach Wahl"),
    (
        r"Schweinsschopfbraten\s*(?:im\s*)?(?:Natursaft)?",
        "Schweinsschopfbraten im Natursaft mit Erdäpfelknödel",
    ),
    (r"Calamari\s*gebacken", "Calamari gebacken mit Caesar Salat und Sauce Tartar"),
    (r"Wiener\s*Schnitzel", "Wiener Schnitzel mit Beilage nach Wahl"),
    (r"Tafelspitz", "Tafelspitz mit klassischen Beilagen"),
    (r"Backhendl", "Backhendl mit Erdäpfelsalat"),
];

const VEGGIE_DISHES: &[(&str, &str)] = &[
    (r"Cremespinat\s*(?:mit\s*)?(?:Spiegelei)?", "Cremespinat mit Spiegelei und Röstkartoffel"),
    (r"Käsespätzle", "Käsespätzle mit Röstzwiebeln und Blattsalat"),
    (
        r"(?:Süß-?Saures?\s*)?Wokgemüse.*?Tofu",
        "Süß-Saures Wokgemüse mit Jasminreis und gegrilltem Tofu",
    ),
    (r"Spinatknödel", "Spinatknödel mit Salbeibutter"),
    (r"Gemüsecurry", "Gemüsecurry mit Reis"),
    (r"Erdäpfelgulasch", "Erdäpfelgulasch"),
];

const PASTA_DISHES: &[(&str, &str)] = &[
    (r"Pizza\s*Della\s*Casa", "Pizza Della Casa"),
    (r"Rosa\s*Kalbstafelspitz", "Rosa Kalbstafelspitz mit Serviettenknödel und Waldpilzragout"),
    (
        r"Frische\s*Pasta.*?(?:Rinderbolognese|Pesto)",
        "Frische Pasta mit Rinderbolognese oder Pesto",
    ),
    (r"Rinderbolognese", "Pasta mit Rinderbolognese"),
    (r"Lasagne", "Lasagne"),
];

static CLEANUP: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        // allergen codes: "A,C,G" and "|A,C" / "/G"
        Regex::new(r"\b[A-Z](,[A-Z])+\b").unwrap(),
        Regex::new(r"[|/][A-Z](,[A-Z])*").unwrap(),
        Regex::new(r"€\s*\d+[,.]\d{2}").unwrap(),
        Regex::new(r"\d+[,.]\d{2}").unwrap(),
        Regex::new(r"(?i)\d+\s*kcal").unwrap(),
    ]
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static GENERIC_DAILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\w+(?:\s+\w+)?)\s+(?:mit\s+)?(?:Blattsalat|Beilage)").unwrap()
});

static CHEFS_CHOICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chef'?s\s*choice").unwrap());

/// What one day column offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMenu {
    pub closed: bool,
    pub soup: Option<String>,
    pub daily: Option<String>,
    pub veggie: Option<String>,
    pub pasta: Option<String>,
}

pub struct TMarxProvider {
    fetcher: Fetcher,
    menu_url: String,
    ocr: OcrSettings,
    cache: MenuCache,
}

impl TMarxProvider {
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
impl MenuProvider for TMarxProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn url(&self) -> &str {
        MENU_URL
    }

    fn cache(&self) -> &MenuCache {
        &self.cache
    }

    async fn load_weekly_menu(&self) -> anyhow::Result<WeeklyMenu> {
        let bytes = self.fetcher.fetch_bytes(&self.menu_url).await?;
        let pages = ocr::ocr_pages(&bytes, &self.ocr).await?;
        let (page, columns) = select_german_page(&pages, self.ocr.dpi)?;
        let week = parse_page(page, &columns);
        info!(provider = NAME, items = week.item_count(), "parsed weekly menu");
        Ok(week)
    }
}

/// Picks the page with German day headers, or the first non-English page with fixed columns.
pub fn select_german_page(
    pages: &[OcrPage],
    dpi: u32,
) -> Result<(&OcrPage, Vec<DayColumn>), ExtractError> {
    if let Some((page, mut columns)) = pages
        .iter()
        .find_map(|page| ocr::detect_day_columns(page).map(|columns| (page, columns)))
    {
        let content_end = scale(FIXED_CONTENT_Y.1, dpi);
        for column in &mut columns {
            column.y_end = column.y_end.min(content_end);
        }
        return Ok((page, columns));
    }

    let page = pages
        .iter()
        .find(|page| !ocr::is_english_page(page))
        .ok_or(ExtractError::NoGermanPage)?;
    debug!(provider = NAME, "header row unreadable, using fixed columns");
    Ok((page, fixed_columns(dpi)))
}

/// Converts a 300 dpi coordinate to `dpi`.
fn scale(value: u32, dpi: u32) -> u32 {
    (value as f32 * dpi as f32 / 300.0).round() as u32
}

pub fn fixed_columns(dpi: u32) -> Vec<DayColumn> {
    FIXED_COLUMNS
        .iter()
        .map(|&(day, x_start, x_end)| DayColumn {
            day,
            x_start: scale(x_start, dpi),
            x_end: scale(x_end, dpi),
            y_start: scale(FIXED_CONTENT_Y.0, dpi),
            y_end: scale(FIXED_CONTENT_Y.1, dpi),
        })
        .collect()
}

pub fn parse_page(page: &OcrPage, columns: &[DayColumn]) -> WeeklyMenu {
    let mut week = WeeklyMenu::empty(NAME);
    for column in columns {
        let text = ocr::lines_text(&ocr::column_lines(page, column));
        week.set_items(column.day, column_items(&parse_column_text(&text)));
    }
    week
}

pub fn column_items(menu: &ColumnMenu) -> Vec<MenuItem> {
    if menu.closed {
        return vec![
            MenuItem::new("Feiertag - Geschlossen")
                .with_english("Holiday - Closed")
                .with_description(""),
        ];
    }

    let mut items = Vec::new();
    if let Some(soup) = &menu.soup {
        items.push(MenuItem::new(soup.as_str()).with_price(SOUP_PRICE).with_description("Suppe"));
    }
    if let Some(daily) = &menu.daily {
        items.push(
            MenuItem::new(daily.as_str())
                .with_price(DAILY_PRICE)
                .with_description("Tagesteller"),
        );
    }
    if let Some(veggie) = &menu.veggie {
        items.push(
            MenuItem::new(veggie.as_str())
                .with_price(VEGGIE_PRICE)
                .with_description("Vegetarisch"),
        );
    }
    items.push(
        MenuItem::new("Create your own Bowl")
            .with_price(BOWL_PRICE)
            .with_description("Bowl"),
    );
    if let Some(pasta) = &menu.pasta {
        items.push(
            MenuItem::new(pasta.as_str())
                .with_price(PASTA_PRICE)
                .with_description("Pasta & Co"),
        );
    }
    items
}

pub fn clean_text(text: &str) -> String {
    let mut text = text.to_string();
    for re in CLEANUP.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn case_insensitive(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

fn first_known(text: &str, dishes: &[(&str, &str)]) -> Option<String> {
    dishes.iter().find_map(|(pattern, name)| {
        case_insensitive(pattern)
            .filter(|re| re.is_match(text))
            .map(|_| name.to_string())
    })
}

pub fn parse_column_text(text: &str) -> ColumnMenu {
    let full = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if full.is_empty() {
        return ColumnMenu::default();
    }

    let upper = full.to_uppercase();
    if upper.contains("FEIERTAG") || upper.contains("GESCHLOSSEN") {
        return ColumnMenu {
            closed: true,
            ..ColumnMenu::default()
        };
    }

    let clean = clean_text(&full);
    let soup = SOUPS.iter().find_map(|pattern| {
        case_insensitive(pattern)
            .and_then(|re| re.captures(&clean))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    });

    let daily = first_known(&clean, DAILY_DISHES).or_else(|| {
        GENERIC_DAILY
            .find(&clean)
            .map(|m| m.as_str().trim().to_string())
    });

    let veggie = first_known(&clean, VEGGIE_DISHES).or_else(|| {
        CHEFS_CHOICE
            .is_match(&clean)
            .then(|| "Chef's choice".to_string())
    });

    ColumnMenu {
        closed: false,
        soup,
        daily,
        veggie,
        pasta: first_known(&clean, PASTA_DISHES),
    }
}
