use chrono::{Datelike, Local, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A working day of the lunch week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn english(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }

    pub fn german(self) -> &'static str {
        match self {
            Day::Monday => "Montag",
            Day::Tuesday => "Dienstag",
            Day::Wednesday => "Mittwoch",
            Day::Thursday => "Donnerstag",
            Day::Friday => "Freitag",
        }
    }

    /// Selector label, e.g. "Monday / Montag".
    pub fn label(self) -> String {
        format!("{} / {}", self.english(), self.german())
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_weekday(weekday: Weekday) -> Option<Day> {
        match weekday {
            Weekday::Mon => Some(Day::Monday),
            Weekday::Tue => Some(Day::Tuesday),
            Weekday::Wed => Some(Day::Wednesday),
            Weekday::Thu => Some(Day::Thursday),
            Weekday::Fri => Some(Day::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    /// Today's lunch day. Weekends fall back to Monday.
    pub fn today() -> Day {
        Day::from_weekday(Local::now().weekday()).unwrap_or(Day::Monday)
    }

    /// Accepts English or German names in any case.
    pub fn from_name(name: &str) -> Option<Day> {
        let name = name.trim();
        Day::ALL.into_iter().find(|day| {
            day.english().eq_ignore_ascii_case(name) || day.german().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.english())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown day '{0}', expected Monday-Friday or Montag-Freitag")]
pub struct ParseDayError(pub String);

impl FromStr for Day {
    type Err = ParseDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::from_name(s).ok_or_else(|| ParseDayError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name_german: String,
    #[serde(default)]
    pub name_english: String,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl MenuItem {
    pub fn new(name_german: impl Into<String>) -> Self {
        Self {
            name_german: name_german.into(),
            name_english: String::new(),
            price: None,
            description: None,
            image_url: None,
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_english(mut self, name_english: impl Into<String>) -> Self {
        self.name_english = name_english.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMenu {
    pub day: Day,
    pub items: Vec<MenuItem>,
    pub provider_name: String,
}

impl DailyMenu {
    pub fn empty(day: Day, provider_name: impl Into<String>) -> Self {
        Self {
            day,
            items: Vec::new(),
            provider_name: provider_name.into(),
        }
    }
}

/// One provider's menu for the whole week, keyed by day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyMenu {
    pub provider_name: String,
    pub days: BTreeMap<Day, DailyMenu>,
}

impl WeeklyMenu {
    pub fn empty(provider_name: &str) -> Self {
        let days = Day::ALL
            .into_iter()
            .map(|day| (day, DailyMenu::empty(day, provider_name)))
            .collect();
        Self {
            provider_name: provider_name.to_string(),
            days,
        }
    }

    /// Replaces the items of `day`. An empty list leaves the day untouched.
    pub fn set_items(&mut self, day: Day, items: Vec<MenuItem>) {
        if items.is_empty() {
            return;
        }
        self.days.insert(
            day,
            DailyMenu {
                day,
                items,
                provider_name: self.provider_name.clone(),
            },
        );
    }

    pub fn day(&self, day: Day) -> DailyMenu {
        self.days
            .get(&day)
            .cloned()
            .unwrap_or_else(|| DailyMenu::empty(day, self.provider_name.clone()))
    }

    pub fn item_count(&self) -> usize {
        self.days.values().map(|menu| menu.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}
