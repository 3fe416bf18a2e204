pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod images;
pub mod lambda;
pub mod logging;
pub mod model;
pub mod ocr;
pub mod pdf;
pub mod provider;
pub mod providers;
pub mod service;
pub mod translate;
pub mod web;

pub use config::Config;
pub use error::ExtractError;
pub use model::{DailyMenu, Day, MenuItem, WeeklyMenu};
pub use provider::{MenuCache, MenuProvider};
pub use service::LunchService;
