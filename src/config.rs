use crate::images::DEFAULT_IMAGE_SEARCH_URL;
use crate::ocr::OcrSettings;
use crate::translate::DEFAULT_TRANSLATE_URL;
use clap::Args;
use std::time::Duration;

/// Runtime settings, each overridable by flag or environment variable.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Address the web server listens on
    #[arg(long, env = "LUNCH_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Seconds a parsed weekly menu stays cached
    #[arg(long, env = "LUNCH_CACHE_TTL_SECS", default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "LUNCH_HTTP_TIMEOUT_SECS", default_value_t = 15)]
    pub http_timeout_secs: u64,

    /// Attempts per download, including the first
    #[arg(long, env = "LUNCH_HTTP_RETRIES", default_value_t = 3)]
    pub http_retries: u32,

    #[arg(long, env = "LUNCH_OCR_DPI", default_value_t = 300)]
    pub ocr_dpi: u32,

    /// Tesseract language pack
    #[arg(long, env = "LUNCH_OCR_LANG", default_value = "deu")]
    pub ocr_lang: String,

    #[arg(long, env = "LUNCH_TRANSLATE_URL", default_value = DEFAULT_TRANSLATE_URL)]
    pub translate_url: String,

    #[arg(long, env = "LUNCH_IMAGE_SEARCH_URL", default_value = DEFAULT_IMAGE_SEARCH_URL)]
    pub image_search_url: String,

    /// Look up dish photos
    #[arg(long, env = "LUNCH_IMAGES", default_value_t = true, action = clap::ArgAction::Set)]
    pub images: bool,
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn ocr(&self) -> OcrSettings {
        OcrSettings {
            dpi: self.ocr_dpi,
            lang: self.ocr_lang.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            cache_ttl_secs: 3600,
            http_timeout_secs: 15,
            http_retries: 3,
            ocr_dpi: 300,
            ocr_lang: "deu".to_string(),
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
            image_search_url: DEFAULT_IMAGE_SEARCH_URL.to_string(),
            images: true,
        }
    }
}
