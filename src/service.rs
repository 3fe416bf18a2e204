use crate::config::Config;
use crate::fetch::{Fetcher, build_client};
use crate::images::ImageSearch;
use crate::model::{DailyMenu, Day, MenuItem};
use crate::provider::MenuProvider;
use crate::providers::default_providers;
use crate::translate::Translator;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

/// Providers plus the translation and image utilities that annotate their dishes.
pub struct LunchService {
    providers: Vec<Arc<dyn MenuProvider>>,
    translator: Translator,
    images: ImageSearch,
    images_enabled: bool,
}

impl LunchService {
    pub fn new(
        providers: Vec<Arc<dyn MenuProvider>>,
        translator: Translator,
        images: ImageSearch,
    ) -> Self {
        Self {
            providers,
            translator,
            images,
            images_enabled: true,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = build_client(config.http_timeout())?;
        let fetcher = Fetcher::new(client.clone(), config.http_retries);
        let providers = default_providers(&fetcher, config);
        info!(providers = providers.len(), "lunch service ready");

        Ok(Self::new(
            providers,
            Translator::new(client.clone(), config.translate_url.clone())
                .with_cache_ttl(config.cache_ttl()),
            ImageSearch::new(client, config.image_search_url.clone())
                .with_cache_ttl(config.cache_ttl()),
        )
        .with_images(config.images))
    }

    /// Turns image lookup off globally, whatever a request asks for.
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.images_enabled = enabled;
        self
    }

    pub fn images_enabled(&self) -> bool {
        self.images_enabled
    }

    pub fn providers(&self) -> &[Arc<dyn MenuProvider>] {
        &self.providers
    }

    /// Case-insensitive lookup by restaurant name.
    pub fn provider(&self, name: &str) -> Option<&Arc<dyn MenuProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.name().eq_ignore_ascii_case(name))
    }

    /// Every restaurant's menu for `day`, in provider order.
    pub async fn menus(&self, day: Day, with_images: bool) -> Vec<DailyMenu> {
        join_all(
            self.providers
                .iter()
                .map(|provider| self.provider_menu(provider.as_ref(), day, with_images)),
        )
        .await
    }

    pub async fn provider_menu(
        &self,
        provider: &dyn MenuProvider,
        day: Day,
        with_images: bool,
    ) -> DailyMenu {
        let menu = provider.get_menu(day).await;
        debug!(provider = provider.name(), %day, items = menu.items.len(), "menu loaded");
        self.annotate(menu, with_images && self.images_enabled).await
    }

    async fn annotate(&self, mut menu: DailyMenu, with_images: bool) -> DailyMenu {
        menu.items = join_all(
            menu.items
                .into_iter()
                .map(|item| self.annotate_item(item, with_images)),
        )
        .await;
        menu
    }

    async fn annotate_item(&self, mut item: MenuItem, with_images: bool) -> MenuItem {
        if item.name_english.is_empty() {
            item.name_english = self.translator.translate(&item.name_german).await;
        }
        if with_images && item.image_url.is_none() {
            let url = self.images.search_image(&item.name_german).await;
            if !url.is_empty() {
                item.image_url = Some(url);
            }
        }
        item
    }
}
