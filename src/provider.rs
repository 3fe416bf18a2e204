use crate::model::{DailyMenu, Day, WeeklyMenu};
use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// A restaurant whose weekly menu can be fetched and parsed.
#[async_trait]
pub trait MenuProvider: Send + Sync {
    fn name(&self) -> &str;

    fn url(&self) -> &str;

    fn cache(&self) -> &MenuCache;

    /// Downloads and parses the current week. Errors are surfaced as-is.
    async fn load_weekly_menu(&self) -> anyhow::Result<WeeklyMenu>;

    /// Like `load_weekly_menu`, but a failure yields an empty week.
    async fn fetch_weekly_menu(&self) -> WeeklyMenu {
        match self.load_weekly_menu().await {
            Ok(menu) => menu,
            Err(err) => {
                warn!(provider = self.name(), "failed to load weekly menu: {err:#}");
                WeeklyMenu::empty(self.name())
            }
        }
    }

    async fn get_menu(&self, day: Day) -> DailyMenu {
        match self.cache().get_or_load(self.load_weekly_menu()).await {
            Ok(week) => week.day(day),
            Err(err) => {
                warn!(provider = self.name(), %day, "failed to load weekly menu: {err:#}");
                DailyMenu::empty(day, self.name())
            }
        }
    }
}

struct CachedWeek {
    fetched_at: Instant,
    menu: WeeklyMenu,
}

/// Holds the last successfully parsed week for `ttl`.
pub struct MenuCache {
    ttl: Duration,
    slot: Mutex<Option<CachedWeek>>,
}

impl MenuCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached week, or runs `load` and caches its result on success.
    /// Concurrent callers wait for the same load.
    pub async fn get_or_load<F>(&self, load: F) -> anyhow::Result<WeeklyMenu>
    where
        F: Future<Output = anyhow::Result<WeeklyMenu>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.menu.clone());
            }
        }

        let menu = load.await?;
        info!(
            provider = %menu.provider_name,
            items = menu.item_count(),
            "cached weekly menu"
        );
        *slot = Some(CachedWeek {
            fetched_at: Instant::now(),
            menu: menu.clone(),
        });
        Ok(menu)
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuItem;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        loads: AtomicUsize,
        fail: bool,
        cache: MenuCache,
    }

    impl CountingProvider {
        fn new(ttl: Duration, fail: bool) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail,
                cache: MenuCache::new(ttl),
            }
        }
    }

    #[async_trait]
    impl MenuProvider for CountingProvider {
        fn name(&self) -> &str {
            "Counting"
        }

        fn url(&self) -> &str {
            "https://example.com"
        }

        fn cache(&self) -> &MenuCache {
            &self.cache
        }

        async fn load_weekly_menu(&self) -> anyhow::Result<WeeklyMenu> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("source offline");
            }
            let mut week = WeeklyMenu::empty(self.name());
            week.set_items(Day::Monday, vec![MenuItem::new("Tafelspitz")]);
            Ok(week)
        }
    }

    #[tokio::test]
    async fn serves_repeat_requests_from_cache() {
        let provider = CountingProvider::new(Duration::from_secs(3600), false);
        assert_eq!(provider.get_menu(Day::Monday).await.items.len(), 1);
        assert!(provider.get_menu(Day::Tuesday).await.items.is_empty());
        assert_eq!(provider.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_reloaded() {
        let provider = CountingProvider::new(Duration::ZERO, false);
        provider.get_menu(Day::Monday).await;
        provider.get_menu(Day::Monday).await;
        assert_eq!(provider.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let provider = CountingProvider::new(Duration::from_secs(3600), true);
        let menu = provider.get_menu(Day::Monday).await;
        assert!(menu.items.is_empty());
        assert_eq!(menu.provider_name, "Counting");
        provider.get_menu(Day::Monday).await;
        assert_eq!(provider.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_weekly_menu_degrades_to_empty_week() {
        let provider = CountingProvider::new(Duration::from_secs(3600), true);
        let week = provider.fetch_weekly_menu().await;
        assert_eq!(week.days.len(), 5);
        assert!(week.is_empty());
    }

    #[tokio::test]
    async fn clear_forces_a_reload() {
        let provider = CountingProvider::new(Duration::from_secs(3600), false);
        provider.get_menu(Day::Monday).await;
        provider.cache().clear().await;
        provider.get_menu(Day::Monday).await;
        assert_eq!(provider.loads.load(Ordering::SeqCst), 2);
    }
}
