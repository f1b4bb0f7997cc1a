use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::job::RawNumber;
use crate::utils::time::{now, parse_posted_date, today};

pub const PUBLISHED_STATUSES: [&str; 2] = ["公開", "published"];
pub const DEFAULT_CATEGORY: &str = "一般";
pub const DEFAULT_SOURCE: &str = "Patent Hub";
pub const DEFAULT_URL: &str = "#";
pub const DEFAULT_PRIORITY: i64 = 3;
pub const NEWS_TAG: &str = "知財ニュース";
pub const MIN_TITLE_CHARS: usize = 5;
pub const MAX_CACHED_ARTICLES: usize = 100;
pub const SECTION_SIZE: usize = 3;
pub const PERSISTED_ARTICLES: usize = 50;

fn deserialize_text_lossy<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Int(i) => i.to_string(),
            TextOrNumber::Float(f) => f.to_string(),
            TextOrNumber::Bool(b) => b.to_string(),
        }),
    )
}

/// One row of the news sheet as served by the feed endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedRow {
    #[serde(deserialize_with = "deserialize_text_lossy")]
    pub title: Option<String>,
    #[serde(deserialize_with = "deserialize_text_lossy")]
    pub category: Option<String>,
    #[serde(deserialize_with = "deserialize_text_lossy")]
    pub source: Option<String>,
    #[serde(deserialize_with = "deserialize_text_lossy")]
    pub date: Option<String>,
    #[serde(deserialize_with = "deserialize_text_lossy")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "deserialize_text_lossy")]
    pub url: Option<String>,
    pub priority: Option<RawNumber>,
    #[serde(deserialize_with = "deserialize_text_lossy")]
    pub status: Option<String>,
}

/// The Apps Script wraps rows in an envelope; a plain array is accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeedBody {
    Rows(Vec<FeedRow>),
    Envelope {
        #[serde(default = "default_success")]
        success: bool,
        #[serde(default)]
        data: Vec<FeedRow>,
        #[serde(default)]
        error: Option<String>,
    },
}

fn default_success() -> bool {
    true
}

impl FeedBody {
    pub fn into_rows(self) -> Result<Vec<FeedRow>> {
        match self {
            FeedBody::Rows(rows) => Ok(rows),
            FeedBody::Envelope {
                success: true,
                data,
                ..
            } => Ok(data),
            FeedBody::Envelope { error, .. } => Err(Error::Upstream(
                error.unwrap_or_else(|| "news feed reported failure".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub source: String,
    pub published_on: NaiveDate,
    pub summary: String,
    pub url: String,
    pub priority: i64,
    pub tags: Vec<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Keeps published rows with usable titles, fills defaults, and orders by
/// priority then date, both descending.
pub fn process_feed(rows: Vec<FeedRow>, today: NaiveDate) -> Vec<NewsArticle> {
    let mut articles: Vec<NewsArticle> = rows
        .into_iter()
        .filter(|row| {
            row.status
                .as_deref()
                .map(|status| PUBLISHED_STATUSES.contains(&status.trim()))
                .unwrap_or(false)
        })
        .filter_map(|row| {
            let title = row.title.unwrap_or_default();
            if title.trim().chars().count() < MIN_TITLE_CHARS {
                return None;
            }
            let category = non_empty(row.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            let priority = row
                .priority
                .as_ref()
                .and_then(RawNumber::as_int)
                .filter(|p| *p != 0)
                .unwrap_or(DEFAULT_PRIORITY);

            Some(NewsArticle {
                id: Uuid::new_v4(),
                title,
                tags: vec![category.clone(), NEWS_TAG.to_string()],
                category,
                source: non_empty(row.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
                published_on: row
                    .date
                    .as_deref()
                    .and_then(parse_posted_date)
                    .unwrap_or(today),
                summary: row.summary.unwrap_or_default(),
                url: non_empty(row.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
                priority,
            })
        })
        .collect();

    articles.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.published_on.cmp(&a.published_on))
    });
    articles.truncate(MAX_CACHED_ARTICLES);
    articles
}

/// Home page layout: three sections of three articles each, in cache order.
#[derive(Debug, Clone, Serialize)]
pub struct NewsDigest {
    pub latest: Vec<NewsArticle>,
    pub important: Vec<NewsArticle>,
    pub industry: Vec<NewsArticle>,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsStatistics {
    pub total_articles: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub source_breakdown: BTreeMap<String, usize>,
    pub category_breakdown: BTreeMap<String, usize>,
    pub recent_activity: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NewsCache {
    articles: Vec<NewsArticle>,
    last_update: Option<DateTime<Utc>>,
}

impl NewsCache {
    fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read(path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the leading articles and the update time.
    fn store(&self, path: &Path) -> Result<()> {
        let snapshot = NewsCacheSnapshot {
            articles: &self.articles[..self.articles.len().min(PERSISTED_ARTICLES)],
            last_update: self.last_update,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&snapshot)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct NewsCacheSnapshot<'a> {
    articles: &'a [NewsArticle],
    last_update: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct NewsService {
    client: Client,
    feed_url: Option<String>,
    cache: Arc<RwLock<NewsCache>>,
    cache_path: Option<PathBuf>,
}

impl NewsService {
    /// Without a feed URL the service serves the built-in sample feed.
    pub fn new(feed_url: Option<String>) -> Self {
        Self::with_client(feed_url, Client::new())
    }

    pub fn with_client(feed_url: Option<String>, client: Client) -> Self {
        Self {
            client,
            feed_url,
            cache: Arc::new(RwLock::new(NewsCache::default())),
            cache_path: None,
        }
    }

    /// Restores articles saved at `path` and saves to it after every
    /// successful refresh. An unreadable file starts from an empty cache.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match NewsCache::load(&path) {
            Ok(Some(cache)) => {
                info!(count = cache.articles.len(), path = %path.display(), "news cache restored");
                self.cache = Arc::new(RwLock::new(cache));
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, path = %path.display(), "could not restore news cache");
            }
        }
        self.cache_path = Some(path);
        self
    }

    pub fn is_demo(&self) -> bool {
        self.feed_url.is_none()
    }

    async fn fetch_rows(&self) -> Result<Vec<FeedRow>> {
        let Some(url) = self.feed_url.as_deref() else {
            return Ok(sample_feed());
        };
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "news feed returned status {}",
                response.status()
            )));
        }
        response.json::<FeedBody>().await?.into_rows()
    }

    /// Fetches and replaces the cache. On failure the cache is left as it was.
    #[instrument(skip(self), fields(demo = self.is_demo()))]
    pub async fn refresh(&self) -> Result<usize> {
        let rows = match self.fetch_rows().await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "news feed fetch failed; keeping cached articles");
                return Err(err);
            }
        };
        let articles = process_feed(rows, today());
        let count = articles.len();

        let mut cache = self
            .cache
            .write()
            .map_err(|_| Error::Internal("news cache lock poisoned".to_string()))?;
        cache.articles = articles;
        cache.last_update = Some(now());
        if let Some(path) = self.cache_path.as_deref() {
            if let Err(err) = cache.store(path) {
                warn!(error = %err, path = %path.display(), "could not save news cache");
            }
        }
        drop(cache);

        info!(count, "news cache updated");
        Ok(count)
    }

    fn read<R>(&self, f: impl FnOnce(&NewsCache) -> R) -> Result<R> {
        let cache = self
            .cache
            .read()
            .map_err(|_| Error::Internal("news cache lock poisoned".to_string()))?;
        Ok(f(&cache))
    }

    pub fn articles(&self) -> Result<Vec<NewsArticle>> {
        self.read(|cache| cache.articles.clone())
    }

    pub fn last_update(&self) -> Result<Option<DateTime<Utc>>> {
        self.read(|cache| cache.last_update)
    }

    pub fn digest(&self) -> Result<NewsDigest> {
        self.read(|cache| {
            let section = |index: usize| -> Vec<NewsArticle> {
                cache
                    .articles
                    .iter()
                    .skip(index * SECTION_SIZE)
                    .take(SECTION_SIZE)
                    .cloned()
                    .collect()
            };
            NewsDigest {
                latest: section(0),
                important: section(1),
                industry: section(2),
                last_update: cache.last_update,
            }
        })
    }

    /// Case-insensitive match on title or summary.
    pub fn search(&self, keyword: &str) -> Result<Vec<NewsArticle>> {
        let keyword = keyword.trim().to_lowercase();
        self.read(|cache| {
            cache
                .articles
                .iter()
                .filter(|a| {
                    a.title.to_lowercase().contains(&keyword)
                        || a.summary.to_lowercase().contains(&keyword)
                })
                .cloned()
                .collect()
        })
    }

    pub fn by_category(&self, category: &str) -> Result<Vec<NewsArticle>> {
        self.read(|cache| {
            cache
                .articles
                .iter()
                .filter(|a| a.category == category || a.tags.iter().any(|t| t == category))
                .cloned()
                .collect()
        })
    }

    pub fn statistics(&self) -> Result<NewsStatistics> {
        self.read(|cache| {
            let mut source_breakdown = BTreeMap::new();
            let mut category_breakdown = BTreeMap::new();
            for article in &cache.articles {
                *source_breakdown.entry(article.source.clone()).or_insert(0) += 1;
                *category_breakdown.entry(article.category.clone()).or_insert(0) += 1;
            }
            NewsStatistics {
                total_articles: cache.articles.len(),
                last_update: cache.last_update,
                source_breakdown,
                category_breakdown,
                recent_activity: cache.articles.len().min(10),
            }
        })
    }

    /// Refreshes now and then on every tick of `interval`. No retry, no backoff.
    pub fn spawn_poller(&self, interval: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "news poller started");
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = service.refresh().await {
                    error!(error = ?e, "news refresh failed");
                }
            }
        })
    }
}

fn sample_row(
    title: &str,
    category: &str,
    source: &str,
    date: &str,
    summary: &str,
    url: &str,
    priority: i64,
) -> FeedRow {
    FeedRow {
        title: Some(title.to_string()),
        category: Some(category.to_string()),
        source: Some(source.to_string()),
        date: Some(date.to_string()),
        summary: Some(summary.to_string()),
        url: Some(url.to_string()),
        priority: Some(RawNumber::Int(priority)),
        status: Some("公開".to_string()),
    }
}

/// Feed served when no endpoint is configured.
pub fn sample_feed() -> Vec<FeedRow> {
    vec![
        sample_row(
            "特許庁、AI関連特許の審査基準を改訂",
            "特許",
            "特許庁",
            "2025-08-09",
            "AIの技術進歩に対応し、特許審査基準の明確化を図る改訂が行われました。",
            "https://www.jpo.go.jp/news/ai-patent-guidelines.html",
            5,
        ),
        sample_row(
            "国際商標出願件数が過去最高を記録",
            "商標",
            "WIPO",
            "2025-08-08",
            "2024年の国際商標出願件数が前年比15%増となり、過去最高を記録しました。",
            "https://www.wipo.int/news/trademark-record.html",
            4,
        ),
        sample_row(
            "スタートアップ向け知財支援プログラム開始",
            "支援制度",
            "JETRO",
            "2025-08-07",
            "新興企業の知的財産戦略を支援する新たなプログラムがスタートしました。",
            "https://www.jetro.go.jp/startup-ip-support.html",
            3,
        ),
        sample_row(
            "意匠権の保護期間延長について議論開始",
            "意匠",
            "特許庁",
            "2025-08-06",
            "国際的な動向を踏まえ、意匠権の保護期間延長に関する検討が始まりました。",
            "https://www.jpo.go.jp/news/design-protection.html",
            3,
        ),
        sample_row(
            "グローバル特許データベースの機能拡充",
            "データベース",
            "WIPO",
            "2025-08-05",
            "WIPO Global Brandデータベースに新機能が追加され、検索性が向上しました。",
            "https://www.wipo.int/database-update.html",
            2,
        ),
    ]
}
