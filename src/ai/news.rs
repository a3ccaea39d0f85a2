//! News query contract and local enrichment of raw records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::NewsQueryService;
use crate::domain::{
    GroundingSource, ItemOrigin, NewsField, NewsItem, NewsRegion, NewsTag, NEWS_BOT_REPORTER,
};

/// One news lookup: topic, scope and the optional state or country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsQuery {
    pub field: NewsField,
    pub region: NewsRegion,
    pub location: Option<String>,
}

impl NewsQuery {
    pub fn new(field: NewsField, region: NewsRegion, location: Option<String>) -> Self {
        Self {
            field,
            region,
            location,
        }
    }

    /// Human readable description of where the news should come from.
    pub fn target_context(&self) -> String {
        match (self.region, self.location.as_deref()) {
            (NewsRegion::State, Some(loc)) => format!("the state of {}, India", loc),
            (NewsRegion::National, Some(loc)) => format!("the country of {}", loc),
            (region, _) => region.label().to_string(),
        }
    }
}

/// A story as returned by the news source, before enrichment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNewsRecord {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "NewsTag::deserialize_lenient")]
    pub tag: NewsTag,
}

/// Records plus the citations the source grounded them on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsBatch {
    pub records: Vec<RawNewsRecord>,
    pub sources: Vec<GroundingSource>,
}

/// Turn raw records into dashboard items.
///
/// Ids are `news-<index>-<millis>` so they stay unique within one batch.
pub fn enrich(query: &NewsQuery, batch: NewsBatch, now: DateTime<Utc>) -> Vec<NewsItem> {
    let stamp = now.timestamp_millis();
    let NewsBatch { records, sources } = batch;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| NewsItem {
            id: format!("news-{}-{}", index, stamp),
            title: record.title,
            description: record.description,
            field: query.field,
            region: query.region,
            state_name: query.location.clone(),
            reporter_id: NEWS_BOT_REPORTER.to_string(),
            posted_date: now,
            image_url: record.image_url.filter(|url| !url.trim().is_empty()),
            source: ItemOrigin::External,
            tag: record.tag,
            font_style: None,
            sources: sources.clone(),
        })
        .collect()
}

/// Query the news source and enrich the result.
///
/// Failures never propagate: they are logged and degrade to an empty feed.
pub async fn fetch_aggregated_news(
    service: &dyn NewsQueryService,
    query: &NewsQuery,
) -> Vec<NewsItem> {
    match service.query_news(query).await {
        Ok(batch) => {
            let items = enrich(query, batch, Utc::now());
            info!(
                provider = service.provider_name(),
                field = %query.field,
                region = %query.region,
                count = items.len(),
                "News query completed"
            );
            items
        }
        Err(e) => {
            error!(
                provider = service.provider_name(),
                field = %query.field,
                region = %query.region,
                "Error fetching news: {}",
                e
            );
            Vec::new()
        }
    }
}
