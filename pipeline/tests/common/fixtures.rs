//! Test fixtures and data for pipeline tests

use shared::{CuratorVerdict, QueryCategory, SearchQuery, Source, VideoKind, VideoRecord};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub fn url(id: &str, kind: VideoKind) -> String {
        match kind {
            VideoKind::Video => format!("https://www.youtube.com/watch?v={id}"),
            VideoKind::Short => format!("https://www.youtube.com/shorts/{id}"),
        }
    }

    pub fn record(id: &str, kind: VideoKind, source: Source) -> VideoRecord {
        VideoRecord::from_listing(&Self::url(id, kind), &format!("Title {id}"), kind, source, None, false).unwrap()
    }

    pub fn search_record(id: &str, kind: VideoKind, query: &str) -> VideoRecord {
        VideoRecord::from_listing(&Self::url(id, kind), &format!("Title {id}"), kind, Source::Search, Some(query), false)
            .unwrap()
    }

    pub fn verdict(id: &str, like: bool) -> CuratorVerdict {
        CuratorVerdict {
            record_id: id.to_string(),
            like,
            rationale: None,
        }
    }

    /// Ten proposals satisfying the default query policy
    pub fn balanced_queries() -> Vec<SearchQuery> {
        let math = [
            "easy fractions",
            "easy ratios and rates",
            "dividing decimals",
            "negative numbers on a number line",
            "area of composite shapes",
        ];
        let curiosity = [
            "how black holes form",
            "why leaves change color",
            "how the roman aqueducts worked",
            "how airplanes stay in the air",
            "deep ocean animals",
        ];
        math.iter()
            .map(|t| SearchQuery::new(*t, QueryCategory::Math))
            .chain(curiosity.iter().map(|t| SearchQuery::new(*t, QueryCategory::Curiosity)))
            .collect()
    }
}
