//! Action compiler
//!
//! Merges the feed-pass and search-pass outcomes into one deduplicated action
//! list. Every disliked feed item becomes a dislike. Liked search items form a
//! pool from which a capped number of videos and shorts are sampled. A URL
//! that received a dislike verdict on either side never appears as a like.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use shared::{Action, ActionItem, ActionList, CuratorVerdict, FeedOutcome, SearchOutcome, VideoKind, VideoRecord};

use super::sampling::sample_preserving_order;
use crate::config::CompilerConfig;

#[derive(Debug, Clone, Copy, Default)]
pub struct ActionCompiler {
    config: CompilerConfig,
}

impl ActionCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn compile<R: Rng + ?Sized>(&self, feed: &FeedOutcome, search: &SearchOutcome, rng: &mut R) -> ActionList {
        let feed_judged = join(&feed.records, &feed.verdicts);
        let search_judged = join(&search.records, &search.verdicts);

        let disliked: HashSet<&str> = feed_judged
            .iter()
            .chain(search_judged.iter())
            .filter(|(_, like)| !like)
            .map(|(record, _)| record.url.as_str())
            .collect();

        let mut seen = HashSet::new();
        let dislikes: Vec<ActionItem> = feed_judged
            .iter()
            .filter(|(record, like)| !like && seen.insert(record.url.as_str()))
            .map(|(record, _)| item(record, Action::Dislike))
            .collect();

        let mut pooled = HashSet::new();
        let (videos, shorts): (Vec<&VideoRecord>, Vec<&VideoRecord>) = search_judged
            .iter()
            .filter(|(record, like)| {
                *like && !disliked.contains(record.url.as_str()) && pooled.insert(record.url.as_str())
            })
            .map(|(record, _)| *record)
            .partition(|record| record.kind == VideoKind::Video);

        let liked_videos = sample_preserving_order(&videos, self.config.like_cap_videos, rng);
        let liked_shorts = sample_preserving_order(&shorts, self.config.like_cap_shorts, rng);

        let actions = dislikes
            .into_iter()
            .chain(liked_videos.into_iter().map(|r| item(r, Action::Like)))
            .chain(liked_shorts.into_iter().map(|r| item(r, Action::Like)))
            .collect();

        ActionList::new(actions, videos.len(), shorts.len())
    }
}

fn item(record: &VideoRecord, action: Action) -> ActionItem {
    ActionItem {
        url: record.url.clone(),
        kind: record.kind,
        action,
    }
}

/// Records paired with their verdict, in record order; unmatched on either side are dropped
fn join<'a>(records: &'a [VideoRecord], verdicts: &[CuratorVerdict]) -> Vec<(&'a VideoRecord, bool)> {
    let mut by_id: HashMap<&str, bool> = HashMap::new();
    for verdict in verdicts {
        by_id.entry(verdict.record_id.as_str()).or_insert(verdict.like);
    }
    records
        .iter()
        .filter_map(|record| by_id.get(record.id.as_str()).map(|like| (record, *like)))
        .collect()
}
