//! Stage implementations
//!
//! Each stage reads the artifact of the stage before it, does its work and
//! replaces its own artifact. Browser stages hold exactly one session for
//! their whole body and release it whether or not the body succeeded.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use shared::logging::log_artifact_written;
use shared::{
    process_info, process_warn, ActionList, ArtifactStore, ExecutionReport, FeedCuration, FeedListing, FeedOutcome,
    ItemStatus, ProcessId, QueryResults, ReducedSearch, SearchCuration, SearchListing, SearchOutcome, StageId,
    VideoKind, VideoRecord,
};

use crate::config::PipelineConfig;
use crate::core::{ActionCompiler, ActionExecutor, Curator, Reducer};
use crate::error::{PipelineError, PipelineResult};
use crate::services::{HttpBrowserClient, OpenAiClassifier};
use crate::traits::{BrowserDriver, ClassificationService, ListingExtractor, ReactionController};
use crate::types::{CurationPass, ListingSource, Rubric, SessionHandle, SessionOptions};

/// Timeout for a single browser sidecar request
const BROWSER_TIMEOUT: Duration = Duration::from_secs(90);

/// Combine a stage body result with the session release result.
///
/// The body's error wins; a release failure only surfaces when the body
/// succeeded.
fn settle<T>(result: PipelineResult<T>, released: PipelineResult<()>) -> PipelineResult<T> {
    match (result, released) {
        (Err(e), Err(release)) => {
            process_warn!(ProcessId::current(), "Session release also failed: {}", release);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(release)) => Err(release),
        (Ok(value), Ok(())) => Ok(value),
    }
}

fn dedupe_by_url(records: Vec<VideoRecord>) -> Vec<VideoRecord> {
    let mut seen = HashSet::new();
    records.into_iter().filter(|r| seen.insert(r.url.clone())).collect()
}

/// extract-feed: read the recommendation feed
pub async fn extract_feed<D, E>(
    driver: &D,
    extractor: &E,
    store: &ArtifactStore,
    options: &SessionOptions,
) -> PipelineResult<FeedListing>
where
    D: BrowserDriver + ?Sized,
    E: ListingExtractor + ?Sized,
{
    let session = driver.open_session(options).await?;
    let result = extractor.extract(&session, &ListingSource::Feed).await;
    let records = settle(result, driver.close_session(session).await)?;

    let listing = FeedListing::from_records(dedupe_by_url(records));
    if listing.total() == 0 {
        process_warn!(ProcessId::current(), "Feed listing is empty");
    }
    store.write(&listing).await?;
    log_artifact_written(
        ProcessId::current(),
        StageId::ExtractFeed,
        &format!("{} videos, {} shorts", listing.videos.len(), listing.shorts.len()),
    );
    Ok(listing)
}

/// curate-feed: pass-1 verdicts and search query generation
pub async fn curate_feed<C: ClassificationService>(
    curator: &Curator<C>,
    store: &ArtifactStore,
    rubric: &Rubric,
) -> PipelineResult<FeedCuration> {
    let listing: FeedListing = store.read().await?;
    let records = listing.records();
    let (verdicts, queries) = curator.curate_feed(&records, rubric).await?;

    let disliked = verdicts.iter().filter(|v| !v.like).count();
    let curation = FeedCuration {
        analyzed_at: Utc::now(),
        model: curator.model(),
        outcome: FeedOutcome { records, verdicts },
        queries,
    };
    store.write(&curation).await?;
    log_artifact_written(
        ProcessId::current(),
        StageId::CurateFeed,
        &format!(
            "{} of {} items disliked, {} queries",
            disliked,
            curation.outcome.records.len(),
            curation.queries.len()
        ),
    );
    Ok(curation)
}

/// extract-search: run every generated query in one session.
///
/// A failed query is recorded and the stage moves on; the stage fails only
/// when every query failed. Sponsored results are dropped.
pub async fn extract_search<D, E>(
    driver: &D,
    extractor: &E,
    store: &ArtifactStore,
    options: &SessionOptions,
) -> PipelineResult<SearchListing>
where
    D: BrowserDriver + ?Sized,
    E: ListingExtractor + ?Sized,
{
    let curation: FeedCuration = store.read().await?;

    let session = driver.open_session(options).await?;
    let result = run_searches(extractor, &session, &curation).await;
    let searches = settle(result, driver.close_session(session).await)?;

    let failed = searches.iter().filter(|s| s.error.is_some()).count();
    if !searches.is_empty() && failed == searches.len() {
        let first = searches.iter().find_map(|s| s.error.clone()).unwrap_or_default();
        return Err(PipelineError::collaborator(
            "extract_search",
            format!("all {} searches failed (first error: {first})", searches.len()),
        ));
    }

    let listing = SearchListing {
        searched_at: Utc::now(),
        searches,
        feed: curation.outcome,
    };
    store.write(&listing).await?;
    log_artifact_written(
        ProcessId::current(),
        StageId::ExtractSearch,
        &format!("{} queries, {} failed", listing.searches.len(), failed),
    );
    Ok(listing)
}

async fn run_searches<E: ListingExtractor + ?Sized>(
    extractor: &E,
    session: &SessionHandle,
    curation: &FeedCuration,
) -> PipelineResult<Vec<QueryResults>> {
    let mut searches = Vec::with_capacity(curation.queries.len());
    for query in &curation.queries {
        let source = ListingSource::Search(query.clone());
        let results = match extractor.extract(session, &source).await {
            Ok(records) => {
                let kept: Vec<VideoRecord> = dedupe_by_url(records).into_iter().filter(|r| !r.sponsored).collect();
                let (videos, shorts): (Vec<VideoRecord>, Vec<VideoRecord>) =
                    kept.into_iter().partition(|r| r.kind == VideoKind::Video);
                QueryResults {
                    query: query.clone(),
                    videos,
                    shorts,
                    error: None,
                }
            }
            Err(e) => {
                process_warn!(ProcessId::current(), "⚠️ Search '{}' failed: {}", query.text, e);
                QueryResults {
                    query: query.clone(),
                    videos: Vec::new(),
                    shorts: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        process_info!(
            ProcessId::current(),
            "🔍 '{}': {} videos, {} shorts",
            query.text,
            results.videos.len(),
            results.shorts.len()
        );
        searches.push(results);
    }
    Ok(searches)
}

/// reduce: sample a fixed quota per query and kind
pub async fn reduce<R: Rng + ?Sized>(
    reducer: &Reducer,
    store: &ArtifactStore,
    rng: &mut R,
) -> PipelineResult<ReducedSearch> {
    let listing: SearchListing = store.read().await?;
    let reduced = reducer.reduce_listing(&listing, rng);

    for search in &reduced.searches {
        let before = search.original_counts;
        let after = search.reduced_counts();
        process_info!(
            ProcessId::current(),
            "✂️ '{}': videos {} -> {}, shorts {} -> {}",
            search.query.text,
            before.videos,
            after.videos,
            before.shorts,
            after.shorts
        );
    }
    store.write(&reduced).await?;
    log_artifact_written(
        ProcessId::current(),
        StageId::Reduce,
        &format!("{} queries, {} records kept", reduced.searches.len(), reduced.records().len()),
    );
    Ok(reduced)
}

/// curate-search: pass-2 verdicts over the reduced results
pub async fn curate_search<C: ClassificationService>(
    curator: &Curator<C>,
    store: &ArtifactStore,
    rubric: &Rubric,
) -> PipelineResult<SearchCuration> {
    let reduced: ReducedSearch = store.read().await?;
    let records = reduced.records();
    let verdicts = curator.curate_search(&records, rubric).await?;

    let liked = verdicts.iter().filter(|v| v.like).count();
    let curation = SearchCuration {
        analyzed_at: Utc::now(),
        model: curator.model(),
        outcome: SearchOutcome { records, verdicts },
        feed: reduced.feed,
    };
    store.write(&curation).await?;
    log_artifact_written(
        ProcessId::current(),
        StageId::CurateSearch,
        &format!("{} of {} items liked", liked, curation.outcome.records.len()),
    );
    Ok(curation)
}

/// compile: merge both passes into the action list
pub async fn compile<R: Rng + ?Sized>(
    compiler: &ActionCompiler,
    store: &ArtifactStore,
    rng: &mut R,
) -> PipelineResult<ActionList> {
    let curation: SearchCuration = store.read().await?;
    let list = compiler.compile(&curation.feed, &curation.outcome, rng);

    store.write(&list).await?;
    let summary = list.summary;
    log_artifact_written(
        ProcessId::current(),
        StageId::Compile,
        &format!(
            "{} dislikes, {} likes ({} videos of {}, {} shorts of {})",
            summary.total_to_dislike(),
            summary.total_to_like(),
            summary.videos_to_like,
            summary.liked_videos_available,
            summary.shorts_to_like,
            summary.liked_shorts_available
        ),
    );
    Ok(list)
}

/// execute: reconcile every action against the platform
pub async fn execute<D, R>(
    driver: &D,
    executor: &ActionExecutor<'_, R>,
    store: &ArtifactStore,
    options: &SessionOptions,
) -> PipelineResult<ExecutionReport>
where
    D: BrowserDriver + ?Sized,
    R: ReactionController + ?Sized,
{
    let list: ActionList = store.read().await?;

    let session = driver.open_session(options).await?;
    let report = executor.execute(&session, &list.actions).await;
    let released = driver.close_session(session).await;

    // Written before the release result is surfaced
    store.write(&report).await?;
    log_artifact_written(
        ProcessId::current(),
        StageId::Execute,
        &format!(
            "{} applied, {} skipped, {} failed",
            report.count(ItemStatus::Applied),
            report.count(ItemStatus::Skipped),
            report.count(ItemStatus::Failed)
        ),
    );
    settle(Ok(report), released)
}

fn classifier_curator(config: &PipelineConfig) -> PipelineResult<Curator<OpenAiClassifier>> {
    let classifier = OpenAiClassifier::new(config.classifier()?)?;
    Ok(Curator::new(classifier, config.curator, config.policy.clone()))
}

/// Run one stage against the real collaborators
pub async fn run_stage(stage: StageId, config: &PipelineConfig) -> PipelineResult<()> {
    config.validate()?;
    let store = ArtifactStore::new(&config.work_dir);
    let mut options = config.session.clone();
    options.headless = !config.debug;

    match stage {
        StageId::ExtractFeed => {
            let browser = HttpBrowserClient::new(&config.browser_endpoint, BROWSER_TIMEOUT)?;
            extract_feed(&browser, &browser, &store, &options).await?;
        }
        StageId::CurateFeed => {
            let curator = classifier_curator(config)?;
            let rubric = config.rubric.load(CurationPass::Feed).await?;
            curate_feed(&curator, &store, &rubric).await?;
        }
        StageId::ExtractSearch => {
            let browser = HttpBrowserClient::new(&config.browser_endpoint, BROWSER_TIMEOUT)?;
            extract_search(&browser, &browser, &store, &options).await?;
        }
        StageId::Reduce => {
            let reducer = Reducer::new(config.reducer_quota);
            reduce(&reducer, &store, &mut config.rng()).await?;
        }
        StageId::CurateSearch => {
            let curator = classifier_curator(config)?;
            let rubric = config.rubric.load(CurationPass::Search).await?;
            curate_search(&curator, &store, &rubric).await?;
        }
        StageId::Compile => {
            let compiler = ActionCompiler::new(config.compiler);
            compile(&compiler, &store, &mut config.rng()).await?;
        }
        StageId::Execute => {
            let browser = HttpBrowserClient::new(&config.browser_endpoint, BROWSER_TIMEOUT)?;
            let executor = ActionExecutor::new(&browser, &store, config.pacing, config.debug);
            execute(&browser, &executor, &store, &options).await?;
        }
    }
    Ok(())
}
