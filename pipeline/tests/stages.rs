//! Stage chain over the artifact store with in-memory collaborators

use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    Action, ActionItem, ActionList, ExecutionReport, FeedCuration, ItemStatus, SearchCuration, SearchListing, SharedError, Source,
    StageId, VideoKind,
};

use pipeline::stages;
use pipeline::{
    ActionCompiler, ActionExecutor, CuratorConfig, Curator, CurationPass, MockClassificationService, PacingConfig,
    PipelineError, QueryPolicy, Reducer, Rubric,
};

mod common;
use common::{FakePlatform, TestFixtures, TestHelpers};

fn rubric(pass: CurationPass) -> Rubric {
    Rubric {
        pass,
        audience: "A 6th grader".to_string(),
        standards: None,
    }
}

/// Likes every record whose id starts with `like`, dislikes the rest
fn classifier() -> MockClassificationService {
    let mut service = MockClassificationService::new();
    service.expect_model().return_const("test-model".to_string());
    service.expect_evaluate().returning(|batch, _| {
        Ok(batch
            .iter()
            .map(|r| TestFixtures::verdict(&r.id, r.id.starts_with("like")))
            .collect())
    });
    service
        .expect_propose_queries()
        .returning(|_| Ok(TestFixtures::balanced_queries()));
    service
}

fn curator() -> Curator<MockClassificationService> {
    Curator::new(classifier(), CuratorConfig::default(), QueryPolicy::default())
}

fn platform() -> FakePlatform {
    let feed = vec![
        TestFixtures::record("likefeed1", VideoKind::Video, Source::Feed),
        TestFixtures::record("bad1", VideoKind::Video, Source::Feed),
        TestFixtures::record("bad2", VideoKind::Short, Source::Feed),
    ];
    let mut platform = FakePlatform::with_feed(feed);

    for (n, query) in TestFixtures::balanced_queries().iter().enumerate() {
        let mut records: Vec<_> = (0..5)
            .map(|i| TestFixtures::search_record(&format!("likev{n}x{i}"), VideoKind::Video, &query.text))
            .collect();
        records.push(TestFixtures::search_record(&format!("likes{n}"), VideoKind::Short, &query.text));
        records.push(TestFixtures::search_record(&format!("meh{n}"), VideoKind::Video, &query.text));
        let mut sponsored = TestFixtures::search_record(&format!("ad{n}"), VideoKind::Video, &query.text);
        sponsored.sponsored = true;
        records.push(sponsored);
        platform.searches.insert(query.text.clone(), records);
    }
    platform
}

#[tokio::test]
async fn test_full_chain_produces_every_artifact() {
    let (temp, store) = TestHelpers::temp_store();
    let options = TestHelpers::session_options(&temp);
    let platform = platform();
    let curator = curator();
    let mut rng = StdRng::seed_from_u64(17);

    let feed = tokio_test::assert_ok!(stages::extract_feed(&platform, &platform, &store, &options).await);
    assert_eq!(feed.total(), 3);

    let feed_curation = stages::curate_feed(&curator, &store, &rubric(CurationPass::Feed)).await.unwrap();
    assert_eq!(feed_curation.queries.len(), 10);
    assert_eq!(feed_curation.model, "test-model");

    let listing = stages::extract_search(&platform, &platform, &store, &options).await.unwrap();
    assert_eq!(listing.searches.len(), 10);
    assert!(listing.searches.iter().all(|s| s.videos.iter().all(|v| !v.sponsored)));
    assert_eq!(listing.feed.records.len(), 3);

    let reduced = stages::reduce(&Reducer::default(), &store, &mut rng).await.unwrap();
    assert!(reduced.searches.iter().all(|s| s.videos.len() <= 3 && s.shorts.len() <= 3));

    stages::curate_search(&curator, &store, &rubric(CurationPass::Search)).await.unwrap();
    let list = stages::compile(&ActionCompiler::default(), &store, &mut rng).await.unwrap();
    assert_eq!(list.summary.total_to_dislike(), 2);
    assert_eq!(list.summary.videos_to_like, 10);
    assert_eq!(list.summary.shorts_to_like, 10);
    assert_eq!(list.summary.total_to_like(), 20);

    let executor = ActionExecutor::new(&platform, &store, PacingConfig::none(), false);
    let report = tokio_test::assert_ok!(stages::execute(&platform, &executor, &store, &options).await);
    assert_eq!(report.count(ItemStatus::Applied), 22);
    assert!(platform.sessions_balanced());

    for stage in StageId::ALL {
        assert!(store.path_for(stage).exists(), "missing artifact for {stage}");
    }

    // Persisted artifacts match what the stages returned
    let saved: ActionList = store.read().await.unwrap();
    assert_eq!(saved.actions, list.actions);
    let saved_report: ExecutionReport = store.read().await.unwrap();
    assert_eq!(saved_report.outcomes.len(), 22);
    let saved_search: SearchCuration = store.read().await.unwrap();
    assert_eq!(saved_search.feed, feed_curation.outcome);
}

#[tokio::test]
async fn test_session_released_when_extraction_fails() {
    let (temp, store) = TestHelpers::temp_store();
    let platform = FakePlatform {
        fail_feed: true,
        ..Default::default()
    };

    let result = stages::extract_feed(&platform, &platform, &store, &TestHelpers::session_options(&temp)).await;

    assert!(matches!(result, Err(PipelineError::CollaboratorError { .. })));
    assert!(platform.sessions_balanced());
    assert!(!store.path_for(StageId::ExtractFeed).exists());
}

#[tokio::test]
async fn test_report_written_when_session_release_fails() {
    let (temp, store) = TestHelpers::temp_store();
    let item = ActionItem {
        url: TestFixtures::url("abc", VideoKind::Video),
        kind: VideoKind::Video,
        action: Action::Like,
    };
    store.write(&ActionList::new(vec![item], 1, 0)).await.unwrap();
    let platform = FakePlatform {
        fail_close: true,
        ..Default::default()
    };
    let executor = ActionExecutor::new(&platform, &store, PacingConfig::none(), false);

    let result = stages::execute(&platform, &executor, &store, &TestHelpers::session_options(&temp)).await;

    assert!(matches!(result, Err(PipelineError::CollaboratorError { .. })));
    assert_eq!(platform.click_count(), 1);
    assert!(platform.sessions_balanced());
    assert!(store.path_for(StageId::Execute).exists());
    let report: ExecutionReport = store.read().await.unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.count(ItemStatus::Applied), 1);
}

#[tokio::test]
async fn test_failed_search_is_recorded_and_run_continues() {
    let (temp, store) = TestHelpers::temp_store();
    let options = TestHelpers::session_options(&temp);
    let mut platform = platform();
    platform.failing_queries.insert("easy fractions".to_string());

    stages::extract_feed(&platform, &platform, &store, &options).await.unwrap();
    stages::curate_feed(&curator(), &store, &rubric(CurationPass::Feed)).await.unwrap();
    stages::extract_search(&platform, &platform, &store, &options).await.unwrap();

    let listing: SearchListing = store.read().await.unwrap();
    let failed: Vec<_> = listing.searches.iter().filter(|s| s.error.is_some()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].query.text, "easy fractions");
    assert!(failed[0].videos.is_empty());
}

#[tokio::test]
async fn test_stage_fails_when_every_search_fails() {
    let (temp, store) = TestHelpers::temp_store();
    let options = TestHelpers::session_options(&temp);
    let mut platform = platform();
    for query in TestFixtures::balanced_queries() {
        platform.failing_queries.insert(query.text);
    }

    stages::extract_feed(&platform, &platform, &store, &options).await.unwrap();
    stages::curate_feed(&curator(), &store, &rubric(CurationPass::Feed)).await.unwrap();
    let result = stages::extract_search(&platform, &platform, &store, &options).await;

    assert!(matches!(result, Err(PipelineError::CollaboratorError { .. })));
    assert!(platform.sessions_balanced());
    assert!(!store.path_for(StageId::ExtractSearch).exists());
}

#[tokio::test]
async fn test_missing_predecessor_artifact() {
    let (_temp, store) = TestHelpers::temp_store();
    let result = stages::compile(&ActionCompiler::default(), &store, &mut StdRng::seed_from_u64(0)).await;

    match result {
        Err(PipelineError::ArtifactError(SharedError::MissingArtifact { stage, .. })) => {
            assert_eq!(stage, StageId::CurateSearch)
        }
        other => panic!("expected MissingArtifact, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rerun_overwrites_artifact() {
    let (temp, store) = TestHelpers::temp_store();
    let options = TestHelpers::session_options(&temp);
    let platform = platform();

    stages::extract_feed(&platform, &platform, &store, &options).await.unwrap();
    stages::curate_feed(&curator(), &store, &rubric(CurationPass::Feed)).await.unwrap();
    let first: FeedCuration = store.read().await.unwrap();

    stages::curate_feed(&curator(), &store, &rubric(CurationPass::Feed)).await.unwrap();
    let second: FeedCuration = store.read().await.unwrap();
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(second.queries.len(), 10);
}
