//! Curator
//!
//! Splits records into bounded batches, submits them to the classification
//! service together with the rubric and checks that every batch came back
//! with exactly one verdict per record. The feed pass also generates the
//! search queries for the next stage and enforces the query policy on them.

use std::collections::HashSet;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use shared::{process_debug, process_info, CuratorVerdict, ProcessId, SearchQuery, VideoRecord};

use super::policy::QueryPolicy;
use crate::config::CuratorConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::traits::ClassificationService;
use crate::types::{QueryContext, Rubric};

/// Curator over a classification service
pub struct Curator<C: ClassificationService> {
    service: C,
    config: CuratorConfig,
    policy: QueryPolicy,
}

impl<C: ClassificationService> Curator<C> {
    pub fn new(service: C, config: CuratorConfig, policy: QueryPolicy) -> Self {
        Self { service, config, policy }
    }

    pub fn model(&self) -> String {
        self.service.model()
    }

    /// Evaluate every record, batch by batch
    pub async fn evaluate_all(&self, records: &[VideoRecord], rubric: &Rubric) -> PipelineResult<Vec<CuratorVerdict>> {
        let unique = unique_by_id(records);
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<&[VideoRecord]> = unique.chunks(self.config.batch_size.max(1)).collect();
        let batch_count = batches.len();
        process_info!(
            ProcessId::current(),
            "🧮 Evaluating {} records in {} batches",
            unique.len(),
            batch_count
        );

        let verdicts: Vec<Vec<CuratorVerdict>> = stream::iter(batches.into_iter().enumerate().map(|(n, batch)| async move {
            let verdicts = self.service.evaluate(batch, rubric).await?;
            process_debug!(ProcessId::current(), "Batch {}/{} returned {} verdicts", n + 1, batch_count, verdicts.len());
            check_batch(batch, verdicts)
        }))
        .buffered(self.config.max_in_flight.max(1))
        .try_collect()
        .await?;

        Ok(verdicts.into_iter().flatten().collect())
    }

    /// Feed pass: verdicts plus the policy-checked search queries
    pub async fn curate_feed(
        &self,
        records: &[VideoRecord],
        rubric: &Rubric,
    ) -> PipelineResult<(Vec<CuratorVerdict>, Vec<SearchQuery>)> {
        let verdicts = self.evaluate_all(records, rubric).await?;

        let context = QueryContext {
            feed_titles: records.iter().map(|r| r.title.clone()).collect(),
            rubric: rubric.clone(),
            policy: self.policy.clone(),
        };
        let proposals = self.service.propose_queries(&context).await?;
        let proposed = proposals.len();
        let queries = self.policy.apply(proposals)?;
        process_info!(
            ProcessId::current(),
            "🔎 Selected {} search queries from {} proposals",
            queries.len(),
            proposed
        );

        Ok((verdicts, queries))
    }

    /// Search pass: verdicts only
    pub async fn curate_search(&self, records: &[VideoRecord], rubric: &Rubric) -> PipelineResult<Vec<CuratorVerdict>> {
        self.evaluate_all(records, rubric).await
    }
}

/// First record of each id, in input order
fn unique_by_id(records: &[VideoRecord]) -> Vec<VideoRecord> {
    let mut seen = HashSet::new();
    records.iter().filter(|r| seen.insert(r.id.clone())).cloned().collect()
}

/// Every input id exactly once, nothing else
fn check_batch(batch: &[VideoRecord], verdicts: Vec<CuratorVerdict>) -> PipelineResult<Vec<CuratorVerdict>> {
    let expected: HashSet<&str> = batch.iter().map(|r| r.id.as_str()).collect();

    let mut seen = HashSet::new();
    let mut unexpected = Vec::new();
    for verdict in &verdicts {
        let id = verdict.record_id.as_str();
        if !expected.contains(id) || !seen.insert(id) {
            unexpected.push(verdict.record_id.clone());
        }
    }

    let missing: Vec<String> = batch
        .iter()
        .filter(|r| !seen.contains(r.id.as_str()))
        .map(|r| r.id.clone())
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(verdicts)
    } else {
        Err(PipelineError::IncompleteVerdictError {
            expected: batch.len(),
            received: verdicts.len(),
            missing,
            unexpected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockClassificationService;
    use crate::types::CurationPass;
    use shared::{QueryCategory, Source, VideoKind};

    fn record(id: &str) -> VideoRecord {
        VideoRecord::from_listing(
            &format!("https://www.youtube.com/watch?v={id}"),
            &format!("Video {id}"),
            VideoKind::Video,
            Source::Feed,
            None,
            false,
        )
        .unwrap()
    }

    fn rubric() -> Rubric {
        Rubric {
            pass: CurationPass::Feed,
            audience: "test audience".to_string(),
            standards: None,
        }
    }

    fn verdict(id: &str, like: bool) -> CuratorVerdict {
        CuratorVerdict {
            record_id: id.to_string(),
            like,
            rationale: None,
        }
    }

    fn echo_verdicts(batch: &[VideoRecord]) -> Vec<CuratorVerdict> {
        batch.iter().map(|r| verdict(&r.id, r.id.ends_with('0'))).collect()
    }

    fn curator(service: MockClassificationService, batch_size: usize) -> Curator<MockClassificationService> {
        let config = CuratorConfig {
            batch_size,
            max_in_flight: 2,
        };
        Curator::new(service, config, QueryPolicy::default())
    }

    #[tokio::test]
    async fn test_records_split_into_bounded_batches() {
        let mut service = MockClassificationService::new();
        service
            .expect_evaluate()
            .withf(|batch, _| batch.len() <= 4)
            .times(3)
            .returning(|batch, _| Ok(echo_verdicts(batch)));

        let records: Vec<_> = (0..10).map(|i| record(&format!("id{i}"))).collect();
        let verdicts = curator(service, 4).evaluate_all(&records, &rubric()).await.unwrap();

        assert_eq!(verdicts.len(), 10);
        let ids: HashSet<_> = verdicts.iter().map(|v| v.record_id.clone()).collect();
        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let mut service = MockClassificationService::new();
        service.expect_evaluate().never();

        let verdicts = curator(service, 4).evaluate_all(&[], &rubric()).await.unwrap();
        assert!(verdicts.is_empty());
    }

    #[tokio::test]
    async fn test_missing_verdict_is_reported() {
        let mut service = MockClassificationService::new();
        service
            .expect_evaluate()
            .returning(|batch, _| Ok(echo_verdicts(&batch[1..])));

        let records = vec![record("a"), record("b"), record("c")];
        let result = curator(service, 10).evaluate_all(&records, &rubric()).await;

        match result {
            Err(PipelineError::IncompleteVerdictError {
                expected,
                received,
                missing,
                unexpected,
            }) => {
                assert_eq!(expected, 3);
                assert_eq!(received, 2);
                assert_eq!(missing, vec!["a".to_string()]);
                assert!(unexpected.is_empty());
            }
            other => panic!("expected IncompleteVerdictError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_and_duplicate_ids_are_reported() {
        let mut service = MockClassificationService::new();
        service
            .expect_evaluate()
            .returning(|_, _| Ok(vec![verdict("a", true), verdict("a", false), verdict("zzz", true)]));

        let records = vec![record("a")];
        let result = curator(service, 10).evaluate_all(&records, &rubric()).await;

        match result {
            Err(PipelineError::IncompleteVerdictError { missing, unexpected, .. }) => {
                assert!(missing.is_empty());
                assert_eq!(unexpected, vec!["a".to_string(), "zzz".to_string()]);
            }
            other => panic!("expected IncompleteVerdictError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_service_error_propagates_unchanged() {
        let mut service = MockClassificationService::new();
        service
            .expect_evaluate()
            .times(1)
            .returning(|_, _| Err(PipelineError::classification("HTTP 503")));

        let result = curator(service, 10).evaluate_all(&[record("a")], &rubric()).await;
        assert!(matches!(result, Err(PipelineError::ClassificationServiceError { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_input_ids_evaluated_once() {
        let mut service = MockClassificationService::new();
        service
            .expect_evaluate()
            .withf(|batch, _| batch.len() == 2)
            .returning(|batch, _| Ok(echo_verdicts(batch)));

        let records = vec![record("a"), record("b"), record("a")];
        let verdicts = curator(service, 10).evaluate_all(&records, &rubric()).await.unwrap();
        assert_eq!(verdicts.len(), 2);
    }

    #[tokio::test]
    async fn test_feed_pass_applies_query_policy() {
        let mut service = MockClassificationService::new();
        service.expect_evaluate().returning(|batch, _| Ok(echo_verdicts(batch)));
        service
            .expect_propose_queries()
            .withf(|context| context.feed_titles == vec!["Video a".to_string()] && context.policy.total == 10)
            .returning(|_| {
                let mut queries: Vec<_> = (0..3)
                    .map(|i| SearchQuery::new(format!("geometry topic {i}"), QueryCategory::Math))
                    .collect();
                queries.push(SearchQuery::new("easy fractions", QueryCategory::Math));
                queries.push(SearchQuery::new("easy decimals", QueryCategory::Math));
                queries.extend((0..5).map(|i| SearchQuery::new(format!("how stars form {i}"), QueryCategory::Curiosity)));
                Ok(queries)
            });

        let (verdicts, queries) = curator(service, 10).curate_feed(&[record("a")], &rubric()).await.unwrap();
        assert_eq!(verdicts.len(), 1);
        assert_eq!(queries.len(), 10);
        assert_eq!(queries.iter().filter(|q| !q.constraints.is_empty()).count(), 2);
    }

    #[tokio::test]
    async fn test_feed_pass_fails_when_policy_unmet() {
        let mut service = MockClassificationService::new();
        service.expect_evaluate().returning(|batch, _| Ok(echo_verdicts(batch)));
        service
            .expect_propose_queries()
            .returning(|_| Ok(vec![SearchQuery::new("easy fractions", QueryCategory::Math)]));

        let result = curator(service, 10).curate_feed(&[record("a")], &rubric()).await;
        assert!(matches!(result, Err(PipelineError::QueryPolicyError { .. })));
    }
}
