//! Segment pipeline and call orchestrator tests
//!
//! Exercise failure isolation, index stability and ordering with the
//! scripted model from `helpers`.

mod helpers;

use cca_ai::models::{CallRecord, CallStatus, Segment, SegmentDraft};
use cca_ai::{CallOrchestrator, PipelineStage, SegmentOutcome, SegmentPipeline};
use helpers::{ScriptedModel, StaticRetriever, LOAN_RULE};
use std::sync::Arc;

fn call(transcript: &str) -> CallRecord {
    CallRecord {
        id: 1,
        call_id: "call-1".to_string(),
        transcript: transcript.to_string(),
        status: CallStatus::Pending,
        created_at: "2024-01-01T00:00:00.000Z".to_string(),
    }
}

fn segment(index: usize, question: &str, answer: &str) -> Segment {
    Segment::new(
        index,
        SegmentDraft {
            customer_query: question.to_string(),
            agent_response: answer.to_string(),
        },
    )
}

fn orchestrator(model: Arc<ScriptedModel>, retriever: Arc<StaticRetriever>) -> CallOrchestrator {
    CallOrchestrator::new(model, retriever, 3)
}

#[tokio::test]
async fn test_segment_completes_with_context_and_query() {
    let model = Arc::new(ScriptedModel::new());
    let retriever = Arc::new(StaticRetriever::new(&[LOAN_RULE, "Card fees: annual cap."]));
    let pipeline = SegmentPipeline::new(model.clone(), retriever.clone(), 3);

    let outcome = pipeline
        .run("call-1", segment(2, "How long can I borrow?", "Up to 18 months."))
        .await;

    let SegmentOutcome::Completed(finding) = outcome else {
        panic!("expected completed segment");
    };
    assert_eq!(finding.segment_index(), 2);
    assert_eq!(finding.search_query.as_str(), "regulation for How long can I borrow?");
    assert_eq!(finding.context.passages.len(), 2);
    assert!(finding.verdict.violation_detected);

    // Passages reach the analyzer joined by the separator
    let contexts = model.contexts_seen.lock().unwrap();
    assert_eq!(contexts[0], format!("{}\n---\nCard fees: annual cap.", LOAN_RULE));

    let queries = retriever.queries.lock().unwrap();
    assert_eq!(queries[0].1, 3);
}

#[tokio::test]
async fn test_drop_reasons_are_tagged_by_stage() {
    let model = Arc::new(ScriptedModel::new());
    let retriever = Arc::new(StaticRetriever::new(&[LOAN_RULE]));
    let pipeline = SegmentPipeline::new(model, retriever, 3);

    let cases = [
        ("FAIL_QUERY rates?", PipelineStage::QueryTransform),
        ("EMPTY_QUERY rates?", PipelineStage::QueryTransform),
        ("FAIL_RETRIEVAL rates?", PipelineStage::Retrieval),
        ("FAIL_ANALYSIS rates?", PipelineStage::Analysis),
    ];

    for (question, expected_stage) in cases {
        match pipeline.run("call-1", segment(4, question, "12 months")).await {
            SegmentOutcome::Dropped(dropped) => {
                assert_eq!(dropped.index, 4);
                assert_eq!(dropped.stage, Some(expected_stage), "question: {question}");
                assert!(!dropped.reason.is_empty());
            }
            other => panic!("expected drop for {question}, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_empty_context_still_analyzed() {
    let model = Arc::new(ScriptedModel::new());
    let retriever = Arc::new(StaticRetriever::new(&[]));
    let pipeline = SegmentPipeline::new(model, retriever, 3);

    let outcome = pipeline
        .run("call-1", segment(1, "Is 24 months ok?", "Yes, 24 months."))
        .await;

    let SegmentOutcome::Completed(finding) = outcome else {
        panic!("expected completed segment");
    };
    assert!(finding.context.is_empty());
    assert!(!finding.verdict.violation_detected);
}

#[tokio::test]
async fn test_failed_segment_keeps_sibling_indices() {
    let model = Arc::new(ScriptedModel::new());
    let retriever = Arc::new(StaticRetriever::new(&[LOAN_RULE]));
    let orchestrator = orchestrator(model, retriever);

    let transcript = "\
Q: Can I get 6 months? || A: Yes, 6 months.
Q: FAIL_ANALYSIS and 10 months? || A: 10 months works.
Q: What about 18 months? || A: Sure, 18 months.";

    let analysis = orchestrator.analyze_call(&call(transcript)).await.unwrap();

    assert_eq!(analysis.segments_total, 3);
    let indices: Vec<usize> = analysis.findings.iter().map(|f| f.segment_index()).collect();
    assert_eq!(indices, vec![1, 3]);
    assert_eq!(analysis.dropped.len(), 1);
    assert_eq!(analysis.dropped[0].index, 2);
    assert_eq!(analysis.dropped[0].stage, Some(PipelineStage::Analysis));
}

#[tokio::test]
async fn test_findings_ordered_despite_completion_order() {
    let model = Arc::new(ScriptedModel::new());
    let retriever = Arc::new(StaticRetriever::new(&[LOAN_RULE]));
    let orchestrator = orchestrator(model, retriever);

    let transcript = "\
Q: SLOW first question 3 months? || A: 3 months.
Q: second question? || A: Yes.
Q: SLOW third question? || A: No.
Q: fourth question? || A: Maybe.";

    let analysis = orchestrator.analyze_call(&call(transcript)).await.unwrap();

    let indices: Vec<usize> = analysis.findings.iter().map(|f| f.segment_index()).collect();
    assert_eq!(indices, vec![1, 2, 3, 4]);
    assert!(analysis.findings[0].segment.customer_query.starts_with("SLOW first"));
}

#[tokio::test]
async fn test_no_segments_is_empty_result() {
    let model = Arc::new(ScriptedModel::new());
    let retriever = Arc::new(StaticRetriever::new(&[LOAN_RULE]));
    let orchestrator = orchestrator(model, retriever.clone());

    let analysis = orchestrator
        .analyze_call(&call("Agent: Good morning!\nCustomer: Hi, just checking in."))
        .await
        .unwrap();

    assert_eq!(analysis.segments_total, 0);
    assert!(analysis.has_no_findings());
    assert!(retriever.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_segmenter_failure_fails_call() {
    let model = Arc::new(ScriptedModel::new());
    let retriever = Arc::new(StaticRetriever::new(&[LOAN_RULE]));
    let orchestrator = orchestrator(model, retriever);

    let err = orchestrator
        .analyze_call(&call("SEGMENTER_FAIL\nQ: rates? || A: 5%"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(PipelineStage::Segmentation));
}

#[tokio::test]
async fn test_all_segments_dropped_yields_no_findings() {
    let model = Arc::new(ScriptedModel::new());
    let retriever = Arc::new(StaticRetriever::new(&[LOAN_RULE]));
    let orchestrator = orchestrator(model, retriever);

    let transcript = "\
Q: FAIL_QUERY one? || A: a
Q: FAIL_RETRIEVAL two? || A: b";

    let analysis = orchestrator.analyze_call(&call(transcript)).await.unwrap();

    assert_eq!(analysis.segments_total, 2);
    assert!(analysis.has_no_findings());
    assert_eq!(analysis.dropped.len(), 2);
}
