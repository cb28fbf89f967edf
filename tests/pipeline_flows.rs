mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::{
    fast_collector_config, BrokenLauncher, FailingSummarizer, KeywordClassifier, RecordingSummarizer,
    ScriptedLauncher, ScriptedPage, Stage,
};
use reviewanalyzer_lib::browser_ai::BrowserLauncher;
use reviewanalyzer_lib::config::Config;
use reviewanalyzer_lib::error::AppError;
use reviewanalyzer_lib::init::AppServices;
use reviewanalyzer_lib::llm::{InputTruncator, Summarizer};
use reviewanalyzer_lib::models::{StageOutcome, StopReason};
use reviewanalyzer_lib::services::report;

const PRODUCT_URL: &str = "https://shop.local/vp/products/42";

fn services(
    launcher: Arc<dyn BrowserLauncher>,
    classifier: Arc<KeywordClassifier>,
    summarizer: Arc<dyn Summarizer>,
) -> AppServices {
    let mut config = Config::default();
    config.collector = fast_collector_config(5);
    config.sentiment.label_map = BTreeMap::from([
        ("LABEL_0".to_string(), "부정".to_string()),
        ("LABEL_1".to_string(), "긍정".to_string()),
    ]);

    AppServices::from_parts(
        config,
        launcher,
        classifier,
        summarizer,
        InputTruncator::Whitespace,
    )
}

fn review_page() -> ScriptedPage {
    ScriptedPage::new(vec![
        Stage::new(&["배송이 빨라요"], 1000),
        Stage::new(&["배송이 빨라요", "품질 좋아요", "포장이 별로"], 1600),
    ])
}

#[tokio::test]
async fn test_full_run_tallies_and_summarizes() {
    let page = review_page();
    let classifier = Arc::new(KeywordClassifier::working());
    let summarizer = Arc::new(RecordingSummarizer::default());
    let services = services(
        Arc::new(ScriptedLauncher { page: page.clone() }),
        classifier.clone(),
        summarizer.clone(),
    );

    let analysis = services.pipeline().run(PRODUCT_URL, 5).await.unwrap();

    assert_eq!(analysis.reviews.len(), 3);
    assert_eq!(analysis.stop, StopReason::Stalled);
    assert_eq!(page.quits(), 1);

    let tally = analysis.sentiment.completed().unwrap();
    assert_eq!(tally.get("긍정"), 2);
    assert_eq!(tally.get("부정"), 1);
    assert_eq!(tally.total(), analysis.reviews.len());

    let summary = analysis.summary.completed().unwrap();
    assert!(!summary.text.is_empty());
    assert_eq!(
        summarizer.documents.lock().unwrap()[0],
        "배송이 빨라요 품질 좋아요 포장이 별로"
    );

    let text = report::render_text(&analysis, 2);
    assert!(text.contains("Collected 3 reviews."));
    assert!(text.contains("긍정: 2"));
}

#[tokio::test]
async fn test_sentiment_failure_does_not_block_summary() {
    let page = review_page();
    let classifier = Arc::new(KeywordClassifier::failing());
    let summarizer = Arc::new(RecordingSummarizer::default());
    let services = services(
        Arc::new(ScriptedLauncher { page: page.clone() }),
        classifier.clone(),
        summarizer.clone(),
    );

    let analysis = services.pipeline().run(PRODUCT_URL, 5).await.unwrap();

    assert!(analysis.sentiment.is_failed());
    assert!(analysis.summary.completed().is_some());
    assert_eq!(classifier.calls(), 1);
    assert_eq!(summarizer.calls(), 1);
}

#[tokio::test]
async fn test_summary_failure_does_not_block_sentiment() {
    let page = review_page();
    let classifier = Arc::new(KeywordClassifier::working());
    let services = services(
        Arc::new(ScriptedLauncher { page: page.clone() }),
        classifier.clone(),
        Arc::new(FailingSummarizer),
    );

    let analysis = services.pipeline().run(PRODUCT_URL, 5).await.unwrap();

    assert!(matches!(analysis.summary, StageOutcome::Failed(_)));
    let tally = analysis.sentiment.completed().unwrap();
    assert_eq!(tally.get("긍정"), 2);
    assert_eq!(tally.get("부정"), 1);
    assert_eq!(page.quits(), 1);

    let text = report::render_text(&analysis, 5);
    assert!(text.contains("failed: Generation error"));
}

#[tokio::test]
async fn test_browser_error_mid_scroll_releases_browser() {
    let page = review_page().failing_scroll_at(2);
    let classifier = Arc::new(KeywordClassifier::working());
    let summarizer = Arc::new(RecordingSummarizer::default());
    let services = services(
        Arc::new(ScriptedLauncher { page: page.clone() }),
        classifier.clone(),
        summarizer.clone(),
    );

    let err = services.pipeline().run(PRODUCT_URL, 5).await.unwrap_err();

    assert!(matches!(err, AppError::Browser(_)));
    assert!(err.is_fatal());
    assert_eq!(page.scrolls(), 2);
    assert_eq!(page.quits(), 1);
    assert_eq!(classifier.calls(), 0);
    assert_eq!(summarizer.calls(), 0);
}

#[tokio::test]
async fn test_broken_page_scripts_fail_the_run() {
    let page = review_page().with_broken_scripts();
    let services = services(
        Arc::new(ScriptedLauncher { page: page.clone() }),
        Arc::new(KeywordClassifier::working()),
        Arc::new(RecordingSummarizer::default()),
    );

    let err = services.pipeline().run(PRODUCT_URL, 5).await.unwrap_err();
    assert!(matches!(err, AppError::Browser(_)));
    assert_eq!(page.quits(), 1);
}

#[tokio::test]
async fn test_missing_section_skips_inference() {
    let page = review_page().without_review_tab();
    let classifier = Arc::new(KeywordClassifier::working());
    let summarizer = Arc::new(RecordingSummarizer::default());
    let services = services(
        Arc::new(ScriptedLauncher { page: page.clone() }),
        classifier.clone(),
        summarizer.clone(),
    );

    let analysis = services.pipeline().run(PRODUCT_URL, 5).await.unwrap();

    assert!(analysis.reviews.is_empty());
    assert_eq!(analysis.stop, StopReason::ReviewSectionMissing);
    assert!(analysis.sentiment.completed().unwrap().is_empty());
    assert!(matches!(analysis.summary, StageOutcome::Skipped(_)));
    assert_eq!(classifier.calls(), 0);
    assert_eq!(summarizer.calls(), 0);
    assert_eq!(page.quits(), 1);
}

#[tokio::test]
async fn test_navigation_failure_is_fatal_and_releases_browser() {
    let page = review_page().failing_navigation();
    let classifier = Arc::new(KeywordClassifier::working());
    let summarizer = Arc::new(RecordingSummarizer::default());
    let services = services(
        Arc::new(ScriptedLauncher { page: page.clone() }),
        classifier.clone(),
        summarizer.clone(),
    );

    let err = services.pipeline().run(PRODUCT_URL, 5).await.unwrap_err();

    assert!(matches!(err, AppError::Navigation(_)));
    assert!(err.is_fatal());
    assert_eq!(page.quits(), 1);
    assert_eq!(classifier.calls(), 0);
    assert_eq!(summarizer.calls(), 0);
}

#[tokio::test]
async fn test_launch_failure_is_reported() {
    let services = services(
        Arc::new(BrokenLauncher),
        Arc::new(KeywordClassifier::working()),
        Arc::new(RecordingSummarizer::default()),
    );

    let err = services.pipeline().run(PRODUCT_URL, 5).await.unwrap_err();
    assert!(matches!(err, AppError::Launch(_)));
}

#[tokio::test]
async fn test_invalid_url_never_launches_a_browser() {
    let page = review_page();
    let services = services(
        Arc::new(ScriptedLauncher { page: page.clone() }),
        Arc::new(KeywordClassifier::working()),
        Arc::new(RecordingSummarizer::default()),
    );

    let err = services.pipeline().run("file:///etc/passwd", 5).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(page.counters.lock().unwrap().navigations, 0);
    assert_eq!(page.quits(), 0);
}
