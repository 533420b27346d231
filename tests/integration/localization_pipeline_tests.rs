/*!
 * Integration tests for the localization pipeline
 */

use anyhow::Result;
use std::time::{Duration, Instant};
use url::Url;

use page_localizer::errors::LocalizationError;
use page_localizer::localization::{LocalizationMode, PipelineOptions};
use page_localizer::providers::mock::MockProvider;

use crate::common;

/// Test that one failing chunk does not take the others down
#[tokio::test]
async fn test_localize_withOneFailingChunk_shouldKeepTheOthers() -> Result<()> {
    let html = common::numbered_paragraphs(6);
    let provider = MockProvider::working().with_failure_on("Paragraph number 2 with");
    let pipeline = common::test_pipeline(provider, PipelineOptions { chunk_size: 2, ..common::fast_options() });

    let outcome = pipeline.localize(&html, &common::spanish_request()).await?;
    let report = &outcome.report;

    assert_eq!(report.chunks_total, 3);
    assert_eq!(report.chunks_failed, 1);
    assert_eq!(report.units_total, 6);
    assert_eq!(report.units_processed, 4);
    assert_eq!(report.units_unresolved, 2);
    assert_eq!(report.units_processed + report.units_unresolved, report.units_total);

    let mut unresolved = report.unresolved_ids.clone();
    unresolved.sort();
    assert_eq!(unresolved, vec!["TEXT_2", "TEXT_3"]);

    assert!(outcome.localized_html.contains("<p>[LOCALIZED] Paragraph number 0 with enough text</p>"));
    assert!(outcome.localized_html.contains("<p>Paragraph number 2 with enough text</p>"));
    assert!(outcome.localized_html.contains("<p>[LOCALIZED] Paragraph number 5 with enough text</p>"));
    Ok(())
}

/// Test that concurrent chunks settle into the same result as sequential ones
#[tokio::test]
async fn test_localize_withConcurrentChunks_shouldLocalizeEverything() -> Result<()> {
    let html = common::numbered_paragraphs(5);
    let provider = MockProvider::slow(20);
    let pipeline = common::test_pipeline(
        provider.clone(),
        PipelineOptions {
            chunk_size: 1,
            max_concurrent_chunks: Some(3),
            ..common::fast_options()
        },
    );

    let outcome = pipeline.localize(&html, &common::spanish_request()).await?;

    assert_eq!(outcome.report.chunks_total, 5);
    assert_eq!(outcome.report.units_processed, 5);
    assert_eq!(outcome.report.completeness(), 1.0);
    assert_eq!(provider.request_count(), 5);
    for i in 0..5 {
        let expected = format!("<p>[LOCALIZED] Paragraph number {} with enough text</p>", i);
        assert!(outcome.localized_html.contains(&expected));
    }
    Ok(())
}

/// Test a landing page with a real translation table
#[tokio::test]
async fn test_localize_withTranslationTable_shouldWriteLocalizedCopy() -> Result<()> {
    let provider = MockProvider::working().with_translations(&[
        ("Build your dream website today", "Crea hoy el sitio web de tus sueños"),
        ("Start your project now", "Empieza tu proyecto ahora"),
        ("Our design team at work", "Nuestro equipo de diseño trabajando"),
    ]);
    let pipeline = common::test_pipeline(provider, common::fast_options());

    let outcome = pipeline.localize(common::LANDING_PAGE, &common::spanish_request()).await?;
    let html = &outcome.localized_html;

    assert!(html.contains(r#"<h1 id="hero-title">Crea hoy el sitio web de tus sueños</h1>"#));
    assert!(html.contains(r#"href="/start">Empieza tu proyecto ahora</a>"#));
    assert!(html.contains(r#"alt="Nuestro equipo de diseño trabajando""#));
    assert!(html.contains(r#"var greeting = "Build your dream website today";"#));
    assert_eq!(outcome.report.units_processed, 7);
    assert_eq!(outcome.metadata.target_language, "Spanish");
    assert_eq!(outcome.metadata.audience, "small business owners");
    Ok(())
}

/// Test that fenced, chatty responses are still recovered
#[tokio::test]
async fn test_localize_withFencedResponses_shouldParseThem() -> Result<()> {
    let pipeline = common::test_pipeline(MockProvider::working().fenced(), common::fast_options());

    let outcome = pipeline
        .localize(&common::numbered_paragraphs(2), &common::spanish_request())
        .await?;

    assert_eq!(outcome.report.units_processed, 2);
    assert_eq!(outcome.report.units_unresolved, 0);
    Ok(())
}

/// Test document mode with an echoing backend
#[tokio::test]
async fn test_localize_documentMode_shouldReturnValidatedDocument() -> Result<()> {
    let pipeline = common::test_pipeline(
        MockProvider::working(),
        PipelineOptions { mode: LocalizationMode::Document, ..common::fast_options() },
    );

    let outcome = pipeline.localize(common::FULL_DOCUMENT, &common::spanish_request()).await?;

    assert_eq!(outcome.localized_html, common::FULL_DOCUMENT);
    assert_eq!(outcome.metadata.mode, LocalizationMode::Document);
    assert_eq!(outcome.report.chunks_total, 1);
    assert_eq!(outcome.report.units_processed, outcome.report.units_total);
    Ok(())
}

/// Test that a structurally broken document is refused
#[tokio::test]
async fn test_localize_documentMode_withBodylessAnswer_shouldFail() {
    let provider = MockProvider::working()
        .with_custom_response(|_| "<html><head><title>Acme</title></head></html>".to_string());
    let pipeline = common::test_pipeline(
        provider,
        PipelineOptions { mode: LocalizationMode::Document, ..common::fast_options() },
    );

    let result = pipeline.localize(common::FULL_DOCUMENT, &common::spanish_request()).await;

    assert!(matches!(result, Err(LocalizationError::InvalidDocumentStructure(_))));
}

/// Test that auto mode sends small pages whole
#[tokio::test]
async fn test_localize_autoMode_withSmallPage_shouldUseDocumentMode() -> Result<()> {
    let provider = MockProvider::working();
    let pipeline = common::test_pipeline(
        provider.clone(),
        PipelineOptions { mode: LocalizationMode::Auto, ..common::fast_options() },
    );

    let outcome = pipeline.localize(common::FULL_DOCUMENT, &common::spanish_request()).await?;

    assert_eq!(outcome.metadata.mode, LocalizationMode::Document);
    assert_eq!(provider.request_count(), 1);
    Ok(())
}

/// Test that relative references are made absolute against the base URL
#[tokio::test]
async fn test_localize_withBaseUrl_shouldAbsolutizeReferences() -> Result<()> {
    let pipeline = common::test_pipeline(MockProvider::working(), common::fast_options())
        .with_base_url(Url::parse("https://example.com/shop/")?);

    let outcome = pipeline.localize(common::LANDING_PAGE, &common::spanish_request()).await?;

    assert!(outcome.localized_html.contains(r#"href="https://example.com/start""#));
    assert!(outcome.localized_html.contains(r#"src="https://example.com/team.jpg""#));
    Ok(())
}

/// Test that cancelling mid-run applies the settled chunks only
#[tokio::test]
async fn test_localizeUntil_cancelledMidRun_shouldApplySettledChunks() -> Result<()> {
    let html = common::numbered_paragraphs(3);
    let pipeline = common::test_pipeline(
        MockProvider::slow(200),
        PipelineOptions { chunk_size: 1, ..common::fast_options() },
    );

    let outcome = pipeline
        .localize_until(
            &html,
            &common::spanish_request(),
            tokio::time::sleep(Duration::from_millis(300)),
        )
        .await?;

    assert!(outcome.metadata.cancelled);
    assert_eq!(outcome.report.units_processed, 1);
    assert_eq!(outcome.report.units_unresolved, 2);
    assert!(outcome.localized_html.contains("<p>[LOCALIZED] Paragraph number 0 with enough text</p>"));
    assert!(outcome.localized_html.contains("<p>Paragraph number 1 with enough text</p>"));
    Ok(())
}

/// Test that sequential chunks wait for the configured delay between dispatches
#[tokio::test]
async fn test_localize_sequentialChunks_shouldWaitBetweenDispatches() -> Result<()> {
    let html = common::numbered_paragraphs(3);
    let provider = MockProvider::working();
    let pipeline = common::test_pipeline(
        provider.clone(),
        PipelineOptions {
            chunk_size: 1,
            max_concurrent_chunks: None,
            chunk_delay: Duration::from_millis(150),
            ..common::fast_options()
        },
    );

    let started = Instant::now();
    let outcome = pipeline.localize(&html, &common::spanish_request()).await?;

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(outcome.report.chunks_total, 3);
    assert_eq!(outcome.report.units_processed, 3);
    assert_eq!(provider.request_count(), 3);
    Ok(())
}

/// Test that a concurrency cap dispatches chunks without the sequential delay
#[tokio::test]
async fn test_localize_withConcurrencyCap_shouldSkipChunkDelay() -> Result<()> {
    let html = common::numbered_paragraphs(3);
    let pipeline = common::test_pipeline(
        MockProvider::working(),
        PipelineOptions {
            chunk_size: 1,
            max_concurrent_chunks: Some(1),
            chunk_delay: Duration::from_secs(5),
            ..common::fast_options()
        },
    );

    let started = Instant::now();
    let outcome = pipeline.localize(&html, &common::spanish_request()).await?;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(outcome.report.units_processed, 3);
    Ok(())
}
