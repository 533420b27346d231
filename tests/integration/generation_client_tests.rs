/*!
 * Tests for generation with retry and model fallback
 */

use page_localizer::errors::{LocalizationError, ProviderError};
use page_localizer::localization::GenerationOptions;
use page_localizer::providers::mock::MockProvider;

use crate::common;

const UNIT_PROMPT: &str = "[\n  {\n    \"id\": \"TEXT_0\",\n    \"text\": \"Welcome\",\n    \"context\": \"body\"\n  }\n]";

/// Test that the answering model and the models tried are reported
#[tokio::test]
async fn test_generateWithModel_withMissingFirstModel_shouldFallBackAndReport() {
    let provider = MockProvider::working()
        .with_model_error("a/one", ProviderError::ModelNotFound("no such model".to_string()));
    let client = common::test_client(provider.clone(), &["a/one", "b/two"]);

    let generation = client
        .generate_with_model(UNIT_PROMPT, "system", &GenerationOptions::default())
        .await
        .unwrap();

    assert_eq!(generation.model, "b/two");
    assert_eq!(generation.models_tried, vec!["a/one", "b/two"]);
    assert!(generation.text.contains("[LOCALIZED] Welcome"));
    assert_eq!(provider.models_seen(), vec!["a/one", "b/two"]);
}

/// Test that a preferred model is tried before the configured list
#[tokio::test]
async fn test_generate_withPreferredModel_shouldTryItFirst() {
    let provider = MockProvider::working();
    let client = common::test_client(provider.clone(), &["a/one", "b/two"]);
    let options = GenerationOptions {
        model: Some("c/three".to_string()),
        ..GenerationOptions::default()
    };

    client.generate(UNIT_PROMPT, "", &options).await.unwrap();

    assert_eq!(provider.models_seen(), vec!["c/three"]);
}

/// Test that a transient server error is retried on the same model
#[tokio::test]
async fn test_generate_withTransientServerError_shouldRetrySameModel() {
    let provider = MockProvider::fail_first(1, 503);
    let client = common::test_client(provider.clone(), &["a/one", "b/two"]);

    let text = client.generate(UNIT_PROMPT, "", &GenerationOptions::default()).await.unwrap();

    assert!(text.starts_with('['));
    assert_eq!(provider.models_seen(), vec!["a/one", "a/one"]);
}

/// Test that an authentication error stops the whole generation
#[tokio::test]
async fn test_generate_withInvalidKey_shouldNotTryOtherModels() {
    let provider = MockProvider::failing(401);
    let client = common::test_client(provider.clone(), &["a/one", "b/two"]);

    let error = client
        .generate(UNIT_PROMPT, "", &GenerationOptions::default())
        .await
        .unwrap_err();

    match error {
        LocalizationError::GenerationFailed { attempts, source } => {
            assert_eq!(attempts, 1);
            assert!(matches!(source, ProviderError::AuthenticationError(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(provider.request_count(), 1);
}

/// Test that exhausting every model surfaces the last error
#[tokio::test]
async fn test_generate_withEveryModelRateLimited_shouldFailAfterAllModels() {
    let provider = MockProvider::working()
        .with_model_error("a/one", ProviderError::from_status(429, "slow down"))
        .with_model_error("b/two", ProviderError::from_status(429, "slow down"));
    let client = common::test_client(provider.clone(), &["a/one", "b/two"]);

    let error = client
        .generate(UNIT_PROMPT, "", &GenerationOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        LocalizationError::GenerationFailed { attempts: 2, source: ProviderError::RateLimitExceeded(_) }
    ));
    assert_eq!(provider.models_seen(), vec!["a/one", "a/one", "b/two", "b/two"]);
}

/// Test the connection check against a failing backend
#[tokio::test]
async fn test_testConnection_withFailingProvider_shouldFail() {
    let client = common::test_client(MockProvider::failing(401), &["a/one"]);
    assert!(client.test_connection().await.is_err());

    let client = common::test_client(MockProvider::working(), &["a/one"]);
    assert_eq!(client.test_connection().await.unwrap(), "a/one");
}
