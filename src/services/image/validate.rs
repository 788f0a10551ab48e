//! Product image pre-flight validation.
//!
//! Before blending, the product photo is checked with a vision model. With a
//! user prompt the check is "does the image contain the object the prompt
//! mentions"; without one it is "does the image contain exactly one object".
//! A failure of the validation call itself lets the image through, blending
//! is the feature and validation is only a guard.

use std::sync::Arc;

use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::clients::openai::OpenAiApi;
use crate::utils::common::extract_output_text;

pub const VALIDATION_MODEL: &str = "gpt-4o-mini";

static COUNT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Clone, Serialize)]
pub struct ProductValidation {
    pub is_valid: bool,
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains_object: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

pub struct ValidationService {
    api: Arc<dyn OpenAiApi>,
}

impl ValidationService {
    pub fn new(api: Arc<dyn OpenAiApi>) -> Self {
        Self { api }
    }

    pub async fn validate_product_image(
        &self,
        image_data_url: &str,
        user_prompt: Option<&str>,
    ) -> ProductValidation {
        let user_prompt = user_prompt.map(str::trim).filter(|prompt| !prompt.is_empty());
        info!(
            "Validating product image, mode: {}",
            if user_prompt.is_some() { "prompt-match" } else { "single-object" }
        );

        let question = match user_prompt {
            Some(prompt) => format!(
                "Does this image contain an object mentioned in the following text: \"{}\"?\nAnswer with just \"yes\" or \"no\".",
                prompt
            ),
            None => "How many distinct objects/products are in this image?\nAnswer with just a number.".to_string(),
        };

        let response = match self
            .api
            .analyze_image(image_data_url, &question, VALIDATION_MODEL)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Image validation call failed: {}", e);
                return ProductValidation {
                    is_valid: true,
                    reason: None,
                    object_count: None,
                    contains_object: None,
                    validation_error: Some(e.to_string()),
                };
            }
        };

        let text = extract_output_text(&response).trim().to_lowercase();
        info!("Validation model answered: {:?}", text);

        match user_prompt {
            Some(prompt) => {
                let contains_object = text.contains("yes");
                ProductValidation {
                    is_valid: contains_object,
                    reason: (!contains_object).then(|| {
                        format!(
                            "Image does not contain an object mentioned in the prompt: \"{}\"",
                            prompt
                        )
                    }),
                    object_count: None,
                    contains_object: Some(contains_object),
                    validation_error: None,
                }
            }
            None => {
                let object_count = COUNT_PATTERN
                    .find(&text)
                    .and_then(|m| m.as_str().parse::<u32>().ok());
                let is_valid = object_count == Some(1);
                ProductValidation {
                    is_valid,
                    reason: if is_valid {
                        None
                    } else {
                        Some(match object_count {
                            Some(count) => format!(
                                "Image contains {} objects, expected exactly 1 if prompt is empty",
                                count
                            ),
                            None => "Could not determine object count".to_string(),
                        })
                    },
                    object_count,
                    contains_object: None,
                    validation_error: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::openai::test_support::MockOpenAi;
    use serde_json::json;

    fn service_answering(answer: &str) -> (ValidationService, Arc<MockOpenAi>) {
        let mock = Arc::new(MockOpenAi::default());
        *mock.analyze_result.lock().unwrap() = Some(Ok(json!({ "output_text": answer })));
        (ValidationService::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_prompt_match_yes_passes() {
        let (service, mock) = service_answering("Yes, it does.");
        let result = service
            .validate_product_image("data:image/png;base64,aGk=", Some("a water bottle"))
            .await;
        assert!(result.is_valid);
        assert_eq!(result.contains_object, Some(true));
        assert!(result.reason.is_none());

        let calls = mock.analyze_calls.lock().unwrap();
        assert!(calls[0].1.contains("a water bottle"));
    }

    #[tokio::test]
    async fn test_prompt_match_no_fails_with_reason() {
        let (service, _) = service_answering("No.");
        let result = service
            .validate_product_image("data:image/png;base64,aGk=", Some("a sneaker"))
            .await;
        assert!(!result.is_valid);
        assert!(result.reason.unwrap().contains("a sneaker"));
    }

    #[tokio::test]
    async fn test_single_object_count_of_one_passes() {
        let (service, _) = service_answering("There is 1 object.");
        let result = service
            .validate_product_image("data:image/png;base64,aGk=", None)
            .await;
        assert!(result.is_valid);
        assert_eq!(result.object_count, Some(1));
    }

    #[tokio::test]
    async fn test_multiple_objects_fail_with_count() {
        let (service, _) = service_answering("3");
        let result = service
            .validate_product_image("data:image/png;base64,aGk=", None)
            .await;
        assert!(!result.is_valid);
        assert_eq!(result.object_count, Some(3));
        assert!(result.reason.unwrap().contains("3 objects"));
    }

    #[tokio::test]
    async fn test_unparseable_count_fails() {
        let (service, _) = service_answering("several items");
        let result = service
            .validate_product_image("data:image/png;base64,aGk=", None)
            .await;
        assert!(!result.is_valid);
        assert_eq!(result.reason.as_deref(), Some("Could not determine object count"));
    }

    #[tokio::test]
    async fn test_analysis_error_fails_open() {
        let mock = Arc::new(MockOpenAi::default());
        *mock.analyze_result.lock().unwrap() = Some(Err("rate limited".to_string()));
        let service = ValidationService::new(mock);

        let result = service
            .validate_product_image("data:image/png;base64,aGk=", None)
            .await;
        assert!(result.is_valid);
        assert!(result.validation_error.unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_blank_prompt_uses_single_object_mode() {
        let (service, mock) = service_answering("1");
        service
            .validate_product_image("data:image/png;base64,aGk=", Some("   "))
            .await;
        let calls = mock.analyze_calls.lock().unwrap();
        assert!(calls[0].1.contains("How many distinct objects"));
    }
}
