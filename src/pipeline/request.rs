//! Review request as sent by callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ValidationError, coerce_string, is_truthy};

/// `{title, description, regions[]}`
///
/// Fields stay optional so a missing title is reported as a validation
/// error instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub regions: Value,
}

/// An [`AnalyzeRequest`] whose required fields are present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub title: String,
    pub description: String,
    pub regions: Vec<String>,
}

impl AnalyzeRequest {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        regions: Vec<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            regions: Value::from(regions),
        }
    }

    /// Require a non-blank title and description.
    ///
    /// Regions are optional; anything other than a list is ignored.
    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        let present = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        match (present(&self.title), present(&self.description)) {
            (Some(title), Some(description)) => Ok(ValidatedRequest {
                title,
                description,
                regions: self.region_list(),
            }),
            _ => Err(ValidationError::missing_fields(&["title", "description"])),
        }
    }

    fn region_list(&self) -> Vec<String> {
        match &self.regions {
            Value::Array(items) => items
                .iter()
                .filter(|v| is_truthy(v))
                .map(coerce_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationErrorKind;
    use serde_json::json;

    fn parse(value: Value) -> AnalyzeRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_request_is_trimmed() {
        let request = parse(json!({
            "title": " Curfew blocker ",
            "description": "Blocks logins after 10pm\n",
            "regions": ["Utah", "", "EU"]
        }));

        let valid = request.validate().unwrap();
        assert_eq!(valid.title, "Curfew blocker");
        assert_eq!(valid.description, "Blocks logins after 10pm");
        assert_eq!(valid.regions, vec!["Utah", "EU"]);
    }

    #[test]
    fn test_missing_or_blank_fields_rejected() {
        for body in [
            json!({}),
            json!({"title": "t"}),
            json!({"description": "d"}),
            json!({"title": "", "description": "d"}),
            json!({"title": "t", "description": "   "}),
        ] {
            let err = parse(body.clone()).validate().unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::MissingField, "{}", body);
            assert_eq!(err.to_string(), "Missing required fields: title, description");
        }
    }

    #[test]
    fn test_non_list_regions_ignored() {
        let request = parse(json!({"title": "t", "description": "d", "regions": "Utah"}));
        assert!(request.validate().unwrap().regions.is_empty());

        let request = parse(json!({"title": "t", "description": "d"}));
        assert!(request.validate().unwrap().regions.is_empty());
    }
}
