//! # Error Taxonomy Mapping
//!
//! Turns a non-2xx Orders API response into an [`OrderError`].
//!
//! | HTTP | Issue code                                 | Result                |
//! |------|--------------------------------------------|-----------------------|
//! | 404  | any                                        | `OrderNotFound`       |
//! | 422  | `ORDER_ALREADY_CAPTURED`                   | `AlreadyCaptured`     |
//! | 422  | `ORDER_NOT_APPROVED`                       | `NotApproved`         |
//! | 422  | `ORDER_NOT_FOUND`, `INVALID_RESOURCE_ID`   | `OrderNotFound`       |
//! | 422  | anything else                              | `Unprocessable`       |
//! | 5xx  | any                                        | `UpstreamUnavailable` |
//! | else | any                                        | `InvalidRequest`      |

use pay_core::{OrderError, ProviderContext, ProviderIssue};
use serde::Deserialize;

/// Raw bodies longer than this are cut before they reach an error message.
const MAX_RAW_MESSAGE: usize = 512;

#[derive(Debug, Deserialize)]
struct PayPalErrorBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    debug_id: Option<String>,
    #[serde(default)]
    details: Vec<ProviderIssue>,
}

/// Pure status/body → [`OrderError`] mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTaxonomyMapper {
    /// Keep the provider's issue list (never in production)
    expose_details: bool,
}

impl ErrorTaxonomyMapper {
    pub fn new(expose_details: bool) -> Self {
        Self { expose_details }
    }

    /// Mapper for production: debug ids only, no raw details
    pub fn production() -> Self {
        Self::new(false)
    }

    pub fn map(&self, status: u16, body: &str) -> OrderError {
        let (ctx, issues) = self.context(status, body);

        match status {
            404 => OrderError::OrderNotFound(ctx),
            422 => {
                let recognised = issues.iter().find_map(|issue| match issue.as_str() {
                    "ORDER_ALREADY_CAPTURED" => Some(Kind::AlreadyCaptured),
                    "ORDER_NOT_APPROVED" => Some(Kind::NotApproved),
                    "ORDER_NOT_FOUND" | "INVALID_RESOURCE_ID" => Some(Kind::NotFound),
                    _ => None,
                });
                match recognised {
                    Some(Kind::AlreadyCaptured) => OrderError::AlreadyCaptured(ctx),
                    Some(Kind::NotApproved) => OrderError::NotApproved(ctx),
                    Some(Kind::NotFound) => OrderError::OrderNotFound(ctx),
                    None => OrderError::Unprocessable(ctx),
                }
            }
            500..=599 => OrderError::UpstreamUnavailable(ctx),
            _ => OrderError::InvalidRequest(ctx),
        }
    }

    /// Build the context and return the issue codes separately, since the
    /// codes drive classification even when details are hidden.
    fn context(&self, status: u16, body: &str) -> (ProviderContext, Vec<String>) {
        match serde_json::from_str::<PayPalErrorBody>(body) {
            Ok(parsed) => {
                let issues = parsed.details.iter().map(|d| d.issue.clone()).collect();
                let message = parsed
                    .message
                    .or_else(|| parsed.details.first().and_then(|d| d.description.clone()))
                    .unwrap_or_else(|| format!("HTTP {status}"));
                let details = (self.expose_details && !parsed.details.is_empty())
                    .then_some(parsed.details);

                let ctx = ProviderContext {
                    status,
                    name: parsed.name,
                    message,
                    debug_id: parsed.debug_id,
                    details,
                };
                (ctx, issues)
            }
            Err(_) => {
                let ctx = ProviderContext {
                    status,
                    message: truncate(body),
                    ..Default::default()
                };
                (ctx, Vec::new())
            }
        }
    }
}

enum Kind {
    AlreadyCaptured,
    NotApproved,
    NotFound,
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if trimmed.chars().count() <= MAX_RAW_MESSAGE {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(MAX_RAW_MESSAGE).collect();
    cut.push('…');
    cut
}
