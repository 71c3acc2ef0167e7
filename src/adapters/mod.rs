// Adapters layer: reqwest-backed implementations of the domain ports.

pub mod auth;
pub mod http;
pub mod marketplace;

use crate::utils::error::{ReplenishError, Result};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

pub use auth::{acquire_credential, Credential};
pub use http::ErpClient;
pub use marketplace::MarketplaceClient;

/// One client per run; every request inherits the timeout.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("auto-replenish/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ReplenishError::ConfigError {
            message: format!("Cannot build HTTP client: {}", e),
        })
}

pub(crate) fn send_error(service: &str, e: reqwest::Error) -> ReplenishError {
    if e.is_timeout() {
        ReplenishError::upstream(service, "request timed out")
    } else {
        ReplenishError::upstream(service, e.to_string())
    }
}

/// Decodes a JSON body. Non-success statuses are upstream failures unless `rejectable`
/// is set and the server answered 4xx, which means the order itself was refused.
pub(crate) async fn read_json(service: &str, response: Response, rejectable: bool) -> Result<Value> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| send_error(service, e))?;

    if !status.is_success() {
        let message = String::from_utf8_lossy(&body).chars().take(300).collect::<String>();
        if rejectable && status.is_client_error() {
            return Err(ReplenishError::FulfillmentRejected {
                service: service.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        return Err(ReplenishError::upstream(
            service,
            format!("HTTP {}: {}", status, message),
        ));
    }

    serde_json::from_slice(&body).map_err(|e| ReplenishError::malformed(service, e.to_string()))
}

/// Quantities come as JSON numbers or as decimal strings.
pub(crate) fn parse_quantity(value: &Value) -> Option<f64> {
    let quantity = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    quantity.is_finite().then_some(quantity)
}

pub(crate) fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{:.0}", quantity)
    } else {
        quantity.to_string()
    }
}

/// Identifiers come back as strings or numbers depending on the service.
pub(crate) fn parse_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quantity_accepts_numbers_and_strings() {
        assert_eq!(parse_quantity(&json!(12.5)), Some(12.5));
        assert_eq!(parse_quantity(&json!(" 40.000 ")), Some(40.0));
        assert_eq!(parse_quantity(&json!("n/a")), None);
        assert_eq!(parse_quantity(&json!(null)), None);
        assert_eq!(parse_quantity(&json!("NaN")), None);
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(30.0), "30");
        assert_eq!(format_quantity(12.5), "12.5");
    }

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier(&json!("4500000017")), Some("4500000017".to_string()));
        assert_eq!(parse_identifier(&json!(10000042)), Some("10000042".to_string()));
        assert_eq!(parse_identifier(&json!("")), None);
    }
}
