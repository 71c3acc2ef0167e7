use crate::adapters::auth::Credential;
use crate::adapters::{parse_identifier, parse_quantity, read_json, send_error};
use crate::domain::model::SupplierOffer;
use crate::domain::ports::OfferCatalog;
use crate::utils::error::{ReplenishError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const SERVICE: &str = "supplier marketplace";
const CATALOG_PATH: &str = "v2/suppliers/catalog";

#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl MarketplaceClient {
    pub fn new(client: Client, base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credential,
        }
    }
}

fn parse_offer(item: &Value, currency: &str) -> Result<SupplierOffer> {
    let supplier_id = item
        .get("supplier")
        .and_then(parse_identifier)
        .ok_or_else(|| ReplenishError::malformed(SERVICE, "offer without supplier"))?;
    let unit_price = item
        .get("price")
        .and_then(parse_quantity)
        .filter(|price| *price >= 0.0)
        .ok_or_else(|| ReplenishError::malformed(SERVICE, format!("offer {} without valid price", supplier_id)))?;
    let lead_time_days = item
        .get("leadtime")
        .and_then(parse_quantity)
        .filter(|days| *days >= 0.0 && days.fract() == 0.0 && *days <= f64::from(u32::MAX))
        .map(|days| days as u32)
        .ok_or_else(|| ReplenishError::malformed(SERVICE, format!("offer {} without valid leadtime", supplier_id)))?;
    let currency = item
        .get("currency")
        .and_then(|c| c.as_str())
        .unwrap_or(currency)
        .to_string();

    Ok(SupplierOffer {
        supplier_id,
        unit_price,
        currency,
        lead_time_days,
    })
}

#[async_trait]
impl OfferCatalog for MarketplaceClient {
    async fn offers(&self, material: &str, quantity: f64, currency: &str) -> Result<Vec<SupplierOffer>> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), CATALOG_PATH);
        let qty = quantity.to_string();

        tracing::debug!("📡 {}: GET {} for {} x {}", SERVICE, url, qty, material);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.credential.token())
            .query(&[("material", material), ("qty", qty.as_str()), ("currency", currency)])
            .send()
            .await
            .map_err(|e| send_error(SERVICE, e))?;
        let body = read_json(SERVICE, response, false).await?;

        let items = body
            .get("offers")
            .and_then(|o| o.as_array())
            .ok_or_else(|| ReplenishError::malformed(SERVICE, "missing offers array"))?;

        // Returned order is kept; cheapest-offer ties resolve on it.
        items.iter().map(|item| parse_offer(item, currency)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_offer_accepts_string_fields() {
        let offer = parse_offer(
            &json!({"supplier": "SUP-9", "price": "9.90", "leadtime": "7"}),
            "EUR",
        )
        .unwrap();
        assert_eq!(offer.supplier_id, "SUP-9");
        assert_eq!(offer.unit_price, 9.9);
        assert_eq!(offer.lead_time_days, 7);
        assert_eq!(offer.currency, "EUR");
    }

    #[test]
    fn test_parse_offer_rejects_missing_price() {
        let err = parse_offer(&json!({"supplier": "SUP-9", "leadtime": 3}), "EUR").unwrap_err();
        assert_eq!(err.kind(), crate::utils::error::ErrorKind::MalformedResponse);
    }
}
