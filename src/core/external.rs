use crate::domain::model::{ExternalSourcingDecision, Shortage, SupplierOffer};
use crate::domain::ports::OfferCatalog;
use crate::utils::error::{ReplenishError, Result};
use chrono::NaiveDate;
use std::sync::Arc;

/// Prices the residual shortage on the external marketplace.
pub struct ExternalSourcingPlanner {
    catalog: Arc<dyn OfferCatalog>,
}

impl ExternalSourcingPlanner {
    pub fn new(catalog: Arc<dyn OfferCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn fetch_offers(
        &self,
        material: &str,
        quantity: f64,
        currency: &str,
    ) -> Result<Vec<SupplierOffer>> {
        let offers = self.catalog.offers(material, quantity, currency).await?;
        if offers.is_empty() {
            return Err(ReplenishError::NoOffersAvailable {
                material: material.to_string(),
                quantity,
            });
        }
        Ok(offers)
    }

    /// Lowest unit price; on equal prices the offer returned first wins.
    pub fn select_cheapest(offers: &[SupplierOffer]) -> Option<&SupplierOffer> {
        offers.iter().fold(None, |best: Option<&SupplierOffer>, offer| match best {
            Some(current) if current.unit_price <= offer.unit_price => Some(current),
            _ => Some(offer),
        })
    }

    /// Returns `None` when nothing is left to buy. An empty offer set is an error.
    pub async fn plan(
        &self,
        material: &str,
        residual: Shortage,
        currency: &str,
        today: NaiveDate,
    ) -> Result<Option<ExternalSourcingDecision>> {
        if residual.is_zero() {
            return Ok(None);
        }

        let offers = self
            .fetch_offers(material, residual.quantity(), currency)
            .await?;
        tracing::debug!("🛒 {} offers for {} x {}", offers.len(), residual, material);

        let best = Self::select_cheapest(&offers).cloned().ok_or_else(|| {
            ReplenishError::NoOffersAvailable {
                material: material.to_string(),
                quantity: residual.quantity(),
            }
        })?;
        let delivery_date = today
            .checked_add_days(chrono::Days::new(u64::from(best.lead_time_days)))
            .ok_or_else(|| {
                ReplenishError::malformed(
                    "supplier marketplace",
                    format!(
                        "offer {} lead time of {} days leaves the calendar",
                        best.supplier_id, best.lead_time_days
                    ),
                )
            })?;

        Ok(Some(ExternalSourcingDecision {
            offer: best,
            quantity: residual.quantity(),
            delivery_date,
        }))
    }
}
