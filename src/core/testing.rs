//! In-memory collaborators for unit tests.

use crate::core::cancel::CancellationToken;
use crate::domain::model::SupplierOffer;
use crate::domain::ports::{
    AvailabilityService, ForecastSource, OfferCatalog, PurchaseRequisitionRequest,
    RequisitionService, StockSource, TransferOrderRequest, TransferOrderService,
};
use crate::utils::error::{ReplenishError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeErp {
    demand: Vec<f64>,
    on_hand: HashMap<String, f64>,
    receipts: HashMap<String, f64>,
    confirmable: HashMap<String, f64>,
    offers: Vec<SupplierOffer>,
    failing: HashSet<String>,
    malformed: HashSet<String>,
    rejecting: HashSet<String>,
    cancel_after: Option<(String, CancellationToken)>,
    calls: Mutex<Vec<String>>,
    pub atp_requests: Mutex<Vec<(String, f64, NaiveDate)>>,
    pub offer_requests: Mutex<Vec<f64>>,
    pub transfers: Mutex<Vec<TransferOrderRequest>>,
    pub requisitions: Mutex<Vec<PurchaseRequisitionRequest>>,
}

impl FakeErp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demand(mut self, lines: Vec<f64>) -> Self {
        self.demand = lines;
        self
    }

    pub fn with_stock(mut self, location: &str, quantity: f64) -> Self {
        self.on_hand.insert(location.to_string(), quantity);
        self
    }

    pub fn with_receipts(mut self, location: &str, quantity: f64) -> Self {
        self.receipts.insert(location.to_string(), quantity);
        self
    }

    /// Upper bound the ATP check confirms at `location`; unknown locations confirm nothing.
    pub fn with_confirmable(mut self, location: &str, quantity: f64) -> Self {
        self.confirmable.insert(location.to_string(), quantity);
        self
    }

    pub fn with_offers(mut self, offers: Vec<SupplierOffer>) -> Self {
        self.offers = offers;
        self
    }

    /// Makes `service` (or `stock:<location>`) fail as unreachable.
    pub fn failing(mut self, service: &str) -> Self {
        self.failing.insert(service.to_string());
        self
    }

    /// Makes the stock query for `location` answer with an unusable payload.
    pub fn malformed_stock(mut self, location: &str) -> Self {
        self.malformed.insert(location.to_string());
        self
    }

    /// Makes an order-creation `service` reject its requests.
    pub fn rejecting(mut self, service: &str) -> Self {
        self.rejecting.insert(service.to_string());
        self
    }

    pub fn cancel_after(mut self, service: &str, token: CancellationToken) -> Self {
        self.cancel_after = Some((service.to_string(), token));
        self
    }

    pub fn calls(&self, service: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == service)
            .count()
    }

    fn record(&self, service: &str) -> Result<()> {
        self.calls.lock().unwrap().push(service.to_string());
        if let Some((trigger, token)) = &self.cancel_after {
            if trigger == service {
                token.cancel();
            }
        }
        if self.failing.contains(service) {
            return Err(ReplenishError::upstream(service, "connection refused"));
        }
        Ok(())
    }
}

pub fn offer(supplier: &str, price: f64, lead_time_days: u32) -> SupplierOffer {
    SupplierOffer {
        supplier_id: supplier.to_string(),
        unit_price: price,
        currency: "EUR".to_string(),
        lead_time_days,
    }
}

#[async_trait]
impl ForecastSource for FakeErp {
    async fn demand_lines(&self, _material: &str, _location: &str, _horizon: u32) -> Result<Vec<f64>> {
        self.record("forecast")?;
        Ok(self.demand.clone())
    }
}

#[async_trait]
impl StockSource for FakeErp {
    async fn on_hand(&self, _material: &str, location: &str) -> Result<f64> {
        self.record("stock")?;
        if self.failing.contains(&format!("stock:{}", location)) {
            return Err(ReplenishError::upstream("stock", "gateway timeout"));
        }
        if self.malformed.contains(location) {
            return Err(ReplenishError::malformed("stock", "missing d.results array"));
        }
        Ok(self.on_hand.get(location).copied().unwrap_or(0.0))
    }

    async fn incoming_receipts(&self, _material: &str, location: &str) -> Result<f64> {
        self.record("receipts")?;
        Ok(self.receipts.get(location).copied().unwrap_or(0.0))
    }
}

#[async_trait]
impl AvailabilityService for FakeErp {
    async fn confirm(
        &self,
        _material: &str,
        location: &str,
        quantity: f64,
        required_date: NaiveDate,
    ) -> Result<f64> {
        self.record("atp")?;
        self.atp_requests
            .lock()
            .unwrap()
            .push((location.to_string(), quantity, required_date));
        let limit = self.confirmable.get(location).copied().unwrap_or(0.0);
        Ok(quantity.min(limit))
    }
}

#[async_trait]
impl TransferOrderService for FakeErp {
    async fn create_transfer(&self, request: &TransferOrderRequest) -> Result<String> {
        self.record("transfer")?;
        if self.rejecting.contains("transfer") {
            return Err(ReplenishError::FulfillmentRejected {
                service: "transfer".to_string(),
                status: 400,
                message: "receiving plant blocked".to_string(),
            });
        }
        let mut transfers = self.transfers.lock().unwrap();
        transfers.push(request.clone());
        Ok(format!("STO-{}", 4500000000u64 + transfers.len() as u64))
    }
}

#[async_trait]
impl OfferCatalog for FakeErp {
    async fn offers(&self, _material: &str, quantity: f64, _currency: &str) -> Result<Vec<SupplierOffer>> {
        self.record("offers")?;
        self.offer_requests.lock().unwrap().push(quantity);
        Ok(self.offers.clone())
    }
}

#[async_trait]
impl RequisitionService for FakeErp {
    async fn create_requisition(&self, request: &PurchaseRequisitionRequest) -> Result<String> {
        self.record("requisition")?;
        if self.rejecting.contains("requisition") {
            return Err(ReplenishError::FulfillmentRejected {
                service: "requisition".to_string(),
                status: 422,
                message: "supplier not released".to_string(),
            });
        }
        let mut requisitions = self.requisitions.lock().unwrap();
        requisitions.push(request.clone());
        Ok(format!("PR-{}", 10000000u64 + requisitions.len() as u64))
    }
}
