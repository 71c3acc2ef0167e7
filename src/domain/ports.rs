use crate::domain::model::SupplierOffer;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Demand planning system.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Demand quantity line items for the material at the location within the horizon.
    async fn demand_lines(
        &self,
        material: &str,
        location: &str,
        horizon_weeks: u32,
    ) -> Result<Vec<f64>>;
}

/// Inventory and MRP view of a location.
#[async_trait]
pub trait StockSource: Send + Sync {
    async fn on_hand(&self, material: &str, location: &str) -> Result<f64>;
    async fn incoming_receipts(&self, material: &str, location: &str) -> Result<f64>;
}

/// Available-to-promise check.
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    /// Quantity the location can confirm for `required_date`; may be partial or zero.
    async fn confirm(
        &self,
        material: &str,
        location: &str,
        quantity: f64,
        required_date: NaiveDate,
    ) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOrderRequest {
    pub supplying_location: String,
    pub receiving_location: String,
    pub material: String,
    pub quantity: f64,
    pub delivery_date: NaiveDate,
}

#[async_trait]
pub trait TransferOrderService: Send + Sync {
    /// Creates a stock transfer order and returns its identifier. Not idempotent.
    async fn create_transfer(&self, request: &TransferOrderRequest) -> Result<String>;
}

/// External supplier marketplace.
#[async_trait]
pub trait OfferCatalog: Send + Sync {
    async fn offers(
        &self,
        material: &str,
        quantity: f64,
        currency: &str,
    ) -> Result<Vec<SupplierOffer>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRequisitionRequest {
    pub material: String,
    pub location: String,
    pub quantity: f64,
    pub delivery_date: NaiveDate,
    pub supplier_hint: String,
}

#[async_trait]
pub trait RequisitionService: Send + Sync {
    /// Creates a purchase requisition and returns its identifier. Not idempotent.
    async fn create_requisition(&self, request: &PurchaseRequisitionRequest) -> Result<String>;
}
