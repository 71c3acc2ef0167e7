use crate::adapters::auth::Credential;
use crate::adapters::{format_quantity, parse_identifier, parse_quantity, read_json, send_error};
use crate::domain::ports::{
    AvailabilityService, ForecastSource, PurchaseRequisitionRequest, RequisitionService,
    StockSource, TransferOrderRequest, TransferOrderService,
};
use crate::utils::error::{ReplenishError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{json, Value};

const ODATA_ROOT: &str = "sap/opu/odata/sap";
const DEMAND_FORECAST: &str = "API_DEMAND_PLANNING_SRV/DemandForecast";
const MATERIAL_STOCK: &str = "API_MATERIAL_STOCK_SRV/MaterialStock";
const MRP_ITEMS: &str = "API_MRP_COCKPIT_SRV/MrpItems";
const ATP_CHECK: &str = "API_ATP_CHECK_SRV/CheckAvailability";
const STOCK_TRANSPORT_ORDER: &str = "API_STOCK_TRANSPORT_ORDER_SRV/A_StockTransportOrder";
const PURCHASE_REQUISITION: &str = "API_PURCHASEREQ_PROCESS_SRV/A_PurchaseRequisitionHeader";

/// Incoming receipts in MRP ("AR" element category).
const RECEIPT_CATEGORY: &str = "AR";

/// ERP OData services: forecast, stock, MRP, ATP, transfer orders and requisitions.
#[derive(Debug, Clone)]
pub struct ErpClient {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl ErpClient {
    pub fn new(client: Client, base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credential,
        }
    }

    fn url(&self, service_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            ODATA_ROOT,
            service_path
        )
    }

    /// GET an entity set and return `d.results`.
    async fn query(&self, service: &str, path: &str, filter: String, select: Option<&str>) -> Result<Vec<Value>> {
        let mut request = self
            .client
            .get(self.url(path))
            .bearer_auth(self.credential.token())
            .query(&[("$filter", filter.as_str()), ("$format", "json")]);
        if let Some(select) = select {
            request = request.query(&[("$select", select)]);
        }

        tracing::debug!("📡 {}: GET {} ({})", service, path, filter);
        let response = request.send().await.map_err(|e| send_error(service, e))?;
        let body = read_json(service, response, false).await?;

        match body.pointer("/d/results") {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Err(ReplenishError::malformed(service, "missing d.results array")),
        }
    }

    /// POST an entity and return the `d` object.
    async fn create(&self, service: &str, path: &str, body: Value, rejectable: bool) -> Result<Value> {
        tracing::debug!("📡 {}: POST {}", service, path);
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(self.credential.token())
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(service, e))?;
        let body = read_json(service, response, rejectable).await?;

        match body.get("d") {
            Some(d @ Value::Object(_)) => Ok(d.clone()),
            _ => Err(ReplenishError::malformed(service, "missing d object")),
        }
    }
}

/// Sums `field` across OData result items; every item must carry it.
fn sum_field(service: &str, items: &[Value], field: &str) -> Result<f64> {
    items.iter().try_fold(0.0, |total, item| {
        item.get(field)
            .and_then(parse_quantity)
            .map(|quantity| total + quantity)
            .ok_or_else(|| ReplenishError::malformed(service, format!("item without numeric {}", field)))
    })
}

fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn material_plant_filter(material: &str, location: &str) -> String {
    format!(
        "Material eq {} and Plant eq {}",
        odata_literal(material),
        odata_literal(location)
    )
}

#[async_trait]
impl ForecastSource for ErpClient {
    async fn demand_lines(&self, material: &str, location: &str, horizon_weeks: u32) -> Result<Vec<f64>> {
        let filter = format!(
            "{} and HorizonWeeks le {}",
            material_plant_filter(material, location),
            horizon_weeks
        );
        let items = self
            .query("demand forecast", DEMAND_FORECAST, filter, Some("DemandQuantity"))
            .await?;

        items
            .iter()
            .map(|item| {
                item.get("DemandQuantity").and_then(parse_quantity).ok_or_else(|| {
                    ReplenishError::malformed("demand forecast", "item without numeric DemandQuantity")
                })
            })
            .collect()
    }
}

#[async_trait]
impl StockSource for ErpClient {
    async fn on_hand(&self, material: &str, location: &str) -> Result<f64> {
        let filter = format!(
            "{} and StorageLocation ne ''",
            material_plant_filter(material, location)
        );
        let items = self.query("material stock", MATERIAL_STOCK, filter, None).await?;
        sum_field("material stock", &items, "UnrestrictedStockQuantity")
    }

    async fn incoming_receipts(&self, material: &str, location: &str) -> Result<f64> {
        let filter = format!(
            "{} and MrpElementCategory eq {}",
            material_plant_filter(material, location),
            odata_literal(RECEIPT_CATEGORY)
        );
        let items = self.query("MRP receipts", MRP_ITEMS, filter, None).await?;
        sum_field("MRP receipts", &items, "Quantity")
    }
}

#[async_trait]
impl AvailabilityService for ErpClient {
    async fn confirm(
        &self,
        material: &str,
        location: &str,
        quantity: f64,
        required_date: NaiveDate,
    ) -> Result<f64> {
        let body = json!({
            "Material": material,
            "Plant": location,
            "DemandQuantity": format_quantity(quantity),
            "RequiredDate": required_date.to_string(),
        });
        let d = self.create("ATP check", ATP_CHECK, body, false).await?;

        d.get("ConfirmedQuantity")
            .and_then(parse_quantity)
            .ok_or_else(|| ReplenishError::malformed("ATP check", "missing ConfirmedQuantity"))
    }
}

#[async_trait]
impl TransferOrderService for ErpClient {
    async fn create_transfer(&self, request: &TransferOrderRequest) -> Result<String> {
        let body = json!({
            "SupplyingPlant": request.supplying_location,
            "ReceivingPlant": request.receiving_location,
            "Material": request.material,
            "OrderQuantity": format_quantity(request.quantity),
            "DeliveryDate": request.delivery_date.to_string(),
        });
        let d = self
            .create("stock transport order", STOCK_TRANSPORT_ORDER, body, true)
            .await?;

        d.get("StockTransportOrder")
            .and_then(parse_identifier)
            .ok_or_else(|| {
                ReplenishError::malformed("stock transport order", "missing StockTransportOrder")
            })
    }
}

#[async_trait]
impl RequisitionService for ErpClient {
    async fn create_requisition(&self, request: &PurchaseRequisitionRequest) -> Result<String> {
        let body = json!({
            "Material": request.material,
            "Plant": request.location,
            "Quantity": format_quantity(request.quantity),
            "DeliveryDate": request.delivery_date.to_string(),
            "SupplierHint": request.supplier_hint,
        });
        let d = self
            .create("purchase requisition", PURCHASE_REQUISITION, body, true)
            .await?;

        d.get("PurchaseRequisition")
            .and_then(parse_identifier)
            .ok_or_else(|| {
                ReplenishError::malformed("purchase requisition", "missing PurchaseRequisition")
            })
    }
}
