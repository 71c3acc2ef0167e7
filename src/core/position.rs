use crate::domain::model::{DemandForecast, Shortage, SupplyPosition};
use crate::domain::ports::StockSource;
use crate::utils::error::{ReplenishError, Result};
use std::sync::Arc;

/// Reads stock and incoming receipts for a location and derives the home shortage.
pub struct SupplyPositionEvaluator {
    stock: Arc<dyn StockSource>,
}

impl SupplyPositionEvaluator {
    pub fn new(stock: Arc<dyn StockSource>) -> Self {
        Self { stock }
    }

    pub async fn fetch_position(&self, material: &str, location: &str) -> Result<SupplyPosition> {
        let on_hand_quantity = self.stock.on_hand(material, location).await?;
        let incoming_receipt_quantity = self.stock.incoming_receipts(material, location).await?;

        for (field, value) in [
            ("on-hand", on_hand_quantity),
            ("incoming receipts", incoming_receipt_quantity),
        ] {
            if !value.is_finite() {
                return Err(ReplenishError::malformed(
                    "stock",
                    format!("{} quantity for {} is {}", field, location, value),
                ));
            }
        }

        Ok(SupplyPosition {
            location: location.to_string(),
            on_hand_quantity,
            incoming_receipt_quantity,
        })
    }

    /// `max(0, demand - on hand - receipts)`.
    pub fn compute_shortage(demand: &DemandForecast, home: &SupplyPosition) -> Shortage {
        Shortage::new(demand.quantity - home.on_hand_quantity - home.incoming_receipt_quantity)
    }
}
