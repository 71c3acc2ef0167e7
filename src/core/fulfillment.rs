use crate::domain::model::{ExternalSourcingDecision, InternalSourcingDecision};
use crate::domain::ports::{
    PurchaseRequisitionRequest, RequisitionService, TransferOrderRequest, TransferOrderService,
};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;

/// Issues transfer orders and purchase requisitions.
///
/// Neither call carries a deduplication token: calling either twice creates two orders.
pub struct FulfillmentExecutor {
    transfers: Arc<dyn TransferOrderService>,
    requisitions: Arc<dyn RequisitionService>,
}

impl FulfillmentExecutor {
    pub fn new(
        transfers: Arc<dyn TransferOrderService>,
        requisitions: Arc<dyn RequisitionService>,
    ) -> Self {
        Self {
            transfers,
            requisitions,
        }
    }

    pub async fn create_internal_transfer(
        &self,
        material: &str,
        receiving_location: &str,
        decision: &InternalSourcingDecision,
    ) -> Result<String> {
        let request = TransferOrderRequest {
            supplying_location: decision.source_location.clone(),
            receiving_location: receiving_location.to_string(),
            material: material.to_string(),
            quantity: decision.quantity,
            delivery_date: decision.required_by_date,
        };
        let order_id = self.transfers.create_transfer(&request).await?;
        tracing::info!(
            "🚚 Transfer order {} created: {} from {} to {}",
            order_id,
            request.quantity,
            request.supplying_location,
            request.receiving_location
        );
        Ok(order_id)
    }

    pub async fn create_purchase_requisition(
        &self,
        material: &str,
        location: &str,
        decision: &ExternalSourcingDecision,
        residual_quantity: f64,
        required_by_date: NaiveDate,
    ) -> Result<String> {
        let request = PurchaseRequisitionRequest {
            material: material.to_string(),
            location: location.to_string(),
            quantity: residual_quantity,
            delivery_date: required_by_date,
            supplier_hint: decision.offer.supplier_id.clone(),
        };
        let requisition_id = self.requisitions.create_requisition(&request).await?;
        tracing::info!(
            "🧾 Purchase requisition {} created: {} via supplier {}",
            requisition_id,
            request.quantity,
            request.supplier_hint
        );
        Ok(requisition_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{offer, FakeErp};
    use crate::utils::error::ErrorKind;

    fn internal() -> InternalSourcingDecision {
        InternalSourcingDecision {
            source_location: "B".to_string(),
            quantity: 30.0,
            required_by_date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
        }
    }

    fn external() -> ExternalSourcingDecision {
        ExternalSourcingDecision {
            offer: offer("SUP-7", 9.9, 14),
            quantity: 50.0,
            delivery_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_transfer_request_carries_decision() {
        let erp = Arc::new(FakeErp::new());
        let executor = FulfillmentExecutor::new(erp.clone(), erp.clone());

        let id = executor
            .create_internal_transfer("FG-100", "A", &internal())
            .await
            .unwrap();

        assert!(id.starts_with("STO-"));
        let transfers = erp.transfers.lock().unwrap();
        assert_eq!(transfers[0].supplying_location, "B");
        assert_eq!(transfers[0].receiving_location, "A");
        assert_eq!(transfers[0].quantity, 30.0);
    }

    #[tokio::test]
    async fn test_requisition_uses_residual_and_supplier_hint() {
        let erp = Arc::new(FakeErp::new());
        let executor = FulfillmentExecutor::new(erp.clone(), erp.clone());
        let decision = external();

        executor
            .create_purchase_requisition("FG-100", "A", &decision, 50.0, decision.delivery_date)
            .await
            .unwrap();

        let requisitions = erp.requisitions.lock().unwrap();
        assert_eq!(requisitions[0].quantity, 50.0);
        assert_eq!(requisitions[0].supplier_hint, "SUP-7");
        assert_eq!(requisitions[0].delivery_date, decision.delivery_date);
    }

    // Order creation is not idempotent: a repeated call is a second order.
    #[tokio::test]
    async fn test_repeated_calls_create_distinct_orders() {
        let erp = Arc::new(FakeErp::new());
        let executor = FulfillmentExecutor::new(erp.clone(), erp.clone());
        let decision = external();

        let first = executor
            .create_internal_transfer("FG-100", "A", &internal())
            .await
            .unwrap();
        let second = executor
            .create_internal_transfer("FG-100", "A", &internal())
            .await
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(erp.transfers.lock().unwrap().len(), 2);

        let pr1 = executor
            .create_purchase_requisition("FG-100", "A", &decision, 50.0, decision.delivery_date)
            .await
            .unwrap();
        let pr2 = executor
            .create_purchase_requisition("FG-100", "A", &decision, 50.0, decision.delivery_date)
            .await
            .unwrap();
        assert_ne!(pr1, pr2);
        assert_eq!(erp.requisitions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejection_is_reported_not_retried() {
        let erp = Arc::new(FakeErp::new().rejecting("requisition"));
        let executor = FulfillmentExecutor::new(erp.clone(), erp.clone());
        let decision = external();

        let err = executor
            .create_purchase_requisition("FG-100", "A", &decision, 50.0, decision.delivery_date)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FulfillmentRejected);
        assert_eq!(erp.calls("requisition"), 1);
    }
}
