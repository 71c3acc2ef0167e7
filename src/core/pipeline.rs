use crate::core::cancel::CancellationToken;
use crate::core::external::ExternalSourcingPlanner;
use crate::core::forecast::ForecastReader;
use crate::core::fulfillment::FulfillmentExecutor;
use crate::core::internal::InternalSourcingPlanner;
use crate::core::position::SupplyPositionEvaluator;
use crate::domain::model::{ReplenishmentRequest, RunReport, RunState, RunStatus, Stage};
use crate::domain::ports::{
    AvailabilityService, ForecastSource, OfferCatalog, RequisitionService, StockSource,
    TransferOrderService,
};
use crate::utils::error::ReplenishError;
use std::sync::Arc;

/// The remote systems one run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub forecast: Arc<dyn ForecastSource>,
    pub stock: Arc<dyn StockSource>,
    pub availability: Arc<dyn AvailabilityService>,
    pub transfers: Arc<dyn TransferOrderService>,
    pub offers: Arc<dyn OfferCatalog>,
    pub requisitions: Arc<dyn RequisitionService>,
}

type StageResult<T> = std::result::Result<T, (Stage, ReplenishError)>;

trait AtStage<T> {
    fn at(self, stage: Stage) -> StageResult<T>;
}

impl<T> AtStage<T> for crate::utils::error::Result<T> {
    fn at(self, stage: Stage) -> StageResult<T> {
        self.map_err(|e| (stage, e))
    }
}

/// Forecast → position → internal sourcing → external sourcing → fulfillment.
///
/// Stages run strictly in order and never revisit an earlier state. A failure halts the
/// run; orders already issued are left in place.
pub struct ReplenishmentPipeline {
    forecast: ForecastReader,
    position: SupplyPositionEvaluator,
    internal: InternalSourcingPlanner,
    external: ExternalSourcingPlanner,
    fulfillment: FulfillmentExecutor,
}

impl ReplenishmentPipeline {
    pub fn new(collaborators: Collaborators, concurrent_peer_queries: bool) -> Self {
        Self {
            forecast: ForecastReader::new(collaborators.forecast),
            position: SupplyPositionEvaluator::new(collaborators.stock.clone()),
            internal: InternalSourcingPlanner::new(
                collaborators.stock,
                collaborators.availability,
                concurrent_peer_queries,
            ),
            external: ExternalSourcingPlanner::new(collaborators.offers),
            fulfillment: FulfillmentExecutor::new(
                collaborators.transfers,
                collaborators.requisitions,
            ),
        }
    }

    pub async fn run(
        &self,
        request: &ReplenishmentRequest,
        cancel: &CancellationToken,
    ) -> RunReport {
        let mut report = RunReport::new(request.clone());

        if let Err((stage, e)) = self.drive(request, cancel, &mut report).await {
            tracing::error!("❌ Replenishment failed at {} stage: {}", stage, e);
            report.fail(stage, &e);
        }

        report
    }

    async fn drive(
        &self,
        request: &ReplenishmentRequest,
        cancel: &CancellationToken,
        report: &mut RunReport,
    ) -> StageResult<()> {
        let material = request.material.as_str();
        let home = request.home_location.as_str();

        cancel.checkpoint(Stage::Forecast).at(Stage::Forecast)?;
        let forecast = self
            .forecast
            .fetch_demand(material, home, request.horizon_weeks)
            .await
            .at(Stage::Forecast)?;
        tracing::info!("📈 Demand forecast for {}@{}: {}", material, home, forecast.quantity);
        report.forecast = Some(forecast.clone());
        report.advance(RunState::ForecastFetched);

        cancel.checkpoint(Stage::SupplyPosition).at(Stage::SupplyPosition)?;
        let position = self
            .position
            .fetch_position(material, home)
            .await
            .at(Stage::SupplyPosition)?;
        let shortage = SupplyPositionEvaluator::compute_shortage(&forecast, &position);
        tracing::info!(
            "📦 Home {}: on hand {}, receipts {}, shortage {}",
            home,
            position.on_hand_quantity,
            position.incoming_receipt_quantity,
            shortage
        );
        report.home_position = Some(position);
        report.shortage = Some(shortage);
        report.advance(RunState::PositionEvaluated);

        if shortage.is_zero() {
            tracing::info!("✅ Demand covered, no action needed");
            report.status = RunStatus::NoAction;
            report.advance(RunState::NoActionNeeded);
            return Ok(());
        }
        report.advance(RunState::ShortageComputed);

        cancel.checkpoint(Stage::InternalSourcing).at(Stage::InternalSourcing)?;
        let required_by = request.internal_required_by().at(Stage::InternalSourcing)?;
        let plan = self
            .internal
            .plan(material, &request.peer_locations, shortage, required_by)
            .await
            .at(Stage::InternalSourcing)?;
        let residual = shortage.reduce_by(plan.allocated());
        report.surplus = plan.candidates;
        report.residual_shortage = Some(residual);
        match &plan.decision {
            Some(decision) => {
                tracing::info!(
                    "🏭 Internal source: {} units from {}",
                    decision.quantity,
                    decision.source_location
                );
                report.internal = Some(decision.clone());
                report.advance(RunState::InternalSourced);
            }
            None => tracing::info!("🏭 No peer could confirm surplus"),
        }

        if !residual.is_zero() {
            cancel.checkpoint(Stage::ExternalSourcing).at(Stage::ExternalSourcing)?;
            let decision = self
                .external
                .plan(material, residual, &request.currency, request.today)
                .await
                .at(Stage::ExternalSourcing)?;
            if let Some(decision) = decision {
                tracing::info!(
                    "🛒 Best supplier for {} units: {} at {} {}",
                    residual,
                    decision.offer.supplier_id,
                    decision.offer.unit_price,
                    decision.offer.currency
                );
                report.external = Some(decision);
                report.advance(RunState::ExternalPriced);
            }
        }

        cancel.checkpoint(Stage::Fulfillment).at(Stage::Fulfillment)?;
        if let Some(decision) = &plan.decision {
            let order_id = self
                .fulfillment
                .create_internal_transfer(material, home, decision)
                .await
                .at(Stage::Fulfillment)?;
            report.fulfillment.internal_order_id = Some(order_id);
        }
        if let Some(decision) = &report.external {
            let requisition_id = self
                .fulfillment
                .create_purchase_requisition(
                    material,
                    home,
                    decision,
                    residual.quantity(),
                    decision.delivery_date,
                )
                .await
                .at(Stage::Fulfillment)?;
            report.fulfillment.purchase_requisition_id = Some(requisition_id);
        }

        report.status = RunStatus::Success;
        report.advance(RunState::Fulfilled);
        Ok(())
    }
}
