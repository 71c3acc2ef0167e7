use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::{ErrorKind, ReplenishError, Result};

/// Quantities below this are treated as zero when comparing floating point amounts.
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Everything one replenishment run needs to know up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentRequest {
    pub material: String,
    pub home_location: String,
    /// Peers are evaluated for surplus in exactly this order.
    pub peer_locations: Vec<String>,
    pub horizon_weeks: u32,
    pub transport_days: u32,
    pub currency: String,
    pub today: NaiveDate,
}

impl ReplenishmentRequest {
    /// Date by which an internal transfer must arrive at the home location.
    pub fn internal_required_by(&self) -> Result<NaiveDate> {
        self.today
            .checked_add_days(chrono::Days::new(u64::from(self.transport_days)))
            .ok_or_else(|| ReplenishError::InvalidConfigValueError {
                field: "run.transport_days".to_string(),
                value: self.transport_days.to_string(),
                reason: format!("no calendar date {} days after {}", self.transport_days, self.today),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub material: String,
    pub location: String,
    pub horizon_weeks: u32,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyPosition {
    pub location: String,
    pub on_hand_quantity: f64,
    pub incoming_receipt_quantity: f64,
}

impl SupplyPosition {
    pub fn total(&self) -> f64 {
        self.on_hand_quantity + self.incoming_receipt_quantity
    }
}

/// Uncovered demand at the home location. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shortage(f64);

impl Shortage {
    pub fn new(quantity: f64) -> Self {
        if quantity > QUANTITY_EPSILON {
            Self(quantity)
        } else {
            Self(0.0)
        }
    }

    pub fn quantity(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 <= QUANTITY_EPSILON
    }

    /// Remaining shortage after `allocated` has been covered elsewhere.
    pub fn reduce_by(self, allocated: f64) -> Self {
        Self::new(self.0 - allocated)
    }
}

impl fmt::Display for Shortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurplusCandidate {
    pub location: String,
    pub available_quantity: f64,
    pub confirmed_quantity: Option<f64>,
    pub required_by_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalSourcingDecision {
    pub source_location: String,
    pub quantity: f64,
    pub required_by_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierOffer {
    pub supplier_id: String,
    pub unit_price: f64,
    pub currency: String,
    pub lead_time_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSourcingDecision {
    pub offer: SupplierOffer,
    pub quantity: f64,
    pub delivery_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentResult {
    pub internal_order_id: Option<String>,
    pub purchase_requisition_id: Option<String>,
}

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Forecast,
    SupplyPosition,
    InternalSourcing,
    ExternalSourcing,
    Fulfillment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Forecast => "forecast",
            Stage::SupplyPosition => "supply-position",
            Stage::InternalSourcing => "internal-sourcing",
            Stage::ExternalSourcing => "external-sourcing",
            Stage::Fulfillment => "fulfillment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Start,
    ForecastFetched,
    PositionEvaluated,
    NoActionNeeded,
    ShortageComputed,
    InternalSourced,
    ExternalPriced,
    Fulfilled,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::NoActionNeeded | RunState::Fulfilled | RunState::Failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: Stage, error: &ReplenishError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    NoAction,
    Failed(StageFailure),
}

/// Structured outcome of one run: what was decided, what was created, and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub request: ReplenishmentRequest,
    pub state: RunState,
    pub trace: Vec<RunState>,
    pub forecast: Option<DemandForecast>,
    pub home_position: Option<SupplyPosition>,
    pub shortage: Option<Shortage>,
    pub surplus: Vec<SurplusCandidate>,
    pub internal: Option<InternalSourcingDecision>,
    pub residual_shortage: Option<Shortage>,
    pub external: Option<ExternalSourcingDecision>,
    pub fulfillment: FulfillmentResult,
    pub status: RunStatus,
}

impl RunReport {
    pub fn new(request: ReplenishmentRequest) -> Self {
        Self {
            request,
            state: RunState::Start,
            trace: vec![RunState::Start],
            forecast: None,
            home_position: None,
            shortage: None,
            surplus: Vec::new(),
            internal: None,
            residual_shortage: None,
            external: None,
            fulfillment: FulfillmentResult::default(),
            status: RunStatus::Success,
        }
    }

    /// Moves forward to `next`. States are only ever appended.
    pub fn advance(&mut self, next: RunState) {
        self.state = next;
        self.trace.push(next);
    }

    pub fn fail(&mut self, stage: Stage, error: &ReplenishError) {
        self.status = RunStatus::Failed(StageFailure::new(stage, error));
        self.advance(RunState::Failed);
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match &self.status {
            RunStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.status, RunStatus::Failed(_))
    }

    /// 0 for success and no-action, non-zero for any stage failure.
    pub fn exit_code(&self) -> i32 {
        match &self.status {
            RunStatus::Success | RunStatus::NoAction => 0,
            RunStatus::Failed(failure) => match failure.kind {
                ErrorKind::UpstreamUnavailable => 2,
                ErrorKind::Configuration | ErrorKind::Internal => 3,
                _ => 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortage_clamps_at_zero() {
        assert!(Shortage::new(-12.5).is_zero());
        assert_eq!(Shortage::new(-12.5).quantity(), 0.0);
        assert_eq!(Shortage::new(7.0).quantity(), 7.0);
        assert!(Shortage::new(30.0).reduce_by(45.0).is_zero());
    }

    #[test]
    fn test_internal_required_by_adds_transport_days() {
        let request = ReplenishmentRequest {
            material: "FG-100".to_string(),
            home_location: "A".to_string(),
            peer_locations: vec![],
            horizon_weeks: 4,
            transport_days: 2,
            currency: "EUR".to_string(),
            today: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        };
        assert_eq!(
            request.internal_required_by().unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_internal_required_by_out_of_calendar_is_config_error() {
        let request = ReplenishmentRequest {
            material: "FG-100".to_string(),
            home_location: "A".to_string(),
            peer_locations: vec![],
            horizon_weeks: 4,
            transport_days: u32::MAX,
            currency: "EUR".to_string(),
            today: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        };
        let err = request.internal_required_by().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_report_trace_only_moves_forward() {
        let request = ReplenishmentRequest {
            material: "FG-100".to_string(),
            home_location: "A".to_string(),
            peer_locations: vec![],
            horizon_weeks: 4,
            transport_days: 2,
            currency: "EUR".to_string(),
            today: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        };
        let mut report = RunReport::new(request);
        report.advance(RunState::ForecastFetched);
        report.fail(
            Stage::SupplyPosition,
            &ReplenishError::upstream("stock", "connection refused"),
        );

        assert_eq!(
            report.trace,
            vec![RunState::Start, RunState::ForecastFetched, RunState::Failed]
        );
        assert!(report.state.is_terminal());
        assert_eq!(report.failure().unwrap().stage, Stage::SupplyPosition);
        assert_eq!(report.exit_code(), 2);
    }
}
