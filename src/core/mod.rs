pub mod cancel;
pub mod engine;
pub mod external;
pub mod forecast;
pub mod fulfillment;
pub mod internal;
pub mod pipeline;
pub mod position;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{ReplenishmentRequest, RunReport, RunStatus};
pub use crate::domain::ports::{
    AvailabilityService, ForecastSource, OfferCatalog, RequisitionService, StockSource, Storage,
    TransferOrderService,
};
pub use crate::utils::error::Result;
