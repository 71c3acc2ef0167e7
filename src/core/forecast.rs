use crate::domain::model::DemandForecast;
use crate::domain::ports::ForecastSource;
use crate::utils::error::{ReplenishError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number};
use std::sync::Arc;

/// Sums forecast line items into one demand figure.
pub struct ForecastReader {
    source: Arc<dyn ForecastSource>,
}

impl ForecastReader {
    pub fn new(source: Arc<dyn ForecastSource>) -> Self {
        Self { source }
    }

    pub async fn fetch_demand(
        &self,
        material: &str,
        location: &str,
        horizon_weeks: u32,
    ) -> Result<DemandForecast> {
        validate_non_empty_string("material", material).map_err(as_input_error)?;
        validate_non_empty_string("location", location).map_err(as_input_error)?;
        validate_positive_number("horizon_weeks", horizon_weeks as usize, 1)
            .map_err(as_input_error)?;

        let lines = self
            .source
            .demand_lines(material, location, horizon_weeks)
            .await?;
        let quantity: f64 = lines.iter().sum();

        if !quantity.is_finite() || quantity < 0.0 {
            return Err(ReplenishError::malformed(
                "demand forecast",
                format!("total demand {} is not a non-negative quantity", quantity),
            ));
        }

        tracing::debug!(
            "📈 {} line items for {}@{} over {} weeks",
            lines.len(),
            material,
            location,
            horizon_weeks
        );

        Ok(DemandForecast {
            material: material.to_string(),
            location: location.to_string(),
            horizon_weeks,
            quantity,
        })
    }
}

fn as_input_error(e: ReplenishError) -> ReplenishError {
    ReplenishError::ValidationError {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::FakeErp;
    use crate::utils::error::ErrorKind;

    #[tokio::test]
    async fn test_sums_line_items() {
        let erp = Arc::new(FakeErp::new().with_demand(vec![40.0, 25.5, 14.5]));
        let reader = ForecastReader::new(erp);

        let forecast = reader.fetch_demand("FG-100", "A", 4).await.unwrap();

        assert_eq!(forecast.quantity, 80.0);
        assert_eq!(forecast.material, "FG-100");
        assert_eq!(forecast.location, "A");
        assert_eq!(forecast.horizon_weeks, 4);
    }

    #[tokio::test]
    async fn test_empty_forecast_is_zero_demand() {
        let reader = ForecastReader::new(Arc::new(FakeErp::new()));
        let forecast = reader.fetch_demand("FG-100", "A", 4).await.unwrap();
        assert_eq!(forecast.quantity, 0.0);
    }

    #[tokio::test]
    async fn test_rejects_bad_input_without_calling_source() {
        let erp = Arc::new(FakeErp::new().with_demand(vec![10.0]));
        let reader = ForecastReader::new(erp.clone());

        let err = reader.fetch_demand("", "A", 4).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = reader.fetch_demand("FG-100", "A", 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert_eq!(erp.calls("forecast"), 0);
    }

    #[tokio::test]
    async fn test_negative_total_is_malformed() {
        let erp = Arc::new(FakeErp::new().with_demand(vec![10.0, -25.0]));
        let reader = ForecastReader::new(erp);

        let err = reader.fetch_demand("FG-100", "A", 4).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let erp = Arc::new(FakeErp::new().with_demand(vec![12.0, 8.0]));
        let reader = ForecastReader::new(erp);

        let first = reader.fetch_demand("FG-100", "A", 4).await.unwrap();
        let second = reader.fetch_demand("FG-100", "A", 4).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unreachable_source_propagates() {
        let erp = Arc::new(FakeErp::new().failing("forecast"));
        let reader = ForecastReader::new(erp);

        let err = reader.fetch_demand("FG-100", "A", 4).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }
}
