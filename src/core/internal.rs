use crate::domain::model::{
    InternalSourcingDecision, Shortage, SurplusCandidate, QUANTITY_EPSILON,
};
use crate::domain::ports::{AvailabilityService, StockSource};
use crate::utils::error::{ErrorKind, Result};
use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct InternalPlan {
    pub candidates: Vec<SurplusCandidate>,
    pub decision: Option<InternalSourcingDecision>,
}

impl InternalPlan {
    pub fn allocated(&self) -> f64 {
        self.decision.as_ref().map(|d| d.quantity).unwrap_or(0.0)
    }
}

/// Looks for surplus at peer locations and picks a transfer source.
///
/// Selection is first-fit in peer order: the first peer whose ATP check confirms
/// `min(surplus, remaining shortage)` is taken and the search stops. A later peer with
/// more stock is never considered once an earlier one confirms. This keeps the number of
/// ATP calls low; it does not look for the best source.
pub struct InternalSourcingPlanner {
    stock: Arc<dyn StockSource>,
    availability: Arc<dyn AvailabilityService>,
    concurrent_queries: bool,
}

impl InternalSourcingPlanner {
    pub fn new(
        stock: Arc<dyn StockSource>,
        availability: Arc<dyn AvailabilityService>,
        concurrent_queries: bool,
    ) -> Self {
        Self {
            stock,
            availability,
            concurrent_queries,
        }
    }

    /// One surplus query per peer. Results keep the order of `peers` even when the
    /// queries run concurrently. An unreachable peer counts as zero surplus.
    pub async fn list_surplus(
        &self,
        material: &str,
        peers: &[String],
        required_by_date: NaiveDate,
    ) -> Result<Vec<SurplusCandidate>> {
        let results = if self.concurrent_queries {
            join_all(peers.iter().map(|peer| self.stock.on_hand(material, peer))).await
        } else {
            let mut results = Vec::with_capacity(peers.len());
            for peer in peers {
                results.push(self.stock.on_hand(material, peer).await);
            }
            results
        };

        let mut candidates = Vec::with_capacity(peers.len());
        for (peer, result) in peers.iter().zip(results) {
            let available_quantity = match result {
                Ok(quantity) if quantity.is_finite() => quantity.max(0.0),
                Ok(quantity) => {
                    tracing::warn!("⚠️ Peer {} reported {} surplus, ignoring", peer, quantity);
                    0.0
                }
                Err(e) if e.kind() == ErrorKind::UpstreamUnavailable => {
                    tracing::warn!("⚠️ Surplus query for peer {} failed, assuming none: {}", peer, e);
                    0.0
                }
                Err(e) => return Err(e),
            };
            candidates.push(SurplusCandidate {
                location: peer.clone(),
                available_quantity,
                confirmed_quantity: None,
                required_by_date,
            });
        }

        Ok(candidates)
    }

    /// Runs the ATP check for `quantity` and records what was confirmed on the candidate.
    pub async fn confirm_availability(
        &self,
        material: &str,
        candidate: &mut SurplusCandidate,
        quantity: f64,
    ) -> Result<bool> {
        let confirmed = self
            .availability
            .confirm(material, &candidate.location, quantity, candidate.required_by_date)
            .await?;
        candidate.confirmed_quantity = Some(confirmed);
        Ok(confirmed + QUANTITY_EPSILON >= quantity)
    }

    /// First-fit selection over `candidates` in their current order.
    pub async fn select(
        &self,
        material: &str,
        candidates: &mut [SurplusCandidate],
        shortage: Shortage,
    ) -> Result<Option<InternalSourcingDecision>> {
        for candidate in candidates.iter_mut() {
            let take = candidate.available_quantity.min(shortage.quantity());
            if take <= QUANTITY_EPSILON {
                tracing::debug!("🏭 Peer {} has no surplus, skipping", candidate.location);
                continue;
            }

            if self.confirm_availability(material, candidate, take).await? {
                tracing::info!("🏭 Peer {} confirmed {} units", candidate.location, take);
                return Ok(Some(InternalSourcingDecision {
                    source_location: candidate.location.clone(),
                    quantity: take,
                    required_by_date: candidate.required_by_date,
                }));
            }

            tracing::debug!(
                "🏭 Peer {} could not confirm {} (confirmed {:?})",
                candidate.location,
                take,
                candidate.confirmed_quantity
            );
        }

        Ok(None)
    }

    pub async fn plan(
        &self,
        material: &str,
        peers: &[String],
        shortage: Shortage,
        required_by_date: NaiveDate,
    ) -> Result<InternalPlan> {
        let mut candidates = self.list_surplus(material, peers, required_by_date).await?;
        let decision = self.select(material, &mut candidates, shortage).await?;
        Ok(InternalPlan {
            candidates,
            decision,
        })
    }
}
