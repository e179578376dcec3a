use std::sync::Arc;
use validator::Validate;

use crate::accounts::{UpdateCommissionRequest, UpdateConsultantLevelRequest};
use crate::models::{Agent, Client, EntityId};
use crate::pricing::{CacheKey, PricingError, PricingResult, RateCache};
use crate::repository::{AgentRepository, ClientRepository};

/// Commission settings for agents and consultant tiers for clients
///
/// Every successful change drops the matching RateCache entry so the next
/// resolution reads the new value. Prices already attached to carts,
/// wishlists and orders are not touched.
#[derive(Clone)]
pub struct AccountService {
    agents: Arc<dyn AgentRepository>,
    clients: Arc<dyn ClientRepository>,
    cache: Arc<RateCache>,
}

impl AccountService {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        clients: Arc<dyn ClientRepository>,
        cache: Arc<RateCache>,
    ) -> Self {
        Self {
            agents,
            clients,
            cache,
        }
    }

    /// Update an agent's global rate and, when given, its category overrides
    ///
    /// # Errors
    /// * `InvalidArgument` for a malformed id or a rate outside 0 to 100
    /// * `NotFound` when the agent does not exist
    pub async fn update_commission(
        &self,
        agent_id: &str,
        request: UpdateCommissionRequest,
    ) -> PricingResult<Agent> {
        let agent_id = EntityId::parse(agent_id)?;
        request
            .validate()
            .map_err(|e| PricingError::invalid(format!("Commission rates must be between 0 and 100: {}", e)))?;

        let mut agent = self
            .agents
            .find_by_id(&agent_id)
            .await?
            .ok_or_else(|| PricingError::not_found("Agent", &agent_id))?;

        agent.commission_rate = request.commission_rate;
        if let Some(overrides) = request.category_commissions {
            agent.category_commissions = overrides;
        }

        self.agents.save(&agent).await?;
        self.cache.invalidate(&CacheKey::Agent(agent_id.clone())).await;

        tracing::info!(
            agent_id = %agent_id,
            commission_rate = %agent.commission_rate,
            overrides = agent.category_commissions.len(),
            "Agent commission updated"
        );
        Ok(agent)
    }

    pub async fn update_consultant_level(
        &self,
        client_id: &str,
        request: UpdateConsultantLevelRequest,
    ) -> PricingResult<Client> {
        let client_id = EntityId::parse(client_id)?;

        let mut client = self
            .clients
            .find_by_id(&client_id)
            .await?
            .ok_or_else(|| PricingError::not_found("Client", &client_id))?;

        client.consultant_level = request.consultant_level;
        self.clients.save(&client).await?;
        self.cache.invalidate(&CacheKey::Client(client_id.clone())).await;

        tracing::info!(
            client_id = %client_id,
            level = %client.consultant_level.unwrap_or_default(),
            "Client consultant level updated"
        );
        Ok(client)
    }
}
