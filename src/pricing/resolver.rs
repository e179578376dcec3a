// Rate Resolver
//
// Turns an optional (client, agent) pair into the rates the calculator
// needs. Missing records are a soft condition: the rate falls back and a
// warning is logged. Only malformed ids and store failures are errors.

use std::sync::Arc;

use crate::models::{Agent, Client, ConsultantLevelRecord, EntityId};
use crate::pricing::{
    cache::{CacheKey, CachedRecord, RateCache},
    error::PricingResult,
    types::{CommissionRates, ConsultantLevel, Percentage},
};
use crate::repository::{AgentRepository, ClientRepository, ConsultantLevelRepository};

/// Rates in effect for one request, before per-product category substitution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRates {
    /// The agent record, kept for per-category lookups without further I/O
    pub agent: Option<Agent>,
    pub agent_commission_rate: Percentage,
    pub consultant_level: ConsultantLevel,
    pub consultant_level_rate: Percentage,
    pub consultant_name: String,
    /// True when no agent-specific rate exists
    pub is_global_rate: bool,
}

impl ResolvedRates {
    /// Rate pair for a product category
    ///
    /// A category override replaces the agent's global rate. The flag is
    /// true when an override was applied.
    pub fn rates_for(&self, category: &str) -> (CommissionRates, bool) {
        let override_rate = self
            .agent
            .as_ref()
            .and_then(|agent| agent.category_rate(category));

        match override_rate {
            Some(rate) => (CommissionRates::new(rate, self.consultant_level_rate), true),
            None => (
                CommissionRates::new(self.agent_commission_rate, self.consultant_level_rate),
                false,
            ),
        }
    }
}

pub struct RateResolver {
    agents: Arc<dyn AgentRepository>,
    clients: Arc<dyn ClientRepository>,
    levels: Arc<dyn ConsultantLevelRepository>,
    cache: Arc<RateCache>,
    default_agent_rate: Percentage,
}

impl RateResolver {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        clients: Arc<dyn ClientRepository>,
        levels: Arc<dyn ConsultantLevelRepository>,
        cache: Arc<RateCache>,
    ) -> Self {
        Self {
            agents,
            clients,
            levels,
            cache,
            default_agent_rate: Percentage::ZERO,
        }
    }

    /// Platform-wide rate used when no agent applies
    pub fn with_default_agent_rate(mut self, rate: Percentage) -> Self {
        self.default_agent_rate = rate;
        self
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    /// Resolve the rates for an optional client and agent
    ///
    /// # Errors
    /// * `InvalidArgument` for a malformed id
    /// * `UpstreamUnavailable` when a store lookup fails
    pub async fn resolve(&self, client_id: Option<&str>, agent_id: Option<&str>) -> PricingResult<ResolvedRates> {
        let client_id = EntityId::parse_optional(client_id)?;
        let agent_id = EntityId::parse_optional(agent_id)?;
        self.resolve_ids(client_id.as_ref(), agent_id.as_ref()).await
    }

    /// Same as `resolve` for ids that are already validated
    pub async fn resolve_ids(
        &self,
        client_id: Option<&EntityId>,
        agent_id: Option<&EntityId>,
    ) -> PricingResult<ResolvedRates> {
        let agent = match agent_id {
            Some(id) => {
                let found = self.load_agent(id).await?;
                if found.is_none() {
                    tracing::warn!(agent_id = %id, "Agent not found, using default commission rate");
                }
                found
            }
            None => None,
        };

        let (agent_commission_rate, is_global_rate) = match agent {
            Some(ref agent) => (agent.commission_rate, false),
            None => (self.default_agent_rate, true),
        };

        let consultant_level = match client_id {
            Some(id) => match self.load_client(id).await? {
                Some(client) => client.consultant_level.unwrap_or_default(),
                None => {
                    tracing::warn!(client_id = %id, "Client not found, no consultant commission applied");
                    ConsultantLevel::None
                }
            },
            None => ConsultantLevel::None,
        };

        let (consultant_level_rate, consultant_name) = match self.load_level(consultant_level).await? {
            Some(record) => (record.rate, record.name),
            None => (
                consultant_level.default_rate(),
                consultant_level.display_name().to_string(),
            ),
        };

        tracing::debug!(
            agent_rate = %agent_commission_rate,
            consultant_rate = %consultant_level_rate,
            level = %consultant_level,
            is_global_rate,
            "Resolved commission rates"
        );

        Ok(ResolvedRates {
            agent,
            agent_commission_rate,
            consultant_level,
            consultant_level_rate,
            consultant_name,
            is_global_rate,
        })
    }

    async fn load_agent(&self, id: &EntityId) -> PricingResult<Option<Agent>> {
        if let Some(agent) = self.cache.get_agent(id).await {
            return Ok(Some(agent));
        }
        let found = self.agents.find_by_id(id).await?;
        if let Some(ref agent) = found {
            self.cache
                .set(CacheKey::Agent(id.clone()), CachedRecord::Agent(agent.clone()))
                .await;
        }
        Ok(found)
    }

    async fn load_client(&self, id: &EntityId) -> PricingResult<Option<Client>> {
        if let Some(client) = self.cache.get_client(id).await {
            return Ok(Some(client));
        }
        let found = self.clients.find_by_id(id).await?;
        if let Some(ref client) = found {
            self.cache
                .set(CacheKey::Client(id.clone()), CachedRecord::Client(client.clone()))
                .await;
        }
        Ok(found)
    }

    async fn load_level(&self, level: ConsultantLevel) -> PricingResult<Option<ConsultantLevelRecord>> {
        if let Some(record) = self.cache.get_level(level).await {
            return Ok(Some(record));
        }
        let found = self.levels.find_by_level(level).await?;
        if let Some(ref record) = found {
            self.cache
                .set(CacheKey::ConsultantLevel(level), CachedRecord::ConsultantLevel(record.clone()))
                .await;
        }
        Ok(found)
    }
}
