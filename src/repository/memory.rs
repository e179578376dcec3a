// In-process document store
//
// Backs the `memory` storage backend and the HTTP tests. Collections live in
// tokio RwLock maps; `set_unavailable` makes every call fail as if the
// database were unreachable.

use axum::async_trait;
use serde::Deserialize;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cart::{Cart, Wishlist};
use crate::models::{Agent, Client, ConsultantLevelRecord, EntityId, Product};
use crate::orders::{NewOrder, Order, OrderStatus, StatusMachine};
use crate::pricing::ConsultantLevel;
use crate::query::{PageRequest, ProductFilter, SortField, SortOrder};
use crate::repository::{
    AgentRepository, CartRepository, ClientRepository, ConsultantLevelRepository, OrderRepository,
    Page, ProductRepository, RepoResult, RepositoryError, StatusUpdate, WishlistRepository,
};

/// Reference data accepted by `MemoryStore::from_seed`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub consultant_levels: Vec<ConsultantLevelRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<BTreeMap<EntityId, Product>>,
    agents: RwLock<HashMap<EntityId, Agent>>,
    clients: RwLock<HashMap<EntityId, Client>>,
    consultant_levels: RwLock<HashMap<ConsultantLevel, ConsultantLevelRecord>>,
    carts: RwLock<HashMap<EntityId, Cart>>,
    wishlists: RwLock<HashMap<EntityId, Wishlist>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        Self {
            products: RwLock::new(seed.products.into_iter().map(|p| (p.id.clone(), p)).collect()),
            agents: RwLock::new(seed.agents.into_iter().map(|a| (a.id.clone(), a)).collect()),
            clients: RwLock::new(seed.clients.into_iter().map(|c| (c.id.clone(), c)).collect()),
            consultant_levels: RwLock::new(
                seed.consultant_levels.into_iter().map(|r| (r.level, r)).collect(),
            ),
            ..Self::default()
        }
    }

    /// Parse a JSON seed document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let seed: SeedData = serde_json::from_str(json)?;
        Ok(Self::from_seed(seed))
    }

    /// Simulate an unreachable store
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn insert_product(&self, product: Product) {
        self.products.write().await.insert(product.id.clone(), product);
    }

    pub async fn insert_agent(&self, agent: Agent) {
        self.agents.write().await.insert(agent.id.clone(), agent);
    }

    pub async fn insert_client(&self, client: Client) {
        self.clients.write().await.insert(client.id.clone(), client);
    }

    pub async fn insert_consultant_level(&self, record: ConsultantLevelRecord) {
        self.consultant_levels.write().await.insert(record.level, record);
    }

    pub async fn remove_product(&self, id: &EntityId) -> Option<Product> {
        self.products.write().await.remove(id)
    }
}

fn compare_products(a: &Product, b: &Product, field: SortField) -> CmpOrdering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        // non-numeric prices sort last, like NULLs in Postgres
        SortField::Price => match (a.base_price.is_nan(), b.base_price.is_nan()) {
            (true, true) => CmpOrdering::Equal,
            (true, false) => CmpOrdering::Greater,
            (false, true) => CmpOrdering::Less,
            (false, false) => a.base_price.total_cmp(&b.base_price),
        },
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Product>> {
        self.check_available()?;
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn find_many(&self, filter: &ProductFilter, page: &PageRequest) -> RepoResult<Page<Product>> {
        self.check_available()?;
        let products = self.products.read().await;

        let mut matching: Vec<&Product> = products.values().filter(|p| filter.matches(p)).collect();
        if let Some(field) = filter.sort_field {
            // stable sort keeps id order for ties
            matching.sort_by(|a, b| {
                let ordering = compare_products(a, b, field);
                match filter.sort_order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .cloned()
            .collect();

        Ok(Page { items, total })
    }
}

#[async_trait]
impl AgentRepository for MemoryStore {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Agent>> {
        self.check_available()?;
        Ok(self.agents.read().await.get(id).cloned())
    }

    async fn save(&self, agent: &Agent) -> RepoResult<()> {
        self.check_available()?;
        self.agents.write().await.insert(agent.id.clone(), agent.clone());
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for MemoryStore {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Client>> {
        self.check_available()?;
        Ok(self.clients.read().await.get(id).cloned())
    }

    async fn save(&self, client: &Client) -> RepoResult<()> {
        self.check_available()?;
        self.clients.write().await.insert(client.id.clone(), client.clone());
        Ok(())
    }
}

#[async_trait]
impl ConsultantLevelRepository for MemoryStore {
    async fn find_by_level(&self, level: ConsultantLevel) -> RepoResult<Option<ConsultantLevelRecord>> {
        self.check_available()?;
        Ok(self.consultant_levels.read().await.get(&level).cloned())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Option<Cart>> {
        self.check_available()?;
        Ok(self.carts.read().await.get(client_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        self.check_available()?;
        self.carts.write().await.insert(cart.client_id.clone(), cart.clone());
        Ok(())
    }
}

#[async_trait]
impl WishlistRepository for MemoryStore {
    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Option<Wishlist>> {
        self.check_available()?;
        Ok(self.wishlists.read().await.get(client_id).cloned())
    }

    async fn save(&self, wishlist: &Wishlist) -> RepoResult<()> {
        self.check_available()?;
        self.wishlists
            .write()
            .await
            .insert(wishlist.client_id.clone(), wishlist.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create(&self, new_order: NewOrder) -> RepoResult<Order> {
        self.check_available()?;
        let order = Order::from_new(new_order, chrono::Utc::now());
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Order>> {
        self.check_available()?;
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Vec<Order>> {
        self.check_available()?;
        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders
            .values()
            .filter(|order| &order.client_id == client_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update_status(&self, id: Uuid, to: OrderStatus) -> RepoResult<StatusUpdate> {
        self.check_available()?;
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(&id) else {
            return Ok(StatusUpdate::NotFound);
        };

        if !StatusMachine::is_valid_transition(order.status, to) {
            return Ok(StatusUpdate::Rejected { current: order.status });
        }
        if order.status != to {
            order.status = to;
            order.updated_at = chrono::Utc::now();
        }
        Ok(StatusUpdate::Updated(order.clone()))
    }
}
