// Persistence collaborators
//
// The pricing core only sees these traits. Two backends implement them:
// JSONB document tables in PostgreSQL and an in-process store.

pub mod memory;
pub mod postgres;

use axum::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::cart::{Cart, Wishlist};
use crate::models::{Agent, Client, ConsultantLevelRecord, EntityId, Product};
use crate::orders::{NewOrder, Order, OrderStatus};
use crate::pricing::ConsultantLevel;
use crate::query::{PageRequest, ProductFilter};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Storage failures; every variant is an upstream problem for the caller
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// One page of results plus the total match count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Product>>;
    async fn find_many(&self, filter: &ProductFilter, page: &PageRequest) -> RepoResult<Page<Product>>;
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Agent>>;
    async fn save(&self, agent: &Agent) -> RepoResult<()>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Client>>;
    async fn save(&self, client: &Client) -> RepoResult<()>;
}

#[async_trait]
pub trait ConsultantLevelRepository: Send + Sync {
    /// Stored record for a tier; `None` means the fixed table applies
    async fn find_by_level(&self, level: ConsultantLevel) -> RepoResult<Option<ConsultantLevelRecord>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Option<Cart>>;
    async fn save(&self, cart: &Cart) -> RepoResult<()>;
}

#[async_trait]
pub trait WishlistRepository: Send + Sync {
    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Option<Wishlist>>;
    async fn save(&self, wishlist: &Wishlist) -> RepoResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Store a new pending order and return it with its id and number
    async fn create(&self, new_order: NewOrder) -> RepoResult<Order>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Order>>;
    /// Newest first
    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Vec<Order>>;
    /// Move an order to `to` if the status machine allows it
    ///
    /// The current status is read and written under one row lock.
    async fn update_status(&self, id: Uuid, to: OrderStatus) -> RepoResult<StatusUpdate>;
}

/// Outcome of a status change
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Updated(Order),
    NotFound,
    Rejected { current: OrderStatus },
}

/// Every repository the services need, behind trait objects
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub agents: Arc<dyn AgentRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub consultant_levels: Arc<dyn ConsultantLevelRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub wishlists: Arc<dyn WishlistRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    /// All collaborators served by one in-process store
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            products: store.clone(),
            agents: store.clone(),
            clients: store.clone(),
            consultant_levels: store.clone(),
            carts: store.clone(),
            wishlists: store.clone(),
            orders: store,
        }
    }

    /// All collaborators served by one PostgreSQL pool
    pub fn postgres(store: PostgresStore) -> Self {
        let store = Arc::new(store);
        Self {
            products: store.clone(),
            agents: store.clone(),
            clients: store.clone(),
            consultant_levels: store.clone(),
            carts: store.clone(),
            wishlists: store.clone(),
            orders: store,
        }
    }
}
