// PostgreSQL document store
//
// Every collection is a table of `id` + `doc JSONB`. Documents use the same
// camelCase JSON shape as the HTTP API.

use axum::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cart::{Cart, Wishlist};
use crate::models::{Agent, Client, ConsultantLevelRecord, EntityId, Product};
use crate::orders::{NewOrder, Order, OrderStatus, StatusMachine};
use crate::pricing::ConsultantLevel;
use crate::query::{PageRequest, ProductFilter, ProductQueryBuilder};
use crate::repository::{
    AgentRepository, CartRepository, ClientRepository, ConsultantLevelRepository, OrderRepository,
    Page, ProductRepository, RepoResult, StatusUpdate, WishlistRepository,
};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load one document by text id from a collection table
    async fn find_doc<T: DeserializeOwned>(&self, table: &str, id: &str) -> RepoResult<Option<T>> {
        let sql = format!("SELECT doc FROM {} WHERE id = $1", table);
        let row: Option<(Json<Value>,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((Json(doc),)) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace one document
    async fn upsert_doc<T: serde::Serialize + Sync>(&self, table: &str, id: &str, doc: &T) -> RepoResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, doc, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc, updated_at = NOW()",
            table
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(Json(doc))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PostgresStore {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Product>> {
        self.find_doc("products", id.as_str()).await
    }

    async fn find_many(&self, filter: &ProductFilter, page: &PageRequest) -> RepoResult<Page<Product>> {
        let builder = ProductQueryBuilder::from_filter(filter, page);

        let (sql, params) = builder.build();
        let mut query = sqlx::query_as::<_, (Json<Value>,)>(&sql);
        for param in &params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let (count_sql, count_params) = builder.build_count();
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in &count_params {
            count_query = count_query.bind(param);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let items = rows
            .into_iter()
            .map(|(Json(doc),)| serde_json::from_value(doc))
            .collect::<Result<Vec<Product>, _>>()?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
        })
    }
}

#[async_trait]
impl AgentRepository for PostgresStore {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Agent>> {
        self.find_doc("agents", id.as_str()).await
    }

    async fn save(&self, agent: &Agent) -> RepoResult<()> {
        self.upsert_doc("agents", agent.id.as_str(), agent).await
    }
}

#[async_trait]
impl ClientRepository for PostgresStore {
    async fn find_by_id(&self, id: &EntityId) -> RepoResult<Option<Client>> {
        self.find_doc("clients", id.as_str()).await
    }

    async fn save(&self, client: &Client) -> RepoResult<()> {
        self.upsert_doc("clients", client.id.as_str(), client).await
    }
}

#[async_trait]
impl ConsultantLevelRepository for PostgresStore {
    async fn find_by_level(&self, level: ConsultantLevel) -> RepoResult<Option<ConsultantLevelRecord>> {
        self.find_doc("consultant_levels", level.as_str()).await
    }
}

#[async_trait]
impl CartRepository for PostgresStore {
    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Option<Cart>> {
        self.find_doc("carts", client_id.as_str()).await
    }

    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        self.upsert_doc("carts", cart.client_id.as_str(), cart).await
    }
}

#[async_trait]
impl WishlistRepository for PostgresStore {
    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Option<Wishlist>> {
        self.find_doc("wishlists", client_id.as_str()).await
    }

    async fn save(&self, wishlist: &Wishlist) -> RepoResult<()> {
        self.upsert_doc("wishlists", wishlist.client_id.as_str(), wishlist).await
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn create(&self, new_order: NewOrder) -> RepoResult<Order> {
        let order = Order::from_new(new_order, chrono::Utc::now());

        sqlx::query(
            r#"
            INSERT INTO orders (id, client_id, created_at, updated_at, doc)
            VALUES ($1, $2, $3, $3, $4)
            "#,
        )
        .bind(order.id)
        .bind(order.client_id.as_str())
        .bind(order.created_at)
        .bind(Json(&order))
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Order>> {
        let row: Option<(Json<Value>,)> = sqlx::query_as("SELECT doc FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((Json(doc),)) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    async fn find_by_client_id(&self, client_id: &EntityId) -> RepoResult<Vec<Order>> {
        let rows: Vec<(Json<Value>,)> = sqlx::query_as(
            r#"
            SELECT doc FROM orders
            WHERE client_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(client_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(|(Json(doc),)| serde_json::from_value(doc))
            .collect::<Result<Vec<Order>, _>>()?;
        Ok(orders)
    }

    async fn update_status(&self, id: Uuid, to: OrderStatus) -> RepoResult<StatusUpdate> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT doc FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((Json(doc),)) = row else {
            return Ok(StatusUpdate::NotFound);
        };
        let mut order: Order = serde_json::from_value(doc)?;

        if !StatusMachine::is_valid_transition(order.status, to) {
            return Ok(StatusUpdate::Rejected { current: order.status });
        }
        if order.status == to {
            return Ok(StatusUpdate::Updated(order));
        }

        // only non-price fields change; items and totals are written back untouched
        order.status = to;
        order.updated_at = chrono::Utc::now();

        sqlx::query("UPDATE orders SET doc = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(Json(&order))
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(StatusUpdate::Updated(order))
    }
}
