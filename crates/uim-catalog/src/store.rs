//! Catalog storage.

use crate::error::CatalogError;
use crate::ingest::IngestReport;
use crate::search::{FilterQuery, Page, fold};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use uim_core::{CatalogConfig, Intent, Manifest, Service};

/// Persistent catalog of services, intents and tags.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Apply a whole manifest atomically: upsert the service, upsert every
    /// intent by uid, replace its tag links and drop the service's intents
    /// the manifest no longer lists. An intent uid owned by a different
    /// service fails the whole manifest. Nothing is written on error.
    async fn apply_manifest(&self, manifest: &Manifest) -> Result<IngestReport, CatalogError>;

    async fn find_service_by_name(&self, name: &str) -> Result<Option<Service>, CatalogError>;

    async fn find_intent_by_uid(&self, intent_uid: &str) -> Result<Option<Intent>, CatalogError>;

    async fn list_services(&self) -> Result<Vec<Service>, CatalogError>;

    async fn intents_for_service(&self, service_id: i64) -> Result<Vec<Intent>, CatalogError>;

    /// Delete a service and, by cascade, its intents and tag links.
    /// Returns false when no such service exists.
    async fn delete_service(&self, name: &str) -> Result<bool, CatalogError>;

    /// One page of intents matching every supplied filter, in insertion order.
    async fn filter_intents(
        &self,
        filter: &FilterQuery,
        page: Page,
    ) -> Result<Vec<Intent>, CatalogError>;

    /// Up to `limit` intents, in insertion order, whose name or description
    /// contains every term. Terms must already be folded with [`fold`].
    async fn intents_with_terms(
        &self,
        terms: &[String],
        limit: u32,
    ) -> Result<Vec<Intent>, CatalogError>;
}

const INTENT_COLUMNS: &str = "i.id, i.service_id, i.intent_uid, i.name, i.description, \
     i.input_parameters, i.output_parameters, i.endpoint";

#[derive(FromRow)]
struct ServiceRow {
    id: i64,
    name: String,
    description: String,
    url: String,
    logo_url: Option<String>,
    terms_url: Option<String>,
    privacy_url: Option<String>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            name: row.name,
            description: row.description,
            url: row.url,
            logo_url: row.logo_url,
            terms_url: row.terms_url,
            privacy_url: row.privacy_url,
        }
    }
}

#[derive(FromRow)]
struct IntentRow {
    id: i64,
    service_id: i64,
    intent_uid: String,
    name: String,
    description: String,
    input_parameters: String,
    output_parameters: String,
    endpoint: String,
}

impl IntentRow {
    fn into_intent(self, tags: Vec<String>) -> Result<Intent, CatalogError> {
        Ok(Intent {
            id: self.id,
            service_id: self.service_id,
            intent_uid: self.intent_uid,
            name: self.name,
            description: self.description,
            input_parameters: serde_json::from_str(&self.input_parameters)?,
            output_parameters: serde_json::from_str(&self.output_parameters)?,
            endpoint: self.endpoint,
            tags,
        })
    }
}

/// SQLite-backed catalog.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open (creating if needed) the configured database and run migrations.
    pub async fn connect(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// A private in-memory catalog. A single connection keeps one database
    /// alive for the lifetime of the pool.
    pub async fn in_memory() -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CatalogError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_tags(&self, intent_ids: &[i64]) -> Result<HashMap<i64, Vec<String>>, CatalogError> {
        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        if intent_ids.is_empty() {
            return Ok(tags);
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT it.intent_id, t.name FROM intent_tags it \
             JOIN tags t ON t.id = it.tag_id WHERE it.intent_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in intent_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY it.rowid");

        let rows: Vec<(i64, String)> = qb.build_query_as().fetch_all(&self.pool).await?;
        for (intent_id, name) in rows {
            tags.entry(intent_id).or_default().push(name);
        }
        Ok(tags)
    }

    async fn hydrate(&self, rows: Vec<IntentRow>) -> Result<Vec<Intent>, CatalogError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut tags = self.load_tags(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let row_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_intent(row_tags)
            })
            .collect()
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn apply_manifest(&self, manifest: &Manifest) -> Result<IngestReport, CatalogError> {
        let info = &manifest.service_info;
        let mut tx = self.pool.begin().await?;

        let service_id: i64 = sqlx::query_scalar(
            "INSERT INTO services (name, description, url, logo_url, terms_url, privacy_url) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(name) DO UPDATE SET \
                description = excluded.description, \
                url = excluded.url, \
                logo_url = excluded.logo_url, \
                terms_url = excluded.terms_url, \
                privacy_url = excluded.privacy_url \
             RETURNING id",
        )
        .bind(&info.name)
        .bind(&info.description)
        .bind(&info.service_url)
        .bind(&info.service_logo_url)
        .bind(&info.service_terms_of_service_url)
        .bind(&info.service_privacy_policy_url)
        .fetch_one(&mut *tx)
        .await?;

        let mut intent_uids = Vec::with_capacity(manifest.intents.len());
        let mut tag_links = 0usize;

        for descriptor in &manifest.intents {
            // The WHERE clause leaves another service's row untouched and
            // returns nothing, which rolls the manifest back.
            let intent_id: Option<i64> = sqlx::query_scalar(
                "INSERT INTO intents \
                    (service_id, intent_uid, name, description, input_parameters, output_parameters, \
                     endpoint, name_folded, description_folded) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(intent_uid) DO UPDATE SET \
                    name = excluded.name, \
                    description = excluded.description, \
                    input_parameters = excluded.input_parameters, \
                    output_parameters = excluded.output_parameters, \
                    endpoint = excluded.endpoint, \
                    name_folded = excluded.name_folded, \
                    description_folded = excluded.description_folded \
                 WHERE intents.service_id = excluded.service_id \
                 RETURNING id",
            )
            .bind(service_id)
            .bind(&descriptor.intent_uid)
            .bind(&descriptor.intent_name)
            .bind(&descriptor.description)
            .bind(serde_json::to_string(&descriptor.input_parameters)?)
            .bind(serde_json::to_string(&descriptor.output_parameters)?)
            .bind(manifest.endpoint_for(descriptor))
            .bind(fold(&descriptor.intent_name))
            .bind(fold(&descriptor.description))
            .fetch_optional(&mut *tx)
            .await?;
            let Some(intent_id) = intent_id else {
                return Err(CatalogError::IntentConflict {
                    intent_uid: descriptor.intent_uid.clone(),
                });
            };

            sqlx::query("DELETE FROM intent_tags WHERE intent_id = ?")
                .bind(intent_id)
                .execute(&mut *tx)
                .await?;

            for tag in &descriptor.tags {
                // DO UPDATE (not DO NOTHING) so RETURNING yields the existing id.
                let tag_id: i64 = sqlx::query_scalar(
                    "INSERT INTO tags (name) VALUES (?) \
                     ON CONFLICT(name) DO UPDATE SET name = excluded.name \
                     RETURNING id",
                )
                .bind(tag)
                .fetch_one(&mut *tx)
                .await?;

                let linked = sqlx::query(
                    "INSERT OR IGNORE INTO intent_tags (intent_id, tag_id) VALUES (?, ?)",
                )
                .bind(intent_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
                tag_links += linked.rows_affected() as usize;
            }

            debug!(intent_uid = %descriptor.intent_uid, intent_id, "upserted intent");
            intent_uids.push(descriptor.intent_uid.clone());
        }

        let mut stale = QueryBuilder::<Sqlite>::new("DELETE FROM intents WHERE service_id = ");
        stale.push_bind(service_id);
        if !manifest.intents.is_empty() {
            stale.push(" AND intent_uid NOT IN (");
            let mut uids = stale.separated(", ");
            for descriptor in &manifest.intents {
                uids.push_bind(descriptor.intent_uid.clone());
            }
            uids.push_unseparated(")");
        }
        let removed = stale.build().execute(&mut *tx).await?.rows_affected() as usize;

        tx.commit().await?;

        Ok(IngestReport {
            service: Service {
                id: service_id,
                name: info.name.clone(),
                description: info.description.clone(),
                url: info.service_url.clone(),
                logo_url: info.service_logo_url.clone(),
                terms_url: info.service_terms_of_service_url.clone(),
                privacy_url: info.service_privacy_policy_url.clone(),
            },
            intent_uids,
            tag_links,
            removed,
        })
    }

    async fn find_service_by_name(&self, name: &str) -> Result<Option<Service>, CatalogError> {
        let row: Option<ServiceRow> = sqlx::query_as(
            "SELECT id, name, description, url, logo_url, terms_url, privacy_url \
             FROM services WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Service::from))
    }

    async fn find_intent_by_uid(&self, intent_uid: &str) -> Result<Option<Intent>, CatalogError> {
        let row: Option<IntentRow> = sqlx::query_as(&format!(
            "SELECT {INTENT_COLUMNS} FROM intents i WHERE i.intent_uid = ?"
        ))
        .bind(intent_uid)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_services(&self) -> Result<Vec<Service>, CatalogError> {
        let rows: Vec<ServiceRow> = sqlx::query_as(
            "SELECT id, name, description, url, logo_url, terms_url, privacy_url \
             FROM services ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Service::from).collect())
    }

    async fn intents_for_service(&self, service_id: i64) -> Result<Vec<Intent>, CatalogError> {
        let rows: Vec<IntentRow> = sqlx::query_as(&format!(
            "SELECT {INTENT_COLUMNS} FROM intents i WHERE i.service_id = ? ORDER BY i.id"
        ))
        .bind(service_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn delete_service(&self, name: &str) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM services WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn filter_intents(
        &self,
        filter: &FilterQuery,
        page: Page,
    ) -> Result<Vec<Intent>, CatalogError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {INTENT_COLUMNS} FROM intents i WHERE 1 = 1"
        ));

        if let Some(name) = &filter.name {
            qb.push(" AND instr(i.name_folded, ")
                .push_bind(fold(name))
                .push(") > 0");
        }
        if let Some(uid) = &filter.uid {
            qb.push(" AND i.intent_uid = ").push_bind(uid.clone());
        }
        if let Some(description) = &filter.description {
            qb.push(" AND instr(i.description_folded, ")
                .push_bind(fold(description))
                .push(") > 0");
        }
        if !filter.tags.is_empty() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM intent_tags it JOIN tags t ON t.id = it.tag_id \
                 WHERE it.intent_id = i.id AND t.name IN (",
            );
            let mut tags = qb.separated(", ");
            for tag in &filter.tags {
                tags.push_bind(tag.clone());
            }
            tags.push_unseparated("))");
        }

        qb.push(" ORDER BY i.id LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(page.skip));

        let rows: Vec<IntentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn intents_with_terms(
        &self,
        terms: &[String],
        limit: u32,
    ) -> Result<Vec<Intent>, CatalogError> {
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {INTENT_COLUMNS} FROM intents i WHERE 1 = 1"
        ));
        for term in terms {
            qb.push(" AND (instr(i.name_folded, ")
                .push_bind(term.clone())
                .push(") > 0 OR instr(i.description_folded, ")
                .push_bind(term.clone())
                .push(") > 0)");
        }
        qb.push(" ORDER BY i.id LIMIT ").push_bind(i64::from(limit));

        let rows: Vec<IntentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }
}
