//! Document store - Persistenza a documenti con controllo di versione
//!
//! Ogni entità è salvata come documento JSON in una collezione, con un contatore di versione
//! incrementato ad ogni scrittura. Le scritture che modificano un documento esistente sono
//! condizionali sulla versione letta (optimistic concurrency): se nel frattempo un altro
//! scrittore ha salvato, la scrittura non avviene e [`DocumentStore::modify`] riprova
//! ricaricando il documento.
//!
//! Due backend:
//! - `MySql`: tabella unica `documents` con colonna JSON
//! - `Memory`: `DashMap` in memoria, usato nei test e in sviluppo

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Numero massimo di tentativi di una modify prima di arrendersi con un conflitto
pub const MAX_WRITE_ATTEMPTS: usize = 5;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    doc_id INT AUTO_INCREMENT PRIMARY KEY,
    collection VARCHAR(64) NOT NULL,
    version BIGINT NOT NULL DEFAULT 0,
    body JSON NOT NULL,
    unique_key VARCHAR(255) GENERATED ALWAYS AS (
        CASE WHEN collection = 'users' THEN JSON_UNQUOTE(JSON_EXTRACT(body, '$.email')) END
    ) STORED,
    INDEX idx_documents_collection (collection),
    UNIQUE INDEX uq_documents_unique_key (collection, unique_key)
)
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("document not found")]
    NotFound,
    #[error("too many concurrent writes on the same document")]
    VersionConflict,
    #[error("a document with the same unique key already exists")]
    Duplicate,
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Database(err),
    }
}

/// Entità salvabile come documento
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> i32;

    /// Chiamato una sola volta, quando lo store assegna l'id in inserimento
    fn set_id(&mut self, id: i32);

    /// Chiave univoca nella collezione, verificata in inserimento.
    /// Su MySQL deve corrispondere alla colonna generata `unique_key` di [`SCHEMA`].
    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// Documento letto insieme alla versione con cui è stato letto
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub doc: T,
    pub version: i64,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    version: i64,
    body: Value,
}

/// Backend in memoria. Le operazioni sono sincrone: nessun lock viene tenuto attraverso un `.await`.
#[derive(Debug)]
pub struct MemoryBackend {
    docs: DashMap<(&'static str, i32), StoredDocument>,
    // chiave univoca -> id del documento che la possiede
    unique: DashMap<(&'static str, String), i32>,
    next_id: AtomicI32,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            docs: DashMap::new(),
            unique: DashMap::new(),
            next_id: AtomicI32::new(1),
        }
    }
}

impl MemoryBackend {
    fn insert<T: Document>(&self, mut doc: T) -> Result<T, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        doc.set_id(id);
        let body = serde_json::to_value(&doc)?;

        // la prenotazione della chiave è atomica: tra due inserimenti concorrenti ne vince uno
        if let Some(key) = doc.unique_key() {
            match self.unique.entry((T::COLLECTION, key)) {
                Entry::Occupied(_) => return Err(StoreError::Duplicate),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }

        self.docs
            .insert((T::COLLECTION, id), StoredDocument { version: 0, body });
        Ok(doc)
    }

    pub fn load<T: Document>(&self, id: i32) -> Result<Option<Versioned<T>>, StoreError> {
        // il guard del DashMap viene rilasciato prima della deserializzazione
        let stored = match self.docs.get(&(T::COLLECTION, id)) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        Ok(Some(Versioned {
            doc: serde_json::from_value(stored.body)?,
            version: stored.version,
        }))
    }

    pub fn replace_if_version<T: Document>(
        &self,
        doc: &T,
        expected: i64,
    ) -> Result<bool, StoreError> {
        let body = serde_json::to_value(doc)?;
        match self.docs.get_mut(&(T::COLLECTION, doc.id())) {
            Some(mut entry) if entry.version == expected => {
                entry.version += 1;
                entry.body = body;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn scan<T: Document>(&self, filter: impl Fn(&Value) -> bool) -> Result<Vec<T>, StoreError> {
        let mut found: Vec<(i32, Value)> = self
            .docs
            .iter()
            .filter(|e| e.key().0 == T::COLLECTION && filter(&e.value().body))
            .map(|e| (e.key().1, e.value().body.clone()))
            .collect();
        found.sort_by_key(|(id, _)| *id);

        found
            .into_iter()
            .map(|(_, body)| serde_json::from_value(body).map_err(StoreError::from))
            .collect()
    }

    fn delete<T: Document>(&self, id: i32) -> bool {
        let removed = self.docs.remove(&(T::COLLECTION, id)).is_some();
        if removed {
            self.unique
                .retain(|key, owner| !(key.0 == T::COLLECTION && *owner == id));
        }
        removed
    }

    fn delete_if_version<T: Document>(&self, id: i32, expected: i64) -> bool {
        let removed = self
            .docs
            .remove_if(&(T::COLLECTION, id), |_, doc| doc.version == expected)
            .is_some();
        if removed {
            self.unique
                .retain(|key, owner| !(key.0 == T::COLLECTION && *owner == id));
        }
        removed
    }

    fn delete_matching<T: Document>(&self, filter: impl Fn(&Value) -> bool) -> u64 {
        let mut removed = 0;
        self.docs.retain(|key, doc| {
            let matches = key.0 == T::COLLECTION && filter(&doc.body);
            if matches {
                removed += 1;
            }
            !matches
        });
        removed
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    version: i64,
    body: String,
}

impl DocumentRow {
    fn decode<T: Document>(self) -> Result<Versioned<T>, StoreError> {
        Ok(Versioned {
            doc: serde_json::from_str(&self.body)?,
            version: self.version,
        })
    }
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

/// Store condiviso da tutti i repository. Il clone è economico: pool e backend sono condivisi.
#[derive(Clone)]
pub enum DocumentStore {
    MySql(MySqlPool),
    Memory(Arc<MemoryBackend>),
}

impl DocumentStore {
    pub fn mysql(pool: MySqlPool) -> Self {
        DocumentStore::MySql(pool)
    }

    pub fn in_memory() -> Self {
        DocumentStore::Memory(Arc::new(MemoryBackend::default()))
    }

    /// Crea la tabella dei documenti se non esiste (no-op in memoria)
    pub async fn migrate(&self) -> Result<(), StoreError> {
        if let DocumentStore::MySql(pool) = self {
            sqlx::query(SCHEMA).execute(pool).await?;
            debug!("Documents table ready");
        }
        Ok(())
    }

    /// Inserisce un nuovo documento assegnandogli l'id
    pub async fn insert<T: Document>(&self, doc: T) -> Result<T, StoreError> {
        match self {
            DocumentStore::Memory(mem) => mem.insert(doc),
            DocumentStore::MySql(pool) => {
                let mut doc = doc;
                let mut tx = pool.begin().await?;

                let result = sqlx::query(
                    "INSERT INTO documents (collection, version, body) VALUES (?, 0, JSON_OBJECT())",
                )
                .bind(T::COLLECTION)
                .execute(&mut *tx)
                .await?;

                doc.set_id(result.last_insert_id() as i32);

                // il vincolo su unique_key scatta qui, il rollback avviene al drop di tx
                sqlx::query("UPDATE documents SET body = ? WHERE doc_id = ?")
                    .bind(serde_json::to_string(&doc)?)
                    .bind(doc.id())
                    .execute(&mut *tx)
                    .await
                    .map_err(map_write_error)?;

                tx.commit().await?;
                Ok(doc)
            }
        }
    }

    pub async fn load<T: Document>(&self, id: i32) -> Result<Option<Versioned<T>>, StoreError> {
        match self {
            DocumentStore::Memory(mem) => mem.load(id),
            DocumentStore::MySql(pool) => {
                let row = sqlx::query_as::<_, DocumentRow>(
                    "SELECT version, CAST(body AS CHAR) AS body FROM documents WHERE collection = ? AND doc_id = ?",
                )
                .bind(T::COLLECTION)
                .bind(id)
                .fetch_optional(pool)
                .await?;

                row.map(DocumentRow::decode).transpose()
            }
        }
    }

    pub async fn get<T: Document>(&self, id: i32) -> Result<Option<T>, StoreError> {
        Ok(self.load::<T>(id).await?.map(|v| v.doc))
    }

    /// Documenti con gli id indicati, ordinati per id. Gli id inesistenti vengono ignorati.
    pub async fn get_many<T: Document>(&self, ids: &[i32]) -> Result<Vec<T>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            DocumentStore::Memory(mem) => {
                let mut docs = Vec::with_capacity(ids.len());
                let mut sorted = ids.to_vec();
                sorted.sort_unstable();
                sorted.dedup();
                for id in sorted {
                    if let Some(v) = mem.load::<T>(id)? {
                        docs.push(v.doc);
                    }
                }
                Ok(docs)
            }
            DocumentStore::MySql(pool) => {
                let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
                    "SELECT version, CAST(body AS CHAR) AS body FROM documents WHERE collection = ",
                );
                qb.push_bind(T::COLLECTION);
                qb.push(" AND doc_id IN (");
                let mut separated = qb.separated(", ");
                for id in ids {
                    separated.push_bind(*id);
                }
                separated.push_unseparated(") ORDER BY doc_id");

                let rows: Vec<DocumentRow> = qb.build_query_as().fetch_all(pool).await?;
                rows.into_iter()
                    .map(|r| r.decode::<T>().map(|v| v.doc))
                    .collect()
            }
        }
    }

    pub async fn find_all<T: Document>(&self) -> Result<Vec<T>, StoreError> {
        match self {
            DocumentStore::Memory(mem) => mem.scan::<T>(|_| true),
            DocumentStore::MySql(pool) => {
                let rows = sqlx::query_as::<_, DocumentRow>(
                    "SELECT version, CAST(body AS CHAR) AS body FROM documents WHERE collection = ? ORDER BY doc_id",
                )
                .bind(T::COLLECTION)
                .fetch_all(pool)
                .await?;

                rows.into_iter()
                    .map(|r| r.decode::<T>().map(|v| v.doc))
                    .collect()
            }
        }
    }

    /// Documenti il cui campo di primo livello `field` vale esattamente `value`
    pub async fn find_by_field<T: Document>(
        &self,
        field: &str,
        value: Value,
    ) -> Result<Vec<T>, StoreError> {
        match self {
            DocumentStore::Memory(mem) => mem.scan::<T>(|body| body.get(field) == Some(&value)),
            DocumentStore::MySql(pool) => {
                let rows = sqlx::query_as::<_, DocumentRow>(
                    r#"
                    SELECT version, CAST(body AS CHAR) AS body
                    FROM documents
                    WHERE collection = ? AND JSON_EXTRACT(body, ?) = CAST(? AS JSON)
                    ORDER BY doc_id
                    "#,
                )
                .bind(T::COLLECTION)
                .bind(json_path(field))
                .bind(value.to_string())
                .fetch_all(pool)
                .await?;

                rows.into_iter()
                    .map(|r| r.decode::<T>().map(|v| v.doc))
                    .collect()
            }
        }
    }

    /// Scrittura condizionale: riesce solo se la versione salvata è ancora `expected`
    pub async fn replace_if_version<T: Document>(
        &self,
        doc: &T,
        expected: i64,
    ) -> Result<bool, StoreError> {
        match self {
            DocumentStore::Memory(mem) => mem.replace_if_version(doc, expected),
            DocumentStore::MySql(pool) => {
                let result = sqlx::query(
                    r#"
                    UPDATE documents SET body = ?, version = version + 1
                    WHERE collection = ? AND doc_id = ? AND version = ?
                    "#,
                )
                .bind(serde_json::to_string(doc)?)
                .bind(T::COLLECTION)
                .bind(doc.id())
                .bind(expected)
                .execute(pool)
                .await
                .map_err(map_write_error)?;

                Ok(result.rows_affected() == 1)
            }
        }
    }

    /// Sovrascrittura incondizionata, per documenti con un solo scrittore (es. notifica letta dal destinatario)
    pub async fn save<T: Document>(&self, doc: &T) -> Result<(), StoreError> {
        match self {
            DocumentStore::Memory(mem) => {
                let body = serde_json::to_value(doc)?;
                let mut entry = mem
                    .docs
                    .get_mut(&(T::COLLECTION, doc.id()))
                    .ok_or(StoreError::NotFound)?;
                entry.version += 1;
                entry.body = body;
                Ok(())
            }
            DocumentStore::MySql(pool) => {
                let result = sqlx::query(
                    "UPDATE documents SET body = ?, version = version + 1 WHERE collection = ? AND doc_id = ?",
                )
                .bind(serde_json::to_string(doc)?)
                .bind(T::COLLECTION)
                .bind(doc.id())
                .execute(pool)
                .await
                .map_err(map_write_error)?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound);
                }
                Ok(())
            }
        }
    }

    /// Read-modify-write con retry.
    ///
    /// `apply` riceve il documento appena letto e può rifiutare la modifica ritornando `Err`,
    /// nel qual caso nulla viene scritto. Dato che in caso di conflitto viene richiamata sul
    /// documento ricaricato, `apply` non deve avere effetti fuori dal documento stesso.
    ///
    /// Ritorna il documento salvato e il valore prodotto dall'ultima esecuzione di `apply`.
    #[instrument(skip(self, apply), fields(collection = T::COLLECTION))]
    pub async fn modify<T, F, R, E>(&self, id: i32, mut apply: F) -> Result<(T, R), E>
    where
        T: Document,
        F: FnMut(&mut T) -> Result<R, E>,
        E: From<StoreError>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Versioned { mut doc, version } =
                self.load::<T>(id).await?.ok_or(StoreError::NotFound)?;

            let outcome = apply(&mut doc)?;

            if self.replace_if_version(&doc, version).await? {
                debug!(version = version + 1, "Document saved");
                return Ok((doc, outcome));
            }
            warn!(attempt, "Version conflict, reloading document");
        }

        warn!("Giving up after {} conflicting attempts", MAX_WRITE_ATTEMPTS);
        Err(StoreError::VersionConflict.into())
    }

    pub async fn delete<T: Document>(&self, id: i32) -> Result<bool, StoreError> {
        match self {
            DocumentStore::Memory(mem) => Ok(mem.delete::<T>(id)),
            DocumentStore::MySql(pool) => {
                let result =
                    sqlx::query("DELETE FROM documents WHERE collection = ? AND doc_id = ?")
                        .bind(T::COLLECTION)
                        .bind(id)
                        .execute(pool)
                        .await?;
                Ok(result.rows_affected() > 0)
            }
        }
    }

    /// Eliminazione condizionale: riesce solo se la versione salvata è ancora `expected`
    pub async fn delete_if_version<T: Document>(
        &self,
        id: i32,
        expected: i64,
    ) -> Result<bool, StoreError> {
        match self {
            DocumentStore::Memory(mem) => Ok(mem.delete_if_version::<T>(id, expected)),
            DocumentStore::MySql(pool) => {
                let result = sqlx::query(
                    "DELETE FROM documents WHERE collection = ? AND doc_id = ? AND version = ?",
                )
                .bind(T::COLLECTION)
                .bind(id)
                .bind(expected)
                .execute(pool)
                .await?;
                Ok(result.rows_affected() == 1)
            }
        }
    }

    /// Read-check-delete con retry, come [`DocumentStore::modify`].
    ///
    /// Ritorna il documento nella versione effettivamente eliminata: chi pulisce i riferimenti
    /// al documento lavora su quella, non su una lettura precedente.
    #[instrument(skip(self, check), fields(collection = T::COLLECTION))]
    pub async fn remove<T, F, E>(&self, id: i32, mut check: F) -> Result<T, E>
    where
        T: Document,
        F: FnMut(&T) -> Result<(), E>,
        E: From<StoreError>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Versioned { doc, version } =
                self.load::<T>(id).await?.ok_or(StoreError::NotFound)?;

            check(&doc)?;

            if self.delete_if_version::<T>(id, version).await? {
                debug!(version, "Document deleted");
                return Ok(doc);
            }
            warn!(attempt, "Version conflict on delete, reloading document");
        }

        warn!("Giving up after {} conflicting attempts", MAX_WRITE_ATTEMPTS);
        Err(StoreError::VersionConflict.into())
    }

    /// Elimina i documenti che hanno `field == value`, ritorna quanti ne ha eliminati
    pub async fn delete_by_field<T: Document>(
        &self,
        field: &str,
        value: Value,
    ) -> Result<u64, StoreError> {
        match self {
            DocumentStore::Memory(mem) => {
                Ok(mem.delete_matching::<T>(|body| body.get(field) == Some(&value)))
            }
            DocumentStore::MySql(pool) => {
                let result = sqlx::query(
                    "DELETE FROM documents WHERE collection = ? AND JSON_EXTRACT(body, ?) = CAST(? AS JSON)",
                )
                .bind(T::COLLECTION)
                .bind(json_path(field))
                .bind(value.to_string())
                .execute(pool)
                .await?;
                Ok(result.rows_affected())
            }
        }
    }
}
