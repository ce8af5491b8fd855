//! `CorrectionStore` trait and its REST implementation.
//!
//! The hosted store speaks PostgREST:
//!
//! | operation | request                                                     |
//! |-----------|-------------------------------------------------------------|
//! | list      | `GET    /rest/v1/{table}?select=*&order=created_at.desc`    |
//! | insert    | `POST   /rest/v1/{table}` body `[NewCorrection]`            |
//! | update    | `PATCH  /rest/v1/{table}?id=eq.{id}` body `CorrectionPatch` |
//! | delete    | `DELETE /rest/v1/{table}?id=eq.{id}`                        |
//!
//! Every request carries `apikey` and `Authorization: Bearer` headers.
//! Mutations ask for `Prefer: return=representation`, so an empty answer to
//! an update or delete means no row matched the id.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::StoreConfig;
use crate::store::{CorrectionPatch, CorrectionRecord, NewCorrection, RecordId, StoreError};

// ---------------------------------------------------------------------------
// CorrectionStore trait
// ---------------------------------------------------------------------------

/// Async CRUD over correction records.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// behind `Arc<dyn CorrectionStore>`.
#[async_trait]
pub trait CorrectionStore: Send + Sync {
    /// All records, newest first.
    async fn list(&self) -> Result<Vec<CorrectionRecord>, StoreError>;

    /// Create a record; returns it with its store-assigned id and timestamp.
    async fn insert(&self, new: NewCorrection) -> Result<CorrectionRecord, StoreError>;

    /// Replace the correction fields of an existing record.
    async fn update(
        &self,
        id: &RecordId,
        patch: CorrectionPatch,
    ) -> Result<CorrectionRecord, StoreError>;

    /// Remove a record.
    async fn delete(&self, id: &RecordId) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// RestCorrectionStore
// ---------------------------------------------------------------------------

const RETURN_REPRESENTATION: &str = "return=representation";

/// PostgREST client for the correction table.
pub struct RestCorrectionStore {
    client: reqwest::Client,
    /// `{url}/rest/v1/{table}`, or `None` when no URL is configured.
    endpoint: Option<String>,
    api_key: String,
}

impl RestCorrectionStore {
    /// Build the store around a shared HTTP client.
    ///
    /// An unconfigured store is still constructed; every call then fails with
    /// [`StoreError::NotConfigured`].
    pub fn new(client: reqwest::Client, config: &StoreConfig) -> Self {
        let endpoint = config.is_configured().then(|| {
            format!(
                "{}/rest/v1/{}",
                config.url.trim_end_matches('/'),
                config.table
            )
        });
        Self {
            client,
            endpoint,
            api_key: config.api_key.clone().unwrap_or_default(),
        }
    }

    fn request(&self, method: Method) -> Result<RequestBuilder, StoreError> {
        let endpoint = self.endpoint.as_deref().ok_or(StoreError::NotConfigured)?;
        let mut req = self.client.request(method, endpoint);
        if !self.api_key.is_empty() {
            req = req.header("apikey", &self.api_key).bearer_auth(&self.api_key);
        }
        Ok(req)
    }

    fn id_filter(id: &RecordId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{id}"))]
    }
}

/// Map an error status to [`StoreError::Rejected`], preferring the
/// PostgREST `message` field over the raw body.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(text);
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let body = check(response).await?.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| StoreError::Parse(e.to_string()))
}

#[async_trait]
impl CorrectionStore for RestCorrectionStore {
    async fn list(&self) -> Result<Vec<CorrectionRecord>, StoreError> {
        let response = self
            .request(Method::GET)?
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        let records: Vec<CorrectionRecord> = parse(response).await?;
        log::debug!("store: listed {} corrections", records.len());
        Ok(records)
    }

    async fn insert(&self, new: NewCorrection) -> Result<CorrectionRecord, StoreError> {
        let response = self
            .request(Method::POST)?
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[new])
            .send()
            .await?;
        let record = parse::<Vec<CorrectionRecord>>(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Parse("insert returned no representation".into()))?;
        log::info!("store: inserted correction {}", record.id);
        Ok(record)
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: CorrectionPatch,
    ) -> Result<CorrectionRecord, StoreError> {
        let response = self
            .request(Method::PATCH)?
            .query(&Self::id_filter(id))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch)
            .send()
            .await?;
        let record = parse::<Vec<CorrectionRecord>>(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        log::info!("store: updated correction {id}");
        Ok(record)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE)?
            .query(&Self::id_filter(id))
            .header("Prefer", RETURN_REPRESENTATION)
            .send()
            .await?;
        let removed: Vec<CorrectionRecord> = parse(response).await?;
        if removed.is_empty() {
            return Err(StoreError::NotFound(id.clone()));
        }
        log::info!("store: deleted correction {id}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockCorrectionStore (test double)
// ---------------------------------------------------------------------------

/// In-memory store with optional forced failure.
#[cfg(test)]
pub struct MockCorrectionStore {
    records: std::sync::Mutex<Vec<CorrectionRecord>>,
    next_id: std::sync::atomic::AtomicU64,
    failure: std::sync::Mutex<Option<String>>,
    writes: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockCorrectionStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<CorrectionRecord>) -> Self {
        Self {
            next_id: std::sync::atomic::AtomicU64::new(records.len() as u64 + 1),
            records: std::sync::Mutex::new(records),
            failure: std::sync::Mutex::new(None),
            writes: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Make every following call fail with `Rejected { status: 500 }`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Number of insert, update and delete calls received.
    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<CorrectionRecord> {
        self.records.lock().unwrap().clone()
    }

    fn count_write(&self) {
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(StoreError::Rejected {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CorrectionStore for MockCorrectionStore {
    async fn list(&self) -> Result<Vec<CorrectionRecord>, StoreError> {
        self.check_failure()?;
        let mut records = self.records();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn insert(&self, new: NewCorrection) -> Result<CorrectionRecord, StoreError> {
        self.count_write();
        self.check_failure()?;
        let n = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let record = CorrectionRecord {
            id: RecordId::new(n.to_string()),
            original_hanji: new.original_hanji,
            original_lomaji: new.original_lomaji,
            hanji_correction: Some(new.hanji_correction),
            lomaji_correction: Some(new.lomaji_correction),
            created_at: chrono::DateTime::from_timestamp(n as i64, 0).unwrap(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: CorrectionPatch,
    ) -> Result<CorrectionRecord, StoreError> {
        self.count_write();
        self.check_failure()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.hanji_correction = Some(patch.hanji_correction);
        record.lomaji_correction = Some(patch.lomaji_correction);
        Ok(record.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.count_write();
        self.check_failure()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
