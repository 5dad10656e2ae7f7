use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;

use super::{ImageUpload, RecordApi};
use crate::error::{ClientError, ClientResult};
use crate::state::data::{Record, RecordFields};

/// In-memory stand-in for the personal-information server
pub struct FakeRecordApi {
    pub records: Mutex<Vec<Record>>,
    pub next_id: AtomicI64,
    /// Every call, in order, e.g. "list", "create", "update 2", "remove 1"
    pub calls: Mutex<Vec<String>>,
    /// Returned (once) by the next call instead of touching the records
    pub fail_next: Mutex<Option<ClientError>>,
    /// Whether create/update echo the stored record back
    pub echo_records: bool,
    /// Stored photo files by path; uploads land here too
    pub photos: Mutex<HashMap<String, Vec<u8>>>,
    /// Photo paths read, in order (kept apart from `calls`)
    pub photo_reads: Mutex<Vec<String>>,
}

impl FakeRecordApi {
    pub fn with_records(records: Vec<Record>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            records: Mutex::new(records),
            next_id: AtomicI64::new(next_id),
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            echo_records: true,
            photos: Mutex::new(HashMap::new()),
            photo_reads: Mutex::new(Vec::new()),
        }
    }

    pub async fn put_photo(&self, image: &str, bytes: Vec<u8>) {
        self.photos.lock().await.insert(image.to_string(), bytes);
    }

    pub async fn photo_reads(&self) -> Vec<String> {
        self.photo_reads.lock().await.clone()
    }

    pub async fn fail_next(&self, err: ClientError) {
        *self.fail_next.lock().await = Some(err);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn enter(&self, call: String) -> ClientResult<()> {
        self.calls.lock().await.push(call);
        match self.fail_next.lock().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Keep an uploaded file and return the path the server would report
    async fn store_upload(&self, image: Option<&ImageUpload>) -> Option<String> {
        let upload = image?;
        let path = format!("images/{}", upload.file_name);
        self.put_photo(&path, upload.bytes.clone()).await;
        Some(path)
    }
}

impl Default for FakeRecordApi {
    fn default() -> Self {
        Self::with_records(Vec::new())
    }
}

#[async_trait]
impl RecordApi for FakeRecordApi {
    async fn list(&self) -> ClientResult<Vec<Record>> {
        self.enter("list".to_string()).await?;
        Ok(self.records.lock().await.clone())
    }

    async fn create(
        &self,
        fields: &RecordFields,
        image: Option<&ImageUpload>,
    ) -> ClientResult<Option<Record>> {
        self.enter("create".to_string()).await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = fields.clone().into_record(id, self.store_upload(image).await);
        self.records.lock().await.push(record.clone());
        Ok(self.echo_records.then_some(record))
    }

    async fn update(
        &self,
        id: i64,
        fields: &RecordFields,
        image: Option<&ImageUpload>,
    ) -> ClientResult<Option<Record>> {
        self.enter(format!("update {id}")).await?;
        let uploaded = self.store_upload(image).await;
        let mut records = self.records.lock().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: String::new(),
            })?;
        let image = uploaded.or_else(|| slot.image.clone());
        *slot = fields.clone().into_record(id, image);
        Ok(self.echo_records.then(|| slot.clone()))
    }

    async fn remove(&self, id: i64) -> ClientResult<()> {
        self.enter(format!("remove {id}")).await?;
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(ClientError::Status {
                status: 404,
                body: String::new(),
            });
        }
        Ok(())
    }

    async fn photo(&self, image: &str) -> ClientResult<Vec<u8>> {
        self.photo_reads.lock().await.push(image.to_string());
        self.photos
            .lock()
            .await
            .get(image)
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                body: String::new(),
            })
    }
}
