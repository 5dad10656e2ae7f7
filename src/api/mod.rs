/// Remote personal-information API
///
/// This module handles:
/// - The `RecordApi` boundary the core talks to (http.rs for the real server)
/// - Image uploads attached to create/update requests
/// - Reading stored photos back for display
/// - An in-memory fake used by the tests (fake.rs)

pub mod http;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::state::data::{Record, RecordFields};

pub use http::HttpRecordApi;

/// A photo file as it will be sent in the multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// The calls the client core needs from the server.
///
/// `update` is one capability regardless of how the transport expresses it.
/// Create and update return the stored record when the server echoes it back.
#[async_trait]
pub trait RecordApi: Send + Sync + 'static {
    async fn list(&self) -> ClientResult<Vec<Record>>;

    async fn create(
        &self,
        fields: &RecordFields,
        image: Option<&ImageUpload>,
    ) -> ClientResult<Option<Record>>;

    async fn update(
        &self,
        id: i64,
        fields: &RecordFields,
        image: Option<&ImageUpload>,
    ) -> ClientResult<Option<Record>>;

    async fn remove(&self, id: i64) -> ClientResult<()>;

    /// Raw bytes of a stored photo, by the path a record carries in `image`
    async fn photo(&self, image: &str) -> ClientResult<Vec<u8>>;
}
