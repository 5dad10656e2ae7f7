/// HTTP implementation of the personal-information API
///
/// Wire contract:
/// - `GET    /personal-information`       -> `{ "sql_data": [record, ...] }`
/// - `POST   /personal-information`       multipart fields (+ optional `image`) -> record
/// - `POST   /personal-information/{id}`  same fields + `_method=PUT` -> record
/// - `DELETE /personal-information/{id}`  -> empty body
///
/// The deployed server only routes create/replace verbs for multipart bodies,
/// so updates are a POST carrying the `_method` override field.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::instrument;

use super::{ImageUpload, RecordApi};
use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};
use crate::state::data::{Record, RecordEnvelope, RecordFields, RecordListEnvelope};

/// Override field telling the server to treat a POST as a replace
const METHOD_OVERRIDE_FIELD: &str = "_method";
const METHOD_OVERRIDE_PUT: &str = "PUT";

const JSON: &str = "application/json";

/// Laravel-style 422 body
#[derive(Debug, Default, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

pub struct HttpRecordApi {
    client: reqwest::Client,
    config: AppConfig,
}

impl HttpRecordApi {
    pub fn new(config: AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    /// Text fields of the multipart body; updates also carry the method override
    fn form_text(fields: &RecordFields, method_override: Option<&'static str>) -> Vec<(&'static str, String)> {
        let mut text = fields.form_pairs();
        if let Some(method) = method_override {
            text.push((METHOD_OVERRIDE_FIELD, method.to_string()));
        }
        text
    }

    /// Build the multipart body shared by create and update
    fn form(text: Vec<(&'static str, String)>, image: Option<&ImageUpload>) -> ClientResult<Form> {
        let mut form = Form::new();
        for (name, value) in text {
            form = form.text(name, value);
        }
        if let Some(upload) = image {
            let part = Part::bytes(upload.bytes.clone())
                .file_name(upload.file_name.clone())
                .mime_str(&upload.mime)
                .map_err(|e| ClientError::Image(format!("unsupported image type: {e}")))?;
            form = form.part("image", part);
        }
        Ok(form)
    }

    fn list_request(&self) -> RequestBuilder {
        self.client.get(self.config.records_url()).header(ACCEPT, JSON)
    }

    fn create_request(&self, fields: &RecordFields, image: Option<&ImageUpload>) -> ClientResult<RequestBuilder> {
        let form = Self::form(Self::form_text(fields, None), image)?;
        Ok(self
            .client
            .post(self.config.records_url())
            .header(ACCEPT, JSON)
            .multipart(form))
    }

    fn update_request(
        &self,
        id: i64,
        fields: &RecordFields,
        image: Option<&ImageUpload>,
    ) -> ClientResult<RequestBuilder> {
        let form = Self::form(Self::form_text(fields, Some(METHOD_OVERRIDE_PUT)), image)?;
        Ok(self
            .client
            .post(self.config.record_url(id))
            .header(ACCEPT, JSON)
            .multipart(form))
    }

    fn remove_request(&self, id: i64) -> RequestBuilder {
        self.client.delete(self.config.record_url(id)).header(ACCEPT, JSON)
    }

    fn photo_request(&self, image: &str) -> RequestBuilder {
        self.client.get(self.config.photo_url(image))
    }

    async fn send_form(&self, request: RequestBuilder) -> ClientResult<Option<Record>> {
        let response = request.send().await?;
        let body = check_status(response).await?.bytes().await?;
        Ok(decode_echoed_record(&body))
    }
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    #[instrument(name = "api_list_records", skip(self))]
    async fn list(&self) -> ClientResult<Vec<Record>> {
        let response = self.list_request().send().await?;
        let body = check_status(response).await?.bytes().await?;
        let envelope: RecordListEnvelope = serde_json::from_slice(&body)
            .map_err(|e| ClientError::Decode(format!("record list: {e}")))?;
        tracing::debug!(count = envelope.sql_data.len(), "fetched records");
        Ok(envelope.sql_data)
    }

    #[instrument(name = "api_create_record", skip(self, fields, image), fields(with_image = image.is_some()))]
    async fn create(
        &self,
        fields: &RecordFields,
        image: Option<&ImageUpload>,
    ) -> ClientResult<Option<Record>> {
        let request = self.create_request(fields, image)?;
        self.send_form(request).await
    }

    #[instrument(name = "api_update_record", skip(self, fields, image), fields(with_image = image.is_some()))]
    async fn update(
        &self,
        id: i64,
        fields: &RecordFields,
        image: Option<&ImageUpload>,
    ) -> ClientResult<Option<Record>> {
        let request = self.update_request(id, fields, image)?;
        self.send_form(request).await
    }

    #[instrument(name = "api_remove_record", skip(self))]
    async fn remove(&self, id: i64) -> ClientResult<()> {
        let response = self.remove_request(id).send().await?;
        check_status(response).await?;
        Ok(())
    }

    #[instrument(name = "api_fetch_photo", skip(self))]
    async fn photo(&self, image: &str) -> ClientResult<Vec<u8>> {
        let response = self.photo_request(image).send().await?;
        let body = check_status(response).await?.bytes().await?;
        Ok(body.to_vec())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

/// Turn a non-success status into the matching error, reading the body for context
async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), body))
}

fn status_error(status: u16, body: String) -> ClientError {
    if status == 422 {
        let parsed: ValidationBody = serde_json::from_str(&body).unwrap_or_default();
        let message = if parsed.message.is_empty() {
            "validation failed".to_string()
        } else {
            parsed.message
        };
        return ClientError::Validation {
            message,
            fields: parsed.errors,
        };
    }
    ClientError::Status { status, body }
}

/// The server has already applied the change by the time we read the body,
/// so an unexpected shape only loses the echo, not the mutation.
fn decode_echoed_record(body: &[u8]) -> Option<Record> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<RecordEnvelope>(body) {
        Ok(envelope) => Some(envelope.into_record()),
        Err(e) => {
            tracing::warn!(error = %e, "mutation succeeded but the response did not contain a record");
            None
        }
    }
}
