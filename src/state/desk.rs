/// The admin desk: store, search query, dialogs and mutations wired together
///
/// `Desk::update` is the single place state changes. It takes user intents
/// and async completions as `Event`s and returns the `Effect`s to run.
/// Effects are plain data; `Effect::run` performs one against a `RecordApi`
/// and yields the completion event. The UI shell turns effects into tasks
/// and feeds the completions back into `update`.

use std::sync::Arc;

use iced::widget::image::Handle;

use super::data::{Field, Record, RecordDraft};
use super::dialog::{DialogCoordinator, DialogState};
use super::gateway::{self, MutationGateway, MutationOutcome, MutationRequest};
use super::photos::PhotoCache;
use super::search;
use super::staging::{self, ImagePreview, StageTicket};
use super::store::RecordStore;
use crate::api::RecordApi;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub enum Event {
    // ========== User intents ==========
    QueryChanged(String),
    Reload,
    OpenAdd,
    OpenEdit(i64),
    OpenDelete(i64),
    Cancel,
    FieldChanged(Field, String),
    /// A photo file was picked and read
    ImagePicked { file_name: String, bytes: Vec<u8> },
    /// The picked photo could not be read from disk
    ImageUnreadable(ClientError),
    /// Form submit (add/edit)
    Submit,
    /// Delete confirmation
    ConfirmDelete,

    // ========== Async completions ==========
    RecordsLoaded(ClientResult<Vec<Record>>),
    PreviewDecoded(StageTicket, ClientResult<ImagePreview>),
    MutationFinished(MutationOutcome),
    PhotoFetched {
        path: String,
        result: ClientResult<Vec<u8>>,
    },
}

/// Async work requested by `update`
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchRecords,
    DecodePreview {
        ticket: StageTicket,
        file_name: String,
        bytes: Vec<u8>,
    },
    Mutate(MutationRequest),
    /// Read a stored photo for display
    FetchPhoto { path: String },
}

impl Effect {
    /// Perform the effect and report back
    pub async fn run(self, api: Arc<dyn RecordApi>) -> Event {
        match self {
            Effect::FetchRecords => Event::RecordsLoaded(api.list().await),
            Effect::DecodePreview {
                ticket,
                file_name,
                bytes,
            } => Event::PreviewDecoded(ticket, staging::decode_preview(file_name, bytes).await),
            Effect::Mutate(request) => {
                Event::MutationFinished(gateway::execute(api.as_ref(), request).await)
            }
            Effect::FetchPhoto { path } => {
                let result = api.photo(&path).await;
                Event::PhotoFetched { path, result }
            }
        }
    }
}

/// Props for the record list
#[derive(Debug)]
pub struct ListProps<'a> {
    pub query: &'a str,
    pub records: Vec<&'a Record>,
    pub loading: bool,
    pub error: Option<&'a ClientError>,
    pub notice: Option<&'a ClientError>,
    pub photos: &'a PhotoCache,
}

/// Props for the add/edit form dialog
#[derive(Debug)]
pub struct FormProps<'a> {
    /// None when adding
    pub target: Option<&'a Record>,
    /// Stored photo of the target, once fetched
    pub photo: Option<&'a Handle>,
    pub draft: &'a RecordDraft,
    pub preview: Option<&'a ImagePreview>,
    pub decoding: bool,
    pub submitting: bool,
    pub error: Option<&'a ClientError>,
}

/// Props for the delete confirmation dialog
#[derive(Debug)]
pub struct DeleteProps<'a> {
    pub display_name: String,
    pub submitting: bool,
    pub error: Option<&'a ClientError>,
}

#[derive(Debug, Default)]
pub struct Desk {
    store: RecordStore,
    query: String,
    dialog: DialogCoordinator,
    gateway: MutationGateway,
    photos: PhotoCache,
    /// Errors from intents that have no dialog to show them in
    notice: Option<ClientError>,
}

impl Desk {
    /// A fresh desk plus the initial load
    pub fn new() -> (Self, Vec<Effect>) {
        let mut desk = Self::default();
        let effects = desk.fetch();
        (desk, effects)
    }

    /// Initial load and manual reload
    fn fetch(&mut self) -> Vec<Effect> {
        self.store.load();
        vec![Effect::FetchRecords]
    }

    /// Photos of listed records that have not been requested yet
    fn fetch_photos(&mut self) -> Vec<Effect> {
        self.photos
            .request_missing(self.store.records())
            .into_iter()
            .map(|path| Effect::FetchPhoto { path })
            .collect()
    }

    /// Look up a row for an edit/delete intent
    fn row(&self, id: i64) -> ClientResult<Record> {
        self.store
            .get(id)
            .cloned()
            .ok_or(ClientError::UnknownRecord(id))
    }

    pub fn update(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::QueryChanged(query) => {
                self.query = query;
                Vec::new()
            }
            Event::Reload => {
                self.photos.forget_failures();
                self.fetch()
            }
            Event::OpenAdd => {
                let result = self.dialog.open_add();
                self.note(result);
                Vec::new()
            }
            Event::OpenEdit(id) => {
                let result = self.row(id).and_then(|record| self.dialog.open_edit(record));
                self.note(result);
                Vec::new()
            }
            Event::OpenDelete(id) => {
                let result = self.row(id).and_then(|record| self.dialog.open_delete(record));
                self.note(result);
                Vec::new()
            }
            Event::Cancel => {
                self.dialog.cancel();
                Vec::new()
            }
            Event::FieldChanged(field, value) => {
                let result = self.dialog.set_field(field, value);
                self.note(result);
                Vec::new()
            }
            Event::ImagePicked { file_name, bytes } => match self.dialog.stage_image() {
                Ok(ticket) => vec![Effect::DecodePreview {
                    ticket,
                    file_name,
                    bytes,
                }],
                Err(e) => {
                    self.note::<()>(Err(e));
                    Vec::new()
                }
            },
            Event::ImageUnreadable(err) => {
                tracing::warn!(error = %err, "picked image could not be read");
                self.dialog.fail(err);
                Vec::new()
            }
            Event::Submit => self.submit(true),
            Event::ConfirmDelete => self.submit(false),
            Event::RecordsLoaded(result) => {
                // failure is kept on the store and shown by the list
                if self.store.finish_load(result).is_ok() {
                    self.photos.retain_listed(self.store.records());
                }
                self.fetch_photos()
            }
            Event::PreviewDecoded(ticket, result) => {
                self.dialog.accept_image(ticket, result);
                Vec::new()
            }
            Event::MutationFinished(outcome) => {
                let refresh = self.gateway.reconcile(outcome, &mut self.dialog, &mut self.store);
                // the echo may already name a new photo
                let mut effects = self.fetch_photos();
                if refresh {
                    self.store.refresh();
                    effects.push(Effect::FetchRecords);
                }
                effects
            }
            Event::PhotoFetched { path, result } => {
                self.photos.accept(path, result);
                Vec::new()
            }
        }
    }

    /// Form submit (`from_form`) or delete confirmation for the open dialog
    fn submit(&mut self, from_form: bool) -> Vec<Effect> {
        let matches = if from_form {
            self.dialog.state().is_form()
        } else {
            matches!(self.dialog.state(), DialogState::DeleteOpen(_))
        };
        if !matches {
            self.note::<()>(Err(ClientError::NoDialog));
            return Vec::new();
        }
        // Enter in a field bypasses the disabled Save button
        if self.dialog.is_submitting() || self.dialog.staging().is_decoding() {
            tracing::debug!(
                submitting = self.dialog.is_submitting(),
                decoding = self.dialog.staging().is_decoding(),
                "submit ignored until the dialog is idle"
            );
            return Vec::new();
        }

        match self.gateway.prepare(&mut self.dialog) {
            Ok(request) => vec![Effect::Mutate(request)],
            Err(_) => Vec::new(),
        }
    }

    fn note<T>(&mut self, result: ClientResult<T>) {
        match result {
            Ok(_) => self.notice = None,
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "intent ignored");
                self.notice = Some(e);
            }
        }
    }

    pub fn list_props(&self) -> ListProps<'_> {
        ListProps {
            query: &self.query,
            records: search::filter(self.store.records(), &self.query),
            loading: self.store.is_loading(),
            error: self.store.last_error(),
            notice: self.notice.as_ref(),
            photos: &self.photos,
        }
    }

    pub fn form_props(&self) -> Option<FormProps<'_>> {
        if !self.dialog.state().is_form() {
            return None;
        }
        let target = self.dialog.state().target();
        Some(FormProps {
            target,
            photo: target.and_then(|record| self.photos.get(record)),
            draft: self.dialog.draft(),
            preview: self.dialog.preview(),
            decoding: self.dialog.staging().is_decoding(),
            submitting: self.dialog.is_submitting(),
            error: self.dialog.error(),
        })
    }

    pub fn delete_props(&self) -> Option<DeleteProps<'_>> {
        match self.dialog.state() {
            DialogState::DeleteOpen(record) => Some(DeleteProps {
                display_name: record.full_name(),
                submitting: self.dialog.is_submitting(),
                error: self.dialog.error(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
impl Desk {
    fn store(&self) -> &RecordStore {
        &self.store
    }

    fn dialog(&self) -> &DialogCoordinator {
        &self.dialog
    }

    fn notice(&self) -> Option<&ClientError> {
        self.notice.as_ref()
    }
}
