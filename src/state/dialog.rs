/// Which modal dialog is open, and for which record
///
/// Exactly one state holds at a time. Opening a dialog requires `Closed`;
/// an open request while another dialog is up is rejected and leaves the
/// open dialog untouched. Every transition to `Closed` clears the staged
/// photo preview.

use super::data::{Field, Record, RecordDraft};
use super::staging::{ImagePreview, ImageStagingBuffer, StageTicket};
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq)]
pub enum DialogState {
    Closed,
    AddOpen,
    EditOpen(Record),
    DeleteOpen(Record),
}

impl DialogState {
    pub fn name(&self) -> &'static str {
        match self {
            DialogState::Closed => "closed",
            DialogState::AddOpen => "add",
            DialogState::EditOpen(_) => "edit",
            DialogState::DeleteOpen(_) => "delete",
        }
    }

    /// The record the dialog acts on (None for add)
    pub fn target(&self) -> Option<&Record> {
        match self {
            DialogState::EditOpen(record) | DialogState::DeleteOpen(record) => Some(record),
            DialogState::Closed | DialogState::AddOpen => None,
        }
    }

    pub fn is_form(&self) -> bool {
        matches!(self, DialogState::AddOpen | DialogState::EditOpen(_))
    }
}

/// Identifies one opening of a dialog. A mutation started in one session
/// must not close a dialog opened later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogSession(u64);

#[derive(Debug)]
pub struct DialogCoordinator {
    state: DialogState,
    session: u64,
    /// Form contents; kept verbatim across failed submits
    draft: RecordDraft,
    staging: ImageStagingBuffer,
    /// Failure of the last action taken in this dialog
    error: Option<ClientError>,
    /// A submit or confirm from this session is waiting for the server
    submitting: bool,
}

impl Default for DialogCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogCoordinator {
    pub fn new() -> Self {
        Self {
            state: DialogState::Closed,
            session: 0,
            draft: RecordDraft::default(),
            staging: ImageStagingBuffer::new(),
            error: None,
            submitting: false,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn session(&self) -> DialogSession {
        DialogSession(self.session)
    }

    pub fn draft(&self) -> &RecordDraft {
        &self.draft
    }

    pub fn preview(&self) -> Option<&ImagePreview> {
        self.staging.preview()
    }

    pub fn staging(&self) -> &ImageStagingBuffer {
        &self.staging
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// "Create new" intent
    pub fn open_add(&mut self) -> ClientResult<()> {
        self.open(DialogState::AddOpen, RecordDraft::default())
    }

    /// "Edit" intent; the form starts from the record's current values
    pub fn open_edit(&mut self, record: Record) -> ClientResult<()> {
        let draft = RecordDraft::from_record(&record);
        self.open(DialogState::EditOpen(record), draft)
    }

    /// "Delete" intent
    pub fn open_delete(&mut self, record: Record) -> ClientResult<()> {
        self.open(DialogState::DeleteOpen(record), RecordDraft::default())
    }

    fn open(&mut self, next: DialogState, draft: RecordDraft) -> ClientResult<()> {
        if self.state != DialogState::Closed {
            tracing::warn!(open = self.state.name(), requested = next.name(), "dialog already open");
            return Err(ClientError::DialogBusy {
                open: self.state.name(),
            });
        }

        self.session += 1;
        tracing::debug!(dialog = next.name(), session = self.session, "dialog opened");
        self.state = next;
        self.draft = draft;
        self.error = None;
        self.submitting = false;
        Ok(())
    }

    /// Cancel intent. Returns false if nothing was open.
    pub fn cancel(&mut self) -> bool {
        if self.state == DialogState::Closed {
            return false;
        }
        tracing::debug!(dialog = self.state.name(), session = self.session, "dialog cancelled");
        self.close();
        true
    }

    /// Close after a successful mutation, but only if that mutation belongs
    /// to the dialog that is open now.
    pub fn close_session(&mut self, session: DialogSession) -> bool {
        if session.0 != self.session || self.state == DialogState::Closed {
            return false;
        }
        self.close();
        true
    }

    fn close(&mut self) {
        self.state = DialogState::Closed;
        self.draft = RecordDraft::default();
        self.error = None;
        self.submitting = false;
        self.staging.clear();
    }

    /// Field-change callback of the form dialog
    pub fn set_field(&mut self, field: Field, value: String) -> ClientResult<()> {
        if !self.state.is_form() {
            return Err(ClientError::NoDialog);
        }
        self.draft.set(field, value);
        Ok(())
    }

    /// Image-change callback: reserve a ticket for the decode about to run
    pub fn stage_image(&mut self) -> ClientResult<StageTicket> {
        if !self.state.is_form() {
            return Err(ClientError::NoDialog);
        }
        Ok(self.staging.stage())
    }

    /// Land a finished decode; stale results are dropped silently
    pub fn accept_image(&mut self, ticket: StageTicket, result: ClientResult<ImagePreview>) {
        match self.staging.accept(ticket, result) {
            Ok(_) => {}
            Err(e) => self.error = Some(e),
        }
    }

    /// Record a failure that belongs to the open dialog (entered data stays)
    pub fn fail(&mut self, err: ClientError) {
        if self.state != DialogState::Closed {
            self.error = Some(err);
        }
    }

    pub(crate) fn begin_submit(&mut self) {
        self.error = None;
        self.submitting = true;
    }

    /// A mutation from `session` failed; keep the dialog open with its data
    pub(crate) fn submit_failed(&mut self, session: DialogSession, err: ClientError) {
        if session.0 == self.session && self.state != DialogState::Closed {
            self.submitting = false;
            self.error = Some(err);
        }
    }
}
