/// Turns dialog intents into API calls and folds the results back
///
/// Flow for one mutation:
/// 1. `prepare` reads the open dialog and builds a `MutationRequest`
/// 2. `execute` performs the single API call (async, off the update loop)
/// 3. `reconcile` applies the outcome to the store and the dialog
///
/// On success the store gets the server's echo and a refresh is requested;
/// the dialog closes if it is still the one that submitted. On failure
/// nothing but the dialog's error changes.

use std::collections::HashSet;
use std::fmt;

use super::dialog::{DialogCoordinator, DialogSession, DialogState};
use super::data::{Record, RecordFields};
use super::store::{Reconciliation, RecordStore};
use crate::api::{ImageUpload, RecordApi};
use crate::error::{ClientError, ClientResult};

/// What a mutation targets. At most one request per target is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    NewRecord,
    Record(i64),
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationTarget::NewRecord => write!(f, "the new record"),
            MutationTarget::Record(id) => write!(f, "record #{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create {
        fields: RecordFields,
        image: Option<ImageUpload>,
    },
    Update {
        id: i64,
        fields: RecordFields,
        image: Option<ImageUpload>,
    },
    Remove {
        id: i64,
    },
}

impl Mutation {
    pub fn target(&self) -> MutationTarget {
        match self {
            Mutation::Create { .. } => MutationTarget::NewRecord,
            Mutation::Update { id, .. } | Mutation::Remove { id } => MutationTarget::Record(*id),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Update { .. } => "update",
            Mutation::Remove { .. } => "remove",
        }
    }
}

/// A mutation plus the dialog session that issued it
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub session: DialogSession,
    pub mutation: Mutation,
}

/// Result of running a request against the server
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub session: DialogSession,
    pub target: MutationTarget,
    pub verb: &'static str,
    pub result: ClientResult<Reconciliation>,
}

#[derive(Debug, Default)]
pub struct MutationGateway {
    in_flight: HashSet<MutationTarget>,
}

impl MutationGateway {
    /// Build the request for the open dialog (form submit or delete confirm).
    ///
    /// Required-field failures stay in the dialog and nothing is sent.
    pub fn prepare(&mut self, dialog: &mut DialogCoordinator) -> ClientResult<MutationRequest> {
        let result = Self::build(dialog).and_then(|mutation| {
            let target = mutation.target();
            if self.in_flight.contains(&target) {
                return Err(ClientError::MutationInFlight(target.to_string()));
            }
            Ok(mutation)
        });

        match result {
            Ok(mutation) => {
                self.in_flight.insert(mutation.target());
                dialog.begin_submit();
                tracing::info!(verb = mutation.verb(), target = %mutation.target(), "submitting mutation");
                Ok(MutationRequest {
                    session: dialog.session(),
                    mutation,
                })
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "mutation not submitted");
                dialog.fail(e.clone());
                Err(e)
            }
        }
    }

    fn build(dialog: &DialogCoordinator) -> ClientResult<Mutation> {
        let image = || dialog.staging().upload().cloned();
        match dialog.state() {
            DialogState::Closed => Err(ClientError::NoDialog),
            DialogState::AddOpen => Ok(Mutation::Create {
                fields: dialog.draft().to_fields()?,
                image: image(),
            }),
            DialogState::EditOpen(record) => Ok(Mutation::Update {
                id: record.id,
                fields: dialog.draft().to_fields()?,
                image: image(),
            }),
            DialogState::DeleteOpen(record) => Ok(Mutation::Remove { id: record.id }),
        }
    }

    /// Fold an outcome back. Returns true when the store should be refreshed.
    pub fn reconcile(
        &mut self,
        outcome: MutationOutcome,
        dialog: &mut DialogCoordinator,
        store: &mut RecordStore,
    ) -> bool {
        self.in_flight.remove(&outcome.target);

        match outcome.result {
            Ok(change) => {
                tracing::info!(verb = outcome.verb, target = %outcome.target, "mutation succeeded");
                store.reconcile(&change);
                dialog.close_session(outcome.session);
                true
            }
            Err(e) => {
                tracing::warn!(
                    verb = outcome.verb,
                    target = %outcome.target,
                    kind = ?e.kind(),
                    error = %e,
                    "mutation failed"
                );
                dialog.submit_failed(outcome.session, e);
                false
            }
        }
    }
}

/// Perform the one API call a request stands for
pub async fn execute(api: &dyn RecordApi, request: MutationRequest) -> MutationOutcome {
    let MutationRequest { session, mutation } = request;
    let target = mutation.target();
    let verb = mutation.verb();

    let result = match mutation {
        Mutation::Create { fields, image } => api
            .create(&fields, image.as_ref())
            .await
            .map(upsert_or_unknown),
        Mutation::Update { id, fields, image } => api
            .update(id, &fields, image.as_ref())
            .await
            .map(upsert_or_unknown),
        Mutation::Remove { id } => api.remove(id).await.map(|()| Reconciliation::Removed(id)),
    };

    MutationOutcome {
        session,
        target,
        verb,
        result,
    }
}

fn upsert_or_unknown(echo: Option<Record>) -> Reconciliation {
    echo.map(Reconciliation::Upsert).unwrap_or(Reconciliation::Unknown)
}

#[cfg(test)]
impl MutationGateway {
    fn is_in_flight(&self, target: MutationTarget) -> bool {
        self.in_flight.contains(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeRecordApi;
    use crate::state::data::fixtures::{ada, alan, katherine_draft};
    use crate::state::data::Field;

    async fn loaded_store(api: &FakeRecordApi) -> RecordStore {
        let mut store = RecordStore::new();
        store.load_from(api).await.unwrap();
        store
    }

    fn fill(dialog: &mut DialogCoordinator) {
        let draft = katherine_draft();
        for field in Field::ALL {
            dialog.set_field(field, draft.get(field).to_string()).unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_success_closes_and_requests_refresh() {
        let api = FakeRecordApi::with_records(vec![ada()]);
        let mut store = loaded_store(&api).await;
        let mut dialog = DialogCoordinator::new();
        let mut gateway = MutationGateway::default();

        dialog.open_add().unwrap();
        fill(&mut dialog);
        let request = gateway.prepare(&mut dialog).unwrap();
        assert!(gateway.is_in_flight(MutationTarget::NewRecord));

        let outcome = execute(&api, request).await;
        let refresh = gateway.reconcile(outcome, &mut dialog, &mut store);

        assert!(refresh);
        assert_eq!(dialog.state(), &DialogState::Closed);
        assert!(gateway.in_flight.is_empty());
        assert!(store.records().iter().any(|r| r.first_name == "Katherine" && r.id == 2));
    }

    #[tokio::test]
    async fn test_update_sends_target_id() {
        let api = FakeRecordApi::with_records(vec![ada(), alan()]);
        let mut store = loaded_store(&api).await;
        let mut dialog = DialogCoordinator::new();
        let mut gateway = MutationGateway::default();

        dialog.open_edit(alan()).unwrap();
        dialog.set_field(Field::City, "Wilmslow".to_string()).unwrap();
        let request = gateway.prepare(&mut dialog).unwrap();
        assert!(matches!(request.mutation, Mutation::Update { id: 2, .. }));

        let outcome = execute(&api, request).await;
        gateway.reconcile(outcome, &mut dialog, &mut store);

        assert_eq!(store.get(2).map(|r| r.city.as_str()), Some("Wilmslow"));
        assert!(api.calls().await.contains(&"update 2".to_string()));
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_dialog_and_list() {
        let api = FakeRecordApi::with_records(vec![ada()]);
        let mut store = loaded_store(&api).await;
        let mut dialog = DialogCoordinator::new();
        let mut gateway = MutationGateway::default();

        dialog.open_delete(ada()).unwrap();
        let request = gateway.prepare(&mut dialog).unwrap();
        api.fail_next(ClientError::Transport("connection reset".to_string())).await;
        let outcome = execute(&api, request).await;
        let refresh = gateway.reconcile(outcome, &mut dialog, &mut store);

        assert!(!refresh);
        assert_eq!(dialog.state(), &DialogState::DeleteOpen(ada()));
        assert_eq!(store.records(), &[ada()]);
        assert!(!gateway.is_in_flight(MutationTarget::Record(1)));
    }

    #[tokio::test]
    async fn test_missing_field_sends_nothing() {
        let api = FakeRecordApi::default();
        let mut dialog = DialogCoordinator::new();
        let mut gateway = MutationGateway::default();

        dialog.open_add().unwrap();
        dialog.set_field(Field::FirstName, "Katherine".to_string()).unwrap();
        let err = gateway.prepare(&mut dialog).unwrap_err();

        assert_eq!(err, ClientError::MissingField("Last Name"));
        assert_eq!(dialog.error(), Some(&err));
        assert_eq!(dialog.draft().get(Field::FirstName), "Katherine");
        assert!(gateway.in_flight.is_empty());
        assert!(api.calls().await.is_empty());
    }

    #[test]
    fn test_second_request_for_same_target_is_refused() {
        let mut dialog = DialogCoordinator::new();
        let mut gateway = MutationGateway::default();

        dialog.open_delete(ada()).unwrap();
        gateway.prepare(&mut dialog).unwrap();
        let err = gateway.prepare(&mut dialog).unwrap_err();

        assert_eq!(err, ClientError::MutationInFlight("record #1".to_string()));
    }

    #[tokio::test]
    async fn test_late_success_does_not_close_newer_dialog() {
        let api = FakeRecordApi::with_records(vec![ada(), alan()]);
        let mut store = loaded_store(&api).await;
        let mut dialog = DialogCoordinator::new();
        let mut gateway = MutationGateway::default();

        dialog.open_delete(ada()).unwrap();
        let request = gateway.prepare(&mut dialog).unwrap();
        dialog.cancel();
        dialog.open_edit(alan()).unwrap();

        let outcome = execute(&api, request).await;
        let refresh = gateway.reconcile(outcome, &mut dialog, &mut store);

        assert!(refresh);
        assert_eq!(dialog.state(), &DialogState::EditOpen(alan()));
        assert!(store.get(1).is_none());
    }

    #[tokio::test]
    async fn test_create_without_echo_relies_on_refresh() {
        let mut api = FakeRecordApi::with_records(vec![ada()]);
        api.echo_records = false;
        let mut store = loaded_store(&api).await;
        let mut dialog = DialogCoordinator::new();
        let mut gateway = MutationGateway::default();

        dialog.open_add().unwrap();
        fill(&mut dialog);
        let request = gateway.prepare(&mut dialog).unwrap();
        let outcome = execute(&api, request).await;
        assert_eq!(outcome.result, Ok(Reconciliation::Unknown));

        assert!(gateway.reconcile(outcome, &mut dialog, &mut store));
        assert_eq!(store.records().len(), 1);
        store.load_from(&api).await.unwrap();
        assert_eq!(store.records().len(), 2);
    }
}
