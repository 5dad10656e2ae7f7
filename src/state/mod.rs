/// State management module
///
/// This module owns all client-side state, including:
/// - Record, form and wire data structures (data.rs)
/// - The record list as last read from the server (store.rs)
/// - Search over the list (search.rs)
/// - Photo previews waiting to be submitted (staging.rs)
/// - Stored photos fetched for display (photos.rs)
/// - Which dialog is open and for which record (dialog.rs)
/// - Create/update/delete requests and their reconciliation (gateway.rs)
/// - The desk that wires all of the above to UI events (desk.rs)

pub mod data;
pub mod desk;
pub mod dialog;
pub mod gateway;
pub mod photos;
pub mod search;
pub mod staging;
pub mod store;

pub use desk::{Desk, Effect, Event};
