use iced::widget::container;
use iced::{Element, Length, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod state;
mod ui;

use api::{HttpRecordApi, RecordApi};
use config::AppConfig;
use error::ClientError;
use state::{Desk, Effect, Event};

/// File types offered by the photo picker
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Main application state
struct PeopleDesk {
    /// Records, search, dialogs and mutations
    desk: Desk,
    /// The personal-information server
    api: Arc<dyn RecordApi>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// Intents and async completions handled by the desk
    Desk(Event),
    /// User clicked the photo upload button in the form dialog
    PickImage,
}

impl PeopleDesk {
    /// Create a new instance of the application and start the first load
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load();
        tracing::info!(api = %config.records_url(), storage = %config.storage_url, "people desk starting");

        let api: Arc<dyn RecordApi> = Arc::new(HttpRecordApi::new(config));
        let (desk, effects) = Desk::new();
        let app = PeopleDesk { desk, api };
        let task = app.perform(effects);

        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Desk(event) => {
                let effects = self.desk.update(event);
                self.perform(effects)
            }
            Message::PickImage => {
                // only the add/edit dialog takes a photo
                if self.desk.form_props().is_none() {
                    return Task::none();
                }

                // Show the native file picker dialog
                let file = FileDialog::new()
                    .set_title("Select a Photo")
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file();

                match file {
                    Some(path) => Task::perform(read_image_file(path), Message::Desk),
                    None => Task::none(),
                }
            }
        }
    }

    /// Run the desk's effects in the background; each one reports back as a message
    fn perform(&self, effects: Vec<Effect>) -> Task<Message> {
        Task::batch(effects.into_iter().map(|effect| {
            let api = Arc::clone(&self.api);
            Task::perform(effect.run(api), Message::Desk)
        }))
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let base = container(ui::list::view(self.desk.list_props()))
            .width(Length::Fill)
            .height(Length::Fill);

        if let Some(props) = self.desk.form_props() {
            return ui::modal(base, ui::form::view(props), Message::Desk(Event::Cancel));
        }
        if let Some(props) = self.desk.delete_props() {
            return ui::modal(base, ui::confirm::view(props), Message::Desk(Event::Cancel));
        }

        base.into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn main() -> iced::Result {
    init_tracing();

    iced::application("People Desk", PeopleDesk::update, PeopleDesk::view)
        .theme(PeopleDesk::theme)
        .centered()
        .run_with(PeopleDesk::new)
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Read a picked photo without blocking the UI
async fn read_image_file(path: PathBuf) -> Event {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "photo".to_string());

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            tracing::debug!(file = %file_name, size = bytes.len(), "photo read");
            Event::ImagePicked { file_name, bytes }
        }
        Err(e) => Event::ImageUnreadable(ClientError::Image(format!("{}: {e}", path.display()))),
    }
}
