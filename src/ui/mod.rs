/// UI components
///
/// Views receive only the props the desk hands out and emit `Message`s:
/// - `list.rs` - search box, add button and the record table
/// - `form.rs` - add/edit dialog with photo upload
/// - `confirm.rs` - delete confirmation dialog

pub mod confirm;
pub mod form;
pub mod list;

use iced::widget::{center, container, mouse_area, opaque, stack, text};
use iced::{Color, Element};

use crate::error::ClientError;

/// Lay `content` over `base` with a dimmed backdrop; clicking the backdrop sends `on_blur`
pub fn modal<'a, Message>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Message,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    stack![
        base.into(),
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| {
                container::Style {
                    background: Some(
                        Color {
                            a: 0.8,
                            ..Color::BLACK
                        }
                        .into(),
                    ),
                    ..container::Style::default()
                }
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}

/// One-line failure indicator
pub fn error_line<'a, Message: 'a>(error: Option<&ClientError>) -> Option<Element<'a, Message>> {
    error.map(|e| {
        text(format!("⚠️  {}: {e}", e.kind().label()))
            .size(14)
            .style(text::danger)
            .into()
    })
}
