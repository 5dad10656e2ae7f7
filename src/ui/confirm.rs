use iced::widget::{button, column, container, row, text};
use iced::{Element, Length};

use super::error_line;
use crate::state::desk::DeleteProps;
use crate::state::Event;
use crate::Message;

/// Delete confirmation for one record
pub fn view<'a>(props: DeleteProps<'a>) -> Element<'a, Message> {
    let actions = row![
        button("Cancel")
            .on_press(Message::Desk(Event::Cancel))
            .style(button::secondary),
        button("Delete")
            .on_press_maybe((!props.submitting).then_some(Message::Desk(Event::ConfirmDelete)))
            .style(button::danger),
    ]
    .spacing(8);

    let mut content = column![
        text("Confirm Delete").size(24),
        text(format!(
            "Are you sure you want to delete the record for {}? This action cannot be undone.",
            props.display_name
        )),
    ]
    .spacing(16);

    if let Some(line) = error_line(props.error) {
        content = content.push(line);
    }

    container(content.push(container(actions).align_right(Length::Fill)))
        .width(Length::Fixed(400.0))
        .padding(20)
        .style(container::rounded_box)
        .into()
}
