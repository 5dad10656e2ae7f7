/// Add/edit dialog
///
/// Shows the staged preview first, then the record's stored photo.
use iced::widget::{button, column, container, image, row, scrollable, text, text_input, Column};
use iced::{Alignment, Element, Length};

use super::error_line;
use crate::state::data::Field;
use crate::state::desk::FormProps;
use crate::state::Event;
use crate::Message;

const AVATAR_SIZE: f32 = 100.0;

pub fn view<'a>(props: FormProps<'a>) -> Element<'a, Message> {
    let title = if props.target.is_some() {
        "Edit Person"
    } else {
        "Add New Person"
    };

    // staged preview first, then the stored photo, then initials
    let shown = props.preview.map(|preview| &preview.handle).or(props.photo);
    let avatar: Element<'a, Message> = match (shown, props.target) {
        (Some(handle), _) => image(handle.clone())
            .width(Length::Fixed(AVATAR_SIZE))
            .height(Length::Fixed(AVATAR_SIZE))
            .into(),
        (None, Some(record)) => text(record.initials()).size(32).into(),
        (None, None) => text("UP").size(32).into(),
    };

    let upload_label = match (props.decoding, props.target.is_some()) {
        (true, _) => "Decoding...",
        (false, true) => "Update Photo",
        (false, false) => "Upload Photo",
    };

    let photo = column![
        avatar,
        button(upload_label)
            .on_press(Message::PickImage)
            .style(button::secondary),
    ]
    .spacing(10)
    .align_x(Alignment::Center);

    let inputs: Vec<Element<'a, Message>> = Field::ALL
        .into_iter()
        .map(|field| {
            let mut entry = column![text(field.label()).size(14)].spacing(4);
            let placeholder = match field {
                Field::DateOfBirth => "YYYY-MM-DD",
                _ => "",
            };
            entry = entry.push(
                text_input(placeholder, props.draft.get(field))
                    .on_input(move |value| Message::Desk(Event::FieldChanged(field, value)))
                    .on_submit(Message::Desk(Event::Submit))
                    .padding(8),
            );
            if let Some(e) = props.error {
                for message in e.field_messages(field.form_name()) {
                    entry = entry.push(text(message.clone()).size(12).style(text::danger));
                }
            }
            entry.into()
        })
        .collect();

    let save_label = if props.target.is_some() {
        "Save Changes"
    } else {
        "Save"
    };
    let actions = row![
        button("Cancel")
            .on_press(Message::Desk(Event::Cancel))
            .style(button::secondary),
        button(save_label).on_press_maybe(
            (!props.submitting && !props.decoding).then_some(Message::Desk(Event::Submit))
        ),
    ]
    .spacing(8);

    let mut content = column![
        text(title).size(24),
        container(photo).center_x(Length::Fill),
        Column::with_children(inputs).spacing(12),
    ]
    .spacing(20);

    if let Some(line) = error_line(props.error) {
        content = content.push(line);
    }
    content = content.push(container(actions).align_right(Length::Fill));

    container(scrollable(content.padding(10)))
        .width(Length::Fixed(480.0))
        .max_height(720.0)
        .padding(20)
        .style(container::rounded_box)
        .into()
}
