/// Record table with search and per-row actions
use iced::widget::{button, column, container, image, row, scrollable, text, text_input, Column};
use iced::{Alignment, Element, Length};

use super::error_line;
use crate::state::data::Record;
use crate::state::desk::ListProps;
use crate::state::photos::PhotoCache;
use crate::state::Event;
use crate::Message;

const AVATAR_SIZE: f32 = 40.0;

/// Build the main list view
pub fn view<'a>(props: ListProps<'a>) -> Element<'a, Message> {
    let toolbar = row![
        text_input("Search records...", props.query)
            .on_input(|query| Message::Desk(Event::QueryChanged(query)))
            .padding(10)
            .width(Length::Fill),
        button("Add Person")
            .on_press(Message::Desk(Event::OpenAdd))
            .padding(10),
        button("Reload")
            .on_press(Message::Desk(Event::Reload))
            .padding(10)
            .style(button::secondary),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let header = row![
        text("Photo").width(Length::Fixed(60.0)),
        text("Full Name").width(Length::FillPortion(3)),
        text("Date of Birth").width(Length::FillPortion(2)),
        text("Place of Birth").width(Length::FillPortion(4)),
        text("Actions").width(Length::Fixed(150.0)),
    ]
    .spacing(10);

    let body: Element<'a, Message> = if props.loading && props.records.is_empty() {
        container(text("Loading..."))
            .center_x(Length::Fill)
            .padding(20)
            .into()
    } else if props.records.is_empty() {
        container(text("No records found."))
            .center_x(Length::Fill)
            .padding(20)
            .into()
    } else {
        let rows = props
            .records
            .iter()
            .map(|record| record_row(record, props.photos));
        scrollable(Column::with_children(rows).spacing(6)).into()
    };

    let mut content = column![
        text("Personal Information").size(32),
        text("Manage personal records").size(16),
        toolbar,
    ]
    .spacing(16)
    .padding(30);

    for line in [props.error, props.notice].into_iter().filter_map(error_line) {
        content = content.push(line);
    }

    content.push(header).push(body).into()
}

/// One table row
fn record_row<'a>(record: &Record, photos: &PhotoCache) -> Element<'a, Message> {
    let avatar: Element<'a, Message> = match photos.get(record) {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(AVATAR_SIZE))
            .height(Length::Fixed(AVATAR_SIZE))
            .into(),
        None => text(record.initials()).into(),
    };

    row![
        container(avatar).width(Length::Fixed(60.0)),
        text(record.full_name()).width(Length::FillPortion(3)),
        text(record.birth_date_label()).width(Length::FillPortion(2)),
        text(record.place_of_birth()).width(Length::FillPortion(4)),
        row![
            button("Edit")
                .on_press(Message::Desk(Event::OpenEdit(record.id)))
                .style(button::secondary),
            button("Delete")
                .on_press(Message::Desk(Event::OpenDelete(record.id)))
                .style(button::danger),
        ]
        .spacing(6)
        .width(Length::Fixed(150.0)),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}
