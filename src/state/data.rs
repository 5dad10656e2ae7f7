/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the API layer, the core state and the UI layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Represents a single personal-information record as stored on the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Server-assigned ID, unique within the list
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Calendar date; the server may append a time part, which is dropped
    #[serde(with = "birth_date")]
    pub date_of_birth: NaiveDate,
    pub city: String,
    pub state: String,
    pub country: String,
    /// Path of the uploaded photo relative to the storage folder (None if no photo)
    #[serde(default)]
    pub image: Option<String>,
}

impl Record {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Two-letter avatar fallback, e.g. "AL" for Ada Lovelace
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// "City, State, Country"
    pub fn place_of_birth(&self) -> String {
        format!("{}, {}, {}", self.city, self.state, self.country)
    }

    pub fn birth_date_label(&self) -> String {
        self.date_of_birth.format("%d %b %Y").to_string()
    }

    /// Stored photo path, if the record has a photo
    pub fn photo(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.is_empty())
    }

    /// The editable part of this record
    pub fn fields(&self) -> RecordFields {
        RecordFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            date_of_birth: self.date_of_birth,
            city: self.city.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
        }
    }
}

/// Complete set of submitted fields (everything but `id` and `image`)
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl RecordFields {
    /// Form field name/value pairs in the order the server expects them
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        Field::ALL
            .iter()
            .map(|field| {
                let value = match field {
                    Field::FirstName => self.first_name.clone(),
                    Field::LastName => self.last_name.clone(),
                    Field::Email => self.email.clone(),
                    Field::DateOfBirth => self.date_of_birth.format("%Y-%m-%d").to_string(),
                    Field::City => self.city.clone(),
                    Field::State => self.state.clone(),
                    Field::Country => self.country.clone(),
                };
                (field.form_name(), value)
            })
            .collect()
    }

    pub fn into_record(self, id: i64, image: Option<String>) -> Record {
        Record {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            date_of_birth: self.date_of_birth,
            city: self.city,
            state: self.state,
            country: self.country,
            image,
        }
    }
}

/// One editable form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    DateOfBirth,
    City,
    State,
    Country,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::DateOfBirth,
        Field::City,
        Field::State,
        Field::Country,
    ];

    /// Multipart field name on the wire
    pub fn form_name(self) -> &'static str {
        match self {
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Email => "email",
            Field::DateOfBirth => "date_of_birth",
            Field::City => "city",
            Field::State => "state",
            Field::Country => "country",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::Email => "Email",
            Field::DateOfBirth => "Date of Birth",
            Field::City => "City",
            Field::State => "State",
            Field::Country => "Country",
        }
    }
}

/// Raw text the user has typed into the form dialog.
///
/// Values are kept verbatim so a failed submit leaves them intact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    values: [String; 7],
}

impl RecordDraft {
    /// Pre-fill from an existing record (edit dialog)
    pub fn from_record(record: &Record) -> Self {
        let mut draft = Self::default();
        for (field, (_, value)) in Field::ALL.into_iter().zip(record.fields().form_pairs()) {
            draft.set(field, value);
        }
        draft
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field as usize]
    }

    pub fn set(&mut self, field: Field, value: String) {
        self.values[field as usize] = value;
    }

    /// Apply the required-field rules of the form controls.
    /// Anything beyond that is validated by the server.
    pub fn to_fields(&self) -> ClientResult<RecordFields> {
        for field in Field::ALL {
            if self.get(field).trim().is_empty() {
                return Err(ClientError::MissingField(field.label()));
            }
        }

        let raw_date = self.get(Field::DateOfBirth).trim();
        let date_of_birth = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| ClientError::InvalidDate(raw_date.to_string()))?;

        Ok(RecordFields {
            first_name: self.get(Field::FirstName).to_string(),
            last_name: self.get(Field::LastName).to_string(),
            email: self.get(Field::Email).to_string(),
            date_of_birth,
            city: self.get(Field::City).to_string(),
            state: self.get(Field::State).to_string(),
            country: self.get(Field::Country).to_string(),
        })
    }
}

/// Body of `GET /personal-information`
#[derive(Debug, Deserialize)]
pub struct RecordListEnvelope {
    pub sql_data: Vec<Record>,
}

/// Body returned by create/update: either the record itself or `{ "data": record }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecordEnvelope {
    Wrapped { data: Record },
    Bare(Record),
}

impl RecordEnvelope {
    pub fn into_record(self) -> Record {
        match self {
            RecordEnvelope::Wrapped { data } => data,
            RecordEnvelope::Bare(record) => record,
        }
    }
}

/// Dates travel as "YYYY-MM-DD"; timestamps like "1815-12-10T00:00:00.000000Z" are accepted too.
mod birth_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let day = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn ada() -> Record {
        Record {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
            city: "London".to_string(),
            state: "England".to_string(),
            country: "UK".to_string(),
            image: Some("images/ada.png".to_string()),
        }
    }

    pub fn alan() -> Record {
        Record {
            id: 2,
            first_name: "Alan".to_string(),
            last_name: "Turing".to_string(),
            email: "alan@example.com".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1912, 6, 23).unwrap(),
            city: "Maida Vale".to_string(),
            state: "England".to_string(),
            country: "UK".to_string(),
            image: None,
        }
    }

    pub fn grace() -> Record {
        Record {
            id: 3,
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1906, 12, 9).unwrap(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            country: "USA".to_string(),
            image: None,
        }
    }

    /// A filled-in form for a brand new record
    pub fn katherine_draft() -> RecordDraft {
        let mut draft = RecordDraft::default();
        draft.set(Field::FirstName, "Katherine".to_string());
        draft.set(Field::LastName, "Johnson".to_string());
        draft.set(Field::Email, "katherine@example.com".to_string());
        draft.set(Field::DateOfBirth, "1918-08-26".to_string());
        draft.set(Field::City, "White Sulphur Springs".to_string());
        draft.set(Field::State, "WV".to_string());
        draft.set(Field::Country, "USA".to_string());
        draft
    }
}
