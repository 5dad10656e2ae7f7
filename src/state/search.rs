use super::data::Record;

/// Records whose first name, last name or city contains `query`, ignoring case.
///
/// Order follows `records`; an empty query keeps everything.
pub fn filter<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }

    records
        .iter()
        .filter(|record| {
            [&record.first_name, &record.last_name, &record.city]
                .iter()
                .any(|value| value.to_lowercase().contains(&needle))
        })
        .collect()
}
