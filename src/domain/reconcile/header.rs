/// Accepted meter id column names, highest priority first.
pub const METER_ID_HEADERS: [&str; 5] = ["meter_id", "meter id", "meterid", "id", "meter"];

/// Finds the column holding meter ids. Synonym priority wins over header
/// order: with headers `["id", "meter_id"]` the result is `"meter_id"`.
pub fn find_meter_id_column<S: AsRef<str>>(headers: &[S]) -> Option<&str> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|header| header.as_ref().trim().to_lowercase())
        .collect();

    METER_ID_HEADERS.iter().find_map(|synonym| {
        normalized
            .iter()
            .position(|header| header == synonym)
            .map(|idx| headers[idx].as_ref())
    })
}

pub fn accepted_headers_label() -> String {
    METER_ID_HEADERS.join(", ")
}
