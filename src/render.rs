use crate::board;
use crate::snapshot;

pub const PLATFORM_PLACEHOLDER: &'static str = "TBD";

pub fn render_row(prediction: &snapshot::Prediction) -> String {
    let platform_code = prediction.platform_code.as_ref()
        .map(String::as_str)
        .unwrap_or(PLATFORM_PLACEHOLDER);

    let cells = [
        prediction.departure_time.as_str(),
        prediction.headsign.as_str(),
        prediction.train_number.as_str(),
        platform_code,
        prediction.status.as_str(),
    ];

    let mut row = "<tr>".to_string();
    for cell in cells.iter() {
        row.push_str("<td>");
        row.push_str(&escape_html(cell));
        row.push_str("</td>");
    }
    row.push_str("</tr>");
    return row;
}

pub fn render_table_body(predictions: &[(String, snapshot::Prediction)]) -> String {
    return predictions.iter()
        .map(|(_, prediction)| render_row(prediction))
        .collect::<Vec<String>>()
        .join("");
}

// All the region writes for one snapshot, computed up front so the board can
// take them in a single update. Stations the server left out (or sent as
// null) produce no write and keep whatever was showing before.
// Text fields are escaped here, unlike a raw innerHTML assignment, so markup
// in a payload shows up as text instead of being interpreted.
pub fn region_updates(snapshot: &snapshot::Snapshot) -> Vec<(&'static str, String)> {
    let mut updates = vec![
        (board::TIME_ID, escape_html(&snapshot.time)),
        (board::DATE_ID, escape_html(&snapshot.date)),
        (board::TODAY_ID, escape_html(&snapshot.today)),
    ];

    if let Some(ref north) = snapshot.north_station {
        updates.push((board::NORTH_STATION_BODY_ID, render_table_body(north)));
    }

    if let Some(ref south) = snapshot.south_station {
        updates.push((board::SOUTH_STATION_BODY_ID, render_table_body(south)));
    }

    return updates;
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    return escaped;
}
