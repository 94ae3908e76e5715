extern crate chrono;
extern crate chrono_tz;

use crate::render;

pub const TIME_ID: &'static str = "time";
pub const DATE_ID: &'static str = "date";
pub const TODAY_ID: &'static str = "today";
pub const NORTH_STATION_BODY_ID: &'static str = "northStationBody";
pub const SOUTH_STATION_BODY_ID: &'static str = "southStationBody";
pub const COOKIE_TOKEN_ID: &'static str = "cookieToken";

pub type SharedBoard = std::sync::Arc<std::sync::Mutex<Board>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    regions: std::collections::BTreeMap<&'static str, String>,

    pub successful_polls: u64,
    pub failed_polls: u64,
    pub last_refreshed: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
}

#[derive(Serialize)]
pub struct BoardSummary {
    pub regions: std::collections::BTreeMap<String, String>,
    pub successful_polls: u64,
    pub failed_polls: u64,
    pub last_refreshed: Option<String>,
    pub last_error: Option<String>,
}

impl Board {
    pub fn empty() -> Board {
        let mut regions = std::collections::BTreeMap::new();
        for id in &[TIME_ID, DATE_ID, TODAY_ID, NORTH_STATION_BODY_ID, SOUTH_STATION_BODY_ID, COOKIE_TOKEN_ID] {
            regions.insert(*id, "".to_string());
        }

        return Board{
            regions: regions,
            successful_polls: 0,
            failed_polls: 0,
            last_refreshed: None,
            last_error: None,
        };
    }

    pub fn shared(self) -> SharedBoard {
        return std::sync::Arc::new(std::sync::Mutex::new(self));
    }

    pub fn element(&self, id: &str) -> Option<&str> {
        return self.regions.get(id).map(String::as_str);
    }

    pub fn set_element(&mut self, id: &'static str, inner_html: String) {
        self.regions.insert(id, inner_html);
    }

    pub fn record_refresh(&mut self, updates: Vec<(&'static str, String)>, now: chrono::DateTime<chrono::Utc>) {
        for (id, inner_html) in updates {
            self.set_element(id, inner_html);
        }
        self.successful_polls += 1;
        self.last_refreshed = Some(now);
        self.last_error = None;
    }

    pub fn record_failure(&mut self, err: &str) {
        self.failed_polls += 1;
        self.last_error = Some(err.to_string());
    }

    // The poll worked but the page couldn't be written out.
    pub fn record_output_failure(&mut self, err: &str) {
        self.last_error = Some(err.to_string());
    }

    pub fn summary(&self) -> BoardSummary {
        return BoardSummary{
            regions: self.regions.iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            successful_polls: self.successful_polls,
            failed_polls: self.failed_polls,
            last_refreshed: self.last_refreshed.map(format_refresh_time),
            last_error: self.last_error.clone(),
        };
    }

    pub fn to_html(&self) -> String {
        let region = |id: &str| self.element(id).unwrap_or("").to_string();
        let refreshed = self.last_refreshed
            .map(format_refresh_time)
            .unwrap_or("never".to_string());

        let mut page = String::new();
        page.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
        page.push_str("<title>Commuter Rail Departures</title></head><body>\n");
        page.push_str(&format!("<h1 id=\"{}\">{}</h1>\n", TODAY_ID, region(TODAY_ID)));
        page.push_str(&format!("<h2><span id=\"{}\">{}</span> <span id=\"{}\">{}</span></h2>\n",
                               DATE_ID, region(DATE_ID), TIME_ID, region(TIME_ID)));
        page.push_str(&station_table("North Station", NORTH_STATION_BODY_ID, &region(NORTH_STATION_BODY_ID)));
        page.push_str(&station_table("South Station", SOUTH_STATION_BODY_ID, &region(SOUTH_STATION_BODY_ID)));
        page.push_str(&format!("<div id=\"{}\" style=\"display: none;\">{}</div>\n",
                               COOKIE_TOKEN_ID, region(COOKIE_TOKEN_ID)));
        page.push_str(&format!("<p><small>Last refreshed {}</small></p>\n", render::escape_html(&refreshed)));
        page.push_str("</body></html>\n");
        return page;
    }
}

fn station_table(title: &str, body_id: &str, body: &str) -> String {
    return format!(
        "<h3>{}</h3>\n<table><thead><tr><th>Departure</th><th>Destination</th><th>Train</th><th>Track</th><th>Status</th></tr></thead>\n<tbody id=\"{}\">{}</tbody></table>\n",
        title, body_id, body);
}

fn format_refresh_time(t: chrono::DateTime<chrono::Utc>) -> String {
    return t.with_timezone(&chrono_tz::US::Eastern).format("%-I:%M:%S %p %Z").to_string();
}
