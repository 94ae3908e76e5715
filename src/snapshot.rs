extern crate serde;
extern crate serde_json;

use crate::result;

use serde::de::{Deserializer, MapAccess, Visitor};

// Shape of the /page-info/ response:
// {
//   "time": "3:42 p.m.", "date": "2024-1-1", "today": "Monday",
//   "north_station": { "<trip id>": {departure_time, headsign, ...}, ... } | null,
//   "south_station": { ... } | null
// }

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    pub time: String,
    pub date: String,
    pub today: String,

    #[serde(default, deserialize_with = "deserialize_station")]
    pub north_station: Option<Vec<(String, Prediction)>>,

    #[serde(default, deserialize_with = "deserialize_station")]
    pub south_station: Option<Vec<(String, Prediction)>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub departure_time: String,
    pub headsign: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub train_number: String,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub platform_code: Option<String>,
    pub status: String,
}

pub fn parse_snapshot(body: &str) -> result::CommuterResult<Snapshot> {
    let snapshot: Snapshot = serde_json::from_str(body)?;
    return Ok(snapshot);
}

// Keeps the keys in the order the server wrote them. A HashMap (or
// BTreeMap) would reorder the departure board.
struct OrderedPredictions;

impl<'de> Visitor<'de> for OrderedPredictions {
    type Value = Option<Vec<(String, Prediction)>>;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        return write!(f, "null or an object of predictions");
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        return Ok(None);
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        return Ok(None);
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        return deserializer.deserialize_any(OrderedPredictions);
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let mut predictions = Vec::with_capacity(map.size_hint().unwrap_or(0));
        // A repeated key keeps its first position and takes the later value.
        while let Some((key, prediction)) = map.next_entry::<String, Prediction>()? {
            match predictions.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = prediction,
                None => predictions.push((key, prediction)),
            }
        }
        return Ok(Some(predictions));
    }
}

fn deserialize_station<'de, D>(deserializer: D) -> Result<Option<Vec<(String, Prediction)>>, D::Error>
where D: Deserializer<'de> {
    return deserializer.deserialize_option(OrderedPredictions);
}

// Train numbers and track codes come through as strings from the MBTA, but
// nothing stops the server from handing us a bare number.
fn scalar_text<E: serde::de::Error>(value: serde_json::Value) -> Result<Option<String>, E> {
    match value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::String(s) => return Ok(Some(s)),
        serde_json::Value::Number(n) => return Ok(Some(n.to_string())),
        other => return Err(E::custom(format!("expected a string or number, got {}", other))),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    let value: serde_json::Value = serde::Deserialize::deserialize(deserializer)?;
    return scalar_text::<D::Error>(value)?
        .ok_or_else(|| <D::Error as serde::de::Error>::custom("unexpected null"));
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let value: serde_json::Value = serde::Deserialize::deserialize(deserializer)?;
    return scalar_text::<D::Error>(value);
}
