extern crate scraper;
extern crate urlencoding;

pub const COOKIE_NAME: &'static str = "csrftoken";
pub const FALLBACK_ELEMENT_ID: &'static str = "cookieToken";

// Cookie first; the page echoes the token into a hidden element for clients
// that refuse cookies.
pub fn acquire(cookie_header: &str, html: &str, cookie_name: &str, element_id: &str) -> String {
    let from_cookie = cookie_value(cookie_header, cookie_name);
    if !from_cookie.is_empty() {
        debug!("Using CSRF token from cookie '{}'", cookie_name);
        return from_cookie;
    }

    let from_element = element_text(html, element_id);
    if !from_element.is_empty() {
        debug!("Cookie '{}' missing, using token from #{}", cookie_name, element_id);
        return from_element;
    }

    warn!("No CSRF token in cookie '{}' or element #{}, continuing without one",
          cookie_name, element_id);
    return "".to_string();
}

// Parses a "k1=v1; k2=v2" cookie string.
pub fn cookie_value(cookie_header: &str, name: &str) -> String {
    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next().unwrap_or("");
        if key == name {
            let raw = parts.next().unwrap_or("");
            return String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).to_string();
        }
    }
    return "".to_string();
}

// Text content of the element with the given id. Form fields carry the
// token in `value` rather than as text.
pub fn element_text(html: &str, id: &str) -> String {
    use scraper::{Html, Selector};

    let selector = match Selector::parse(&format!("#{}", id)) {
        Ok(selector) => selector,
        Err(err) => {
            error!("Bad element id '{}': {}", id, err);
            return "".to_string();
        }
    };

    let document = Html::parse_document(html);
    let element = match document.select(&selector).next() {
        Some(element) => element,
        None => return "".to_string(),
    };

    let text = element.text().collect::<String>().trim().to_string();
    if !text.is_empty() {
        return text;
    }
    return element.value().attr("value").unwrap_or("").trim().to_string();
}
