extern crate reqwest;

use crate::result;

pub const PAGE_INFO_PATH: &'static str = "page-info/";
pub const CSRF_HEADER: &'static str = "X-CSRFToken";
const USER_AGENT: &'static str = concat!("commuter-board/", env!("CARGO_PKG_VERSION"));

// What the landing page hands a fresh client: its cookies and its markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    pub cookie_header: String,
    pub html: String,
}

pub trait PageInfoSource {
    fn bootstrap(&self) -> result::CommuterResult<Bootstrap>;
    fn fetch_page_info(&self, token: &str) -> result::CommuterResult<String>;
}

pub struct HttpClient {
    client: reqwest::blocking::Client,
    jar: std::sync::Arc<reqwest::cookie::Jar>,
    base_url: reqwest::Url,
    page_info_url: reqwest::Url,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> result::CommuterResult<HttpClient> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let base_url = reqwest::Url::parse(&base).map_err(|err| {
            result::CommuterError::ConfigError(format!("Bad base url '{}': {}", base, err))
        })?;
        let page_info_url = base_url.join(PAGE_INFO_PATH).map_err(|err| {
            result::CommuterError::ConfigError(format!("Bad base url '{}': {}", base, err))
        })?;

        let jar = std::sync::Arc::new(reqwest::cookie::Jar::default());
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(jar.clone())
            .timeout(timeout)
            .build()?;

        return Ok(HttpClient{
            client: client,
            jar: jar,
            base_url: base_url,
            page_info_url: page_info_url,
        });
    }

    fn cookie_header(&self) -> String {
        use reqwest::cookie::CookieStore;

        return self.jar.cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(|s| s.to_string()))
            .unwrap_or("".to_string());
    }
}

impl PageInfoSource for HttpClient {
    fn bootstrap(&self) -> result::CommuterResult<Bootstrap> {
        debug!("Fetching {}", self.base_url);
        let response = self.client.get(self.base_url.clone())
            .header(reqwest::header::ACCEPT, "text/html")
            .send()?;

        if !response.status().is_success() {
            return Err(result::CommuterError::HttpStatusError(response.status()));
        }

        let html = response.text()?;

        return Ok(Bootstrap{
            cookie_header: self.cookie_header(),
            html: html,
        });
    }

    fn fetch_page_info(&self, token: &str) -> result::CommuterResult<String> {
        debug!("POST {}", self.page_info_url);
        let response = self.client.post(self.page_info_url.clone())
            .header(CSRF_HEADER, token)
            // Django's is_ajax() check keys off this header.
            .header("X-Requested-With", "XMLHttpRequest")
            // Required by the CSRF middleware when the site is served over https.
            .header(reqwest::header::REFERER, self.base_url.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(result::CommuterError::HttpStatusError(response.status()));
        }

        return Ok(response.text()?);
    }
}

#[cfg(test)]
mod tests {
    extern crate tiny_http;

    use super::{HttpClient, PageInfoSource};
    use crate::result::CommuterError;

    struct SeenRequest {
        method: String,
        url: String,
        csrf_header: Option<String>,
        ajax_header: Option<String>,
        cookie_header: Option<String>,
    }

    fn header_value(request: &tiny_http::Request, name: &'static str) -> Option<String> {
        return request.headers().iter()
            .find(|h| h.field.equiv(name))
            .map(|h| h.value.as_str().to_string());
    }

    // Serves the landing page (setting the csrftoken cookie) and then answers
    // one /page-info/ POST with `page_info_status`.
    fn fake_site(page_info_status: u16) -> (String, std::sync::mpsc::Receiver<SeenRequest>) {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind fake server");
        let port = server.server_addr().to_ip().expect("ip listener").port();
        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            for _ in 0..2 {
                let request = match server.recv() {
                    Ok(r) => r,
                    Err(_) => return,
                };
                let seen = SeenRequest{
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    csrf_header: header_value(&request, "X-CSRFToken"),
                    ajax_header: header_value(&request, "X-Requested-With"),
                    cookie_header: header_value(&request, "Cookie"),
                };
                let is_page_info = seen.url == "/page-info/";
                let _ = tx.send(seen);

                if is_page_info {
                    let body = std::fs::read_to_string("testdata/page_info.json")
                        .expect("Error reading page_info.json");
                    let _ = request.respond(
                        tiny_http::Response::from_string(body).with_status_code(page_info_status));
                } else {
                    let html = std::fs::read_to_string("testdata/index.html")
                        .expect("Error reading index.html");
                    let cookie = tiny_http::Header::from_bytes(
                        &b"Set-Cookie"[..], &b"csrftoken=cookie-token-42; Path=/"[..])
                        .expect("header");
                    let _ = request.respond(
                        tiny_http::Response::from_string(html).with_header(cookie));
                }
            }
        });

        return (format!("http://127.0.0.1:{}", port), rx);
    }

    #[test]
    fn bootstrap_then_post() {
        let (base_url, seen) = fake_site(200);
        let client = HttpClient::new(&base_url, std::time::Duration::from_secs(5))
            .expect("client");

        let bootstrap = client.bootstrap().expect("bootstrap");
        assert!(bootstrap.cookie_header.contains("csrftoken=cookie-token-42"),
                "{}", bootstrap.cookie_header);
        assert!(bootstrap.html.contains("id=\"cookieToken\""));

        let body = client.fetch_page_info("cookie-token-42").expect("fetch_page_info");
        assert!(body.contains("north_station"));

        let landing = seen.recv().expect("landing request");
        assert_eq!("GET", landing.method);
        assert_eq!("/", landing.url);

        let poll = seen.recv().expect("poll request");
        assert_eq!("POST", poll.method);
        assert_eq!("/page-info/", poll.url);
        assert_eq!(Some("cookie-token-42".to_string()), poll.csrf_header);
        assert_eq!(Some("XMLHttpRequest".to_string()), poll.ajax_header);
        assert!(poll.cookie_header.unwrap_or_default().contains("csrftoken=cookie-token-42"));
    }

    #[test]
    fn non_success_status_is_an_error() {
        let (base_url, _seen) = fake_site(403);
        let client = HttpClient::new(&base_url, std::time::Duration::from_secs(5))
            .expect("client");

        client.bootstrap().expect("bootstrap");
        match client.fetch_page_info("") {
            Err(CommuterError::HttpStatusError(status)) => assert_eq!(403, status.as_u16()),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn hung_request_is_cut_off_by_timeout() {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind fake server");
        let port = server.server_addr().to_ip().expect("ip listener").port();

        // Accept the poll and sit on it without ever answering.
        std::thread::spawn(move || {
            if let Ok(request) = server.recv() {
                std::thread::sleep(std::time::Duration::from_secs(5));
                drop(request);
            }
        });

        let client = HttpClient::new(&format!("http://127.0.0.1:{}", port),
                                     std::time::Duration::from_millis(200))
            .expect("client");

        let started = std::time::Instant::now();
        match client.fetch_page_info("tok") {
            Err(CommuterError::HttpError(_)) => {},
            other => panic!("expected http error, got {:?}", other),
        }
        assert!(started.elapsed() < std::time::Duration::from_millis(1500),
                "took {:?}", started.elapsed());
    }

    #[test]
    fn bad_base_url_is_config_error() {
        match HttpClient::new("not a url", std::time::Duration::from_secs(5)) {
            Err(CommuterError::ConfigError(_)) => {},
            Err(other) => panic!("expected config error, got {:?}", other),
            Ok(_) => panic!("expected config error"),
        }
    }
}
