extern crate serde_json;
extern crate tiny_http;

use crate::board;
use crate::result;

pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

pub fn run_board_server(port: u16, board: board::SharedBoard) -> result::CommuterResult<std::thread::JoinHandle<()>> {
    let server = tiny_http::Server::http(("0.0.0.0", port))
        .map_err(|err| result::make_error(&format!("Couldn't listen on port {}: {}", port, err)))?;

    info!("Serving board on port {}", port);
    return serve(server, board);
}

pub fn serve(server: tiny_http::Server, board: board::SharedBoard) -> result::CommuterResult<std::thread::JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("board-server".to_string())
        .spawn(move || {
            for request in server.incoming_requests() {
                let reply = {
                    let board = board.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    route(request.method(), request.url(), &board)
                };
                debug!("{} {} -> {}", request.method(), request.url(), reply.status);

                let mut response = tiny_http::Response::from_string(reply.body)
                    .with_status_code(reply.status);
                if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
                    response = response.with_header(header);
                }
                if let Err(err) = request.respond(response) {
                    warn!("Error writing response: {}", err);
                }
            }
        })?;

    return Ok(handle);
}

pub fn route(method: &tiny_http::Method, url: &str, board: &board::Board) -> Reply {
    let path = url.splitn(2, '?').next().unwrap_or("");

    match (method, path) {
        (&tiny_http::Method::Get, "/") => {
            return Reply{
                status: 200,
                content_type: "text/html; charset=utf-8",
                body: board.to_html(),
            };
        },
        (&tiny_http::Method::Get, "/board.json") => {
            match serde_json::to_string_pretty(&board.summary()) {
                Ok(body) => return Reply{
                    status: 200,
                    content_type: "application/json",
                    body: body,
                },
                Err(err) => return Reply{
                    status: 500,
                    content_type: "text/plain; charset=utf-8",
                    body: format!("{}", err),
                },
            }
        },
        (_, _) => {
            return Reply{
                status: 404,
                content_type: "text/html; charset=utf-8",
                body: "<h1>404</h1><p>Not found!<p>".to_string(),
            };
        },
    }
}
