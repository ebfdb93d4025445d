use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn response(status: u16, content_type: &[u8], body: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = body.len();
    let mut headers = vec![Header::from_bytes(b"Cache-Control", b"no-store").unwrap()];
    headers.push(Header::from_bytes(b"Content-Type", content_type).unwrap());
    Response::new(StatusCode(status), headers, Cursor::new(body), Some(len), None)
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    response(200, b"text/html; charset=utf-8", body.into_bytes())
}

pub fn json_response(value: &serde_json::Value) -> Response<Cursor<Vec<u8>>> {
    response(200, b"application/json", value.to_string().into_bytes())
}

pub fn json_error(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    response(status, b"application/json", body.into_bytes())
}

pub fn png_response(bytes: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    response(200, b"image/png", bytes)
}

pub fn json_download_response(body: String, filename: &str) -> Response<Cursor<Vec<u8>>> {
    let mut resp = response(200, b"application/json", body.into_bytes());
    let disposition = format!("attachment; filename=\"{}\"", filename);
    if let Ok(header) = Header::from_bytes(&b"Content-Disposition"[..], disposition.as_bytes()) {
        resp.add_header(header);
    }
    resp
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    response(404, b"text/plain", b"404 Not Found".to_vec())
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("").to_owned();

    let response = match (method, path.as_str()) {
        (Method::Get,  "/")                 => handlers::handle_index(),
        (Method::Get,  "/status")           => handlers::handle_status(&state),
        (Method::Get,  "/sample/train.png") => handlers::handle_sample(&state, handlers::SampleKind::Train),
        (Method::Get,  "/sample/test.png")  => handlers::handle_sample(&state, handlers::SampleKind::Test),
        (Method::Post, "/guess")            => handlers::handle_guess(&mut request, &state),
        (Method::Post, "/pause")            => handlers::handle_pause(&state, true),
        (Method::Post, "/continue")         => handlers::handle_pause(&state, false),
        (Method::Post, "/save")             => handlers::handle_save(&state),
        (Method::Get,  "/model.json")       => handlers::handle_download(&state),
        _ => not_found(),
    };

    let _ = request.respond(response);
}
