//! HTTP response building module
//!
//! One builder per terminal status. Error bodies never disclose filesystem
//! details; a builder failure degrades to an empty response rather than a
//! panic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Headers shared by full and partial file responses.
#[derive(Debug)]
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub cache_control: &'a str,
    pub last_modified: &'a str,
}

/// 200 (or the caller's status) with the full body and caching metadata.
pub fn build_file_response(
    data: Bytes,
    headers: &FileHeaders<'_>,
    status: StatusCode,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(status)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", headers.etag)
        .header("Cache-Control", headers.cache_control)
        .header("Last-Modified", headers.last_modified)
        .body(Full::new(body))
        .unwrap_or_else(|e| fallback("file", &e))
}

/// 206 Partial Content for an already-sliced body.
pub fn build_partial_response(
    data: Bytes,
    headers: &FileHeaders<'_>,
    start: usize,
    end: usize,
    total: usize,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = end - start + 1;
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(206)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", headers.etag)
        .header("Cache-Control", headers.cache_control)
        .header("Last-Modified", headers.last_modified)
        .body(Full::new(body))
        .unwrap_or_else(|e| fallback("206", &e))
}

/// 200 directory listing. Listings are regenerated per request, so clients
/// are told not to store them.
pub fn build_listing_response(html: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = html.len();
    let body = if is_head { Bytes::new() } else { Bytes::from(html) };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .header("Cache-Control", "no-store")
        .body(Full::new(body))
        .unwrap_or_else(|e| fallback("listing", &e))
}

/// 301 Moved Permanently. `location` must already carry the query string.
pub fn build_redirect_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(301)
        .header("Location", location)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("Moved Permanently")))
        .unwrap_or_else(|e| fallback("301", &e))
}

/// 304 Not Modified, echoing the `ETag` the match was made against.
pub fn build_304_response(etag: &str, cache_control: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("ETag", etag)
        .header("Cache-Control", cache_control)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| fallback("304", &e))
}

/// 404 Not Found (plain; the custom error page path does not come here).
pub fn build_404_response() -> Response<Full<Bytes>> {
    plain(StatusCode::NOT_FOUND, "404 Not Found")
}

/// 403 Forbidden.
pub fn build_403_response() -> Response<Full<Bytes>> {
    plain(StatusCode::FORBIDDEN, "403 Forbidden")
}

/// 500 Internal Server Error. Details stay in the log.
pub fn build_500_response() -> Response<Full<Bytes>> {
    plain(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// 416 Range Not Satisfiable.
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| fallback("416", &e))
}

fn plain(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| fallback(status.as_str(), &e))
}

fn fallback(what: &str, error: &hyper::http::Error) -> Response<Full<Bytes>> {
    tracing::error!(response = what, error = %error, "failed to build response");
    Response::new(Full::new(Bytes::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_carries_location() {
        let resp = build_redirect_response("/sub/?x=1");
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["Location"], "/sub/?x=1");
    }

    #[test]
    fn head_keeps_length_but_drops_body() {
        let headers = FileHeaders {
            content_type: "text/plain; charset=utf-8",
            etag: "\"t\"",
            cache_control: "max-age=86400",
            last_modified: "Tue, 02 Jan 2024 03:04:05 GMT",
        };
        let resp = build_file_response(Bytes::from("hello"), &headers, StatusCode::OK, true);
        assert_eq!(resp.headers()["Content-Length"], "5");
    }

    #[test]
    fn partial_response_describes_the_slice() {
        let headers = FileHeaders {
            content_type: "application/octet-stream",
            etag: "\"t\"",
            cache_control: "max-age=86400",
            last_modified: "Tue, 02 Jan 2024 03:04:05 GMT",
        };
        let resp = build_partial_response(Bytes::from("ab"), &headers, 0, 1, 10, false);
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["Content-Range"], "bytes 0-1/10");
        assert_eq!(resp.headers()["Content-Length"], "2");
    }

    #[test]
    fn error_bodies_stay_generic() {
        assert_eq!(build_403_response().status(), 403);
        assert_eq!(build_404_response().status(), 404);
        assert_eq!(build_500_response().status(), 500);
        assert_eq!(build_416_response(10).headers()["Content-Range"], "bytes */10");
    }
}
