//! Request dispatch module
//!
//! [`StaticHandler`] orchestrates resolver output into exactly one terminal
//! response per request: file bytes, a canonicalizing redirect, a generated
//! directory listing, an SPA fallback, a custom error page, or a plain
//! 404/403/500.

use crate::config::{Config, ConfigError, StaticConfig};
use crate::http::cache::{self, CacheHeaderPolicy};
use crate::http::mime::MimeTable;
use crate::http::range::{self, RangeParseResult};
use crate::http::response::{self, FileHeaders};
use crate::listing;
use crate::resolver::{self, PathResolver, Resolved};
use crate::vfs::{DirEntryInfo, FileNode, FsError, Vfs};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;

/// Per-request inputs. Only the path, query and a handful of request headers
/// matter; no body is ever consumed.
#[derive(Debug)]
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range: Option<String>,
}

impl<'a> RequestContext<'a> {
    /// Extract the fields the dispatcher consumes from a hyper request.
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        Self {
            path: req.uri().path(),
            query: req.uri().query(),
            is_head: *req.method() == Method::HEAD,
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
            range: header("range"),
        }
    }
}

/// Terminal outcome for one request. Produced by [`StaticHandler::decide`],
/// rendered once, then discarded; nothing persists across requests.
#[derive(Debug)]
pub enum ResponseDecision {
    ServeFile(FileNode),
    /// Target path without the query string; the query is re-attached
    /// verbatim at render time.
    Redirect(String),
    ServeListing(Vec<DirEntryInfo>),
    /// Serves a preconfigured file (SPA index or custom error page) with the
    /// given status in place of the resolved path.
    ServeErrorPage(PathBuf, StatusCode),
    NotFound,
    Forbidden,
    InternalError,
}

/// The request-time static content resolver. Construction validates the
/// configuration; afterwards the handler is immutable and may serve
/// concurrent requests without synchronization.
pub struct StaticHandler {
    config: StaticConfig,
    resolver: PathResolver,
    mime: MimeTable,
    cache: CacheHeaderPolicy,
    vfs: Arc<dyn Vfs>,
}

impl StaticHandler {
    /// Validate `config` against `vfs` and construct a handler. Fails with
    /// [`ConfigError`] before any traffic is accepted if the root is
    /// unavailable or a configured error page does not exist.
    pub async fn new(config: &Config, vfs: Arc<dyn Vfs>) -> Result<Self, ConfigError> {
        let config = config.validate(vfs.as_ref()).await?;
        tracing::info!(root = %config.root.display(), "static handler ready");
        Ok(Self {
            resolver: PathResolver::new(config.root.clone()),
            cache: CacheHeaderPolicy::new(config.cache_control.clone()),
            mime: MimeTable::default(),
            config,
            vfs,
        })
    }

    /// Handle one request: classify the path, then emit exactly one response.
    pub async fn handle(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        let decision = self.decide(ctx).await;
        self.render(ctx, decision).await
    }

    /// Map the request path onto a terminal [`ResponseDecision`].
    pub async fn decide(&self, ctx: &RequestContext<'_>) -> ResponseDecision {
        let path = resolver::normalize_request_path(ctx.path);
        match self.resolver.resolve(self.vfs.as_ref(), &path).await {
            Resolved::File(node) => ResponseDecision::ServeFile(node),
            Resolved::Directory(node) => self.decide_directory(&path, &node).await,
            Resolved::Missing => self.missing_fallback(),
            Resolved::PermissionDenied => ResponseDecision::Forbidden,
            Resolved::Error(detail) => {
                tracing::error!(path = %path, error = %detail, "stat failed");
                ResponseDecision::InternalError
            }
        }
    }

    async fn decide_directory(&self, path: &str, node: &FileNode) -> ResponseDecision {
        // Canonical directory URLs end in a slash.
        if !path.ends_with('/') {
            return ResponseDecision::Redirect(format!("{path}/"));
        }

        // First existing index file wins, as a redirect rather than an
        // internal serve: the resolved URL is what clients cache.
        for index in &self.config.index_files {
            match self.vfs.stat(&node.path.join(index)).await {
                Ok(n) if !n.is_dir => {
                    return ResponseDecision::Redirect(format!("{path}{index}"));
                }
                _ => {}
            }
        }

        if !self.config.directory_listing {
            // A directory with nothing to show routes like a missing path.
            return self.missing_fallback();
        }

        match self.vfs.read_dir(&node.path).await {
            Ok(mut entries) => {
                listing::sort_entries(&mut entries);
                ResponseDecision::ServeListing(entries)
            }
            Err(FsError::PermissionDenied) => ResponseDecision::Forbidden,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "directory enumeration failed");
                ResponseDecision::InternalError
            }
        }
    }

    /// Routing for paths that resolve to nothing. SPA fallback outranks the
    /// custom error page when both are configured.
    fn missing_fallback(&self) -> ResponseDecision {
        if self.config.spa_mode {
            return ResponseDecision::ServeErrorPage(
                self.config.root.join(&self.config.spa_index_file),
                StatusCode::OK,
            );
        }
        if let Some(page) = &self.config.error_page_404 {
            // The configured page fully replaces the 404 semantics; clients
            // receive it as a successful document.
            return ResponseDecision::ServeErrorPage(page.clone(), StatusCode::OK);
        }
        ResponseDecision::NotFound
    }

    async fn render(
        &self,
        ctx: &RequestContext<'_>,
        decision: ResponseDecision,
    ) -> Response<Full<Bytes>> {
        match decision {
            ResponseDecision::ServeFile(node) => {
                self.render_file(ctx, &node, StatusCode::OK).await
            }
            ResponseDecision::Redirect(target) => {
                let location = match ctx.query {
                    Some(q) if !q.is_empty() => format!("{target}?{q}"),
                    _ => target,
                };
                response::build_redirect_response(&location)
            }
            ResponseDecision::ServeListing(entries) => {
                let path = resolver::normalize_request_path(ctx.path);
                response::build_listing_response(listing::render(&path, &entries), ctx.is_head)
            }
            ResponseDecision::ServeErrorPage(path, status) => {
                match self.vfs.stat(&path).await {
                    Ok(node) => self.render_file(ctx, &node, status).await,
                    Err(e) => {
                        tracing::error!(
                            path = %path.display(),
                            error = %e,
                            "configured fallback page unavailable"
                        );
                        response::build_500_response()
                    }
                }
            }
            ResponseDecision::NotFound => response::build_404_response(),
            ResponseDecision::Forbidden => response::build_403_response(),
            ResponseDecision::InternalError => response::build_500_response(),
        }
    }

    async fn render_file(
        &self,
        ctx: &RequestContext<'_>,
        node: &FileNode,
        status: StatusCode,
    ) -> Response<Full<Bytes>> {
        let content = match self.vfs.read(&node.path).await {
            Ok(c) => c,
            Err(FsError::PermissionDenied) => return response::build_403_response(),
            Err(e) => {
                tracing::error!(path = %node.path.display(), error = %e, "read failed");
                return response::build_500_response();
            }
        };

        let etag = cache::generate_etag(&content);
        let last_modified = cache::http_date(node.modified);
        let headers = FileHeaders {
            content_type: self
                .mime
                .content_type_for(node.path.extension().and_then(|e| e.to_str())),
            cache_control: self.cache.value_for(&cache::dotted_extension(&node.path)),
            etag: &etag,
            last_modified: &last_modified,
        };

        // If-None-Match takes precedence over If-Modified-Since.
        let not_modified = cache::check_etag_match(ctx.if_none_match.as_deref(), &etag)
            || (ctx.if_none_match.is_none()
                && cache::not_modified_since(ctx.if_modified_since.as_deref(), node.modified));
        if not_modified {
            return response::build_304_response(&etag, headers.cache_control);
        }

        let total = content.len();
        match range::parse_range_header(ctx.range.as_deref(), total) {
            RangeParseResult::Valid(r) => {
                let (start, end) = (r.start, r.end_position(total));
                let body = Bytes::copy_from_slice(&content[start..=end]);
                response::build_partial_response(body, &headers, start, end, total, ctx.is_head)
            }
            RangeParseResult::NotSatisfiable => response::build_416_response(total),
            RangeParseResult::None => {
                response::build_file_response(Bytes::from(content), &headers, status, ctx.is_head)
            }
        }
    }
}
