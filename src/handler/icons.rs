//! Icon serving module
//!
//! Executes the [`Plan`] for an icon request against the configured asset
//! source: plain passthrough, or light-variant recoloring with a fallback.

use crate::config::{AppState, ColorFallback};
use crate::handler::router::RequestContext;
use crate::http;
use crate::icon::{recolor_svg, Format, IconRequest, Plan};
use crate::logger;
use crate::source::AssetError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Serve `/<filename>.<ext>[?color=...]`
pub async fn serve_icon(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let request = match IconRequest::parse(ctx.path, ctx.query) {
        Ok(request) => request,
        Err(e) => return http::build_404_response(e.message(), ctx.is_head),
    };

    match request.plan() {
        Plan::Serve { path, format } => serve_asset(ctx, state, &path, format).await,
        Plan::Recolor {
            light_path,
            plain_path,
            color,
        } => serve_recolored(ctx, state, &light_path, &plain_path, &color).await,
    }
}

/// Pass an asset through unchanged
async fn serve_asset(
    ctx: &RequestContext<'_>,
    state: &AppState,
    path: &str,
    format: Format,
) -> Response<Full<Bytes>> {
    match state.source.fetch(path).await {
        Ok(data) => http::build_asset_response(data, format.content_type(), ctx.is_head),
        Err(e) => not_found(ctx, state, &e),
    }
}

async fn serve_recolored(
    ctx: &RequestContext<'_>,
    state: &AppState,
    light_path: &str,
    plain_path: &str,
    color: &str,
) -> Response<Full<Bytes>> {
    if !state.source.exists(light_path).await {
        return match state.color_fallback {
            ColorFallback::Plain => serve_asset(ctx, state, plain_path, Format::Svg).await,
            ColorFallback::NotFound => {
                http::build_404_response(state.source.not_found_body(), ctx.is_head)
            }
        };
    }

    let svg = match state.source.fetch_text(light_path).await {
        Ok(svg) => svg,
        Err(e) => return not_found(ctx, state, &e),
    };

    let recolored = recolor_svg(&svg, color);
    logger::log_recolor(light_path, color, recolored.replaced, recolored.textual);

    http::build_asset_response(
        Bytes::from(recolored.svg),
        Format::Svg.content_type(),
        ctx.is_head,
    )
}

/// Every asset failure surfaces as the source's 404
fn not_found(
    ctx: &RequestContext<'_>,
    state: &AppState,
    error: &AssetError,
) -> Response<Full<Bytes>> {
    // Missing files are routine, only unexpected failures are worth a warning
    match error {
        AssetError::NotFound(_) | AssetError::Status { status: 404, .. } => {}
        other => logger::log_warning(&format!("{} -> 404: {other}", ctx.path)),
    }
    http::build_404_response(state.source.not_found_body(), ctx.is_head)
}

#[cfg(test)]
mod tests {
    use crate::config::{AppState, ColorFallback, Config, SourceKind};
    use crate::handler::router::respond;
    use crate::source::memory::MemorySource;
    use crate::source::{AssetSource, LocalSource};
    use http_body_util::BodyExt;
    use hyper::body::Bytes;
    use hyper::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tempdir::TempDir;

    const PLAIN_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg"><path fill="#000"/></svg>"##;
    const LIGHT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg"><path fill="#fff"/><g style="fill:#FFF;stroke:none"/></svg>"##;
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn icons(kind: SourceKind) -> MemorySource {
        MemorySource::new(kind)
            .with_file("svg/aws.svg", PLAIN_SVG)
            .with_file("svg/aws-light.svg", LIGHT_SVG)
            .with_file("svg/aws-dark.svg", PLAIN_SVG)
            .with_file("svg/plex.svg", PLAIN_SVG)
            .with_file("png/aws.png", Bytes::from_static(PNG))
            .with_file("webp/aws.webp", "RIFF")
    }

    fn state_with(source: MemorySource) -> AppState {
        let mut config = Config::load_from("does-not-exist/icons").unwrap();
        config.source.kind = source.kind();
        AppState::with_source(&config, Arc::new(source))
    }

    struct Reply {
        status: u16,
        content_type: String,
        body: Bytes,
    }

    async fn get(state: &AppState, uri: &str) -> Reply {
        let (req, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        let resp = respond(&req, state).await;
        let status = resp.status().as_u16();
        let content_type = resp.headers()["Content-Type"].to_str().unwrap().to_string();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        Reply {
            status,
            content_type,
            body,
        }
    }

    fn text(reply: &Reply) -> &str {
        std::str::from_utf8(&reply.body).unwrap()
    }

    #[tokio::test]
    async fn test_missing_extension() {
        let state = state_with(icons(SourceKind::Cdn));
        for uri in ["/aws", "/aws.", "/dir/"] {
            let reply = get(&state, uri).await;
            assert_eq!(reply.status, 404);
            assert_eq!(text(&reply), "File extension missing");
        }
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let state = state_with(icons(SourceKind::Local));
        for uri in ["/aws.jpg", "/aws.gif?color=fff", "/aws.SVGZ"] {
            let reply = get(&state, uri).await;
            assert_eq!(reply.status, 404);
            assert_eq!(text(&reply), "Format not supported");
        }
    }

    #[tokio::test]
    async fn test_png_served_verbatim() {
        let state = state_with(icons(SourceKind::Cdn));
        let reply = get(&state, "/aws.png").await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/png");
        assert_eq!(&reply.body[..], PNG);
    }

    #[tokio::test]
    async fn test_webp_ignores_color() {
        let state = state_with(icons(SourceKind::Cdn));
        let reply = get(&state, "/aws.webp?color=ff0000").await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/webp");
        assert_eq!(text(&reply), "RIFF");
    }

    #[tokio::test]
    async fn test_plain_svg() {
        let state = state_with(icons(SourceKind::Cdn));
        let reply = get(&state, "/aws.svg?color=%20").await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/svg+xml");
        assert_eq!(text(&reply), PLAIN_SVG);
    }

    #[tokio::test]
    async fn test_recolor_light_variant() {
        let state = state_with(icons(SourceKind::Cdn));
        let reply = get(&state, "/aws.svg?color=ff0000").await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/svg+xml");
        assert!(text(&reply).contains(r##"fill="#ff0000""##));
        assert!(text(&reply).contains(r##"style="fill:#ff0000;stroke:none""##));
        assert!(!text(&reply).contains(r##"fill="#fff""##));
    }

    #[tokio::test]
    async fn test_color_not_double_prefixed() {
        let state = state_with(icons(SourceKind::Local));
        let reply = get(&state, "/aws.svg?color=%2300ff00").await;
        assert_eq!(reply.status, 200);
        assert!(text(&reply).contains(r##"fill="#00ff00""##));
        assert!(!text(&reply).contains("##"));
    }

    #[tokio::test]
    async fn test_recolor_is_deterministic() {
        let state = state_with(icons(SourceKind::Cdn));
        let first = get(&state, "/aws.svg?color=ff0000").await;
        let second = get(&state, "/aws.svg?color=ff0000").await;
        assert_eq!(first.body, second.body);
    }

    #[tokio::test]
    async fn test_theme_variants_ignore_color() {
        let state = state_with(icons(SourceKind::Cdn));
        let light = get(&state, "/aws-light.svg?color=ff0000").await;
        assert_eq!(light.status, 200);
        assert_eq!(text(&light), LIGHT_SVG);

        let dark = get(&state, "/aws-dark.svg?color=ff0000").await;
        assert_eq!(dark.status, 200);
        assert_eq!(text(&dark), PLAIN_SVG);
    }

    #[tokio::test]
    async fn test_no_light_variant_cdn_serves_plain() {
        let state = state_with(icons(SourceKind::Cdn));
        let reply = get(&state, "/plex.svg?color=ff0000").await;
        assert_eq!(reply.status, 200);
        assert_eq!(text(&reply), PLAIN_SVG);
    }

    #[tokio::test]
    async fn test_no_light_variant_local_not_found() {
        let state = state_with(icons(SourceKind::Local));
        let reply = get(&state, "/plex.svg?color=ff0000").await;
        assert_eq!(reply.status, 404);
        assert_eq!(text(&reply), "Not found");
    }

    #[tokio::test]
    async fn test_fallback_override() {
        let source = icons(SourceKind::Local);
        let mut config = Config::load_from("does-not-exist/icons").unwrap();
        config.source.kind = SourceKind::Local;
        config.source.color_fallback = Some(ColorFallback::Plain);
        let state = AppState::with_source(&config, Arc::new(source));

        let reply = get(&state, "/plex.svg?color=ff0000").await;
        assert_eq!(reply.status, 200);
        assert_eq!(text(&reply), PLAIN_SVG);
    }

    #[tokio::test]
    async fn test_missing_asset_bodies() {
        let cdn = state_with(icons(SourceKind::Cdn));
        let reply = get(&cdn, "/missing.png").await;
        assert_eq!(reply.status, 404);
        assert_eq!(text(&reply), "File not found");

        let local = state_with(icons(SourceKind::Local));
        let reply = get(&local, "/missing.png").await;
        assert_eq!(reply.status, 404);
        assert_eq!(text(&reply), "Not found");
    }

    #[tokio::test]
    async fn test_local_directory_end_to_end() {
        let dir = TempDir::new("icon-root").unwrap();
        std::fs::create_dir_all(dir.path().join("svg")).unwrap();
        std::fs::create_dir_all(dir.path().join("png")).unwrap();
        std::fs::write(dir.path().join("svg/aws.svg"), PLAIN_SVG).unwrap();
        std::fs::write(dir.path().join("svg/aws-light.svg"), LIGHT_SVG).unwrap();
        std::fs::write(dir.path().join("png/aws.png"), PNG).unwrap();

        let mut config = Config::load_from("does-not-exist/icons").unwrap();
        config.source.kind = SourceKind::Local;
        let source = LocalSource::new(dir.path(), Duration::from_secs(10));
        let state = AppState::with_source(&config, Arc::new(source));

        let reply = get(&state, "/aws.png").await;
        assert_eq!(reply.status, 200);
        assert_eq!(&reply.body[..], PNG);

        let reply = get(&state, "/aws.svg?color=ff0000").await;
        assert_eq!(reply.status, 200);
        assert!(text(&reply).contains(r##"fill="#ff0000""##));

        let reply = get(&state, "/../aws.svg").await;
        assert_eq!(reply.status, 404);
    }
}
