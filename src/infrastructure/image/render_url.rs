//! Resize transform applied to media CDN URLs before display.

/// Default target width for rendered thumbnails.
pub const DEFAULT_WIDTH: u32 = 320;

/// Default target height for rendered thumbnails.
pub const DEFAULT_HEIGHT: u32 = 320;

/// Hosts that understand the resize query parameters unless configured
/// otherwise.
pub const DEFAULT_CDN_HOSTS: &[&str] = &["cdn.example.com", "media.example.com"];

const RESIZE_PARAMS: &[&str] = &["format", "width", "height", "size", "quality"];

/// Appends format and size parameters to `url` when it points at a known CDN
/// host, keeping any other query parameters. Other URLs are returned as is.
#[must_use]
pub fn resolve_render_url(url: &str, width: u32, height: u32) -> String {
    resolve_render_url_for(url, width, height, DEFAULT_CDN_HOSTS)
}

/// Same as [`resolve_render_url`] with an explicit host list.
#[must_use]
pub fn resolve_render_url_for<S: AsRef<str>>(
    url: &str,
    width: u32,
    height: u32,
    hosts: &[S],
) -> String {
    if !is_cdn_url(url, hosts) {
        return url.to_string();
    }

    let (url, fragment) = match url.split_once('#') {
        Some((url, fragment)) => (url, Some(fragment)),
        None => (url, None),
    };
    let (base_url, existing_params) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };

    let mut params = vec![
        "format=webp".to_string(),
        format!("width={width}"),
        format!("height={height}"),
    ];

    if let Some(existing) = existing_params {
        params.extend(
            existing
                .split('&')
                .filter(|param| !param.is_empty())
                .filter(|param| {
                    let key = param.split('=').next().unwrap_or("");
                    !RESIZE_PARAMS.contains(&key)
                })
                .map(str::to_string),
        );
    }

    let mut rendered = format!("{}?{}", base_url, params.join("&"));
    if let Some(fragment) = fragment {
        rendered.push('#');
        rendered.push_str(fragment);
    }
    rendered
}

/// Checks whether the URL's host is one of `hosts`.
#[must_use]
pub fn is_cdn_url<S: AsRef<str>>(url: &str, hosts: &[S]) -> bool {
    host_of(url).is_some_and(|host| {
        hosts
            .iter()
            .any(|known| host.eq_ignore_ascii_case(known.as_ref()))
    })
}

fn host_of(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}
