//! Best-effort page title lookup for deck entries.
//!
//! A new entry is stored with [`fallback_title`] straight away. A background
//! task then calls [`resolve_title`]; any failure simply leaves the fallback
//! in place.

use std::time::Duration;

use futures::StreamExt;
use reqwest::redirect::Policy;
use thiserror::Error;

use crate::util::{single_line, strip_control_chars, validate_url, Timer, UrlValidationError};

/// Deadline for the whole lookup, body read included.
pub const TITLE_TIMEOUT: Duration = Duration::from_secs(5);
/// Only the first 2 MiB of a page are scanned.
const MAX_TITLE_BODY: usize = 2 * 1024 * 1024;
const MAX_REDIRECTS: usize = 5;

/// Why a title lookup gave up.
#[derive(Debug, Error)]
pub enum TitleError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("not an HTML page ({0})")]
    NotHtml(String),
    #[error("request timed out")]
    Timeout,
    #[error("page has no title")]
    NoTitle,
}

/// Where an entry's displayed title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleState {
    /// Showing the host name (or raw URL).
    Fallback,
    /// A lookup is in flight.
    Resolving,
    /// The page's own title was found and stored.
    Resolved,
}

/// Title to show before (or instead of) the page's own: the host name, or
/// the raw string when it has none.
pub fn fallback_title(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_owned(),
            _ => url.to_owned(),
        },
        Err(_) => url.to_owned(),
    }
}

/// Redirect policy: at most five hops, loops refused.
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("Too many redirects (max 5)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

/// HTTP client used for title lookups.
pub fn http_client(user_agent: &str) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(redirect_policy())
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .connect_timeout(TITLE_TIMEOUT)
        .build()
}

/// Fetch `url` and pull out its title, giving up after [`TITLE_TIMEOUT`].
pub async fn resolve_title(client: &reqwest::Client, url: &str) -> Result<String, TitleError> {
    resolve_title_within(client, url, TITLE_TIMEOUT).await
}

/// [`resolve_title`] with an explicit deadline.
pub async fn resolve_title_within(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, TitleError> {
    let validated = validate_url(url)?;
    let timer = Timer::started(timeout);
    let html = timer
        .guard(fetch_html(client, validated.as_str()))
        .await
        .map_err(|_| TitleError::Timeout)??;
    extract_title(&html).ok_or(TitleError::NoTitle)
}

async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, TitleError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TitleError::HttpStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !content_type.contains("text/html") {
        return Err(TitleError::NotHtml(content_type));
    }

    let bytes = read_capped(response).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read at most [`MAX_TITLE_BODY`] bytes; anything past that is dropped.
async fn read_capped(response: reqwest::Response) -> Result<Vec<u8>, TitleError> {
    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let room = MAX_TITLE_BODY - bytes.len();
        if chunk.len() >= room {
            bytes.extend_from_slice(&chunk[..room]);
            break;
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Find a page title in raw HTML.
///
/// Uses simple string scanning (no HTML parser dependency). The first
/// non-blank of `og:title`, `twitter:title` and `<title>` wins. Entities are
/// decoded, control characters stripped, and whitespace collapsed.
pub fn extract_title(html: &str) -> Option<String> {
    // ASCII lowering keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();

    [
        meta_content(html, &lower, "og:title"),
        meta_content(html, &lower, "twitter:title"),
        title_element(html, &lower),
    ]
    .into_iter()
    .flatten()
    .map(|raw| clean(&raw))
    .find(|t| !t.is_empty())
}

fn clean(raw: &str) -> String {
    let decoded = decode_entities(raw);
    let stripped = strip_control_chars(&decoded);
    single_line(&stripped).into_owned()
}

/// `content` of the first `<meta>` whose `property` or `name` is `key`.
fn meta_content(html: &str, lower: &str, key: &str) -> Option<String> {
    let mut search_from = 0;

    while let Some(rel) = lower[search_from..].find("<meta") {
        let start = search_from + rel;
        let end = tag_end(lower, start)?;
        let tag_lower = &lower[start..=end];

        let matches = attr_value(tag_lower, tag_lower, "property") == Some(key)
            || attr_value(tag_lower, tag_lower, "name") == Some(key);
        if matches {
            if let Some(content) = attr_value(&html[start..=end], tag_lower, "content") {
                if !content.trim().is_empty() {
                    return Some(content.to_owned());
                }
            }
        }

        search_from = end + 1;
    }

    None
}

/// Index of the `>` closing the tag opened at `start`.
///
/// A `>` inside a quoted attribute value does not end the tag.
fn tag_end(lower: &str, start: usize) -> Option<usize> {
    let mut quote = None;
    for (i, b) in lower.bytes().enumerate().skip(start) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

/// Text between the first `<title ...>` and `</title>`.
fn title_element(html: &str, lower: &str) -> Option<String> {
    let mut search_from = 0;
    loop {
        let start = search_from + lower[search_from..].find("<title")?;
        let after_name = start + "<title".len();
        // skip <titlebar> and similar
        match lower.as_bytes().get(after_name) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {}
            _ => {
                search_from = after_name;
                continue;
            }
        }
        let open_end = after_name + lower[after_name..].find('>')? + 1;
        let close = open_end + lower[open_end..].find("</title")?;
        return Some(html[open_end..close].to_owned());
    }
}

/// Value of `name="..."` or `name='...'` in a single tag, sliced from `tag`.
///
/// `lower` is the ASCII-lowercased tag used for matching. The attribute name
/// must be preceded by whitespace so that `name` does not match inside
/// `data-name`.
fn attr_value<'a>(tag: &'a str, lower: &str, name: &str) -> Option<&'a str> {
    let bytes = lower.as_bytes();
    let mut search_from = 0;

    while let Some(rel) = lower[search_from..].find(name) {
        let at = search_from + rel;
        search_from = at + name.len();

        if at == 0 || !bytes[at - 1].is_ascii_whitespace() {
            continue;
        }

        let after = &lower[search_from..];
        let Some(eq) = after.trim_start().strip_prefix('=') else {
            continue;
        };
        let value_at = lower.len() - eq.trim_start().len();
        let quote = match bytes.get(value_at) {
            Some(&q @ (b'"' | b'\'')) => q as char,
            _ => continue,
        };
        let inner_start = value_at + 1;
        let end = inner_start + tag[inner_start..].find(quote)?;
        return Some(&tag[inner_start..end]);
    }

    None
}

/// Decode the handful of entities that show up in titles.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
