use anyhow::{bail, Context, Result};
use reqwest::Url;

/// Parses an upstream base URL. Only `http`/`https` with a host; a path
/// prefix is fine (`https://example.com/api`) but a query or fragment is not,
/// since request paths and query strings are appended to it.
pub(crate) fn load_base_url(label: &str, raw: &str) -> Result<Url> {
    validate_base_url(raw).with_context(|| format!("Invalid {label} base URL '{raw}'"))
}

pub fn validate_base_url(input: &str) -> Result<Url> {
    let s = input.trim();

    if s.is_empty() {
        bail!("Base URL cannot be empty.");
    }
    let url = Url::parse(s).context("Not a valid URL")?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Unsupported scheme '{}': expected http or https", url.scheme());
    }
    if url.host_str().is_none() {
        bail!("Base URL must include a host.");
    }
    if url.query().is_some() || url.fragment().is_some() {
        bail!("Base URL must not carry a query string or fragment.");
    }

    Ok(url)
}
