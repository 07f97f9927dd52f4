//! Values derived from resolved configuration
//!
//! Everything here is cheap and recomputed on every call. The only function
//! with a side effect is [`system_locale`], which asks the operating system
//! each time so that a locale change is picked up without a restart.

use std::process::Command;

/// Locale used when the operating system reports none
pub const DEFAULT_LOCALE: &str = "en_us";

/// Anything that may carry a preferred locale (accounts, mostly)
pub trait HasLocale {
    fn locale(&self) -> Option<&str>;
}

/// `<publicUriBase>/reset_password.html?key=<token>`
///
/// The token is appended as-is; callers supply a URL-safe token.
pub fn reset_password_url(public_uri_base: &str, token: &str) -> String {
    format!("{}/reset_password.html?key={}", public_uri_base, token)
}

/// Base URL for app assets: public base (one trailing slash stripped) +
/// HTTP base path + `/app_assets/`
pub fn asset_url_base(public_uri_base: &str, http_base_uri: &str) -> String {
    let base = public_uri_base.strip_suffix('/').unwrap_or(public_uri_base);
    format!("{}{}/app_assets/", base, http_base_uri)
}

/// Reduce a locale such as `en_US.UTF-8` to its lower-cased language/region
/// code (`en_us`)
pub fn normalize_locale(raw: &str) -> Option<String> {
    let code = raw
        .trim()
        .trim_matches('"')
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_lowercase())
    }
}

/// Extract the normalized `LANG` value from `locale` command output
pub fn parse_locale_output(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("LANG="))
        .and_then(normalize_locale)
}

/// The account's own locale if set, otherwise the system locale
pub fn locale_for<A: HasLocale + ?Sized>(account: &A) -> String {
    account
        .locale()
        .and_then(normalize_locale)
        .unwrap_or_else(system_locale)
}

/// Query the operating system locale
///
/// Runs `locale` and reads its `LANG` line, falling back to the `LANG`
/// environment variable and then [`DEFAULT_LOCALE`]. Not cached.
pub fn system_locale() -> String {
    let from_command = match Command::new("locale").output() {
        Ok(output) if output.status.success() => {
            parse_locale_output(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            tracing::debug!("locale exited with {}", output.status);
            None
        }
        Err(e) => {
            tracing::debug!("Unable to run locale: {}", e);
            None
        }
    };

    from_command
        .or_else(|| std::env::var("LANG").ok().and_then(|lang| normalize_locale(&lang)))
        .unwrap_or_else(|| {
            tracing::debug!("No system locale found, using {}", DEFAULT_LOCALE);
            DEFAULT_LOCALE.to_string()
        })
}
