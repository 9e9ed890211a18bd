//! Server-rendered HTML pages for the browser-facing flow.
//!
//! Three pages: connect (carries the authorization URL), success, and error.
//! Values interpolated here are either service-generated (URLs, messages) or
//! Spotify profile fields; they are HTML-escaped regardless.

const PAGE_STYLE: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    display: flex;
    justify-content: center;
    align-items: center;
    min-height: 100vh;
    margin: 0;
    background: #121212;
    color: #e8e8e8;
}
.card {
    background: #1e1e1e;
    padding: 2.5rem 3rem;
    border-radius: 0.75rem;
    max-width: 30rem;
    text-align: center;
}
.card h1 { margin-top: 0; font-size: 1.4rem; }
.button {
    display: inline-block;
    margin-top: 1rem;
    padding: 0.75rem 2rem;
    border-radius: 2rem;
    background: #1db954;
    color: #000;
    font-weight: 600;
    text-decoration: none;
}
.error { color: #e06c6c; }
.hint { margin-top: 1.5rem; font-size: 0.85rem; color: #9a9a9a; }
"#;

/// GET /connect body.
pub fn connect_page(login_url: &str, app_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Connect Spotify</title><style>{style}</style></head>
<body>
  <div class="card">
    <h1>Connect your Spotify account</h1>
    <p>Authorize read access so your listening data can be collected.</p>
    <a class="button" href="{login_url}">Connect with Spotify</a>
    <p class="hint">Shareable onboarding link: {app_url}/auth/login</p>
  </div>
</body>
</html>
"#,
        style = PAGE_STYLE,
        login_url = escape(login_url),
        app_url = escape(app_url),
    )
}

/// Callback success body.
pub fn success_page(display_name: &str, spotify_user_id: &str) -> String {
    let who = if display_name.is_empty() {
        spotify_user_id
    } else {
        display_name
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Connected</title><style>{style}</style></head>
<body>
  <div class="card">
    <h1>Connected!</h1>
    <p>Thanks {who}, your Spotify account ({id}) is now linked.</p>
    <p class="hint">You can close this window.</p>
  </div>
</body>
</html>
"#,
        style = PAGE_STYLE,
        who = escape(who),
        id = escape(spotify_user_id),
    )
}

/// Callback / flow error body. `message` is one of the fixed per-outcome
/// strings, never upstream error detail.
pub fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Something went wrong</title><style>{style}</style></head>
<body>
  <div class="card">
    <h1 class="error">Something went wrong</h1>
    <p>{message}</p>
    <a class="button" href="/connect">Try again</a>
  </div>
</body>
</html>
"#,
        style = PAGE_STYLE,
        message = escape(message),
    )
}

/// Minimal HTML escaping for interpolated text and attribute values.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_page_contains_login_url() {
        let page = connect_page("https://accounts.spotify.com/authorize?x=1", "https://app.example.com");
        assert!(page.contains("https://accounts.spotify.com/authorize?x=1"));
        assert!(page.contains("https://app.example.com/auth/login"));
    }

    #[test]
    fn test_success_page_prefers_display_name() {
        let page = success_page("Jane", "u789");
        assert!(page.contains("Jane"));
        assert!(page.contains("u789"));

        let page = success_page("", "u789");
        assert!(page.contains("u789"));
    }

    #[test]
    fn test_profile_values_are_escaped() {
        let page = success_page("<script>alert(1)</script>", "u789");
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_error_page_contains_message_and_retry_link() {
        let page = error_page("Spotify token exchange failed.");
        assert!(page.contains("Spotify token exchange failed."));
        assert!(page.contains(r#"href="/connect""#));
    }
}
