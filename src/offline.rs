//! Synthesized offline fallback page.
//!
//! Served only for document requests when both the cache and the
//! network have failed. Marked `no-cache` so a later online navigation
//! never gets stuck on it.

use crate::store::StoredResponse;

const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="de">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Offline</title>
</head>
<body>
  <h1>Offline</h1>
  <p>Diese Seite ist offline nicht verf&uuml;gbar. Bitte Verbindung pr&uuml;fen.</p>
  <button onclick="location.reload()">Erneut versuchen</button>
</body>
</html>
"#;

/// Build the offline response for a document request URL.
pub fn offline_response(url: &str) -> StoredResponse {
    StoredResponse::new(
        url.to_string(),
        200,
        vec![
            ("Content-Type".to_string(), "text/html; charset=utf-8".to_string()),
            ("Cache-Control".to_string(), "no-cache".to_string()),
        ],
        OFFLINE_HTML.as_bytes().to_vec(),
    )
}
