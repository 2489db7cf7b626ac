//! OAuth completion page.
//!
//! The platform redirects the consent popup here. The page reports the
//! outcome to the opener window with an `oauth-callback` message and closes
//! itself after three seconds.

use axum::extract::Query;
use axum::response::Html;
use serde_json::json;
use tracing::info;

use crate::models::CallbackQuery;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A JavaScript string literal that cannot close the surrounding `<script>`.
fn js_string(value: Option<&str>) -> String {
    json!(value)
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn render(query: &CallbackQuery) -> String {
    let success = query.status.as_deref() == Some("success");
    let (title, class, heading, detail) = if success {
        let app = query.app_name.as_deref().unwrap_or("Service");
        (
            "Connection Successful",
            "success",
            "&#9989; Connection Successful!",
            format!("{} has been connected successfully.", escape_html(app)),
        )
    } else {
        (
            "Connection Failed",
            "error",
            "&#10060; Connection Failed",
            "There was an error connecting the service.".to_string(),
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            display: flex;
            align-items: center;
            justify-content: center;
            height: 100vh;
            margin: 0;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
        }}
        .container {{ text-align: center; padding: 40px; }}
        .success {{ color: #10b981; }}
        .error {{ color: #ef4444; }}
    </style>
</head>
<body>
    <div class="container">
        <h1 class="{class}">{heading}</h1>
        <p>{detail}</p>
        <p><small>You can close this window.</small></p>
    </div>
    <script>
        if (window.opener) {{
            window.opener.postMessage({{
                type: 'oauth-callback',
                status: {status},
                connectedAccountId: {account},
                appName: {app}
            }}, '*');
        }}
        setTimeout(() => {{ window.close(); }}, 3000);
    </script>
</body>
</html>
"#,
        status = js_string(query.status.as_deref()),
        account = js_string(query.connected_account_id.as_deref()),
        app = js_string(query.app_name.as_deref()),
    )
}

/// `GET /api/connections/callback?status=&connectedAccountId=&appName=`
pub async fn oauth_callback(Query(query): Query<CallbackQuery>) -> Html<String> {
    info!(
        status = ?query.status,
        connection_id = ?query.connected_account_id,
        app = ?query.app_name,
        "oauth callback"
    );
    Html(render(&query))
}
