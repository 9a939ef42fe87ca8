// Sign-in page listing the configured providers
use crate::models::Network;

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Provider link, carrying `next` through as `x_next`
#[must_use]
pub fn provider_link(network: Network, next: Option<&str>) -> String {
    match next {
        Some(next) => format!("/auth/{network}?x_next={}", urlencoding::encode(next)),
        None => format!("/auth/{network}"),
    }
}

#[must_use]
pub fn render_sign_in_page(networks: &[Network], next: Option<&str>, message: Option<&str>) -> String {
    let provider_buttons = if networks.is_empty() {
        "<p>No identity providers are configured. Please check your configuration.</p>".to_string()
    } else {
        networks
            .iter()
            .map(|network| {
                format!(
                    r#"<a href="{}" class="provider-btn {network}-btn">
            Sign in with {}
        </a>"#,
                    escape_html(&provider_link(*network, next)),
                    network.display_name()
                )
            })
            .collect::<Vec<_>>()
            .join("\n        ")
    };

    let notice = message
        .map(|message| format!(r#"<p class="notice">{}</p>"#, escape_html(message)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sign In</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            margin: 0;
            padding: 0;
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
        }}
        .container {{
            background: white;
            padding: 40px;
            border-radius: 12px;
            box-shadow: 0 15px 35px rgba(0, 0, 0, 0.1);
            text-align: center;
            max-width: 400px;
            width: 100%;
        }}
        .notice {{
            background: #fff8e1;
            border-radius: 8px;
            padding: 10px;
            color: #5d4037;
        }}
        .provider-btn {{
            display: block;
            padding: 12px 20px;
            margin: 10px 0;
            text-decoration: none;
            border-radius: 8px;
            font-weight: 500;
            color: white;
        }}
        .twitter-btn {{ background: #1da1f2; }}
        .facebook-btn {{ background: #1877f2; }}
        .yahoo-btn {{ background: #6001d2; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Sign in</h1>
        {notice}
        {provider_buttons}
    </div>
</body>
</html>"#
    )
}
