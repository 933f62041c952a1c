//! Static HTML pages

pub const HOME: &str = r#"<!DOCTYPE html>
<html>
    <head>
        <title>Telegram Image Sharing</title>
        <meta name="viewport" content="width=device-width, initial-scale=1.0">
        <style>
            body { font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }
            .container { text-align: center; }
            .info { background: #f0f0f0; padding: 20px; border-radius: 10px; margin: 20px 0; }
        </style>
    </head>
    <body>
        <div class="container">
            <h1>📸 Telegram Image Sharing</h1>
            <div class="info">
                <h3>How to use:</h3>
                <p>1. Start the Telegram bot</p>
                <p>2. Use /getlink to create a sharing session</p>
                <p>3. Send your image to the bot</p>
                <p>4. Share the generated link with anyone!</p>
            </div>
            <p>Images are shared through unique session links.</p>
        </div>
    </body>
</html>
"#;

/// 404 page for an unknown or malformed session id
pub fn not_found(session_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <title>Image Not Found</title>
        <style>
            body {{ font-family: Arial, sans-serif; text-align: center; padding: 50px; }}
        </style>
    </head>
    <body>
        <h1>❌ Image Not Found</h1>
        <p>The shared image doesn't exist.</p>
        <p>Session ID: <code>{}</code></p>
    </body>
</html>
"#,
        escape_html(session_id)
    )
}

/// Escape text for an HTML element body
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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
