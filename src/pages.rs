use axum::response::Html;

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{}</title>
</head>
<body>
{}
</body>
</html>
"#,
        escape_html(title),
        body
    ))
}

pub fn index_page(authorization_link: &str) -> Html<String> {
    layout(
        "Login",
        &format!(
            r#"    <h1>OAuth Login</h1>
    <p><a href="{}">Login with GitHub</a></p>"#,
            escape_html(authorization_link)
        ),
    )
}

pub fn welcome_page(user_name: &str) -> Html<String> {
    layout(
        "Welcome",
        &format!(
            "    <h1>Welcome, {}!</h1>\n    <p><a href=\"/\">Back</a></p>",
            escape_html(user_name)
        ),
    )
}

/// Error page parameterized by `code` (numeric status) and `err` (message).
pub fn error_page(code: u16, err: &str) -> Html<String> {
    layout(
        "Error",
        &format!(
            "    <h1>Error {}</h1>\n    <p>{}</p>\n    <p><a href=\"/\">Back to Login</a></p>",
            code,
            escape_html(err)
        ),
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
