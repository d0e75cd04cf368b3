//! Inline HTML templates for the login and home pages

use crate::account::model::LoginViewModel;
use crate::antiforgery::ANTIFORGERY_FORM_FIELD;

/// Login form; the password field always renders empty
pub fn login_page(vm: &LoginViewModel, action: &str) -> String {
    let errors = if vm.errors.is_empty() {
        String::new()
    } else {
        let items: String = vm
            .errors
            .iter()
            .map(|e| format!("<li>{}</li>", html_escape(e)))
            .collect();
        format!(r#"<div class="status error"><ul>{}</ul></div>"#, items)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Login - ProjectIds</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        <h1>Login</h1>
        <p>Sign in to continue.</p>
        {errors}
        <form method="post" action="{action}">
            <input type="hidden" name="{af_field}" value="{af_token}">
            <input type="hidden" name="ReturnUrl" value="{return_url}">
            <div class="field">
                <label for="Username">Username</label>
                <input type="text" id="Username" name="Username" value="{username}" autofocus>
            </div>
            <div class="field">
                <label for="Password">Password</label>
                <input type="password" id="Password" name="Password" value="" autocomplete="off">
            </div>
            <div class="field checkbox">
                <input type="checkbox" id="RememberLogin" name="RememberLogin" value="true"{remember}>
                <label for="RememberLogin">Remember my login</label>
            </div>
            <button type="submit">Login</button>
        </form>
    </div>
</body>
</html>"#,
        css = CSS_STYLES,
        errors = errors,
        action = html_escape(action),
        af_field = ANTIFORGERY_FORM_FIELD,
        af_token = html_escape(&vm.antiforgery_token),
        return_url = html_escape(&vm.return_url),
        username = html_escape(&vm.username),
        remember = if vm.remember_login { " checked" } else { "" },
    )
}

/// Landing page, showing who is signed in
pub fn home_page(display_name: Option<&str>, login_path: &str) -> String {
    let body = match display_name {
        Some(name) => format!("<p>Signed in as <code>{}</code>.</p>", html_escape(name)),
        None => format!(
            r#"<p>You are not signed in.</p><a href="{}" class="button">Login</a>"#,
            html_escape(login_path)
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ProjectIds</title>
    <style>{}</style>
</head>
<body>
    <div class="container">
        <h1>ProjectIds</h1>
        {}
    </div>
</body>
</html>"#,
        CSS_STYLES, body
    )
}

fn html_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const CSS_STYLES: &str = r#"
* {
    box-sizing: border-box;
}
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: #f4f5f7;
    color: #222;
    margin: 0;
    padding: 20px;
    min-height: 100vh;
    display: flex;
    align-items: center;
    justify-content: center;
}
.container {
    background: #fff;
    padding: 40px;
    border-radius: 8px;
    max-width: 400px;
    width: 100%;
    box-shadow: 0 2px 12px rgba(0,0,0,0.1);
}
h1 {
    margin: 0 0 10px 0;
    font-size: 24px;
}
p {
    color: #555;
    margin: 0 0 20px 0;
    line-height: 1.5;
}
.field {
    margin-bottom: 20px;
}
.field.checkbox {
    display: flex;
    align-items: center;
    gap: 8px;
}
.field.checkbox input {
    width: auto;
}
label {
    display: block;
    margin-bottom: 8px;
    font-size: 14px;
}
input {
    width: 100%;
    padding: 12px;
    border: 1px solid #ccc;
    border-radius: 6px;
    font-size: 16px;
}
input:focus {
    outline: none;
    border-color: #2563eb;
}
button, .button {
    display: block;
    width: 100%;
    padding: 14px;
    background: #2563eb;
    color: #fff;
    border: none;
    border-radius: 6px;
    font-size: 16px;
    cursor: pointer;
    text-decoration: none;
    text-align: center;
}
button:hover, .button:hover {
    background: #1d4ed8;
}
.status {
    margin-bottom: 20px;
    padding: 12px;
    border-radius: 6px;
    font-size: 14px;
}
.status.error {
    background: #fee2e2;
    color: #991b1b;
}
.status ul {
    margin: 0;
    padding-left: 18px;
}
code {
    background: #eef;
    padding: 2px 6px;
    border-radius: 4px;
}
"#;
