// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use super::render::Templates;

#[test]
fn body_is_wrapped_unescaped() {
    let templates = Templates::new().unwrap();
    let body = r#"<p class="ql-align-center"><strong>Hello</strong> &amp; welcome</p>"#;
    let html = templates.render_styled_html(body).unwrap();
    assert!(html.contains(body));
    assert!(html.starts_with("<html>"));
    assert!(html.contains("font-family: Arial, sans-serif;"));
    assert!(html.contains(".ql-align-center { text-align: center; }"));
}

#[test]
fn empty_body_still_renders() {
    let templates = Templates::new().unwrap();
    let html = templates.render_styled_html("").unwrap();
    assert!(html.contains("<body>"));
    assert!(html.trim_end().ends_with("</html>"));
}
