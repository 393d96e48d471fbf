use crate::modules::error::code::ErrorCode;
use crate::{modules::error::BulkMailerResult, raise_error};
use handlebars::Handlebars;
use serde_json::json;

const STYLED_HTML: &str = "styled_html";

/// Presentational wrapper applied to every outgoing body. The body is inserted
/// unescaped, it is already HTML produced by the editor.
const STYLED_HTML_TEMPLATE: &str = r#"<html>
  <head>
    <meta charset="utf-8">
    <style>
      body { font-family: Arial, sans-serif; }
      p { margin: 0 0 10px; }
      strong { font-weight: bold; }
      em { font-style: italic; }
      u { text-decoration: underline; }
      ol { list-style-type: decimal; padding-left: 1.2em; }
      ul { list-style-type: disc; padding-left: 1.2em; }
      li { margin-bottom: 5px; }
      .ql-align-center { text-align: center; }
      .ql-align-center img { display: block; margin: 0 auto; }
      img { max-width: 100%; height: auto; }
    </style>
  </head>
  <body>
    {{{body}}}
  </body>
</html>
"#;

pub struct Templates {
    handlebars: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> BulkMailerResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string(STYLED_HTML, STYLED_HTML_TEMPLATE)
            .map_err(|e| {
                raise_error!(
                    format!("Handlebars register '{STYLED_HTML}' error: {e}"),
                    ErrorCode::InternalError
                )
            })?;
        Ok(Self { handlebars })
    }

    pub fn render_styled_html(&self, body: &str) -> BulkMailerResult<String> {
        self.handlebars
            .render(STYLED_HTML, &json!({ "body": body }))
            .map_err(|e| {
                raise_error!(
                    format!("Handlebars '{STYLED_HTML}' render error: {e}"),
                    ErrorCode::InternalError
                )
            })
    }
}
