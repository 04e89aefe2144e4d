//! Error page rendering with HTML (Askama) and SCSS styling
use askama::Template;
use once_cell::sync::Lazy;

/// Compiled CSS from SCSS, shared by every page.
static COMPILED_CSS: Lazy<String> = Lazy::new(|| {
    let scss = include_str!("../styles/error.scss");
    grass::from_string(scss.to_string(), &grass::Options::default())
        .expect("Failed to compile SCSS")
});

/// Static landing page served when no known error code was requested.
static INDEX_PAGE: Lazy<String> =
    Lazy::new(|| with_stylesheet(include_str!("../templates/index.html")));

/// Inject the compiled stylesheet into the document head.
fn with_stylesheet(html: &str) -> String {
    html.replace(
        "</head>",
        &format!("<style>{}</style></head>", COMPILED_CSS.as_str()),
    )
}

#[derive(Debug, Template)]
#[template(path = "error.html")]
pub struct ErrorPageTemplate {
    pub err_code: u16,
    pub err_msg: String,
}

impl ErrorPageTemplate {
    pub fn new(err_code: u16, err_msg: impl Into<String>) -> Self {
        Self {
            err_code,
            err_msg: err_msg.into(),
        }
    }

    #[tracing::instrument(skip(self), fields(err_code = self.err_code))]
    pub fn render_html(&self) -> Result<String, askama::Error> {
        let html = self.render()?;
        Ok(with_stylesheet(&html))
    }
}

pub fn index_page() -> &'static str {
    INDEX_PAGE.as_str()
}
