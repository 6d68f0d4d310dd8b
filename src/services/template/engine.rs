//! MiniJinja template engine wrapper

use anyhow::Result;
use minijinja::{context, Environment, Value};

/// Demo pages, embedded so the binary runs from any working directory
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../web/templates/base.html")),
    ("home.html", include_str!("../../web/templates/home.html")),
    (
        "on_off_reasoning.html",
        include_str!("../../web/templates/on_off_reasoning.html"),
    ),
    (
        "stop_streaming_response.html",
        include_str!("../../web/templates/stop_streaming_response.html"),
    ),
    (
        "upload_image.html",
        include_str!("../../web/templates/upload_image.html"),
    ),
];

pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();

        // Configure MiniJinja
        env.set_debug(cfg!(debug_assertions));

        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }

    /// Render a template with context
    pub fn render(&self, template_name: &str, ctx: Value) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(template_name)?;
        template.render(ctx)
    }

    pub fn render_home(&self, server_url: &str) -> Result<String, minijinja::Error> {
        self.render(
            "home.html",
            context! {
                page_id => "home",
                server_url => server_url,
                version => env!("CARGO_PKG_VERSION"),
            },
        )
    }

    /// Demo page whose stream hits `stream_path`
    pub fn render_demo(&self, page_id: &str, stream_path: &str) -> Result<String, minijinja::Error> {
        self.render(
            &format!("{page_id}.html"),
            context! {
                page_id => page_id,
                stream_path => stream_path,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_pages_render() -> Result<()> {
        let engine = TemplateEngine::new()?;

        let home = engine.render_home("http://localhost:3000")?;
        assert!(home.contains("localhost:3000"));

        for page in ["on_off_reasoning", "stop_streaming_response", "upload_image"] {
            let html = engine.render_demo(page, "/api/reasoning")?;
            assert!(html.contains("/api/reasoning"), "{page} should reference its stream path");
        }

        Ok(())
    }

    #[test]
    fn test_unknown_template_errors() -> Result<()> {
        let engine = TemplateEngine::new()?;
        assert!(engine.render_demo("missing", "/api/reasoning").is_err());
        Ok(())
    }
}
