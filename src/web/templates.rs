//! Tera templates compiled into the binary

use rust_embed::RustEmbed;
use serde::Serialize;
use tera::{Context, Tera};

use crate::models::LookupRecord;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

/// Build a `Tera` instance from the embedded `templates/` directory
pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut sources = Vec::new();
    for name in TemplateAssets::iter() {
        let file = TemplateAssets::get(&name)
            .ok_or_else(|| tera::Error::msg(format!("embedded template {name} vanished")))?;
        let body = String::from_utf8(file.data.into_owned())
            .map_err(|e| tera::Error::chain(format!("template {name} is not UTF-8"), e))?;
        sources.push((name.into_owned(), body));
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(sources)?;
    Ok(tera)
}

/// History row as rendered, with a human-readable timestamp
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub isp: String,
    pub searched_at: String,
}

impl From<&LookupRecord> for HistoryEntry {
    fn from(record: &LookupRecord) -> Self {
        Self {
            ip: record.ip.clone(),
            country: record.country.clone(),
            city: record.city.clone(),
            isp: record.isp.clone(),
            searched_at: record.searched_at_display(),
        }
    }
}

pub fn error_context(message: &str) -> Context {
    let mut context = Context::new();
    context.insert("message", message);
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitorData;

    #[test]
    fn test_all_templates_load() {
        let tera = load_templates().unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        for expected in ["base.html", "index.html", "result.html", "error.html"] {
            assert!(names.contains(&expected), "missing template {expected}");
        }
    }

    #[test]
    fn test_result_escapes_provider_text() {
        let tera = load_templates().unwrap();
        let mut context = Context::new();
        let mut data = VisitorData::private("10.0.0.5");
        data.isp = "<script>alert(1)</script>".to_string();
        context.insert("data", &data);

        let html = tera.render("result.html", &context).unwrap();
        assert!(html.contains("Private IP Address"));
        assert!(!html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn test_error_page_renders_message() {
        let tera = load_templates().unwrap();
        let html = tera
            .render("error.html", &error_context("Error fetching IP info"))
            .unwrap();
        assert!(html.contains("Error fetching IP info"));
    }
}
