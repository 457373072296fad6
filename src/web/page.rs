//! HTML rendering of the prediction form

use crate::config::ProjectConfig;
use crate::pipeline::RawInputs;
use crate::types::field::{InputField, Widget};
use crate::types::report::PredictionReport;

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem 4rem; }
label { display: block; margin-top: 0.8rem; font-weight: 600; }
select, input { width: 100%; padding: 0.4rem; box-sizing: border-box; }
button { margin-top: 1.2rem; padding: 0.5rem 1.5rem; }
.message { margin-top: 1.2rem; padding: 0.8rem; border-radius: 4px; }
.success { background: #e6f4ea; color: #1e6b34; }
.warning { background: #fff4e5; color: #8a5300; }
.error { background: #fdecea; color: #a4261d; }
.notice { color: #555; font-size: 0.9rem; }
.footer { position: fixed; left: 0; bottom: 0; width: 100%; text-align: center; font-size: 12px; color: gray; }
"#;

/// What a page render needs
pub struct PageView<'a> {
    pub projects: &'a [ProjectConfig],
    pub selected: &'a ProjectConfig,
    /// Previously submitted values, shown instead of widget defaults
    pub values: &'a RawInputs,
    /// Artifact load failure; disables the predict button
    pub load_error: Option<String>,
    pub report: Option<&'a PredictionReport>,
}

pub fn render(view: &PageView<'_>) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Multi_Predicto</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h1>Multi_Predicto – Predict Prices &amp; More</h1>\n\
         <p>Select a dataset and enter features to predict values.</p>\n",
        STYLE
    );

    render_project_selector(&mut html, view);

    if let Some(error) = &view.load_error {
        html.push_str(&format!(
            "<div class=\"message error\">Error loading model/features: {}</div>\n",
            escape(error)
        ));
    }

    render_form(&mut html, view);

    if let Some(report) = view.report {
        render_report(&mut html, report);
    }

    html.push_str("<div class=\"footer\">© 2025 Multi_Predicto</div>\n</body>\n</html>\n");
    html
}

fn render_project_selector(html: &mut String, view: &PageView<'_>) {
    html.push_str(
        "<form method=\"get\" action=\"/\">\n<label for=\"project\">Choose a project:</label>\n\
         <select id=\"project\" name=\"project\" onchange=\"this.form.submit()\">\n",
    );
    for project in view.projects {
        let selected = if project.name == view.selected.name {
            " selected"
        } else {
            ""
        };
        let name = escape(&project.name);
        html.push_str(&format!("<option value=\"{}\"{}>{}</option>\n", name, selected, name));
    }
    html.push_str("</select>\n<noscript><button type=\"submit\">Select</button></noscript>\n</form>\n");
}

fn render_form(html: &mut String, view: &PageView<'_>) {
    html.push_str(&format!(
        "<form method=\"post\" action=\"/predict\">\n<input type=\"hidden\" name=\"project\" value=\"{}\">\n",
        escape(&view.selected.name)
    ));

    for field in &view.selected.inputs {
        render_field(html, field, view.values);
    }

    let disabled = if view.load_error.is_some() {
        " disabled"
    } else {
        ""
    };
    html.push_str(&format!("<button type=\"submit\"{}>Predict</button>\n</form>\n", disabled));
}

fn render_field(html: &mut String, field: &InputField, values: &RawInputs) {
    let id = format!("field-{}", escape(&field.name));
    let current = values
        .get(&field.name)
        .cloned()
        .unwrap_or_else(|| field.default_value())
        .to_string();

    html.push_str(&format!("<label for=\"{}\">{}</label>\n", id, escape(field.label())));

    match &field.widget {
        Widget::Choice { options, .. } => {
            html.push_str(&format!("<select id=\"{}\" name=\"{}\">\n", id, escape(&field.name)));
            for option in options {
                let selected = if *option == current { " selected" } else { "" };
                let option = escape(option);
                html.push_str(&format!("<option value=\"{}\"{}>{}</option>\n", option, selected, option));
            }
            html.push_str("</select>\n");
        }
        Widget::Number { min, max, step, .. } => {
            html.push_str(&format!(
                "<input type=\"number\" id=\"{}\" name=\"{}\" min=\"{}\" max=\"{}\" step=\"{}\" value=\"{}\">\n",
                id,
                escape(&field.name),
                min,
                max,
                step,
                escape(&current)
            ));
        }
    }
}

fn render_report(html: &mut String, report: &PredictionReport) {
    html.push_str(&format!(
        "<div class=\"message {}\">{}</div>\n",
        report.status.severity(),
        escape(&report.message)
    ));
    for notice in report.notices() {
        html.push_str(&format!("<p class=\"notice\">{}</p>\n", escape(&notice)));
    }
}

/// Minimal HTML escaping for text and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
