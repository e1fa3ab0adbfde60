//! Server-side HTML for the annotation pages

use crate::config::Config;
use crate::evaluation::{Choice, PickerOption, PreferenceCollector, Selection};
use crate::models::{InputImage, SampleView};
use crate::runner::Page;
use crate::session::Notice;
use axum::http::StatusCode;
use std::fmt::Write;
use uuid::Uuid;

const STYLE: &str = "body{font-family:sans-serif;max-width:1200px;margin:2em auto;padding:0 1em}\
.warning{background:#fff3cd;padding:.75em;border-radius:4px}\
.info{background:#d1ecf1;padding:.75em;border-radius:4px}\
.success{background:#d4edda;padding:.75em;border-radius:4px}\
.outputs{display:flex;gap:1em}.outputs figure{flex:1;margin:0;text-align:center}\
.outputs img{width:100%}fieldset{margin:1em 0}label{margin-right:1.25em}";

/// Escape text for HTML element content and quoted attribute values
pub fn escape(text: &str) -> String {
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

/// Inputs for one session page render
pub struct PageContext<'a> {
    pub config: &'a Config,
    pub collector: &'a PreferenceCollector,
    pub session_id: Uuid,
    pub user_id: &'a str,
    pub notice: Option<Notice>,
}

pub fn session_page(ctx: &PageContext<'_>, page: &Page) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape(&ctx.config.title));

    render_user_form(&mut body, ctx, matches!(page, Page::Complete { .. }));

    match &ctx.notice {
        Some(Notice::Warning(text)) => {
            let _ = writeln!(body, "<p class=\"warning\">{}</p>", escape(text));
        }
        Some(Notice::Info(text)) => {
            let _ = writeln!(body, "<p class=\"info\">{}</p>", escape(text));
        }
        None => {}
    }

    match page {
        Page::UserGate => {
            if !matches!(ctx.notice, Some(Notice::Warning(_))) {
                body.push_str("<p class=\"warning\">Please enter a user ID to begin.</p>\n");
            }
        }
        Page::Sample {
            view,
            selection,
            can_go_back,
        } => render_sample(&mut body, ctx, view, selection, *can_go_back),
        Page::Complete { path } => {
            body.push_str("<p class=\"success\">You have completed all evaluations. Thank you!</p>\n");
            let _ = writeln!(
                body,
                "<p>Your annotations have been saved as: <code>{}</code></p>",
                escape(&path.display().to_string())
            );
        }
    }

    document(&ctx.config.title, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or("Error"));
    let body = format!(
        "<h1>{}</h1>\n<p class=\"warning\">{}</p>\n<p><a href=\"/\">Start a new session</a></p>\n",
        escape(&title),
        escape(message)
    );
    document(&title, &body)
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

fn render_user_form(body: &mut String, ctx: &PageContext<'_>, locked: bool) {
    if locked {
        let _ = writeln!(body, "<p>User ID: <strong>{}</strong></p>", escape(ctx.user_id));
        return;
    }
    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"/session/{}/user\">\n\
         <label for=\"user_id\">Enter your user ID:</label>\n\
         <input id=\"user_id\" name=\"user_id\" type=\"text\" value=\"{}\">\n\
         <button type=\"submit\">Save</button>\n</form>",
        ctx.session_id,
        escape(ctx.user_id)
    );
}

fn render_sample(
    body: &mut String,
    ctx: &PageContext<'_>,
    view: &SampleView,
    selection: &Selection,
    can_go_back: bool,
) {
    let sample_index = view.sample.index;
    let _ = writeln!(body, "<p>Sample {} of {}</p>", view.position + 1, view.total);
    let _ = writeln!(body, "<h4>Image ID: <code>{sample_index}</code></h4>");
    let _ = writeln!(
        body,
        "<h3 style=\"color:#333\">Instruction for Editing: {}</h3>",
        escape(&view.sample.instruction)
    );

    let input_src = match &view.input_image {
        InputImage::Url(url) => url.clone(),
        InputImage::File(_) => format!("/session/{}/image/{}/input", ctx.session_id, sample_index),
    };
    let _ = writeln!(
        body,
        "<p><strong>Input Image</strong></p>\n<img src=\"{}\" width=\"300\" alt=\"Input image\">",
        escape(&input_src)
    );

    body.push_str("<h4>Anonymous Model Outputs</h4>\n<div class=\"outputs\">\n");
    for entry in &view.entries {
        let _ = writeln!(
            body,
            "<figure><img src=\"/session/{}/image/{}/{}\" alt=\"{tag}\"><figcaption>{tag}</figcaption></figure>",
            ctx.session_id,
            sample_index,
            entry.slot,
            tag = escape(&entry.tag)
        );
    }
    body.push_str("</div>\n");

    let question = escape(&ctx.config.question);
    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"/session/{}/submit\">\n\
         <input type=\"hidden\" name=\"sample_index\" value=\"{sample_index}\">\n\
         <p><strong>{question}</strong></p>",
        ctx.session_id
    );
    render_radio_group(
        body,
        &format!("Select the BEST model - {question}"),
        "best",
        &ctx.collector.best_options(&view.entries),
        selection.best,
    );
    render_radio_group(
        body,
        &format!("Select the WORST model - {question}"),
        "worst",
        &ctx.collector.worst_options(&view.entries),
        selection.worst,
    );
    body.push_str("<button type=\"submit\">Submit Evaluation</button>\n</form>\n");

    if can_go_back {
        let _ = writeln!(
            body,
            "<form method=\"post\" action=\"/session/{}/back\">\n\
             <input type=\"hidden\" name=\"sample_index\" value=\"{sample_index}\">\n\
             <button type=\"submit\">&larr; Return to Previous Sample</button>\n</form>",
            ctx.session_id
        );
    }
}

/// `legend` is expected to be escaped already
fn render_radio_group(
    body: &mut String,
    legend: &str,
    name: &str,
    options: &[PickerOption],
    selected: Choice,
) {
    let _ = writeln!(body, "<fieldset>\n<legend>{legend}</legend>");
    for option in options {
        let value = option.choice.form_value();
        let checked = if option.choice == selected { " checked" } else { "" };
        let _ = writeln!(
            body,
            "<label><input type=\"radio\" name=\"{name}\" value=\"{value}\"{checked}> {}</label>",
            escape(&option.label)
        );
    }
    body.push_str("</fieldset>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisplayEntry, Sample};
    use std::path::PathBuf;

    fn view() -> SampleView {
        SampleView {
            position: 1,
            total: 3,
            sample: Sample {
                index: 52,
                instruction: "replace <sky> & clouds".to_string(),
                input: "inputs/52.png".to_string(),
            },
            input_image: InputImage::File(PathBuf::from("inputs/52.png")),
            entries: vec![
                DisplayEntry {
                    slot: 1,
                    tag: "Model 1".to_string(),
                    model: "got".to_string(),
                    image_path: PathBuf::from("outputs/got/52.png"),
                },
                DisplayEntry {
                    slot: 2,
                    tag: "Model 2".to_string(),
                    model: "pixinstruct".to_string(),
                    image_path: PathBuf::from("outputs/pixinstruct/52.png"),
                },
            ],
        }
    }

    fn render(page: &Page, user_id: &str, notice: Option<Notice>) -> String {
        let config = Config::default();
        let collector = PreferenceCollector::new(false);
        let ctx = PageContext {
            config: &config,
            collector: &collector,
            session_id: Uuid::nil(),
            user_id,
            notice,
        };
        session_page(&ctx, page)
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">Tom & Jerry's</a>"), "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;");
    }

    #[test]
    fn test_user_gate_warns() {
        let html = render(&Page::UserGate, "", None);
        assert!(html.contains("Please enter a user ID to begin."));
        assert!(html.contains("action=\"/session/00000000-0000-0000-0000-000000000000/user\""));
        assert!(!html.contains("Submit Evaluation"));
    }

    #[test]
    fn test_sample_page_hides_model_names() {
        let page = Page::Sample {
            view: view(),
            selection: Selection {
                best: Choice::None,
                worst: Choice::Slot(2),
            },
            can_go_back: true,
        };
        let html = render(&page, "alice", None);

        assert!(html.contains("Sample 2 of 3"));
        assert!(html.contains("replace &lt;sky&gt; &amp; clouds"));
        assert!(html.contains("/image/52/input"));
        assert!(html.contains("/image/52/2\""));
        assert!(!html.contains("got"));
        assert!(!html.contains("pixinstruct"));
        assert!(html.contains("name=\"best\" value=\"none\" checked"));
        assert!(html.contains("name=\"worst\" value=\"2\" checked"));
        assert!(html.contains("Return to Previous Sample"));
        let back_form = &html[html.find("/back\"").unwrap()..];
        assert!(back_form.contains("name=\"sample_index\" value=\"52\""));
    }

    #[test]
    fn test_first_sample_has_no_back_button() {
        let page = Page::Sample {
            view: view(),
            selection: Selection {
                best: Choice::None,
                worst: Choice::Slot(1),
            },
            can_go_back: false,
        };
        let html = render(&page, "alice", Some(Notice::Info("heads up".to_string())));
        assert!(!html.contains("Return to Previous Sample"));
        assert!(html.contains("<p class=\"info\">heads up</p>"));
    }

    #[test]
    fn test_complete_page() {
        let page = Page::Complete {
            path: PathBuf::from("results/annotations_alice_20250101_000000.csv"),
        };
        let html = render(&page, "alice", None);
        assert!(html.contains("You have completed all evaluations. Thank you!"));
        assert!(html.contains("results/annotations_alice_20250101_000000.csv"));
        assert!(!html.contains("<input id=\"user_id\""));
    }

    #[test]
    fn test_error_page() {
        let html = error_page(StatusCode::NOT_FOUND, "Session not found: <x>");
        assert!(html.contains("404 Not Found"));
        assert!(html.contains("Session not found: &lt;x&gt;"));
    }
}
