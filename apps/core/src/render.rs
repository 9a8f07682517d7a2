//! Answer rendering.
//!
//! Converts the simple markup used in stored answers into HTML the frontend
//! can display: `**bold**`, bullet lines (•, -, *), short lines ending with a
//! colon become headings, blank lines become breaks. Answers that already
//! contain HTML tags pass through untouched.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("Invalid regex: bold pattern"));

pub fn markdown_like_to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // Already formatted: leave as-is.
    if text.contains('<') && text.contains('>') {
        return text.to_string();
    }

    let mut out: Vec<String> = Vec::new();
    let mut in_list = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            out.push("<br>".to_string());
            continue;
        }

        let line = BOLD.replace_all(line, "<b>$1</b>").to_string();

        // Short line ending with ':' becomes a heading.
        if line.ends_with(':') && line.chars().count() < 80 {
            if in_list {
                out.push("</ul>".to_string());
                in_list = false;
            }
            let title = line[..line.len() - 1].trim();
            out.push(format!("<h4>{}</h4>", title));
            continue;
        }

        if line.starts_with('•') || line.starts_with('-') || line.starts_with('*') {
            let item = line.trim_start_matches(['•', '-', '*', ' ']).trim();
            if !in_list {
                out.push("<ul>".to_string());
                in_list = true;
            }
            out.push(format!("<li>{}</li>", item));
            continue;
        }

        if in_list {
            out.push("</ul>".to_string());
            in_list = false;
        }
        out.push(format!("{}<br>", line));
    }

    if in_list {
        out.push("</ul>".to_string());
    }

    out.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_like_to_html(""), "");
    }

    #[test]
    fn test_bold_replacement() {
        assert_eq!(
            markdown_like_to_html("the **fee** overview"),
            "the <b>fee</b> overview<br>"
        );
    }

    #[test]
    fn test_bullets_become_a_list() {
        let html = markdown_like_to_html("• first\n• second");
        assert_eq!(html, "<ul><li>first</li><li>second</li></ul>");
    }

    #[test]
    fn test_heading_line() {
        let html = markdown_like_to_html("Undergraduate programs:\n• item");
        assert_eq!(html, "<h4>Undergraduate programs</h4><ul><li>item</li></ul>");
    }

    #[test]
    fn test_existing_html_passes_through() {
        let html = "<b>already</b> formatted";
        assert_eq!(markdown_like_to_html(html), html);
    }

    #[test]
    fn test_blank_line_becomes_break() {
        let html = markdown_like_to_html("one\n\ntwo");
        assert_eq!(html, "one<br><br>two<br>");
    }

    #[test]
    fn test_list_closed_before_paragraph() {
        let html = markdown_like_to_html("• item\nafter");
        assert_eq!(html, "<ul><li>item</li></ul>after<br>");
    }
}
