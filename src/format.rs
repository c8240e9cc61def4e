//! Plain text to HTML conversion for chat replies.
//!
//! Agent replies arrive as plain text with Markdown-ish list markers. The
//! chat UI renders HTML, so each reply is converted: list items become
//! `<ul><li>` runs, other lines become paragraphs, and blank lines become
//! `<br>` separators.

use regex::Regex;

/// Format a raw agent reply as HTML for the chat UI.
///
/// - Bullet (`-`, `*`, `•`), numbered (`1.`), lettered (`a.`) and roman
///   (`iv.`) items are grouped into `<ul><li>…</li></ul>` runs
/// - Remaining non-empty lines are wrapped in `<p>…</p>`
/// - Blank lines map to `<br>`; runs of three or more collapse to two,
///   and leading/trailing `<br>` are removed
///
/// Empty input yields an empty string.
pub fn format_message_content(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let bullet_patterns = [
        Regex::new(r"(?i)^[-*•]\s+(.+)").unwrap(),
        Regex::new(r"(?i)^\d+\.\s+(.+)").unwrap(),
        Regex::new(r"(?i)^[a-z]\.\s+(.+)").unwrap(),
        Regex::new(r"(?i)^[ivx]+\.\s+(.+)").unwrap(),
    ];

    let mut formatted = String::new();
    let mut in_list = false;

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() {
            if in_list {
                formatted.push_str("</ul>");
                in_list = false;
            }
            formatted.push_str("<br>");
            continue;
        }

        let item = bullet_patterns
            .iter()
            .find_map(|pattern| pattern.captures(line))
            .map(|captures| captures.get(1).map(|m| m.as_str()).unwrap_or_default());

        if let Some(item) = item {
            if !in_list {
                formatted.push_str("<ul>");
                in_list = true;
            }
            formatted.push_str("<li>");
            formatted.push_str(item);
            formatted.push_str("</li>");
        } else {
            if in_list {
                formatted.push_str("</ul>");
                in_list = false;
            }
            formatted.push_str("<p>");
            formatted.push_str(line);
            formatted.push_str("</p>");
        }
    }

    if in_list {
        formatted.push_str("</ul>");
    }

    // Collapse runs of breaks and drop them at the edges.
    let collapsed = Regex::new(r"(<br>\s*){2,}")
        .unwrap()
        .replace_all(&formatted, "<br><br>");
    let trimmed = Regex::new(r"^<br>|<br>$")
        .unwrap()
        .replace_all(&collapsed, "");

    trimmed.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(format_message_content(""), "");
        assert_eq!(format_message_content("   \n  "), "");
    }

    #[test]
    fn plain_lines_become_paragraphs() {
        assert_eq!(
            format_message_content("Check the oil level.\nThen restart the engine."),
            "<p>Check the oil level.</p><p>Then restart the engine.</p>"
        );
    }

    #[test]
    fn dash_bullets_become_a_list() {
        let input = "Here are the steps:\n- Check the engine\n- Look at the battery";
        assert_eq!(
            format_message_content(input),
            "<p>Here are the steps:</p><ul><li>Check the engine</li><li>Look at the battery</li></ul>"
        );
    }

    #[test]
    fn numbered_and_lettered_items_are_list_items() {
        let input = "1. Jack up the car\n2. Remove the wheel\na. Inspect the pads";
        assert_eq!(
            format_message_content(input),
            "<ul><li>Jack up the car</li><li>Remove the wheel</li><li>Inspect the pads</li></ul>"
        );
    }

    #[test]
    fn roman_numeral_items_are_list_items() {
        let input = "iv. Bleed the brake lines\nxi. Refill the reservoir";
        assert_eq!(
            format_message_content(input),
            "<ul><li>Bleed the brake lines</li><li>Refill the reservoir</li></ul>"
        );
    }

    #[test]
    fn blank_line_closes_a_list() {
        let input = "- one\n- two\n\nAfterwards, test drive.";
        assert_eq!(
            format_message_content(input),
            "<ul><li>one</li><li>two</li></ul><br><p>Afterwards, test drive.</p>"
        );
    }

    #[test]
    fn break_runs_collapse_and_edges_are_trimmed() {
        let input = "\n\nFirst paragraph.\n\n\n\nSecond paragraph.\n\n";
        assert_eq!(
            format_message_content(input),
            "<p>First paragraph.</p><br><br><p>Second paragraph.</p>"
        );
    }

    #[test]
    fn unicode_bullet_is_recognised() {
        assert_eq!(
            format_message_content("• Tighten the clamp"),
            "<ul><li>Tighten the clamp</li></ul>"
        );
    }
}
