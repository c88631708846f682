/// Turns the narrative returned by the service into displayable text
pub trait ResultRenderer: Send + Sync {
    fn render(&self, narrative: &str) -> String;
}

/// Passes the narrative through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl ResultRenderer for PlainRenderer {
    fn render(&self, narrative: &str) -> String {
        narrative.to_string()
    }
}

/// Light markdown cleanup for a terminal: headings are underlined,
/// bullets get a consistent marker, emphasis markers are dropped.
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    bullet: char,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self { bullet: '•' }
    }

    pub fn with_bullet(bullet: char) -> Self {
        Self { bullet }
    }

    fn render_line(&self, line: &str, out: &mut Vec<String>) {
        let trimmed = line.trim();

        if trimmed.starts_with('#') {
            let level = trimmed.chars().take_while(|c| *c == '#').count();
            let title = strip_emphasis(trimmed[level..].trim());
            let rule = if level <= 1 { '=' } else { '-' };
            let width = title.chars().count();
            out.push(title);
            out.push(rule.to_string().repeat(width));
            return;
        }

        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            let indent = line.len() - line.trim_start().len();
            out.push(format!(
                "{}{} {}",
                " ".repeat(indent + 2),
                self.bullet,
                strip_emphasis(item.trim())
            ));
            return;
        }

        out.push(strip_emphasis(trimmed));
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultRenderer for TerminalRenderer {
    fn render(&self, narrative: &str) -> String {
        let mut out = Vec::new();
        let mut blank_run = false;

        for line in narrative.lines() {
            // Collapse runs of blank lines
            if line.trim().is_empty() {
                if !blank_run && !out.is_empty() {
                    out.push(String::new());
                }
                blank_run = true;
                continue;
            }
            blank_run = false;
            self.render_line(line, &mut out);
        }

        while out.last().is_some_and(|l| l.is_empty()) {
            out.pop();
        }

        out.join("\n")
    }
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_renderer_is_identity() {
        let text = "## Verdict\n**Safe**";
        assert_eq!(PlainRenderer.render(text), text);
    }

    #[test]
    fn test_headings_are_underlined() {
        let rendered = TerminalRenderer::new().render("# Summary\n### Sugar");
        assert_eq!(rendered, "Summary\n=======\nSugar\n-----");
    }

    #[test]
    fn test_bullets_and_emphasis() {
        let rendered = TerminalRenderer::new().render("- **Salt**: fine\n* Water");
        assert_eq!(rendered, "  • Salt: fine\n  • Water");
    }

    #[test]
    fn test_blank_lines_collapse() {
        let rendered = TerminalRenderer::with_bullet('-').render("\n\nFirst\n\n\n\nSecond\n\n");
        assert_eq!(rendered, "First\n\nSecond");
    }
}
