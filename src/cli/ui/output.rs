use console::style;

/// Styled terminal output for CLI commands
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn field(&self, label: &str, value: &str) {
        println!("  {:<12} {}", style(label).dim(), value);
    }

    /// Section with one bullet per item, or a dimmed "(none)"
    pub fn list(&self, title: &str, items: &[String]) {
        self.section(&format!("{} ({})", title, items.len()));
        if items.is_empty() {
            println!("  {}", style("(none)").dim());
        }
        for item in items {
            println!("  • {}", item);
        }
    }

    /// Risk score colored by band: <40 green, <70 yellow, else red
    pub fn score(&self, value: f64, rendered: &str) {
        let styled = if value < 40.0 {
            style(rendered).green()
        } else if value < 70.0 {
            style(rendered).yellow()
        } else {
            style(rendered).red()
        };
        println!("{} {}", style("Risk score:").bold(), styled.bold());
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
