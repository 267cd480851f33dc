use crate::probe::Vulnerability;
use crate::signature::Signature;
use crate::utils::text::{printable, truncate_with_ellipsis};
use colored::*;
use std::sync::Arc;

/// Colored terminal output for scan results
pub struct DisplayManager {
    use_colors: bool,
    quiet_mode: bool,
}

impl DisplayManager {
    pub fn new() -> Self {
        Self::with_quiet(false)
    }

    pub fn with_quiet(quiet: bool) -> Self {
        let use_colors = std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map_or(true, |term| term != "dumb");

        Self {
            use_colors,
            quiet_mode: quiet,
        }
    }

    /// Print one confirmed inclusion with its extracted fields
    pub fn print_vulnerability(&self, vuln: &Vulnerability) {
        if self.quiet_mode { return; }

        let injected = printable(&vuln.traversal.build_path(&vuln.matched_path));

        if self.use_colors {
            println!("  {} {} {}",
                "🔥".bright_red(),
                format!("LFI in '{}'", vuln.param).bright_white().bold(),
                format!("({})", vuln.signature).bright_black()
            );
            println!("    └─ {}: {}", "URL".blue().bold(), vuln.url.cyan());
            println!("    └─ {}: {} → {}", "File".blue().bold(), vuln.matched_path.yellow(), injected.white());
            println!("    └─ {}: {}", "Escape".blue().bold(), vuln.traversal.to_string().white());

            for (field, value) in &vuln.extracted_fields {
                println!("       {} {} = {}", "•".bright_green(), field.bright_white(), value.green());
            }
        } else {
            println!("  [LFI] {} ({})", vuln.param, vuln.signature);
            println!("    URL: {}", vuln.url);
            println!("    File: {} -> {}", vuln.matched_path, injected);
            println!("    Escape: {}", vuln.traversal);

            for (field, value) in &vuln.extracted_fields {
                println!("      {} = {}", field, value);
            }
        }
        println!();
    }

    /// Print the catalog listing
    pub fn print_signatures(&self, signatures: &[Arc<Signature>], os: Option<&str>) {
        if self.quiet_mode { return; }

        for sig in signatures {
            let paths = sig.paths_for(os);
            if os.is_some() && paths.is_empty() {
                continue;
            }

            let oses: Vec<&str> = sig.operating_systems().collect();
            let extractors = sig.extractor().len();

            if self.use_colors {
                println!("  {} {} {} {}",
                    "•".bright_green().bold(),
                    format!("{:<14}", sig.name()).bright_white().bold(),
                    format!("{:<7}", sig.category()).cyan(),
                    format!("[{}]", oses.join(", ")).bright_black()
                );
                for path in &paths {
                    println!("    {} {}", "→".bright_green(), path.yellow());
                }
                println!("    {} {}", "pattern".bright_black(), truncate_with_ellipsis(sig.recognizer().as_str(), 60).white());
                if extractors > 0 {
                    println!("    {} {} fields", "extracts".bright_black(), extractors.to_string().yellow());
                }
            } else {
                println!("  • {:<14} {:<7} [{}]", sig.name(), sig.category(), oses.join(", "));
                for path in &paths {
                    println!("    → {}", path);
                }
                println!("    pattern {}", truncate_with_ellipsis(sig.recognizer().as_str(), 60));
                if extractors > 0 {
                    println!("    extracts {} fields", extractors);
                }
            }
        }
    }

    /// Print a clean section header
    pub fn print_section_header(&self, title: &str) {
        if self.quiet_mode { return; }

        if self.use_colors {
            println!("{}", title.bright_cyan().bold());
            println!("{}", "─".repeat(title.chars().count()).bright_cyan());
        } else {
            println!("{}", title);
            println!("{}", "=".repeat(title.chars().count()));
        }
    }

    /// Print a clean success message
    pub fn print_success(&self, message: &str) {
        if self.quiet_mode { return; }

        if self.use_colors {
            println!("  {} {}", "✓".bright_green().bold(), message.green());
        } else {
            println!("[✓] {}", message);
        }
    }

    /// Print a clean warning message
    pub fn print_warning(&self, message: &str) {
        if self.quiet_mode { return; }

        if self.use_colors {
            println!("  {} {}", "!".bright_yellow().bold(), message.yellow());
        } else {
            println!("[!] {}", message);
        }
    }

    /// Print a clean error message
    pub fn print_error(&self, message: &str) {
        if self.use_colors {
            eprintln!("  {} {}", "✗".bright_red().bold(), message.red().bold());
        } else {
            eprintln!("[✗] {}", message);
        }
    }

    /// Print a clean info message
    pub fn print_info(&self, message: &str) {
        if self.quiet_mode { return; }

        if self.use_colors {
            println!("  {} {}", "i".bright_blue().bold(), message.blue());
        } else {
            println!("[i] {}", message);
        }
    }

    pub fn print_banner(&self, title: &str, subtitle: Option<&str>) {
        if self.quiet_mode { return; }

        let width = title.chars().count();
        if self.use_colors {
            println!();
            println!("  {}", "┌─".bright_cyan().to_string() + &"─".repeat(width + 2) + "─┐");
            println!("  {} {} {}",
                "│".bright_cyan(),
                title.bright_white().bold(),
                "│".bright_cyan()
            );
            if let Some(sub) = subtitle {
                println!("  {} {} {}",
                    "│".bright_cyan(),
                    format!("{:^width$}", sub, width = width).bright_black(),
                    "│".bright_cyan()
                );
            }
            println!("  {}", "└─".bright_cyan().to_string() + &"─".repeat(width + 2) + "─┘");
            println!();
        } else {
            let border = "=".repeat(width + 4);
            println!("\n{}", border);
            println!("  {}  ", title);
            if let Some(sub) = subtitle {
                println!("  {}  ", sub);
            }
            println!("{}\n", border);
        }
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}
