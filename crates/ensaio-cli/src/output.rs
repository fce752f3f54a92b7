//! Report formatting for the terminal.

use console::style;
use ensaio::{RunReport, StepStatus};

/// Print a one-line-per-step summary of the script, without running it
pub fn print_script(script: &ensaio::Script, use_color: bool) {
    println!(
        "{} ({} steps)",
        maybe_bold(&script.name, use_color),
        script.steps.len()
    );
    for step in script.to_steps() {
        let ctx = match step.context {
            ensaio::ExecContext::Default => "",
            ensaio::ExecContext::Modal => " [modal]",
        };
        let static_mark = if step.is_static { " (static)" } else { "" };
        println!(
            "  {:>3}. {:<12} {}{ctx}{static_mark}",
            step.number,
            step.action.name(),
            step.target
        );
    }
}

/// Print the run report summary
pub fn print_report(report: &RunReport, use_color: bool) {
    println!();
    for record in &report.steps {
        let marker = match record.status {
            StepStatus::Passed => paint("✓", Color::Green, use_color),
            StepStatus::PassedWithWarnings => paint("!", Color::Yellow, use_color),
            StepStatus::Failed => paint("✗", Color::Red, use_color),
        };
        println!(
            "  {marker} step {:>3} {:<12} {}",
            record.number, record.action, record.target
        );
        for warning in &record.warnings {
            println!("      {} {warning}", paint("warning:", Color::Yellow, use_color));
        }
    }

    println!();
    if let Some(ref fatal) = report.fatal {
        println!("  {} {fatal}", paint("fatal:", Color::Red, use_color));
    }

    let verdict = if report.passed {
        paint("PASSED", Color::Green, use_color)
    } else {
        paint("FAILED", Color::Red, use_color)
    };
    println!(
        "  {} - {} steps, {} warnings",
        verdict,
        report.steps.len(),
        report.warning_count()
    );
}

enum Color {
    Green,
    Yellow,
    Red,
}

fn paint(text: &str, color: Color, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }
    match color {
        Color::Green => style(text).green().to_string(),
        Color::Yellow => style(text).yellow().to_string(),
        Color::Red => style(text).red().to_string(),
    }
}

fn maybe_bold(text: &str, use_color: bool) -> String {
    if use_color {
        style(text).bold().to_string()
    } else {
        text.to_string()
    }
}
