// Terminal output helpers shared by the deploy command and service

use colored::Colorize;

use crate::domain::{DeployPhase, PhaseResult};

const RULE: &str = "════════════════════════════════════════════════════════════";

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_blue()
    );
    println!("{}", format!("║  {:<58}║", title).bright_blue());
    println!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_blue()
    );
    println!();
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).bright_yellow());
}

/// Numbered remediation list, on stderr next to the error
pub fn print_hints(hints: &[String]) {
    if hints.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("{}", "📝 Setup notes:".bright_cyan());
    for (i, hint) in hints.iter().enumerate() {
        eprintln!("   {}. {}", i + 1, hint);
    }
}

pub fn print_phase(phase: DeployPhase) {
    println!(
        "{}",
        format!(
            "━━━ Step {}/{}: {} {} ━━━",
            phase.position(),
            DeployPhase::ALL.len(),
            phase.emoji(),
            phase.name()
        )
        .bold()
    );
}

/// Per-phase timings, closing a run
pub fn print_phase_summary(results: &[PhaseResult]) {
    println!();
    println!("{}", RULE.bright_blue());
    for result in results {
        let status = if result.success { "✅" } else { "❌" };
        match &result.message {
            Some(message) => println!(
                "   {} {} ({:.1}s) {}",
                status,
                result.phase.name(),
                result.duration.as_secs_f64(),
                message.dimmed()
            ),
            None => println!(
                "   {} {} ({:.1}s)",
                status,
                result.phase.name(),
                result.duration.as_secs_f64()
            ),
        }
    }
    println!("{}", RULE.bright_blue());
    println!();
}
