//! Optional confirmation before running AI-issued commands.
//!
//! Disabled by default. When enabled, the user is shown the translated
//! command and must answer `y` or `yes` for it to run.

use anyhow::Result;
use colored::Colorize;
use std::io::{BufRead, Write};
use tracing::info;

/// Whether AI commands need the user's approval before they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPolicy {
    /// Run translated commands immediately.
    Never,
    /// Ask on every translated command.
    Always,
}

impl ConfirmPolicy {
    pub fn from_flag(confirm: bool) -> Self {
        if confirm { Self::Always } else { Self::Never }
    }
}

/// Asks the user whether a command should run.
pub struct ConfirmUI {
    policy: ConfirmPolicy,
}

impl ConfirmUI {
    pub fn new(policy: ConfirmPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConfirmPolicy {
        self.policy
    }

    /// Returns `true` when `command` may run.
    ///
    /// Reads the answer from `input`, the same stream the shell reads
    /// commands from. End of input counts as a refusal.
    pub fn confirm_with_io<R: BufRead, W: Write>(
        &self,
        command: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<bool> {
        if self.policy == ConfirmPolicy::Never {
            return Ok(true);
        }

        write!(
            output,
            "{} {} {} ",
            "Run this command?".yellow(),
            command.cyan(),
            "[y/N]".yellow()
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        let approved = matches!(line.trim().to_lowercase().as_str(), "y" | "yes");
        info!("User {} command: {}", if approved { "approved" } else { "declined" }, command);
        Ok(approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(policy: ConfirmPolicy, answer: &str) -> (bool, String) {
        colored::control::set_override(false);
        let ui = ConfirmUI::new(policy);
        let mut input = Cursor::new(answer.as_bytes().to_vec());
        let mut output = Vec::new();
        let approved = ui.confirm_with_io("del *.tmp", &mut input, &mut output).unwrap();
        (approved, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_never_policy_skips_prompt() {
        let (approved, output) = ask(ConfirmPolicy::Never, "");
        assert!(approved);
        assert!(output.is_empty());
    }

    #[test]
    fn test_yes_answers_approve() {
        for answer in ["y\n", "Y\n", "yes\n", "  YES  \n"] {
            let (approved, output) = ask(ConfirmPolicy::Always, answer);
            assert!(approved, "answer {:?} should approve", answer);
            assert!(output.contains("Run this command? del *.tmp [y/N]"));
        }
    }

    #[test]
    fn test_other_answers_decline() {
        for answer in ["\n", "n\n", "no\n", "sure\n"] {
            let (approved, _) = ask(ConfirmPolicy::Always, answer);
            assert!(!approved, "answer {:?} should decline", answer);
        }
    }

    #[test]
    fn test_eof_declines() {
        let (approved, _) = ask(ConfirmPolicy::Always, "");
        assert!(!approved);
    }

    #[test]
    fn test_from_flag() {
        assert_eq!(ConfirmPolicy::from_flag(true), ConfirmPolicy::Always);
        assert_eq!(ConfirmPolicy::from_flag(false), ConfirmPolicy::Never);
    }
}
