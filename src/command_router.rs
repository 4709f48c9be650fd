use crate::{
    builtins::Builtin,
    config::Config,
    confirm_ui::{ConfirmPolicy, ConfirmUI},
    executor::Executor,
    llm_translator::{self, CommandTranslator, TranslateError, Translation},
    session::Session,
};
use anyhow::Result;
use colored::Colorize;
use std::io::{BufRead, Write};
use tracing::{error, info, warn};

/// What the loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct CommandRouter {
    session: Session,
    translator: Box<dyn CommandTranslator>,
    executor: Executor,
    confirm_ui: ConfirmUI,
}

impl CommandRouter {
    pub fn new(
        session: Session,
        translator: Box<dyn CommandTranslator>,
        executor: Executor,
        confirm_ui: ConfirmUI,
    ) -> Self {
        Self {
            session,
            translator,
            executor,
            confirm_ui,
        }
    }

    /// Router for an interactive run, rooted at the process working directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Session::from_process()?,
            llm_translator::from_config(config),
            Executor::new(),
            ConfirmUI::new(ConfirmPolicy::from_flag(config.confirm_ai_commands)),
        ))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn prompt(&self) -> String {
        format!("{}> ", self.session.display_dir())
    }

    /// Reads and handles lines until `exit` or end of input.
    ///
    /// Errors from individual lines are printed to `err` and never end the loop.
    pub async fn run<R: BufRead, W: Write, E: Write>(
        &mut self,
        input: &mut R,
        out: &mut W,
        err: &mut E,
    ) -> Result<()> {
        writeln!(out, "{}", "Welcome to ShellHit AI Terminal".magenta())?;

        loop {
            write!(out, "{}", self.prompt().blue())?;
            out.flush()?;

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    writeln!(out)?;
                    info!("End of input, leaving");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    writeln!(err, "{} {}", "Error reading input:".red(), e)?;
                    continue;
                }
            }

            match self.process_input(&line, input, out).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(e) => writeln!(err, "{} {:#}", "Error:".red(), e)?,
            }
        }
    }

    /// Handles one line of input.
    ///
    /// Built-in verbs run directly; anything else is sent, untokenized, to the
    /// AI translator. `input` is only read when a command needs confirmation.
    pub async fn process_input<R: BufRead, W: Write>(
        &mut self,
        line: &str,
        input: &mut R,
        out: &mut W,
    ) -> Result<Flow> {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return Ok(Flow::Continue);
        };

        if let Some(builtin) = Builtin::parse(verb) {
            let args: Vec<&str> = tokens.collect();
            return Ok(builtin.run(&args, &mut self.session, out)?);
        }

        self.process_ai_request(line, input, out).await
    }

    async fn process_ai_request<R: BufRead, W: Write>(
        &mut self,
        request: &str,
        input: &mut R,
        out: &mut W,
    ) -> Result<Flow> {
        info!("Translating request: {}", request);

        let command = match self.translator.translate(request).await {
            Ok(Translation::Command(command)) => command,
            Ok(Translation::NoEquivalent) => {
                writeln!(out, "{}", "AI: Sorry, I can't process that request.".yellow())?;
                return Ok(Flow::Continue);
            }
            Err(TranslateError::NotConfigured) => {
                writeln!(
                    out,
                    "{}",
                    "AI: Not available. Set API_KEY in .env or run `shellhit --set-api-key <key>`."
                        .yellow()
                )?;
                return Ok(Flow::Continue);
            }
            Err(e) => {
                warn!("AI translation failed: {}", e);
                writeln!(out, "{}", "AI: Not possible".red())?;
                return Ok(Flow::Continue);
            }
        };

        // A child process cannot change our directory, so apply it here.
        if let Some(target) = cd_target(&command) {
            info!("AI changing directory to: {}", target);
            if let Err(e) = self.session.change_dir(target) {
                writeln!(out, "{} {}", "AI: Failed to change directory:".red(), e)?;
            }
            return Ok(Flow::Continue);
        }

        if !self.confirm_ui.confirm_with_io(&command, input, out)? {
            writeln!(out, "{}", "Command skipped.".yellow())?;
            return Ok(Flow::Continue);
        }

        writeln!(out, "{} {}", "AI Executing:".green(), command.cyan())?;
        out.flush()?;
        self.executor.execute(&command, self.session.current_dir())?;
        Ok(Flow::Continue)
    }
}

/// Directory argument of a translated `cd` command, if it is one.
///
/// Accepts any casing of `cd`, ignores the Windows `/d` switch, and strips
/// surrounding double quotes.
pub fn cd_target(command: &str) -> Option<&str> {
    let prefix = command.get(..3)?;
    if !prefix.eq_ignore_ascii_case("cd ") {
        return None;
    }

    let mut target = command[3..].trim();
    if target.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("/d ")) {
        target = target[3..].trim();
    }
    let target = target
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(target);

    if target.is_empty() { None } else { Some(target) }
}
