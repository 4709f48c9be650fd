use anyhow::Result;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Runs the shell in `dir` with `input` piped to stdin.
///
/// Mock translation is enabled unless `mock` is false. HOME points at `dir`
/// so no user config leaks into the run.
fn run_shell(dir: &Path, input: &str, mock: bool, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_shellhit"));
    cmd.args(args)
        .arg("--no-elevate")
        .current_dir(dir)
        .env("HOME", dir)
        .env("USERPROFILE", dir)
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env_remove("API_KEY")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if mock {
        cmd.env("SHELLHIT_USE_MOCK", "1");
    } else {
        cmd.env_remove("SHELLHIT_USE_MOCK");
    }

    let mut child = cmd.spawn()?;
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())?;
    Ok(child.wait_with_output()?)
}

fn canonical(path: &Path) -> String {
    shellhit::session::display_path(&path.canonicalize().unwrap())
}

#[test]
fn test_builtins_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_shell(dir.path(), "mkdir sub dir\ncd sub dir\npwd\nexit\n", true, &[])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome to ShellHit AI Terminal"));
    assert!(stdout.contains(&canonical(&dir.path().join("sub dir"))));
    assert!(stdout.contains("Exiting ShellHit AI Terminal..."));

    Ok(())
}

#[test]
fn test_ls_lists_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("notes.txt"), "hi")?;

    let output = run_shell(dir.path(), "ls\nexit\n", true, &[])?;

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("notes.txt"));
    Ok(())
}

#[test]
fn test_translated_command_is_executed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_shell(dir.path(), "say hello from the shell\nexit\n", true, &[])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("AI Executing: echo hello from the shell"));
    assert!(stdout.lines().any(|l| l.trim() == "hello from the shell"));
    Ok(())
}

#[test]
fn test_no_equivalent_command_warns() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_shell(dir.path(), "teleport me to mars\nexit\n", true, &[])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("AI: Sorry, I can't process that request."));
    assert!(!stdout.contains("AI Executing"));
    Ok(())
}

#[test]
fn test_translated_cd_changes_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir(dir.path().join("child"))?;

    let output = run_shell(
        dir.path(),
        "cd child\ntake me to the parent folder\npwd\nexit\n",
        true,
        &[],
    )?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("AI Executing"));
    // `pwd` output follows the previous prompt on the same line.
    assert!(stdout.contains(&format!("> {}\n", canonical(dir.path()))));
    Ok(())
}

#[test]
fn test_builtin_errors_do_not_stop_the_shell() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_shell(dir.path(), "rm nonexistent.txt\ncd\npwd\nexit\n", true, &[])?;

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: rm: "));
    assert!(stderr.contains("Error: cd: path required"));
    assert!(String::from_utf8_lossy(&output.stdout).contains(&canonical(dir.path())));
    Ok(())
}

#[test]
fn test_failed_command_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_shell(dir.path(), "make it fail\nexit\n", true, &[])?;

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Command exited with"));
    Ok(())
}

#[test]
fn test_end_of_input_exits_cleanly() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_shell(dir.path(), "pwd\n", true, &[])?;
    assert!(output.status.success());
    Ok(())
}

#[test]
fn test_runs_without_api_key() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_shell(dir.path(), "list my files\npwd\nexit\n", false, &[])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("AI: Not available"));
    assert!(stdout.contains(&canonical(dir.path())));
    assert!(String::from_utf8_lossy(&output.stderr).contains("AI translation is disabled"));
    Ok(())
}

#[test]
fn test_api_key_from_dotenv() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join(".env"), "API_KEY=from-dotenv\n")?;

    let output = run_shell(dir.path(), "", false, &["--config"])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("API Key: Set"));
    assert!(!stdout.contains("from-dotenv"));
    Ok(())
}
