//! Shell command execution for hosts that compute through an external program.

use std::io;
use std::process::{Command, ExitStatus};

/// Run `cmd` through the platform shell with extra environment variables and
/// wait for it to exit.
///
/// On Windows, PowerShell is used when `SHELL_NAME` asks for it or when
/// `PSModulePath` is set, otherwise `cmd.exe`. Elsewhere `$SHELL` (or `/bin/sh`).
pub fn run_command(cmd: &str, envs: &[(&str, &str)]) -> io::Result<ExitStatus> {
    let mut command = if cfg!(windows) {
        let override_shell = std::env::var("SHELL_NAME").unwrap_or_default().to_ascii_lowercase();
        let prefer_ps = if override_shell.contains("powershell") {
            true
        } else if override_shell.contains("cmd") {
            false
        } else {
            !std::env::var("PSModulePath").unwrap_or_default().is_empty()
        };
        if prefer_ps {
            let mut c = Command::new("powershell.exe");
            c.args(["-NoLogo", "-NoProfile", "-Command", cmd]);
            c
        } else {
            let mut c = Command::new("cmd.exe");
            c.args(["/c", cmd]);
            c
        }
    } else {
        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".into());
        let mut c = Command::new(shell);
        c.arg("-c").arg(cmd);
        c
    };
    command.envs(envs.iter().copied());
    command.status()
}
