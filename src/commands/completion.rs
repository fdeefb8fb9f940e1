//! Completion command
//!
//! Generate shell completion scripts

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

/// Generate shell completion scripts
///
/// Outputs completion script for the specified shell to stdout.
///
/// # Examples
///
/// ```bash
/// # Bash
/// spyker-build completion bash > /usr/local/share/bash-completion/completions/spyker-build
///
/// # Zsh
/// spyker-build completion zsh > /usr/local/share/zsh/site-functions/_spyker-build
///
/// # Fish
/// spyker-build completion fish > ~/.config/fish/completions/spyker-build.fish
/// ```
#[allow(
    clippy::unnecessary_wraps,
    reason = "Result type maintained for consistency with command signature pattern"
)]
pub(crate) fn run(shell: Shell) -> Result<()> {
    let mut cmd = crate::Cli::command();

    generate(shell, &mut cmd, "spyker-build", &mut io::stdout());

    Ok(())
}
