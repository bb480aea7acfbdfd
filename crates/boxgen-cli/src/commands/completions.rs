use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io::Write;

/// Print the completion script for `shell`; the binary name comes from the
/// clap definition so completions follow a renamed binary.
pub fn run<C: CommandFactory>(shell: Shell) -> Result<u8, String> {
    let mut cmd = C::command();
    let bin = cmd.get_name().to_owned();
    let mut out = std::io::stdout().lock();
    clap_complete::generate(shell, &mut cmd, bin, &mut out);
    out.flush()
        .map_err(|e| format!("completions for {shell} could not be written: {e}"))?;
    Ok(EXIT_SUCCESS)
}
