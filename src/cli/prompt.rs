//! Yes/no confirmation on the terminal

use std::io::{BufRead, Write};

/// Ask a yes/no question, defaulting to "no"
pub fn confirm(question: &str) -> anyhow::Result<bool> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    confirm_with(question, &mut stdin.lock(), &mut stdout)
}

fn confirm_with<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
