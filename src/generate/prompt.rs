use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

/// Ask a question on stdout and read one trimmed line from stdin
pub fn prompt_line(question: &str) -> Result<String> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    read_answer(question, &mut stdin.lock(), &mut stdout)
}

fn read_answer(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<String> {
    write!(output, "{} {}: ", "?".yellow().bold(), question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(answer.trim().to_string())
}
