use anyhow::{Context, Result};
use scmfront::parser;
use scmfront::reader::FileLexer;
use std::env;

fn main() -> Result<()> {
    let filename = env::args()
        .nth(1)
        .context("Path to a program required as an argument.")?;

    let file_lexer = FileLexer::new(&filename)
        .with_context(|| format!("Failed to read program at {}", filename))?;
    let mut tokens = file_lexer.tokens().peekable();
    let program = parser::parse_program(&mut tokens)?;
    for form in &program {
        println!("{}", form);
    }
    Ok(())
}
