use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Turns a saved captcha image into the code typed at login
pub trait CaptchaSolver: Send + Sync {
    fn solve(&self, image_path: &Path) -> Result<String>;
}

/// Asks the person at the terminal to read the image
#[derive(Debug, Default)]
pub struct StdinCaptcha;

impl CaptchaSolver for StdinCaptcha {
    fn solve(&self, image_path: &Path) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "Captcha saved to {}. Enter captcha: ", image_path.display())?;
        stdout.flush()?;

        read_code(io::stdin().lock())
    }
}

fn read_code(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read captcha from input")?;

    let code = line.trim();
    if code.is_empty() {
        bail!("No captcha entered");
    }
    Ok(code.to_string())
}
