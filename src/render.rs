use anyhow::{Context, Result};
use std::io::{self, IsTerminal, Write};
use termimad::{FmtText, MadSkin};

use crate::dispatch::HttpFailure;
use crate::model::extract_answer;

/// How the answer is laid out on the output stream.
pub struct Renderer {
    skin: MadSkin,
    width: Option<usize>,
}

impl Renderer {
    pub fn new(skin: MadSkin, width: Option<usize>) -> Self {
        Self { skin, width }
    }

    /// Styled output wrapped to the terminal, or plain text when stdout is redirected.
    pub fn for_stdout() -> Self {
        if io::stdout().is_terminal() {
            let (columns, _) = termimad::terminal_size();
            Self::new(MadSkin::default(), Some(usize::from(columns)))
        } else {
            Self::plain()
        }
    }

    pub fn plain() -> Self {
        Self::new(MadSkin::no_style(), None)
    }

    pub fn render_markdown(&self, out: &mut impl Write, markdown: &str) -> Result<()> {
        let text = FmtText::from(&self.skin, markdown, self.width);
        write!(out, "{text}").context("Failed to write rendered answer")?;
        out.flush().context("Failed to flush stdout")
    }

    pub fn render_answer(&self, out: &mut impl Write, body: &[u8]) -> Result<()> {
        let answer = extract_answer(body)?;
        self.render_markdown(out, &answer)
    }
}

pub fn report_http_failure(out: &mut impl Write, failure: &HttpFailure) -> Result<()> {
    writeln!(
        out,
        "The request failed with status code: {}",
        failure.status.as_u16()
    )?;
    for (name, value) in &failure.headers {
        writeln!(
            out,
            "{}: {}",
            name,
            String::from_utf8_lossy(value.as_bytes())
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{}", String::from_utf8_lossy(&failure.body))?;
    out.flush().context("Failed to flush stdout")
}

pub fn report_execution_time(out: &mut impl Write, elapsed: std::time::Duration) -> Result<()> {
    writeln!(out, "Execution time: {:.4} seconds", elapsed.as_secs_f64())?;
    Ok(())
}
