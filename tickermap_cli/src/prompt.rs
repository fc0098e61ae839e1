//! Interactive review prompt over a terminal.

use std::io::{self, BufRead, Write};

use tickermap_lib::{CandidateScore, Decision, ReviewPrompt, Selection, TickerRecord};

/// Reads answers line by line from `input`, writes the menu to `output`.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// `None` on end of input.
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Map a reply to a selection. Numbers pick from the list, `s` or an empty
/// line skips, `q` quits, `id:<company id>` (prefix in any case) picks any
/// catalog entry.
fn parse_selection(answer: &str, candidates: &[CandidateScore]) -> Option<Selection> {
    match answer.to_lowercase().as_str() {
        "" | "s" | "skip" => return Some(Selection::Skip),
        "q" | "quit" => return Some(Selection::Quit),
        _ => {}
    }
    if let Some((prefix, id)) = answer.split_once(':') {
        if prefix.trim().eq_ignore_ascii_case("id") {
            let id = id.trim();
            return (!id.is_empty()).then(|| Selection::Candidate(id.to_string()));
        }
    }
    let n: usize = answer.parse().ok()?;
    candidates
        .get(n.checked_sub(1)?)
        .map(|c| Selection::Candidate(c.entry.id.clone()))
}

impl<R: BufRead, W: Write> ReviewPrompt for TerminalPrompt<R, W> {
    fn select(
        &mut self,
        ticker: &TickerRecord,
        decision: &Decision,
        candidates: &[CandidateScore],
    ) -> io::Result<Selection> {
        writeln!(self.output, "\n{}", "=".repeat(60))?;
        writeln!(self.output, "Ticker:  {}", ticker.symbol)?;
        writeln!(self.output, "Company: {}", ticker.description)?;
        writeln!(self.output, "Verdict: {} ({})", decision.verdict, decision.rationale)?;
        writeln!(self.output, "{}", "=".repeat(60))?;
        for (idx, c) in candidates.iter().enumerate() {
            writeln!(
                self.output,
                "  {}. {} [{}] (confidence: {:.1}%)",
                idx + 1,
                c.entry.name,
                c.entry.id,
                c.score
            )?;
        }
        writeln!(self.output, "  s. Skip    q. Quit    id:<company id>. Other company")?;

        loop {
            write!(self.output, "Select [1-{}/s/q]: ", candidates.len())?;
            self.output.flush()?;
            let Some(answer) = self.read_answer()? else {
                return Ok(Selection::Quit);
            };
            match parse_selection(&answer, candidates) {
                Some(selection) => return Ok(selection),
                None => writeln!(self.output, "Please enter a number between 1 and {}", candidates.len())?,
            }
        }
    }

    fn confirm(&mut self, _ticker: &TickerRecord, warning: &str) -> io::Result<bool> {
        writeln!(self.output, "Warning: {}", warning)?;
        write!(self.output, "Map anyway? [y/N]: ")?;
        self.output.flush()?;
        let answer = self.read_answer()?.unwrap_or_default().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
