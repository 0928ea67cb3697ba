use std::io::{self, BufRead, Write};

/// Interactive questions put to the operator during a run.
pub trait OperatorPrompt {
    /// Yes/no question. Only `y`/`n` answers return.
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;

    /// Free-form single line answer, trimmed. `None` when input is closed.
    fn ask_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Blocking yes/no prompt over an injected line source.
pub struct ConfirmationGate<R, W> {
    input: R,
    output: W,
}

impl ConfirmationGate<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConfirmationGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask until the operator answers `y` or `n` (case-insensitive).
    ///
    /// Any other answer re-prompts. Closed input returns `UnexpectedEof`.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            write!(self.output, "{} [Y/N] ", prompt)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed before an answer was given",
                ));
            }

            match line.trim() {
                answer if answer.eq_ignore_ascii_case("y") => return Ok(true),
                answer if answer.eq_ignore_ascii_case("n") => return Ok(false),
                _ => writeln!(self.output, "Please answer Y or N.")?,
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> OperatorPrompt for ConfirmationGate<R, W> {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        ConfirmationGate::confirm(self, prompt)
    }

    fn ask_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{} ", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Runs a blocking prompt on a tokio worker without starving the runtime.
///
/// Requires the multi-threaded runtime, which `#[tokio::main]` provides.
pub struct BlockingPrompt<P> {
    inner: P,
}

impl<P: OperatorPrompt> BlockingPrompt<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: OperatorPrompt> OperatorPrompt for BlockingPrompt<P> {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        tokio::task::block_in_place(|| self.inner.confirm(prompt))
    }

    fn ask_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        tokio::task::block_in_place(|| self.inner.ask_line(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(input: &str) -> (io::Result<bool>, String) {
        let mut gate = ConfirmationGate::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let answer = gate.confirm("Proceed?");
        let output = String::from_utf8(gate.into_output()).unwrap();
        (answer, output)
    }

    #[test]
    fn accepts_yes_in_either_case() {
        assert!(ask("y\n").0.unwrap());
        assert!(ask("Y\n").0.unwrap());
        assert!(ask("  y  \r\n").0.unwrap());
    }

    #[test]
    fn accepts_no_in_either_case() {
        assert!(!ask("n\n").0.unwrap());
        assert!(!ask("N\n").0.unwrap());
    }

    #[test]
    fn reprompts_on_other_input() {
        let (answer, output) = ask("yes\nmaybe\n\nN\n");
        assert!(!answer.unwrap());
        assert_eq!(output.matches("Proceed? [Y/N]").count(), 4);
        assert_eq!(output.matches("Please answer Y or N.").count(), 3);
    }

    #[test]
    fn ask_line_trims_and_reports_closed_input() {
        let mut gate = ConfirmationGate::new(Cursor::new(b"  /tmp/report.html \n".to_vec()), Vec::new());
        assert_eq!(
            gate.ask_line("Path:").unwrap().as_deref(),
            Some("/tmp/report.html")
        );
        assert_eq!(gate.ask_line("Path:").unwrap(), None);
    }

    #[test]
    fn closed_input_is_an_error() {
        let (answer, _) = ask("what\n");
        assert_eq!(answer.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocking_prompt_delegates_on_worker_thread() {
        let input = Cursor::new(b"maybe\nY\n  C:\\reports \n".to_vec());
        let gate = ConfirmationGate::new(input, Vec::new());
        let mut prompt = BlockingPrompt::new(gate);

        assert!(prompt.confirm("Proceed?").unwrap());
        assert_eq!(
            prompt.ask_line("Path:").unwrap().as_deref(),
            Some("C:\\reports")
        );

        let output = String::from_utf8(prompt.into_inner().into_output()).unwrap();
        assert_eq!(output.matches("[Y/N]").count(), 2);
    }
}
