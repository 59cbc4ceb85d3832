//! Line-based menu input for the terminal client

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

pub const MENU: &str = "\
1. Chat
2. Get Time
3. Add Numbers
4. Get Quote
5. View History
6. Quit
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Chat,
    Time,
    Math,
    Quote,
    History,
    Quit,
}

impl MenuChoice {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "1" => Some(MenuChoice::Chat),
            "2" => Some(MenuChoice::Time),
            "3" => Some(MenuChoice::Math),
            "4" => Some(MenuChoice::Quote),
            "5" => Some(MenuChoice::History),
            "6" => Some(MenuChoice::Quit),
            _ => None,
        }
    }
}

/// Prompts on `output` and reads answers from `input`, one line each
pub struct Prompter<I, O> {
    lines: Lines<I>,
    output: O,
}

impl<I, O> Prompter<I, O>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    pub fn new(input: I, output: O) -> Self {
        Self {
            lines: input.lines(),
            output,
        }
    }

    /// Prints `text` verbatim, followed by a newline
    pub async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// Asks a question; `None` once input is exhausted
    pub async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }

    /// Asks until the answer parses as a number
    pub async fn ask_number(&mut self, prompt: &str) -> io::Result<Option<f64>> {
        loop {
            let Some(answer) = self.ask(prompt).await? else {
                return Ok(None);
            };
            match answer.parse::<f64>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => self.say("Please enter a number.").await?,
            }
        }
    }

    pub fn into_output(self) -> O {
        self.output
    }
}
