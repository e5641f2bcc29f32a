use std::io::{IsTerminal, Write};

use trainerdeck_console::Confirm;
use trainerdeck_core::console::ConsoleSink;

/// Console sink that writes straight to stdout.
pub struct StdoutSink;

impl ConsoleSink for StdoutSink {
    fn append(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        if out.write_all(text.as_bytes()).is_err() {
            return;
        }
        let _ = out.flush();
    }
}

/// Yes/no prompt on the terminal. Without a terminal nothing is confirmed.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if !std::io::stdin().is_terminal() {
            eprintln!("{prompt} (no terminal; pass --yes to confirm)");
            return false;
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}
