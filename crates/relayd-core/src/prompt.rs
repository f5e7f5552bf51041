//! Incremental prompt detection on a byte stream.

/// Matcher that reports when the bytes fed to it end in the target string.
///
/// The algorithm keeps a cursor into the target: a matching byte advances
/// it, a mismatch resets it to the start and then gives the byte one more
/// chance against the first target byte. This is the relay module's
/// historical matching behavior; it is not a full substring-search
/// automaton, so targets with self-overlapping prefixes are not matched
/// exhaustively. The prompts in use are plain literals where this never
/// matters.
#[derive(Debug)]
pub struct PromptScanner {
    target: Vec<u8>,
    pos: usize,
}

impl PromptScanner {
    /// Create a scanner for the given prompt literal.
    pub fn new(target: &str) -> Self {
        debug_assert!(!target.is_empty());
        Self {
            target: target.as_bytes().to_vec(),
            pos: 0,
        }
    }

    /// Feed one byte; returns true when the prompt has just been completed.
    pub fn feed(&mut self, byte: u8) -> bool {
        if byte != self.target[self.pos] {
            self.pos = 0;
        }
        if byte == self.target[self.pos] {
            self.pos += 1;
            if self.pos == self.target.len() {
                self.pos = 0;
                return true;
            }
        }
        false
    }

    /// Forget any partial progress.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Current cursor position into the target.
    pub fn position(&self) -> usize {
        self.pos
    }
}
