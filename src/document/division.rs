//! Tokenized form of a textual block

use unicode_segmentation::UnicodeSegmentation;

/// Classification of one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Run of ASCII alphanumerics / underscores
    Word,
    /// Run of whitespace
    Whitespace,
    /// A single other grapheme cluster (punctuation, CJK, emoji, ...)
    Other,
}

/// One token of a division, with byte and character bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token within the normalized text
    pub byte_start: usize,
    /// Length of the token in bytes
    pub byte_len: usize,
    /// Character offset (Unicode scalars) within the normalized text
    pub char_start: usize,
    /// Length of the token in characters
    pub char_len: usize,
}

impl Token {
    /// The token's slice of the source text
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.byte_start..self.byte_start + self.byte_len]
    }

    /// Character offset one past the token's last character
    pub fn char_end(&self) -> usize {
        self.char_start + self.char_len
    }

    /// Whitespace-only tokens carry no measurable content
    pub fn is_blank(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

/// Ordered token sequence for one textual block.
///
/// Concatenating the tokens reproduces the normalized source text exactly;
/// character offsets partition `[0, charLen)` with no gaps or overlaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Division {
    tokens: Vec<Token>,
}

impl Division {
    /// Tokenize normalized text into word runs, whitespace runs, and
    /// single other grapheme clusters.
    pub fn build(text: &str) -> Self {
        let mut tokens: Vec<Token> = Vec::new();
        let mut char_pos = 0usize;

        for (byte_idx, grapheme) in text.grapheme_indices(true) {
            let kind = classify(grapheme);
            let chars = grapheme.chars().count();
            match tokens.last_mut() {
                Some(last) if last.kind == kind && kind != TokenKind::Other => {
                    last.byte_len += grapheme.len();
                    last.char_len += chars;
                }
                _ => tokens.push(Token {
                    kind,
                    byte_start: byte_idx,
                    byte_len: grapheme.len(),
                    char_start: char_pos,
                    char_len: chars,
                }),
            }
            char_pos += chars;
        }

        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Total character count of the source text
    pub fn char_len(&self) -> usize {
        self.tokens.last().map_or(0, Token::char_end)
    }

    /// Source slice covering the inclusive token range `[from, to]`
    pub fn slice_text<'a>(&self, source: &'a str, from: usize, to: usize) -> &'a str {
        match (self.tokens.get(from), self.tokens.get(to)) {
            (Some(a), Some(b)) if from <= to => {
                &source[a.byte_start..b.byte_start + b.byte_len]
            }
            _ => "",
        }
    }
}

/// A grapheme cluster classifies by its first scalar: ASCII word characters
/// accumulate into word runs, whitespace into whitespace runs, anything
/// else stands alone.
fn classify(grapheme: &str) -> TokenKind {
    match grapheme.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => TokenKind::Word,
        Some(c) if c.is_whitespace() => TokenKind::Whitespace,
        _ => TokenKind::Other,
    }
}
