//! Scanner for the monk Scripting Language
//!
//! Converts source text into a stream of `Token`s, one at a time. The scanner
//! holds the source as a character vector plus a current/next-read cursor
//! pair and never looks more than one character ahead of the character it is
//! about to consume.
//!
//! ## Tokenization Process
//!
//! 1. Skip whitespace (any Unicode whitespace code point).
//! 2. Try two-character punctuation (`== != <= >= ++ --`) via one-character
//!    lookahead, falling back to the one-character form.
//! 3. Classify identifiers/keywords, numeric literals (`,` as the decimal
//!    separator, never `.`), and single-quoted strings.
//! 4. Anything else becomes `Token::Illegal` carrying the offending text;
//!    the scanner never aborts, it just keeps producing tokens.
//!
//! Lexical errors never cross the scanner's boundary as a `Result` — they
//! surface as `Illegal` tokens for the parser (or any other consumer) to
//! report.

use crate::token::{lookup_keyword, lookup_punctuation, Token, TokenKind};

/// Identifier-continuation letters beyond ASCII that this language's
/// grammar additionally accepts (see spec §4.1 step 4).
const ACCENTED_LETTERS: &str = "áéíóúÁÉÍÓÚ";

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    read_position: usize,
    ch: char,
}

impl Lexer {
    /// Builds a new scanner over `input`, priming the first character.
    pub fn new(input: &str) -> Self {
        let mut lexer = Self {
            input: input.chars().collect(),
            position: 0,
            read_position: 0,
            ch: '\0',
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        self.ch = self.input.get(self.read_position).copied().unwrap_or('\0');
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> char {
        self.input.get(self.read_position).copied().unwrap_or('\0')
    }

    fn skip_whitespace(&mut self) {
        while self.ch.is_whitespace() {
            self.read_char();
        }
    }

    fn is_identifier_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_' || ACCENTED_LETTERS.contains(ch)
    }

    fn is_identifier_continue(ch: char) -> bool {
        Self::is_identifier_start(ch) || ch.is_ascii_digit()
    }

    /// Produces the next token, advancing the scanner's cursor past it.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.ch {
            '=' | '<' | '>' | '!' | '+' | '-' => self.read_operator(),
            '\0' => Token::eof(),
            ',' | ';' | '(' | ')' | '{' | '}' | '*' | '/' | '^' => {
                let lexeme = self.ch.to_string();
                self.read_char();
                Token::new(lookup_punctuation(&lexeme).unwrap(), lexeme)
            }
            ch if Self::is_identifier_start(ch) => self.read_identifier(),
            ch if ch.is_ascii_digit() => self.read_number(),
            '\'' => self.read_string(),
            ch => {
                let lexeme = ch.to_string();
                self.read_char();
                Token::new(TokenKind::Illegal, lexeme)
            }
        }
    }

    /// Handles the single- and two-character operators that require
    /// one-token lookahead: `== != <= >= ++ --`, falling back to the
    /// one-character form (`= < > ! + -`, the last two of which have no
    /// one-character token and become `Illegal`).
    fn read_operator(&mut self) -> Token {
        let first = self.ch;
        let two_char: String = [first, self.peek_char()].iter().collect();

        if let Some(kind) = lookup_punctuation(&two_char) {
            self.read_char();
            self.read_char();
            return Token::new(kind, two_char);
        }

        let one_char = first.to_string();
        self.read_char();
        match lookup_punctuation(&one_char) {
            Some(kind) => Token::new(kind, one_char),
            None => Token::new(TokenKind::Illegal, one_char),
        }
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        while Self::is_identifier_continue(self.ch) {
            self.read_char();
        }
        let literal: String = self.input[start..self.position].iter().collect();
        match lookup_keyword(&literal) {
            Some(kind) => Token::new(kind, literal),
            None => Token::new(TokenKind::Ident, literal),
        }
    }

    /// Reads an integer or, if a `,` decimal separator is encountered,
    /// a float. A second `,` inside the same literal is a scan error,
    /// emitted as `Illegal` carrying the partial text already consumed.
    fn read_number(&mut self) -> Token {
        let start = self.position;
        let mut is_float = false;

        while self.ch.is_ascii_digit() {
            self.read_char();
        }

        if self.ch == ',' {
            is_float = true;
            self.read_char();
            while self.ch.is_ascii_digit() {
                self.read_char();
            }
            if self.ch == ',' {
                let partial: String = self.input[start..self.position].iter().collect();
                self.read_char();
                return Token::new(TokenKind::Illegal, partial);
            }
        }

        let literal: String = self.input[start..self.position].iter().collect();
        Token::new(
            if is_float { TokenKind::Float } else { TokenKind::Int },
            literal,
        )
    }

    /// Reads a single-quoted string. An unterminated string (reaching
    /// end-of-input before the closing quote) is an `Illegal` token
    /// carrying the partial content read so far.
    fn read_string(&mut self) -> Token {
        self.read_char(); // consume opening quote
        let start = self.position;
        while self.ch != '\'' && self.ch != '\0' {
            self.read_char();
        }
        let content: String = self.input[start..self.position].iter().collect();
        if self.ch == '\0' {
            return Token::new(TokenKind::Illegal, content);
        }
        self.read_char(); // consume closing quote
        Token::new(TokenKind::Str, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_literals(source: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push((tok.kind, tok.literal));
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn assign_plus() {
        let toks = kinds_and_literals("=+");
        assert_eq!(
            toks,
            vec![
                (TokenKind::Assign, "=".to_string()),
                (TokenKind::Plus, "+".to_string()),
                (TokenKind::Eof, "".to_string()),
            ]
        );
    }

    #[test]
    fn function_declaration_source() {
        let source = "let add = def(x, y) { x + y; };";
        let toks = kinds_and_literals(source);
        let expected_kinds = vec![
            TokenKind::Let,
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Function,
            TokenKind::Lparen,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::Rparen,
            TokenKind::Lbrace,
            TokenKind::Ident,
            TokenKind::Plus,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::Rbrace,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ];
        let got_kinds: Vec<TokenKind> = toks.iter().map(|(k, _)| *k).collect();
        assert_eq!(got_kinds, expected_kinds);
        assert_eq!(toks.last().unwrap().1, "");
    }

    #[test]
    fn two_char_operators_are_not_split() {
        let toks = kinds_and_literals("== != <= >= ++ --");
        let got_kinds: Vec<TokenKind> = toks.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            got_kinds,
            vec![
                TokenKind::Equals,
                TokenKind::Diff,
                TokenKind::LtOrEquals,
                TokenKind::GtOrEquals,
                TokenKind::Incr,
                TokenKind::Decr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn float_literal_uses_comma_separator() {
        let toks = kinds_and_literals("3,14");
        assert_eq!(toks[0], (TokenKind::Float, "3,14".to_string()));
    }

    #[test]
    fn second_comma_in_number_is_illegal() {
        let toks = kinds_and_literals("1,2,3");
        assert_eq!(toks[0].0, TokenKind::Illegal);
    }

    #[test]
    fn unterminated_string_is_illegal() {
        let toks = kinds_and_literals("'hello");
        assert_eq!(toks[0], (TokenKind::Illegal, "hello".to_string()));
    }

    #[test]
    fn string_literal_has_no_delimiters_in_literal() {
        let toks = kinds_and_literals("'hello world'");
        assert_eq!(toks[0], (TokenKind::Str, "hello world".to_string()));
    }

    #[test]
    fn accented_letters_continue_identifiers() {
        let toks = kinds_and_literals("café");
        assert_eq!(toks[0], (TokenKind::Ident, "café".to_string()));
    }

    #[test]
    fn empty_source_yields_only_eof() {
        let toks = kinds_and_literals("");
        assert_eq!(toks, vec![(TokenKind::Eof, "".to_string())]);
    }

    #[test]
    fn whitespace_never_appears_in_tokens() {
        let toks = kinds_and_literals("  1   +   2  ");
        for (_, literal) in &toks {
            assert!(!literal.chars().any(|c| c.is_whitespace()));
        }
    }

    #[test]
    fn illegal_character_is_reported() {
        let toks = kinds_and_literals("@");
        assert_eq!(toks[0], (TokenKind::Illegal, "@".to_string()));
    }
}
