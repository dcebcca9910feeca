//! Tokenizer for preprocessed C++ translation units.
//!
//! Pull-based (spec §4.B): [`Lexer::next_token`] advances, [`Lexer::peek`]
//! looks ahead without consuming, and [`Lexer::save_position`] /
//! [`Lexer::restore_position`] checkpoint both the character cursor and any
//! buffered lookahead so the parser's speculative backtracking can rewind
//! through already-scanned tokens too.

use std::collections::VecDeque;

use faxc_util::{DiagnosticBuilder, FileId, Handler, Span, StringTable};

use crate::cursor::{Cursor, CursorSnapshot};
use crate::token::{FloatSuffix, IntSuffix, Keyword, Punct, Token, TokenKind};
use crate::unicode;

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    table: &'a mut StringTable,
    handler: &'a Handler,
    file_id: FileId,
    lookahead: VecDeque<Token>,
    token_start: usize,
    token_start_line: u32,
    token_start_column: u32,
}

#[derive(Clone)]
pub struct LexerCheckpoint {
    cursor: CursorSnapshot,
    lookahead: VecDeque<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file_id: FileId, table: &'a mut StringTable, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            table,
            handler,
            file_id,
            lookahead: VecDeque::new(),
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    pub fn next_token(&mut self) -> Token {
        if let Some(tok) = self.lookahead.pop_front() {
            return tok;
        }
        self.scan_token()
    }

    /// Look `k` tokens ahead (`k = 0` is the next token) without consuming.
    /// Clamped to the final buffered token once `Eof` has been produced.
    pub fn peek(&mut self, k: usize) -> Token {
        while self.lookahead.len() <= k {
            let eof_reached = self
                .lookahead
                .back()
                .map(|t| t.kind.is_eof())
                .unwrap_or(false);
            if eof_reached {
                break;
            }
            let tok = self.scan_token();
            self.lookahead.push_back(tok);
        }
        let idx = k.min(self.lookahead.len() - 1);
        self.lookahead[idx]
    }

    pub fn save_position(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            cursor: self.cursor.snapshot(),
            lookahead: self.lookahead.clone(),
        }
    }

    pub fn restore_position(&mut self, checkpoint: LexerCheckpoint) {
        self.cursor.restore(checkpoint.cursor);
        self.lookahead = checkpoint.lookahead;
    }

    /// Intern a string the parser needs a [`Symbol`](faxc_util::Symbol) for
    /// but that never appeared as its own token (e.g. a synthesized
    /// `operator+` name built from the `operator` keyword plus a punctuator).
    pub fn intern(&mut self, s: &str) -> faxc_util::Symbol {
        faxc_util::Symbol::from_u32(self.table.intern(s))
    }

    fn span(&self) -> Span {
        Span::with_file(
            self.token_start,
            self.cursor.position(),
            self.file_id,
            self.token_start_line,
            self.token_start_column,
        )
    }

    fn report_error(&mut self, message: impl Into<String>) {
        DiagnosticBuilder::error(message.into())
            .span(self.span())
            .emit(self.handler);
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::new(TokenKind::Eof, self.span());
        }

        let kind = match self.cursor.current_char() {
            '"' => self.lex_string(),
            '\'' => self.lex_char(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if unicode::is_ident_start(c) => self.lex_identifier(),
            _ => self.lex_punct(),
        };
        Token::new(kind, self.span())
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.current_byte() == Some(b'/') {
                match self.cursor.peek_char(1) {
                    '/' => {
                        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                            self.cursor.advance();
                        }
                        continue;
                    }
                    '*' => {
                        self.cursor.advance_n(2);
                        loop {
                            if self.cursor.is_at_end() {
                                self.report_error("unterminated block comment");
                                break;
                            }
                            if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                                self.cursor.advance_n(2);
                                break;
                            }
                            self.cursor.advance();
                        }
                        continue;
                    }
                    _ => {}
                }
            }
            break;
        }
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.cursor.position();
        while !self.cursor.is_at_end() && unicode::is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        if let Some(kw) = Keyword::from_str(text) {
            TokenKind::Keyword(kw)
        } else {
            TokenKind::Ident(faxc_util::Symbol::from_u32(self.table.intern(text)))
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.cursor.position();
        let (base, prefix_len) = if self.cursor.current_char() == '0' {
            match self.cursor.peek_char(1) {
                'x' | 'X' => (16, 2),
                'b' | 'B' => (2, 2),
                _ => (8, 0),
            }
        } else {
            (10, 0)
        };
        self.cursor.advance_n(prefix_len);

        let mut is_float = false;
        while !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if unicode::is_digit_in_base(c, base) || c == '\'' {
                self.cursor.advance();
            } else if base == 10 && c == '.' && self.cursor.peek_char(1) != '.' {
                is_float = true;
                self.cursor.advance();
                while !self.cursor.is_at_end() && self.cursor.current_char().is_ascii_digit() {
                    self.cursor.advance();
                }
            } else if base == 10 && (c == 'e' || c == 'E') {
                is_float = true;
                self.cursor.advance();
                if matches!(self.cursor.current_char(), '+' | '-') {
                    self.cursor.advance();
                }
                while !self.cursor.is_at_end() && self.cursor.current_char().is_ascii_digit() {
                    self.cursor.advance();
                }
            } else {
                break;
            }
        }

        let digits_end = self.cursor.position();
        let text: String = self.cursor.slice_from(start)[prefix_len..(digits_end - start)]
            .chars()
            .filter(|&c| c != '\'')
            .collect();

        if is_float {
            let mut is_f = false;
            let mut is_ld = false;
            match self.cursor.current_char() {
                'f' | 'F' => {
                    is_f = true;
                    self.cursor.advance();
                }
                'l' | 'L' => {
                    is_ld = true;
                    self.cursor.advance();
                }
                _ => {}
            }
            let value: f64 = text.parse().unwrap_or(0.0);
            TokenKind::FloatLiteral {
                value: value.to_bits(),
                suffix: FloatSuffix { is_float: is_f, is_long_double: is_ld },
            }
        } else {
            let value = u128::from_str_radix(&text, base).unwrap_or(0);
            let mut suffix = IntSuffix::default();
            loop {
                match self.cursor.current_char() {
                    'u' | 'U' => {
                        suffix.unsigned = true;
                        self.cursor.advance();
                    }
                    'l' | 'L' => {
                        if suffix.long {
                            suffix.long_long = true;
                        }
                        suffix.long = true;
                        self.cursor.advance();
                    }
                    _ => break,
                }
            }
            TokenKind::IntLiteral { value, suffix }
        }
    }

    fn parse_escape(&mut self) -> Option<char> {
        if self.cursor.is_at_end() {
            return None;
        }
        let c = self.cursor.current_char();
        self.cursor.advance();
        Some(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{C}',
            'v' => '\u{B}',
            'x' => {
                let start = self.cursor.position();
                while !self.cursor.is_at_end() && self.cursor.current_char().is_ascii_hexdigit() {
                    self.cursor.advance();
                }
                let hex = self.cursor.slice_from(start);
                unicode::parse_hex_codepoint(hex)
                    .and_then(unicode::codepoint_to_char)
                    .unwrap_or('\u{FFFD}')
            }
            other => other,
        })
    }

    fn lex_string(&mut self) -> TokenKind {
        self.cursor.advance();
        let mut content = String::new();
        loop {
            if self.cursor.is_at_end() || self.cursor.current_char() == '\n' {
                self.report_error("unterminated string literal");
                break;
            }
            let c = self.cursor.current_char();
            if c == '"' {
                self.cursor.advance();
                break;
            }
            if c == '\\' {
                self.cursor.advance();
                if let Some(escaped) = self.parse_escape() {
                    content.push(escaped);
                }
            } else {
                content.push(c);
                self.cursor.advance();
            }
        }
        TokenKind::StringLiteral(faxc_util::Symbol::from_u32(self.table.intern(&content)))
    }

    fn lex_char(&mut self) -> TokenKind {
        self.cursor.advance();
        let value = if self.cursor.current_char() == '\\' {
            self.cursor.advance();
            self.parse_escape().unwrap_or('\0')
        } else {
            let c = self.cursor.current_char();
            self.cursor.advance();
            c
        };
        if self.cursor.current_char() == '\'' {
            self.cursor.advance();
        } else {
            self.report_error("unterminated character literal");
        }
        TokenKind::CharLiteral(value)
    }

    fn lex_punct(&mut self) -> TokenKind {
        // Longest-match-first over the punctuator alphabet.
        const THREE: &[(&str, Punct)] = &[
            ("<=>", Punct::Spaceship),
            ("...", Punct::Ellipsis),
            ("->*", Punct::ArrowStar),
            ("<<=", Punct::ShlEq),
            (">>=", Punct::ShrEq),
        ];
        const TWO: &[(&str, Punct)] = &[
            ("::", Punct::ColonColon), ("->", Punct::Arrow), (".*", Punct::DotStar),
            ("++", Punct::PlusPlus), ("--", Punct::MinusMinus),
            ("<<", Punct::Shl), (">>", Punct::Shr),
            ("&&", Punct::AmpAmp), ("||", Punct::PipePipe),
            ("==", Punct::EqEq), ("!=", Punct::Ne), ("<=", Punct::Le), (">=", Punct::Ge),
            ("+=", Punct::PlusEq), ("-=", Punct::MinusEq), ("*=", Punct::StarEq),
            ("/=", Punct::SlashEq), ("%=", Punct::PercentEq), ("&=", Punct::AmpEq),
            ("|=", Punct::PipeEq), ("^=", Punct::CaretEq),
            ("##", Punct::HashHash), ("[[", Punct::LBracketLBracket),
            ("]]", Punct::RBracketRBracket),
        ];
        const ONE: &[(char, Punct)] = &[
            ('{', Punct::LBrace), ('}', Punct::RBrace), ('(', Punct::LParen), (')', Punct::RParen),
            ('[', Punct::LBracket), (']', Punct::RBracket),
            (';', Punct::Semi), (':', Punct::Colon), (',', Punct::Comma), ('.', Punct::Dot),
            ('?', Punct::Question),
            ('+', Punct::Plus), ('-', Punct::Minus), ('*', Punct::Star), ('/', Punct::Slash),
            ('%', Punct::Percent), ('&', Punct::Amp), ('|', Punct::Pipe), ('^', Punct::Caret),
            ('~', Punct::Tilde), ('=', Punct::Eq), ('<', Punct::Lt), ('>', Punct::Gt),
            ('!', Punct::Bang), ('#', Punct::Hash), ('@', Punct::At),
        ];

        let rest = self.cursor.remaining();
        for (spelling, punct) in THREE {
            if rest.starts_with(spelling) {
                self.cursor.advance_n(3);
                return TokenKind::Punct(*punct);
            }
        }
        for (spelling, punct) in TWO {
            if rest.starts_with(spelling) {
                self.cursor.advance_n(2);
                return TokenKind::Punct(*punct);
            }
        }
        let c = self.cursor.current_char();
        for (ch, punct) in ONE {
            if *ch == c {
                self.cursor.advance();
                return TokenKind::Punct(*punct);
            }
        }

        self.cursor.advance();
        let text = faxc_util::Symbol::from_u32(self.table.intern(&c.to_string()));
        self.report_error(format!("unexpected character '{c}'"));
        TokenKind::Invalid(text)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let tok = self.next_token();
        if tok.kind.is_eof() {
            None
        } else {
            Some(tok)
        }
    }
}
