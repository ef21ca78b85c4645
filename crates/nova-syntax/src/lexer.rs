//! Hand-written lexer producing lossless tokens (trivia included).

use text_size::{TextRange, TextSize};

use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl Token {
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.range]
    }
}

/// Tokenize `input`. The last token is always [`SyntaxKind::Eof`].
///
/// Malformed input never fails: unterminated literals and comments, and
/// characters outside the grammar become [`SyntaxKind::Error`] tokens.
pub fn lex(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == SyntaxKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    tokens
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> Token {
        let start = self.pos;
        let kind = match self.peek() {
            None => SyntaxKind::Eof,
            Some(c) if c.is_whitespace() => {
                self.eat_while(char::is_whitespace);
                SyntaxKind::Whitespace
            }
            Some('/') if self.peek_nth(1) == Some('/') => {
                self.eat_while(|c| c != '\n' && c != '\r');
                SyntaxKind::LineComment
            }
            Some('/') if self.peek_nth(1) == Some('*') => self.block_comment(),
            Some(c) if is_ident_start(c) => {
                self.eat_while(is_ident_continue);
                SyntaxKind::from_keyword(&self.input[start..self.pos]).unwrap_or(SyntaxKind::Identifier)
            }
            Some(c) if c.is_ascii_digit() => self.number(),
            Some('.') if self.peek_nth(1).map_or(false, |c| c.is_ascii_digit()) => self.number(),
            Some('"') => self.quoted('"', SyntaxKind::StringLiteral),
            Some('\'') => self.quoted('\'', SyntaxKind::CharLiteral),
            Some(_) => self.punctuation(),
        };
        Token {
            kind,
            range: TextRange::new(TextSize::from(start as u32), TextSize::from(self.pos as u32)),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn block_comment(&mut self) -> SyntaxKind {
        self.pos += 2;
        while let Some(c) = self.bump() {
            if c == '*' && self.peek() == Some('/') {
                self.pos += 1;
                return SyntaxKind::BlockComment;
            }
        }
        SyntaxKind::Error
    }

    fn number(&mut self) -> SyntaxKind {
        if self.peek() == Some('0') && matches!(self.peek_nth(1), Some('x' | 'X')) {
            self.pos += 2;
            self.eat_while(|c| c.is_ascii_hexdigit() || c == '_');
            return self.integer_suffix();
        }

        let mut floating = false;
        self.eat_while(|c| c.is_ascii_digit() || c == '_');
        if self.peek() == Some('.') && self.peek_nth(1).map_or(false, |c| c.is_ascii_digit()) {
            floating = true;
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = matches!(self.peek_nth(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_nth(digit_at).map_or(false, |c| c.is_ascii_digit()) {
                floating = true;
                self.pos += digit_at;
                self.eat_while(|c| c.is_ascii_digit());
            }
        }

        match self.peek() {
            Some('f' | 'F') => {
                self.pos += 1;
                SyntaxKind::FloatLiteral
            }
            Some('d' | 'D') => {
                self.pos += 1;
                SyntaxKind::DoubleLiteral
            }
            _ if floating => SyntaxKind::DoubleLiteral,
            _ => self.integer_suffix(),
        }
    }

    fn integer_suffix(&mut self) -> SyntaxKind {
        if matches!(self.peek(), Some('l' | 'L')) {
            self.pos += 1;
            SyntaxKind::LongLiteral
        } else {
            SyntaxKind::IntLiteral
        }
    }

    fn quoted(&mut self, quote: char, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.pos += 1;
                    if self.bump().is_none() {
                        break;
                    }
                }
                '\n' | '\r' => break,
                c if c == quote => {
                    self.pos += 1;
                    return kind;
                }
                c => self.pos += c.len_utf8(),
            }
        }
        SyntaxKind::Error
    }

    fn punctuation(&mut self) -> SyntaxKind {
        const TABLE: &[(&str, SyntaxKind)] = &[
            (">>>=", SyntaxKind::UnsignedRightShiftEq),
            (">>>", SyntaxKind::UnsignedRightShift),
            ("<<=", SyntaxKind::LeftShiftEq),
            (">>=", SyntaxKind::RightShiftEq),
            ("->", SyntaxKind::Arrow),
            ("==", SyntaxKind::EqEq),
            ("!=", SyntaxKind::BangEq),
            ("<=", SyntaxKind::LessEq),
            (">=", SyntaxKind::GreaterEq),
            ("&&", SyntaxKind::AmpAmp),
            ("||", SyntaxKind::PipePipe),
            ("&=", SyntaxKind::AmpEq),
            ("|=", SyntaxKind::PipeEq),
            ("^=", SyntaxKind::CaretEq),
            ("++", SyntaxKind::PlusPlus),
            ("--", SyntaxKind::MinusMinus),
            ("+=", SyntaxKind::PlusEq),
            ("-=", SyntaxKind::MinusEq),
            ("*=", SyntaxKind::StarEq),
            ("/=", SyntaxKind::SlashEq),
            ("%=", SyntaxKind::PercentEq),
            ("<<", SyntaxKind::LeftShift),
            (">>", SyntaxKind::RightShift),
            ("(", SyntaxKind::LParen),
            (")", SyntaxKind::RParen),
            ("{", SyntaxKind::LBrace),
            ("}", SyntaxKind::RBrace),
            ("[", SyntaxKind::LBracket),
            ("]", SyntaxKind::RBracket),
            (";", SyntaxKind::Semicolon),
            (",", SyntaxKind::Comma),
            (".", SyntaxKind::Dot),
            ("?", SyntaxKind::Question),
            (":", SyntaxKind::Colon),
            ("+", SyntaxKind::Plus),
            ("-", SyntaxKind::Minus),
            ("*", SyntaxKind::Star),
            ("/", SyntaxKind::Slash),
            ("%", SyntaxKind::Percent),
            ("~", SyntaxKind::Tilde),
            ("!", SyntaxKind::Bang),
            ("=", SyntaxKind::Eq),
            ("<", SyntaxKind::Less),
            (">", SyntaxKind::Greater),
            ("&", SyntaxKind::Amp),
            ("|", SyntaxKind::Pipe),
            ("^", SyntaxKind::Caret),
        ];

        let rest = &self.input[self.pos..];
        for (text, kind) in TABLE {
            if rest.starts_with(text) {
                self.pos += text.len();
                return *kind;
            }
        }
        self.bump();
        SyntaxKind::Error
    }
}

pub fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}
