use crate::token::{Tok, TokKind};
use mkprof_profile::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LineStart,
    Operator,
    Value,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    state: State,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            state: State::LineStart,
        }
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.src.get(self.pos).copied()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }
    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn span(&self, start: usize) -> Span {
        Span {
            start: start as u32,
            end: self.pos as u32,
        }
    }

    fn tok(&self, kind: TokKind, start: usize, line: u32) -> Tok {
        Tok {
            kind,
            span: self.span(start),
            line,
        }
    }

    /// `\` immediately followed by a line break (`\n` or `\r\n`).
    fn at_continuation(&self) -> bool {
        self.peek() == Some(b'\\')
            && match self.peek2() {
                Some(b'\n') => true,
                Some(b'\r') => self.src.get(self.pos + 2) == Some(&b'\n'),
                _ => false,
            }
    }

    fn bump_continuation(&mut self) {
        self.bump(); // '\'
        if self.peek() == Some(b'\r') {
            self.bump();
        }
        self.bump(); // '\n'
    }

    fn skip_blank_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r') => {
                    self.bump();
                }
                Some(b'\\') if self.at_continuation() => self.bump_continuation(),
                // comment: runs to end of line, continuations included
                Some(b'#') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        if self.at_continuation() {
                            self.bump_continuation();
                            continue;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    pub fn next_tok(&mut self) -> Tok {
        loop {
            self.skip_blank_and_comments();
            let start = self.pos;
            let line = self.line;

            let Some(b) = self.peek() else {
                // close an unterminated last line before reporting Eof
                if self.state != State::LineStart {
                    self.state = State::LineStart;
                    return self.tok(TokKind::Newline, start, line);
                }
                return self.tok(TokKind::Eof, start, line);
            };

            if b == b'\n' {
                self.bump();
                if self.state == State::LineStart {
                    continue; // blank or comment-only line
                }
                self.state = State::LineStart;
                return self.tok(TokKind::Newline, start, line);
            }

            return match self.state {
                State::LineStart => {
                    self.state = State::Operator;
                    self.lex_key(start, line)
                }
                State::Operator => {
                    self.state = State::Value;
                    match self.lex_operator(start, line) {
                        Some(t) => t,
                        None => self.lex_word(start, line),
                    }
                }
                State::Value => self.lex_word(start, line),
            };
        }
    }

    fn lex_key(&mut self, start: usize, line: u32) -> Tok {
        while let Some(b) = self.peek() {
            if matches!(
                b,
                b' ' | b'\t' | b'\r' | b'\n' | b'=' | b'+' | b':' | b'?' | b'!' | b'#'
            ) {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            // operator with no name in front, e.g. "= foo"
            self.bump();
            return self.tok(
                TokKind::Error("expected variable name at start of line".into()),
                start,
                line,
            );
        }
        let key = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        self.tok(TokKind::Key(key), start, line)
    }

    fn lex_operator(&mut self, start: usize, line: u32) -> Option<Tok> {
        let b = self.peek()?;
        if b == b'=' {
            self.bump();
            return Some(self.tok(TokKind::Eq, start, line));
        }
        if b == b'+' && self.peek2() == Some(b'=') {
            self.bump();
            self.bump();
            return Some(self.tok(TokKind::PlusEq, start, line));
        }
        if matches!(b, b':' | b'?' | b'!') && self.peek2() == Some(b'=') {
            self.bump();
            self.bump();
            let op = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
            return Some(self.tok(TokKind::Other(op), start, line));
        }
        None
    }

    /// One whitespace-delimited word. `$(...)`, `${...}` and backtick
    /// segments keep their inner whitespace; `\#` is a literal `#`.
    fn lex_word(&mut self, start: usize, line: u32) -> Tok {
        let mut buf: Vec<u8> = Vec::new();
        let mut closers: Vec<u8> = Vec::new();
        let mut in_tick = false;

        while let Some(b) = self.peek() {
            if in_tick {
                if b == b'\n' {
                    break;
                }
                self.bump();
                buf.push(b);
                if b == b'`' {
                    in_tick = false;
                }
                continue;
            }
            match b {
                b'\n' => break,
                b' ' | b'\t' | b'\r' | b'#' if closers.is_empty() => break,
                b'\\' if self.at_continuation() => {
                    if closers.is_empty() {
                        break;
                    }
                    self.bump_continuation();
                    buf.push(b' ');
                }
                b'\\' if self.peek2() == Some(b'#') => {
                    self.bump();
                    self.bump();
                    buf.push(b'#');
                }
                b'`' => {
                    in_tick = true;
                    self.bump();
                    buf.push(b);
                }
                b'$' => {
                    self.bump();
                    buf.push(b);
                    match self.peek() {
                        Some(b'(') => closers.push(b')'),
                        Some(b'{') => closers.push(b'}'),
                        Some(b'$') => {}
                        _ => continue,
                    }
                    if let Some(next) = self.bump() {
                        buf.push(next);
                    }
                }
                b'(' if !closers.is_empty() => {
                    closers.push(b')');
                    self.bump();
                    buf.push(b);
                }
                b'{' if !closers.is_empty() => {
                    closers.push(b'}');
                    self.bump();
                    buf.push(b);
                }
                _ => {
                    if closers.last() == Some(&b) {
                        closers.pop();
                    }
                    self.bump();
                    buf.push(b);
                }
            }
        }

        if in_tick {
            return self.tok(
                TokKind::Error("unterminated backtick command".into()),
                start,
                line,
            );
        }
        if let Some(&closer) = closers.first() {
            let opener = if closer == b')' { "$(" } else { "${" };
            return self.tok(
                TokKind::Error(format!("unterminated `{}` reference", opener)),
                start,
                line,
            );
        }
        let word = String::from_utf8_lossy(&buf).into_owned();
        self.tok(TokKind::Word(word), start, line)
    }
}
