use mkprof_profile::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    // trivia / eof / error
    Eof,
    /// End of a logical line (continuations already folded)
    Newline,
    /// Error token (e.g., unterminated `$(`)
    Error(String),
    // assignment
    Key(String),
    Eq,       // =
    PlusEq,   // +=
    Other(String), // :=, ?=, ... (rejected by the parser)
    // value words, escapes already resolved
    Word(String),
}

#[derive(Debug, Clone)]
pub struct Tok {
    pub kind: TokKind,
    pub span: Span,
    /// 1-based line the token starts on
    pub line: u32,
}
