use std::collections::HashMap;
use std::path::Path;

use crate::error::ParseError;
use crate::expand::{is_ident, Expander};
use crate::lexer::Lexer;
use crate::token::{Tok, TokKind};
use mkprof_profile::flags::{FlagGroup, Invocation};
use mkprof_profile::profile::ToolchainProfile;

/// Maximum template size in bytes (1MB)
pub const MAX_TEMPLATE_SIZE: usize = 1_000_000;

/// File name prefix `mkmf` uses for templates: `mkmf.template.<name>`.
pub const TEMPLATE_PREFIX: &str = "mkmf.template.";

pub const CPPFLAGS: &str = "CPPFLAGS";
pub const FFLAGS: &str = "FFLAGS";
pub const FC: &str = "FC";
pub const LD: &str = "LD";
pub const CC: &str = "CC";
pub const LDFLAGS: &str = "LDFLAGS";
pub const CFLAGS: &str = "CFLAGS";

/// Profile keys in the order they are written out.
pub const PROFILE_KEYS: [&str; 7] = [CPPFLAGS, FFLAGS, FC, LD, CC, LDFLAGS, CFLAGS];

pub fn parse_str(name: &str, src: &str) -> Result<ToolchainProfile, ParseError> {
    if src.len() > MAX_TEMPLATE_SIZE {
        return Err(ParseError::TooLarge {
            size: src.len(),
            limit: MAX_TEMPLATE_SIZE,
        });
    }
    let mut p = Parser::new(src);
    let template = p.parse_template()?;
    template.into_profile(name)
}

/// Read and parse a template file. The profile is named after the file:
/// `mkmf.template.ia64` becomes `ia64`.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ToolchainProfile, ParseError> {
    let path = path.as_ref();
    let io_err = |source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = std::fs::metadata(path).map_err(io_err)?.len();
    if size > MAX_TEMPLATE_SIZE as u64 {
        return Err(ParseError::TooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            limit: MAX_TEMPLATE_SIZE,
        });
    }
    let src = std::fs::read_to_string(path).map_err(io_err)?;
    parse_str(&profile_name_for(path), &src)
}

pub fn profile_name_for(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file.strip_prefix(TEMPLATE_PREFIX) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file),
    }
}

/// One variable with all of its `=` / `+=` lines merged.
#[derive(Debug, Clone)]
pub(crate) struct Definition {
    pub(crate) words: Vec<String>,
    /// line of the defining `=`
    pub(crate) line: u32,
}

struct Template {
    defs: HashMap<String, Definition>,
}

impl Template {
    fn into_profile(mut self, name: &str) -> Result<ToolchainProfile, ParseError> {
        // flag groups always exist, so `$(CPPFLAGS)` never stays open
        for key in [CPPFLAGS, FFLAGS, LDFLAGS, CFLAGS] {
            self.defs.entry(key.to_string()).or_insert(Definition {
                words: Vec::new(),
                line: 0,
            });
        }
        let ex = Expander::new(&self.defs);
        Ok(ToolchainProfile {
            name: name.to_string(),
            cppflags: group(&ex, CPPFLAGS)?,
            fflags: group(&ex, FFLAGS)?,
            fc: self.invocation(&ex, FC)?,
            ld: self.invocation(&ex, LD)?,
            ldflags: group(&ex, LDFLAGS)?,
            cc: self.invocation(&ex, CC)?,
            cflags: group(&ex, CFLAGS)?,
        })
    }

    fn invocation(&self, ex: &Expander<'_>, key: &'static str) -> Result<Invocation, ParseError> {
        let words = ex
            .expand(key)?
            .ok_or(ParseError::MissingKey { key })?;
        let mut words = words.into_iter();
        let Some(program) = words.next() else {
            let line = self.defs.get(key).map(|d| d.line).unwrap_or(0);
            return Err(ParseError::EmptyValue { key, line });
        };
        Ok(Invocation::with_args(program, FlagGroup::from_words(words)))
    }
}

fn group(ex: &Expander<'_>, key: &str) -> Result<FlagGroup, ParseError> {
    Ok(ex.expand(key)?.map(FlagGroup::from_words).unwrap_or_default())
}

fn syntax(line: u32, msg: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        line,
        msg: msg.into(),
    }
}

struct Parser<'a> {
    lex: Lexer<'a>,
    cur: Tok,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        let mut lex = Lexer::new(src);
        let cur = lex.next_tok();
        Self { lex, cur }
    }

    fn bump(&mut self) {
        self.cur = self.lex.next_tok();
    }

    fn parse_template(&mut self) -> Result<Template, ParseError> {
        let mut defs = HashMap::new();
        loop {
            match &self.cur.kind {
                TokKind::Eof => break,
                TokKind::Key(key) => {
                    let key = key.clone();
                    self.parse_assignment(key, &mut defs)?;
                }
                TokKind::Error(msg) => return Err(syntax(self.cur.line, msg.clone())),
                other => {
                    return Err(syntax(
                        self.cur.line,
                        format!("unexpected {:?} at start of line", other),
                    ))
                }
            }
        }
        Ok(Template { defs })
    }

    /// `KEY = words...` or `KEY += words...`, through the end of the line.
    fn parse_assignment(
        &mut self,
        key: String,
        defs: &mut HashMap<String, Definition>,
    ) -> Result<(), ParseError> {
        let line = self.cur.line;
        if !is_ident(&key) {
            return Err(ParseError::InvalidKey { key, line });
        }
        self.bump();

        let append = match &self.cur.kind {
            TokKind::Eq => false,
            TokKind::PlusEq => true,
            TokKind::Other(op) => {
                return Err(syntax(
                    line,
                    format!("unsupported assignment operator '{}' for '{}'", op, key),
                ))
            }
            TokKind::Error(msg) => return Err(syntax(self.cur.line, msg.clone())),
            _ => return Err(syntax(line, format!("expected '=' after '{}'", key))),
        };
        self.bump();

        let mut words = Vec::new();
        loop {
            match &self.cur.kind {
                TokKind::Word(w) => {
                    words.push(w.clone());
                    self.bump();
                }
                TokKind::Newline => {
                    self.bump();
                    break;
                }
                TokKind::Eof => break,
                TokKind::Error(msg) => return Err(syntax(self.cur.line, msg.clone())),
                other => {
                    return Err(syntax(
                        self.cur.line,
                        format!("unexpected {:?} in value of '{}'", other, key),
                    ))
                }
            }
        }

        if let Some(def) = defs.get_mut(&key) {
            if !append {
                return Err(ParseError::DuplicateKey {
                    key,
                    line,
                    first: def.line,
                });
            }
            def.words.extend(words);
            return Ok(());
        }
        if append {
            return Err(ParseError::AppendToUndefined { key, line });
        }
        defs.insert(key, Definition { words, line });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_from_template_file() {
        assert_eq!(profile_name_for(Path::new("/x/mkmf.template.ia64")), "ia64");
        assert_eq!(profile_name_for(Path::new("gfortran.mk")), "gfortran");
    }

    #[test]
    fn too_large_is_rejected() {
        let src = "#".repeat(MAX_TEMPLATE_SIZE + 1);
        assert!(matches!(
            parse_str("big", &src),
            Err(ParseError::TooLarge { .. })
        ));
    }
}
