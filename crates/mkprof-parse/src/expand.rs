//! Make-style variable expansion over the merged template definitions.
//!
//! Expansion is lazy in the `=` sense: a reference may name a variable
//! defined later in the file. References to names the template does not
//! define, `$$` escapes and backtick commands are left verbatim.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::ParseError;
use crate::parser::Definition;

/// Bound on nested variable references.
pub const MAX_EXPANSION_DEPTH: usize = 64;

/// Bound on the bytes produced while expanding one template, counted
/// across every key and every reuse of a key.
pub const MAX_EXPANSION_SIZE: usize = 4_000_000;

pub(crate) struct Expander<'t> {
    defs: &'t HashMap<String, Definition>,
    /// finished expansions, by key
    memo: RefCell<HashMap<String, Vec<String>>>,
    produced: Cell<usize>,
}

impl<'t> Expander<'t> {
    pub(crate) fn new(defs: &'t HashMap<String, Definition>) -> Self {
        Self {
            defs,
            memo: RefCell::new(HashMap::new()),
            produced: Cell::new(0),
        }
    }

    /// Fully expanded words of `key`, or `None` if the template does not
    /// define it.
    pub(crate) fn expand(&self, key: &str) -> Result<Option<Vec<String>>, ParseError> {
        let Some(def) = self.defs.get(key) else {
            return Ok(None);
        };
        let mut stack = Vec::new();
        self.expand_key(key, def.line, &mut stack).map(Some)
    }

    fn charge(&self, bytes: usize, key: &str, line: u32) -> Result<(), ParseError> {
        let total = self.produced.get().saturating_add(bytes);
        if total > MAX_EXPANSION_SIZE {
            return Err(ParseError::ExpansionTooLarge {
                key: key.to_string(),
                line,
                limit: MAX_EXPANSION_SIZE,
            });
        }
        self.produced.set(total);
        Ok(())
    }

    fn expand_key(
        &self,
        key: &str,
        line: u32,
        stack: &mut Vec<String>,
    ) -> Result<Vec<String>, ParseError> {
        if let Some(words) = self.memo.borrow().get(key) {
            return Ok(words.clone());
        }
        if stack.iter().any(|k| k == key) {
            return Err(ParseError::RecursiveVariable {
                name: key.to_string(),
                line,
            });
        }
        if stack.len() >= MAX_EXPANSION_DEPTH {
            return Err(ParseError::ExpansionTooDeep {
                line,
                limit: MAX_EXPANSION_DEPTH,
            });
        }
        let Some(def) = self.defs.get(key) else {
            return Ok(Vec::new());
        };

        stack.push(key.to_string());
        let mut out = Vec::new();
        for word in &def.words {
            let words = self.expand_word(word, def.line, stack)?;
            self.charge(words.iter().map(|w| w.len() + 1).sum(), key, def.line)?;
            out.extend(words);
        }
        stack.pop();
        self.memo.borrow_mut().insert(key.to_string(), out.clone());
        Ok(out)
    }

    fn expand_word(
        &self,
        word: &str,
        line: u32,
        stack: &mut Vec<String>,
    ) -> Result<Vec<String>, ParseError> {
        if !word.contains('$') {
            return Ok(vec![word.to_string()]);
        }

        // `$(NAME)` on its own splices every word of NAME
        if let Some((name, end)) = reference_at(word, 0) {
            if end == word.len() && is_ident(name) {
                if self.defs.contains_key(name) {
                    return self.expand_key(name, line, stack);
                }
                return Ok(vec![word.to_string()]);
            }
        }

        match self.expand_text(word, line, stack)? {
            Some(text) => Ok(split_grouped(&text)),
            None => Ok(vec![word.to_string()]),
        }
    }

    /// Substitute every defined reference in `text`, including those nested
    /// in the arguments of `$(shell ...)` and similar calls. `None` when
    /// nothing changed.
    fn expand_text(
        &self,
        text: &str,
        line: u32,
        stack: &mut Vec<String>,
    ) -> Result<Option<String>, ParseError> {
        let bytes = text.as_bytes();
        let mut out = String::new();
        let mut copied = 0;
        let mut changed = false;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'`' => {
                    i = match text[i + 1..].find('`') {
                        Some(off) => i + off + 2,
                        None => bytes.len(),
                    };
                }
                b'$' => {
                    let Some((name, end)) = reference_at(text, i) else {
                        i += 1;
                        continue;
                    };
                    if is_ident(name) {
                        if self.defs.contains_key(name) {
                            let value = self.expand_key(name, line, stack)?.join(" ");
                            let key = stack.last().map(String::as_str).unwrap_or(name);
                            self.charge(value.len(), key, line)?;
                            out.push_str(&text[copied..i]);
                            out.push_str(&value);
                            copied = end;
                            changed = true;
                        }
                    } else if !name.is_empty() {
                        // call stays open, its arguments expand
                        if let Some(body) = self.expand_text(name, line, stack)? {
                            let close = if bytes[i + 1] == b'(' { ')' } else { '}' };
                            out.push_str(&text[copied..i + 2]);
                            out.push_str(&body);
                            out.push(close);
                            copied = end;
                            changed = true;
                        }
                    }
                    i = end;
                }
                _ => i += 1,
            }
        }

        if !changed {
            return Ok(None);
        }
        out.push_str(&text[copied..]);
        Ok(Some(out))
    }
}

/// The reference starting at byte `i` (which must be `$`): its name and
/// the byte offset just past it. `$$` yields an empty name.
fn reference_at(word: &str, i: usize) -> Option<(&str, usize)> {
    let bytes = word.as_bytes();
    if bytes.get(i) != Some(&b'$') {
        return None;
    }
    match bytes.get(i + 1).copied()? {
        b'$' => Some(("", i + 2)),
        open @ (b'(' | b'{') => {
            let close = if open == b'(' { b')' } else { b'}' };
            let mut depth = 0usize;
            for (j, &b) in bytes.iter().enumerate().skip(i + 1) {
                if b == open {
                    depth += 1;
                } else if b == close {
                    depth -= 1;
                    if depth == 0 {
                        return Some((&word[i + 2..j], j + 1));
                    }
                }
            }
            None
        }
        b if b.is_ascii_alphabetic() || b == b'_' => Some((&word[i + 1..i + 2], i + 2)),
        _ => None,
    }
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whitespace split that keeps `$(...)`, `${...}` and backtick segments whole.
fn split_grouped(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut cur = String::new();
    let mut depth = 0usize;
    let mut in_tick = false;
    let mut prev_dollar = false;

    for c in s.chars() {
        if in_tick {
            cur.push(c);
            in_tick = c != '`';
            continue;
        }
        match c {
            c if c.is_ascii_whitespace() && depth == 0 => {
                if !cur.is_empty() {
                    words.push(std::mem::take(&mut cur));
                }
            }
            '`' => {
                in_tick = true;
                cur.push(c);
            }
            '(' | '{' if prev_dollar || depth > 0 => {
                depth += 1;
                cur.push(c);
            }
            ')' | '}' if depth > 0 => {
                depth -= 1;
                cur.push(c);
            }
            _ => cur.push(c),
        }
        // `$$` is an escaped dollar and opens nothing
        prev_dollar = c == '$' && !prev_dollar;
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(pairs: &[(&str, &[&str])]) -> HashMap<String, Definition> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (k, ws))| {
                (
                    k.to_string(),
                    Definition {
                        words: ws.iter().map(|w| w.to_string()).collect(),
                        line: i as u32 + 1,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn whole_reference_splices_words() {
        let d = defs(&[("A", &["-x", "-y"]), ("B", &["$(A)", "-z"])]);
        let got = Expander::new(&d).expand("B").unwrap().unwrap();
        assert_eq!(got, ["-x", "-y", "-z"]);
    }

    #[test]
    fn embedded_reference_substitutes_text() {
        let d = defs(&[("NC", &["/opt/netcdf"]), ("C", &["-I${NC}/include"])]);
        let got = Expander::new(&d).expand("C").unwrap().unwrap();
        assert_eq!(got, ["-I/opt/netcdf/include"]);
    }

    #[test]
    fn undefined_and_escaped_references_stay_open() {
        let d = defs(&[("L", &["-L$(LD_LIBRARY_PATH)", "$$HOME", "$(shell nc-config --libs)"])]);
        let got = Expander::new(&d).expand("L").unwrap().unwrap();
        assert_eq!(got, ["-L$(LD_LIBRARY_PATH)", "$$HOME", "$(shell nc-config --libs)"]);
    }

    #[test]
    fn backticks_are_not_expanded() {
        let d = defs(&[("A", &["1"]), ("B", &["`echo $(A)`x$(A)"])]);
        let got = Expander::new(&d).expand("B").unwrap().unwrap();
        assert_eq!(got, ["`echo $(A)`x1"]);
    }

    #[test]
    fn cycle_is_reported() {
        let d = defs(&[("A", &["$(B)"]), ("B", &["-o", "$(A)"])]);
        let err = Expander::new(&d).expand("A").unwrap_err();
        assert!(matches!(err, ParseError::RecursiveVariable { ref name, .. } if name == "A"));
    }

    #[test]
    fn undefined_key_is_none() {
        let d = defs(&[]);
        assert!(Expander::new(&d).expand("CFLAGS").unwrap().is_none());
    }

    #[test]
    fn grouped_split_keeps_references_whole() {
        assert_eq!(
            split_grouped("-a $(shell x y) `p q` b"),
            ["-a", "$(shell x y)", "`p q`", "b"]
        );
    }

    #[test]
    fn idents() {
        assert!(is_ident("NETCDF_LIBS"));
        assert!(is_ident("_x1"));
        assert!(!is_ident("1x"));
        assert!(!is_ident("shell nc-config"));
        assert!(!is_ident(""));
    }

    #[test]
    fn escaped_dollar_does_not_group() {
        assert_eq!(split_grouped("$$(xa b)"), ["$$(xa", "b)"]);
        assert_eq!(split_grouped("$$$(x y)"), ["$$$(x y)"]);
    }

    #[test]
    fn call_arguments_expand() {
        let d = defs(&[
            ("NC", &["/opt/nc"]),
            ("L", &["$(shell $(NC)/bin/nf-config --flibs)", "${wildcard ${NC}/lib}"]),
        ]);
        let got = Expander::new(&d).expand("L").unwrap().unwrap();
        assert_eq!(
            got,
            ["$(shell /opt/nc/bin/nf-config --flibs)", "${wildcard /opt/nc/lib}"]
        );
    }

    #[test]
    fn self_reference_inside_call_is_a_cycle() {
        let d = defs(&[("A", &["$(shell echo $(A))"])]);
        let err = Expander::new(&d).expand("A").unwrap_err();
        assert!(matches!(err, ParseError::RecursiveVariable { .. }));
    }

    #[test]
    fn doubling_is_bounded() {
        let names: Vec<String> = (0..24).map(|i| format!("V{}", i)).collect();
        let refs: Vec<String> = names.iter().map(|n| format!("$({})", n)).collect();
        let mut pairs: Vec<(&str, Vec<&str>)> = vec![(names[0].as_str(), vec!["x"])];
        for i in 1..names.len() {
            pairs.push((names[i].as_str(), vec![refs[i - 1].as_str(), refs[i - 1].as_str()]));
        }
        let borrowed: Vec<(&str, &[&str])> =
            pairs.iter().map(|(k, v)| (*k, v.as_slice())).collect();
        let d = defs(&borrowed);
        let err = Expander::new(&d).expand("V23").unwrap_err();
        assert!(matches!(err, ParseError::ExpansionTooLarge { .. }), "{}", err);
    }

    #[test]
    fn shared_reference_is_expanded_once() {
        let d = defs(&[("A", &["-x"]), ("B", &["$(A)", "$(A)", "-I$(A)"])]);
        let ex = Expander::new(&d);
        assert_eq!(ex.expand("B").unwrap().unwrap(), ["-x", "-x", "-I-x"]);
        assert_eq!(ex.memo.borrow().get("A").map(Vec::len), Some(1));
    }
}
