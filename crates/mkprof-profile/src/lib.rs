#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

pub mod span {
    use serde::{Deserialize, Serialize};

    /// Byte range into a template source.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Span {
        pub start: u32,
        pub end: u32,
    }
}

pub mod flags {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    /// Ordered words of one flag group. Order is load-bearing (link lines).
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FlagGroup {
        words: Vec<String>,
    }

    impl FlagGroup {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn from_words<I, S>(words: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                words: words.into_iter().map(Into::into).collect(),
            }
        }

        pub fn push(&mut self, word: impl Into<String>) {
            self.words.push(word.into());
        }

        pub fn extend<I, S>(&mut self, words: I)
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.words.extend(words.into_iter().map(Into::into));
        }

        pub fn iter(&self) -> impl Iterator<Item = &str> {
            self.words.iter().map(String::as_str)
        }

        pub fn as_slice(&self) -> &[String] {
            &self.words
        }

        pub fn len(&self) -> usize {
            self.words.len()
        }

        pub fn is_empty(&self) -> bool {
            self.words.is_empty()
        }

        pub fn contains(&self, word: &str) -> bool {
            self.words.iter().any(|w| w == word)
        }

        /// Index of the first occurrence of `word`.
        pub fn position(&self, word: &str) -> Option<usize> {
            self.words.iter().position(|w| w == word)
        }

        /// Index of the last occurrence of `word`.
        pub fn last_position(&self, word: &str) -> Option<usize> {
            self.words.iter().rposition(|w| w == word)
        }

        /// True if `prefix` is a leading run of this group's words.
        pub fn starts_with(&self, prefix: &FlagGroup) -> bool {
            self.words.starts_with(&prefix.words)
        }

        /// Words after a leading `prefix`, or `None` if it does not match.
        pub fn strip_prefix(&self, prefix: &FlagGroup) -> Option<&[String]> {
            self.words.strip_prefix(prefix.words.as_slice())
        }

        /// Values of every word that starts with `flag`, e.g. `-I` or `-L`.
        pub fn values_of<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
            self.words
                .iter()
                .filter_map(move |w| w.strip_prefix(flag))
                .filter(|v| !v.is_empty())
        }
    }

    impl fmt::Display for FlagGroup {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.words.join(" "))
        }
    }

    impl<'a> IntoIterator for &'a FlagGroup {
        type Item = &'a String;
        type IntoIter = std::slice::Iter<'a, String>;

        fn into_iter(self) -> Self::IntoIter {
            self.words.iter()
        }
    }

    /// An executable plus its leading arguments, e.g. `mpif90 -L/opt/lib`.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Invocation {
        pub program: String,
        pub args: FlagGroup,
    }

    impl Invocation {
        pub fn new(program: impl Into<String>) -> Self {
            Self {
                program: program.into(),
                args: FlagGroup::new(),
            }
        }

        pub fn with_args(program: impl Into<String>, args: FlagGroup) -> Self {
            Self {
                program: program.into(),
                args,
            }
        }

        /// Library search directories passed as `-L<dir>`.
        pub fn search_paths(&self) -> impl Iterator<Item = &str> {
            self.args.values_of("-L")
        }

        /// Final path component of the program, e.g. `mpif90` for `/opt/bin/mpif90`.
        pub fn basename(&self) -> &str {
            self.program
                .rsplit('/')
                .next()
                .unwrap_or(self.program.as_str())
        }
    }

    impl fmt::Display for Invocation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.program)?;
            for arg in &self.args {
                write!(f, " {}", arg)?;
            }
            Ok(())
        }
    }
}

pub mod profile {
    use super::flags::{FlagGroup, Invocation};
    use serde::{Deserialize, Serialize};

    /// A named, immutable bundle of compiler and linker settings for one
    /// toolchain target. Every flag group is fully expanded except for
    /// references the invoking environment is expected to provide.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ToolchainProfile {
        pub name: String,
        /// `CPPFLAGS`
        pub cppflags: FlagGroup,
        /// `FFLAGS`, already including the preprocessor flags when authored
        /// as `$(CPPFLAGS) ...`
        pub fflags: FlagGroup,
        /// `FC`
        pub fc: Invocation,
        /// `LD`
        pub ld: Invocation,
        /// `LDFLAGS`
        pub ldflags: FlagGroup,
        /// `CC`
        pub cc: Invocation,
        /// `CFLAGS`
        pub cflags: FlagGroup,
    }

    impl ToolchainProfile {
        /// Preprocessor include directories (`-I<dir>`), in order.
        pub fn include_paths(&self) -> impl Iterator<Item = &str> {
            self.cppflags.values_of("-I")
        }

        /// The whole link line after the linker program: `LD` arguments
        /// followed by `LDFLAGS`.
        pub fn link_line(&self) -> FlagGroup {
            let mut line = self.ld.args.clone();
            line.extend(self.ldflags.iter());
            line
        }

        /// References left unexpanded, deduplicated in first-seen order.
        pub fn open_variables(&self) -> Vec<String> {
            let words = self
                .cppflags
                .iter()
                .chain(self.fflags.iter())
                .chain(invocation_words(&self.fc))
                .chain(invocation_words(&self.ld))
                .chain(self.ldflags.iter())
                .chain(invocation_words(&self.cc))
                .chain(self.cflags.iter());

            let mut out: Vec<String> = Vec::new();
            for word in words {
                if is_open_reference(word) && !out.iter().any(|w| w == word) {
                    out.push(word.to_string());
                }
            }
            out
        }
    }

    fn invocation_words(inv: &Invocation) -> impl Iterator<Item = &str> {
        std::iter::once(inv.program.as_str()).chain(inv.args.iter())
    }

    /// `$(X)`, `${X}`, `$X`, or a backtick command substitution, anywhere
    /// in the word.
    pub fn is_open_reference(word: &str) -> bool {
        word.contains('$') || word.contains('`')
    }
}
