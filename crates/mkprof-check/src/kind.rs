//! Integer/real kind promotion flags (`-i4 -r8` and friends).

use std::fmt;

use mkprof_profile::flags::FlagGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KindDimension {
    Integer,
    Real,
}

impl fmt::Display for KindDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindDimension::Integer => write!(f, "integer"),
            KindDimension::Real => write!(f, "real"),
        }
    }
}

/// Default integer and real widths in bytes. `None` means the group does
/// not set that width and the compiler default applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KindConvention {
    pub integer: Option<u8>,
    pub real: Option<u8>,
}

/// Two flags in one group setting different widths for the same dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindConflict {
    pub dimension: KindDimension,
    pub first: String,
    pub second: String,
}

impl KindConvention {
    /// 4 byte integers, 8 byte reals.
    pub const I4_R8: KindConvention = KindConvention {
        integer: Some(4),
        real: Some(8),
    };

    pub fn is_unset(&self) -> bool {
        self.integer.is_none() && self.real.is_none()
    }

    /// Read every kind flag in `flags`. Repeating the same width is fine.
    pub fn scan(flags: &FlagGroup) -> Result<Self, KindConflict> {
        let mut conv = KindConvention::default();
        let mut seen_int: Option<String> = None;
        let mut seen_real: Option<String> = None;

        let words = flags.as_slice();
        let mut i = 0;
        while i < words.len() {
            let (flag, consumed) = match words[i].as_str() {
                // Intel long form takes a bit count as the next word
                w @ ("-integer-size" | "-real-size") => {
                    let bits = words.get(i + 1).and_then(|b| b.parse::<u16>().ok());
                    match bits {
                        Some(bits) if bits % 8 == 0 => {
                            let dim = if w == "-integer-size" {
                                KindDimension::Integer
                            } else {
                                KindDimension::Real
                            };
                            (Some((dim, (bits / 8) as u8)), 2)
                        }
                        _ => (None, 1),
                    }
                }
                w => (parse_short(w), 1),
            };

            if let Some((dim, width)) = flag {
                let text = words[i..i + consumed].join(" ");
                let (slot, seen) = match dim {
                    KindDimension::Integer => (&mut conv.integer, &mut seen_int),
                    KindDimension::Real => (&mut conv.real, &mut seen_real),
                };
                match *slot {
                    Some(prev) if prev != width => {
                        return Err(KindConflict {
                            dimension: dim,
                            first: seen.clone().unwrap_or_default(),
                            second: text,
                        });
                    }
                    Some(_) => {}
                    None => {
                        *slot = Some(width);
                        *seen = Some(text);
                    }
                }
            }
            i += consumed;
        }
        Ok(conv)
    }

    /// True when every width set in `self` matches `other` (unset widths
    /// in either side are not compared).
    pub fn agrees_with(&self, other: &KindConvention) -> bool {
        let dim_ok = |a: Option<u8>, b: Option<u8>| match (a, b) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        dim_ok(self.integer, other.integer) && dim_ok(self.real, other.real)
    }
}

fn parse_short(word: &str) -> Option<(KindDimension, u8)> {
    match word {
        "-fdefault-integer-8" => return Some((KindDimension::Integer, 8)),
        "-fdefault-real-8" => return Some((KindDimension::Real, 8)),
        _ => {}
    }
    let (dim, digits) = if let Some(d) = word.strip_prefix("-i") {
        (KindDimension::Integer, d)
    } else if let Some(d) = word.strip_prefix("-r") {
        (KindDimension::Real, d)
    } else {
        return None;
    };
    match digits {
        "2" | "4" | "8" | "16" => digits.parse().ok().map(|w| (dim, w)),
        _ => None,
    }
}

impl fmt::Display for KindConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            return write!(f, "compiler default");
        }
        let mut parts = Vec::new();
        if let Some(i) = self.integer {
            parts.push(format!("-i{}", i));
        }
        if let Some(r) = self.real {
            parts.push(format!("-r{}", r));
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(words: &[&str]) -> Result<KindConvention, KindConflict> {
        KindConvention::scan(&FlagGroup::from_words(words.iter().copied()))
    }

    #[test]
    fn intel_short_flags() {
        assert_eq!(scan(&["-O2", "-i4", "-r8"]).unwrap(), KindConvention::I4_R8);
    }

    #[test]
    fn intel_long_flags() {
        let k = scan(&["-integer-size", "32", "-real-size", "64"]).unwrap();
        assert_eq!(k, KindConvention::I4_R8);
    }

    #[test]
    fn gfortran_default_real() {
        let k = scan(&["-fdefault-real-8"]).unwrap();
        assert_eq!(k.real, Some(8));
        assert_eq!(k.integer, None);
    }

    #[test]
    fn repeated_width_is_not_a_conflict() {
        assert!(scan(&["-r8", "-fdefault-real-8", "-r8"]).is_ok());
    }

    #[test]
    fn conflicting_widths() {
        let err = scan(&["-i4", "-r8", "-i8"]).unwrap_err();
        assert_eq!(err.dimension, KindDimension::Integer);
        assert_eq!(err.first, "-i4");
        assert_eq!(err.second, "-i8");
    }

    #[test]
    fn unrelated_flags_are_ignored() {
        let k = scan(&["-inline_debug_info", "-rdynamic", "-I/usr/include"]).unwrap();
        assert!(k.is_unset());
        assert_eq!(k.to_string(), "compiler default");
    }

    #[test]
    fn agreement_ignores_unset_widths() {
        let only_real = KindConvention {
            integer: None,
            real: Some(8),
        };
        assert!(only_real.agrees_with(&KindConvention::I4_R8));
        let r4 = KindConvention {
            integer: None,
            real: Some(4),
        };
        assert!(!r4.agrees_with(&KindConvention::I4_R8));
    }
}
