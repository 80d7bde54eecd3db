//! Serialize a profile back to `mkmf` template form.

use std::fmt::Write as _;

use crate::parser::{CC, CFLAGS, CPPFLAGS, FC, FFLAGS, LD, LDFLAGS};
use mkprof_profile::flags::FlagGroup;
use mkprof_profile::profile::ToolchainProfile;

/// Render `profile` as `KEY = value` lines that parse back to an equal
/// profile. `FFLAGS` is written as `$(CPPFLAGS) ...` when it starts with
/// the preprocessor flags.
pub fn render(profile: &ToolchainProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# mkmf template: {}", profile.name);

    assign(&mut out, CPPFLAGS, words(profile.cppflags.iter()));

    let fflags = match profile.fflags.strip_prefix(&profile.cppflags) {
        Some(rest) if !profile.cppflags.is_empty() => {
            let mut v = format!("$({})", CPPFLAGS);
            let rest = words(rest.iter().map(String::as_str));
            if !rest.is_empty() {
                v.push(' ');
                v.push_str(&rest);
            }
            v
        }
        _ => words(profile.fflags.iter()),
    };
    assign(&mut out, FFLAGS, fflags);

    assign(&mut out, FC, words(invocation_words(&profile.fc.program, &profile.fc.args)));
    assign(&mut out, LD, words(invocation_words(&profile.ld.program, &profile.ld.args)));
    assign(&mut out, CC, words(invocation_words(&profile.cc.program, &profile.cc.args)));
    assign(&mut out, LDFLAGS, words(profile.ldflags.iter()));
    assign(&mut out, CFLAGS, words(profile.cflags.iter()));
    out
}

fn invocation_words<'a>(program: &'a str, args: &'a FlagGroup) -> impl Iterator<Item = &'a str> {
    std::iter::once(program).chain(args.iter())
}

fn assign(out: &mut String, key: &str, value: String) {
    if value.is_empty() {
        let _ = writeln!(out, "{} =", key);
    } else if value.ends_with('\\') {
        // a trailing `\` would continue the line; an empty comment ends it
        let _ = writeln!(out, "{} = {} #", key, value);
    } else {
        let _ = writeln!(out, "{} = {}", key, value);
    }
}

fn words<'a>(ws: impl Iterator<Item = &'a str>) -> String {
    ws.map(escape_word).collect::<Vec<_>>().join(" ")
}

/// `#` starts a comment outside backticks, so it is written as `\#`.
fn escape_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_tick = false;
    for c in word.chars() {
        if c == '`' {
            in_tick = !in_tick;
        }
        if c == '#' && !in_tick {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
