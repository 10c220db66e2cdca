//! Command-line argument parsing.
//!
//! Usage:
//!   envmacros [-f<file>]... [-D<name>=<value>]... [-p<max>] [-Exvh] [--] <text>...

use std::path::PathBuf;

use crate::resolve::is_macro_name;

pub const USAGE: &str =
    "Usage: envmacros [-f<file>]... [-D<name>=<value>]... [-p<max>] [-Exvh] [--] <text>...";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    /// Varfiles to load, in order (`-f<file>`, repeatable).
    pub varfiles: Vec<PathBuf>,
    /// Definitions from `-D<name>=<value>`, applied after the varfiles.
    pub defines: Vec<(String, String)>,
    /// Pass budget override (`-p<max>`).
    pub pass_max: Option<usize>,
    /// Do not fall back to the process environment (`-E`).
    pub no_env: bool,
    /// Evaluate each text as an expression instead of just resolving (`-x`).
    pub evaluate: bool,
    /// Print the resolution trace to stderr (`-v`).
    pub verbose: bool,
    /// Print usage and exit (`-h`).
    pub help: bool,
    /// Texts to resolve.
    pub texts: Vec<String>,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if arg == "--" {
            args.texts.extend(argv[i + 1..].iter().cloned());
            break;
        }

        // A lone `-` or anything without a leading dash is text.
        if !arg.starts_with('-') || arg == "-" {
            args.texts.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'E' => args.no_env = true,
                'x' => args.evaluate = true,
                'v' => args.verbose = true,
                'h' => args.help = true,

                // Flags taking a value: attached (`-fvars.txt`) or separate
                // (`-f vars.txt`).
                flag @ ('f' | 'p' | 'D') => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{flag} requires an argument"));
                    };
                    match flag {
                        'f' => args.varfiles.push(PathBuf::from(value)),
                        'p' => {
                            let max = value
                                .parse()
                                .map_err(|_| format!("invalid pass limit: {value}"))?;
                            args.pass_max = Some(max);
                        }
                        _ => args.defines.push(parse_define(&value)?),
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    if args.texts.is_empty() && !args.help {
        return Err("no text to resolve".to_owned());
    }
    Ok(args)
}

/// Split `NAME=VALUE`.  The value may be empty; the name must be a valid
/// macro name.
fn parse_define(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("-D expects NAME=VALUE, got: {s}"))?;
    let name = name.trim();
    if !is_macro_name(name) {
        return Err(format!("invalid macro name: {name}"));
    }
    Ok((name.to_owned(), value.to_owned()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        let argv: Vec<String> = args.iter().map(|s| (*s).to_owned()).collect();
        parse_argv(&argv)
    }

    #[test]
    fn texts_only() {
        let a = parse(&["${HOME}/bin", "plain"]).unwrap();
        assert_eq!(a.texts, ["${HOME}/bin", "plain"]);
        assert!(!a.evaluate && !a.verbose && !a.no_env);
        assert!(a.varfiles.is_empty());
    }

    #[test]
    fn combined_flags() {
        let a = parse(&["-xvE", "1+1"]).unwrap();
        assert!(a.evaluate && a.verbose && a.no_env);
    }

    #[test]
    fn varfiles_attached_and_separate() {
        let a = parse(&["-fa.txt", "-f", "b.txt", "x"]).unwrap();
        assert_eq!(a.varfiles, [PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn value_flag_ends_the_cluster() {
        let a = parse(&["-vfvars.txt", "x"]).unwrap();
        assert!(a.verbose);
        assert_eq!(a.varfiles, [PathBuf::from("vars.txt")]);
    }

    #[test]
    fn pass_limit() {
        assert_eq!(parse(&["-p10", "x"]).unwrap().pass_max, Some(10));
        assert_eq!(parse(&["-p", "3", "x"]).unwrap().pass_max, Some(3));
        assert_eq!(parse(&["-pten", "x"]).unwrap_err(), "invalid pass limit: ten");
    }

    #[test]
    fn defines() {
        let a = parse(&["-Ddog=Dolly", "-D", "empty=", "x"]).unwrap();
        assert_eq!(
            a.defines,
            [("dog".to_owned(), "Dolly".to_owned()), ("empty".to_owned(), String::new())]
        );
        assert_eq!(parse(&["-Dnoequals", "x"]).unwrap_err(), "-D expects NAME=VALUE, got: noequals");
        assert_eq!(parse(&["-D9x=1", "x"]).unwrap_err(), "invalid macro name: 9x");
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = parse(&["-x", "--", "-1 + 2", "-v"]).unwrap();
        assert!(a.evaluate && !a.verbose);
        assert_eq!(a.texts, ["-1 + 2", "-v"]);
    }

    #[test]
    fn errors() {
        assert_eq!(parse(&["-q", "x"]).unwrap_err(), "unknown option: -q");
        assert_eq!(parse(&["x", "-f"]).unwrap_err(), "-f requires an argument");
        assert_eq!(parse(&[]).unwrap_err(), "no text to resolve");
        assert_eq!(parse(&["-v"]).unwrap_err(), "no text to resolve");
    }

    #[test]
    fn help_needs_no_text() {
        assert!(parse(&["-h"]).unwrap().help);
    }
}
