//! Text varfile loader.
//!
//! A varfile holds one definition per line:
//!
//! | Line | Action |
//! |------|--------|
//! | `NAME = VALUE` | add a static entry, origin `FILE:LINE` |
//! | blank, or starting with `#` | ignored |
//! | anything else | [`VarfileError::Syntax`] |
//!
//! Values are stored unexpanded and trimmed; `${...}` inside them is resolved
//! later, at lookup time.  Defining a name that already has a static entry is
//! a [`VarfileError::Duplicate`].  Loading stops at the first fault, keeping
//! the entries added before it.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::VarfileError;
use crate::lookup::Lookup;

fn definition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*=\s*(?P<value>.*)$")
            .expect("definition pattern is valid")
    })
}

/// Parse varfile text into `lookup`.  `source_name` prefixes every origin and
/// error message.  Returns the number of entries added.
pub fn load_str(src: &str, source_name: &str, lookup: &mut Lookup) -> Result<usize, VarfileError> {
    let mut added = 0;

    for (i, raw) in src.lines().enumerate() {
        let origin = format!("{source_name}:{}", i + 1);
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(caps) = definition_re().captures(line) else {
            return Err(VarfileError::Syntax { origin, line: line.to_owned() });
        };
        let name = &caps["name"];
        let value = caps["value"].trim();

        if let Some(previous) = lookup.entry(name) {
            return Err(VarfileError::Duplicate {
                origin,
                name: name.to_owned(),
                previous: previous.origin.clone().unwrap_or_else(|| "unknown".to_owned()),
            });
        }

        log::debug!("{origin}: {name} = {value:?}");
        lookup.add_with_origin(name, value, origin);
        added += 1;
    }

    Ok(added)
}

/// Read and parse a varfile from disk.
pub fn read_text_varfile(path: impl AsRef<Path>, lookup: &mut Lookup) -> Result<usize, VarfileError> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path)
        .map_err(|source| VarfileError::Io { path: path.to_owned(), source })?;
    let added = load_str(&src, &path.display().to_string(), lookup)?;
    log::debug!("{}: {added} entries", path.display());
    Ok(added)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
