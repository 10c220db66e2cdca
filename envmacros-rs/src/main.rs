use envmacros::cli::{self, CliArgs};
use envmacros::{read_text_varfile, Evaluator, Lookup, MacroResult, Resolver};

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("envmacros: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    if args.help {
        println!("{}", cli::USAGE);
        return;
    }

    std::process::exit(run(args));
}

/// Resolve every text argument; returns the exit status.
fn run(args: CliArgs) -> i32 {
    let mut lookup = Lookup::new().with_env(!args.no_env);

    // ── Varfiles, then -D overrides ───────────────────────────────────────────
    for path in &args.varfiles {
        if let Err(e) = read_text_varfile(path, &mut lookup) {
            eprintln!("envmacros: {e}");
            return 2;
        }
    }
    for (name, value) in args.defines {
        lookup.add_with_origin(name, value, "command line");
    }

    let mut builder = Resolver::builder().lookup(lookup);
    if let Some(max) = args.pass_max {
        builder = builder.pass_max(max);
    }
    let evaluator = Evaluator::new(builder.build());

    let mut status = 0;
    for text in &args.texts {
        let ok = if args.evaluate {
            report(evaluator.eval(text), args.verbose)
        } else {
            report(evaluator.resolver().resolve(text), args.verbose)
        };
        if !ok {
            status = 1;
        }
    }
    status
}

/// Print the value on stdout, or the error on stderr.  With `verbose` the
/// trace goes to stderr first.
fn report<T: std::fmt::Display>(result: MacroResult<T>, verbose: bool) -> bool {
    if verbose {
        for step in &result.steps {
            eprintln!("  {step}");
        }
    }
    match (&result.value, &result.error) {
        (Some(value), None) => {
            println!("{value}");
            true
        }
        (_, Some(err)) => {
            eprintln!("envmacros: {err}");
            false
        }
        (None, None) => false,
    }
}
