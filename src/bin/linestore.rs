use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use linestore::{LineStore, PolicyFlag, StoreError, StoreOptions};

/// Treat a flat text file as a collection of lines.
///
/// Mutating commands write the file back only when something changed (`sort`
/// always writes). With --dry-run nothing is written and the resulting contents
/// are printed instead.
#[derive(Parser)]
#[command(name = "linestore", version, about)]
struct Cli {
    /// Skip lines already present, on load and on add (true/false).
    #[arg(
        long,
        global = true,
        env = "LINESTORE_UNIQUE",
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true"
    )]
    unique: String,

    /// Keep lines sorted after every change.
    #[arg(long, global = true, env = "LINESTORE_SORTED")]
    sorted: bool,

    /// Written after each line on save. Accepts \n, \r and \t escapes.
    #[arg(long, global = true, env = "LINESTORE_SEPARATOR", default_value = "\\n")]
    separator: String,

    /// Do not accumulate the event trace.
    #[arg(long, global = true)]
    no_log: bool,

    /// Print the event trace to stderr when done.
    #[arg(long, global = true)]
    trace: bool,

    /// Do not write the file.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print every line.
    Show { file: String },
    /// Print the number of lines.
    Count { file: String },
    /// Exit 0 if the exact line is present, 1 otherwise.
    Check { file: String, line: String },
    /// Print lines containing a literal substring.
    Grep { file: String, needle: String },
    /// Print lines matching a regular expression.
    Egrep { file: String, pattern: String },
    /// Append lines.
    Add {
        file: String,
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Remove every occurrence of the given lines.
    Rm {
        file: String,
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Rewrite every line equal to one of OLD into the --with value.
    Replace {
        file: String,
        #[arg(long = "with")]
        new: String,
        #[arg(required = true)]
        old: Vec<String>,
    },
    /// Sort the file lexicographically.
    Sort {
        file: String,
        #[arg(long)]
        reverse: bool,
    },
}

impl Cmd {
    fn file(&self) -> &str {
        match self {
            Cmd::Show { file }
            | Cmd::Count { file }
            | Cmd::Check { file, .. }
            | Cmd::Grep { file, .. }
            | Cmd::Egrep { file, .. }
            | Cmd::Add { file, .. }
            | Cmd::Rm { file, .. }
            | Cmd::Replace { file, .. }
            | Cmd::Sort { file, .. } => file,
        }
    }
}

fn unescape(s: &str) -> String {
    s.replace("\\n", "\n").replace("\\r", "\r").replace("\\t", "\t")
}

fn print_lines<'a>(lines: impl IntoIterator<Item = &'a str>) {
    for line in lines {
        println!("{line}");
    }
}

fn finish_mutation(
    store: &mut LineStore,
    changed: bool,
    force: bool,
    dry_run: bool,
) -> Result<i32, StoreError> {
    println!("{}", if changed { "changed" } else { "unchanged" });
    if dry_run {
        print_lines(store.iter().map(String::as_str));
    } else if changed || force {
        store.persist()?;
    }
    Ok(0)
}

fn run(cli: &Cli, store: &mut LineStore) -> Result<i32, StoreError> {
    match &cli.command {
        Cmd::Show { .. } => {
            print_lines(store.iter().map(String::as_str));
            Ok(0)
        }
        Cmd::Count { .. } => {
            println!("{}", store.len());
            Ok(0)
        }
        Cmd::Check { line, .. } => match store.contains(line) {
            Some(found) => {
                println!("{found}");
                Ok(0)
            }
            None => Ok(1),
        },
        Cmd::Grep { needle, .. } => {
            let hits = store.search(needle);
            let code = if hits.is_empty() { 1 } else { 0 };
            print_lines(hits);
            Ok(code)
        }
        Cmd::Egrep { pattern, .. } => {
            let hits = store.search_regex(pattern)?;
            let code = if hits.is_empty() { 1 } else { 0 };
            print_lines(hits);
            Ok(code)
        }
        Cmd::Add { lines, .. } => {
            let changed = store.add(lines.clone())?;
            finish_mutation(store, changed, false, cli.dry_run)
        }
        Cmd::Rm { lines, .. } => {
            let changed = store.remove(lines.clone());
            finish_mutation(store, changed, false, cli.dry_run)
        }
        Cmd::Replace { new, old, .. } => {
            let changed = store.replace(old.clone(), new);
            finish_mutation(store, changed, false, cli.dry_run)
        }
        Cmd::Sort { reverse, .. } => {
            store.sort_now(*reverse);
            finish_mutation(store, false, true, cli.dry_run)
        }
    }
}

fn exit_code(err: &StoreError) -> i32 {
    if err.is_io() {
        1
    } else {
        2
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let unique: PolicyFlag = match cli.unique.parse() {
        Ok(flag) => flag,
        Err(never) => match never {},
    };
    let opts = StoreOptions::default()
        .path(cli.command.file())
        .logging(!cli.no_log)
        .unique(unique)
        .sorted(cli.sorted)
        .line_separator(unescape(&cli.separator));
    tracing::debug!(file = cli.command.file(), dry_run = cli.dry_run, "opening store");

    let mut store = match LineStore::with_options(opts) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(exit_code(&e));
        }
    };

    let code = match run(&cli, &mut store) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            exit_code(&e)
        }
    };

    if cli.trace {
        eprint!("{}", store.render_log());
    }
    process::exit(code);
}
