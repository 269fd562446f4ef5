//! Prints a Graphviz rendering of a small red-black tree.
//!
//! Pipe the output through `dot -Tsvg` to see the node colors. Pass `trace`
//! as the first argument to log every rotation and fixup case to stderr.

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use allocated_rbtree::RbTreeMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let level = match std::env::args().nth(1).as_deref() {
        Some("trace") => LevelFilter::Trace,
        Some("debug") => LevelFilter::Debug,
        _ => LevelFilter::Warn,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?;

    let mut map = RbTreeMap::new();
    for k in 1..=10 {
        map.insert(k, k * k)?;
    }
    map.remove(&4)?;
    map.remove(&8)?;

    print!("{}", map.to_dot()?);

    Ok(())
}
