//! Search entry point: run the random construction driver against a fresh
//! sketch, compile the result, and print the well-formed expressions.

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use sketchlisp::driver::{DriverConfig, RandomDriver};
use sketchlisp::naming::WordList;
use sketchlisp::runtime::{validate_expression, StandardLibrary};
use sketchlisp::sketch::{compile_sketch, Sketch};

#[derive(Parser, Debug)]
#[command(name = "sketchlisp-search")]
#[command(about = "Randomly construct, compile and print sketchlisp expressions")]
struct Args {
    /// Move budget for the construction driver
    #[arg(long, default_value_t = 200)]
    moves: usize,

    /// Seed for the random driver
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Word file for cosmetic variable names, one name per line
    #[arg(long)]
    names: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let words = match &args.names {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => WordList::from_lines(content.lines()),
            Err(err) => {
                log::warn!(
                    "could not read name file {}: {}; using built-in names",
                    path.display(),
                    err
                );
                WordList::builtin()
            }
        },
        None => WordList::builtin(),
    };

    let mut sketch = Sketch::with_names(Box::new(words));
    let mut driver = RandomDriver::new(&DriverConfig {
        max_moves: args.moves,
        seed: args.seed,
    });
    let applied = driver.run(&mut sketch);
    log::info!(
        "{} moves applied; {} finished plans, {} unfinished",
        applied,
        sketch.finished_plans().count(),
        sketch.unfinished_plans().count()
    );

    let compilation = compile_sketch(&sketch);
    let vocabulary = StandardLibrary::default_vocabulary();
    println!("{} well-formed expression(s)", compilation.well_formed.len());
    for expr in &compilation.well_formed {
        let tag = if validate_expression(expr, &vocabulary).ok {
            "usable"
        } else {
            "mixed"
        };
        println!("[{}] {}", tag, expr);
    }
}
