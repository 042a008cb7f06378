//! Word dump utility
//! Prints a file's bytes as 16-bit big-endian words, optionally narrowed
//! to an index (e.g. "3", "-1") or a slice (e.g. "0:8", "::2").

use std::env;
use std::fs;
use tlmpkt::{WordIndex, WordView};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <file> [index|slice]", args[0]);
        eprintln!("Examples:");
        eprintln!("  {} frame.bin          # all words", args[0]);
        eprintln!("  {} frame.bin -1       # last word", args[0]);
        eprintln!("  {} frame.bin 0:16:2   # every other word of the first 16", args[0]);
        std::process::exit(1);
    }

    let data = fs::read(&args[1])?;
    let words = WordView::new(&data);

    let selected = match args.get(2) {
        Some(expr) => {
            let index: WordIndex = expr.parse()?;
            words.select(&index)?
        }
        None => words.to_vec(),
    };

    for (i, row) in selected.chunks(8).enumerate() {
        print!("{:06x} ", i * 8);
        for word in row {
            print!(" {:04x}", word);
        }
        println!();
    }
    println!("{} words ({} bytes)", selected.len(), data.len());

    Ok(())
}
