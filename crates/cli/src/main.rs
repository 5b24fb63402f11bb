//! # CLI - RiptideKV Interactive Shell
//!
//! A REPL-style command-line interface for the RiptideKV LSM table. Reads
//! commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted
//! testing (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! INSERT key value   Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! DELETE key         Delete a key (writes a tombstone)
//! RANGE start end    Range scan, inclusive on both ends
//! FLUSH              Force the memtable to a new level0 component
//! STATS              Print per-level component counts and memtable size
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables, see
//! [`config::TableConfig::from_env`]:
//!
//! ```text
//! RIPTIDE_LSM_DIR   table root directory  (default: "data/lsm")
//! RIPTIDE_LSM_R     level fanout          (default: 10)
//! RIPTIDE_LSM_L     memtable capacity     (default: 1000)
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! RiptideKV started (dir=data/lsm, R=10, L=1000)
//! > INSERT name Alice
//! OK
//! > GET name
//! Alice
//! > RANGE a z
//! name -> Alice
//! (1 entries)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use config::TableConfig;
use engine::Engine;
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    tracing_subscriber::fmt::try_init().ok();

    let cfg = TableConfig::from_env();
    let table = Engine::open(&cfg)?;

    println!(
        "RiptideKV started (dir={}, R={}, L={})",
        cfg.directory.display(),
        cfg.fanout,
        cfg.memtable_capacity
    );
    println!("Commands: INSERT key value | GET key | DELETE key | RANGE start end");
    println!("          FLUSH | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "INSERT" | "SET" => {
                    if let Some(k) = parts.next() {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: INSERT key value");
                        } else {
                            match table.insert(k, v) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR insert failed: {}", e),
                            }
                        }
                    } else {
                        println!("ERR usage: INSERT key value");
                    }
                }
                "GET" => {
                    if let Some(k) = parts.next() {
                        match table.get(k) {
                            Ok(Some(v)) => println!("{}", v),
                            Ok(None) => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "DELETE" | "DEL" => {
                    if let Some(k) = parts.next() {
                        match table.delete(k) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR delete failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: DELETE key");
                    }
                }
                "RANGE" | "SCAN" => {
                    let start = parts.next().unwrap_or("");
                    let end = parts.next().unwrap_or("");
                    match table.range(start, end) {
                        Ok(results) => {
                            if results.is_empty() {
                                println!("(empty)");
                            } else {
                                for (k, v) in &results {
                                    println!("{} -> {}", k, v);
                                }
                                println!("({} entries)", results.len());
                            }
                        }
                        Err(e) => println!("ERR range failed: {}", e),
                    }
                }
                "FLUSH" => match table.flush() {
                    Ok(()) => println!("OK (levels={:?})", table.level_sizes()),
                    Err(e) => println!("ERR flush failed: {}", e),
                },
                "STATS" => {
                    println!("{:?}", table);
                }
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => {
                    println!("unknown command: {}", other);
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
