//! marksweep heap shell
//!
//! Interactive driver for the collector and a line-oriented script
//! runner. Handles print as `$N` and are typed back the same way:
//!
//! ```text
//! gc> int 1
//! $0
//! gc> pair $0 nil
//! $1
//! gc> push $1
//! gc> gc
//! freed 0 of 2, 2 live
//! gc> dump
//! heap: live=2 threshold=8 roots=1
//!  $0 int marked=false value=1
//!  $1 pair marked=false a=$0 b=nil
//! ```

use marksweep::{Handle, Heap};
use regex::Regex;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Shell command grammar, one regex per command.
struct Grammar {
    int: Regex,
    pair: Regex,
    set: Regex,
    push: Regex,
}

impl Grammar {
    fn new() -> Self {
        Grammar {
            int: Regex::new(r"^int\s+(-?\d+)$").unwrap(),
            pair: Regex::new(r"^pair\s+(\$\d+|nil)\s+(\$\d+|nil)$").unwrap(),
            set: Regex::new(r"^set\s+(\$\d+)\s+(\$\d+|nil)\s+(\$\d+|nil)$").unwrap(),
            push: Regex::new(r"^push\s+(\$\d+)$").unwrap(),
        }
    }
}

struct Shell {
    heap: Heap,
    grammar: Grammar,
}

impl Shell {
    fn new() -> Self {
        Shell {
            heap: Heap::new(),
            grammar: Grammar::new(),
        }
    }

    /// Evaluate one command line; returns the text to print.
    fn eval(&mut self, line: &str) -> Result<String, String> {
        let line = line.trim();

        if let Some(caps) = self.grammar.int.captures(line) {
            let value: i64 = caps[1].parse().map_err(|_| "integer out of range")?;
            let h = self.heap.alloc_int(value).map_err(|e| e.to_string())?;
            return Ok(h.to_string());
        }

        if let Some(caps) = self.grammar.pair.captures(line) {
            let a = self.live_ref(&caps[1])?;
            let b = self.live_ref(&caps[2])?;
            let h = self.heap.alloc_pair(a, b).map_err(|e| e.to_string())?;
            return Ok(h.to_string());
        }

        if let Some(caps) = self.grammar.set.captures(line) {
            let p = self.live_ref(&caps[1])?.expect("regex only matches $N");
            let a = self.live_ref(&caps[2])?;
            let b = self.live_ref(&caps[3])?;
            return match self.heap.set_pair(p, a, b) {
                Some(()) => Ok(String::new()),
                None => Err(format!("{p} is not a live pair")),
            };
        }

        if let Some(caps) = self.grammar.push.captures(line) {
            let h = self.live_ref(&caps[1])?.expect("regex only matches $N");
            self.heap.push_root(h).map_err(|e| e.to_string())?;
            return Ok(String::new());
        }

        match line {
            "pop" => {
                let h = self.heap.pop_root().map_err(|e| e.to_string())?;
                Ok(h.to_string())
            }
            "gc" => {
                self.heap.collect();
                let stats = self.heap.last_gc();
                Ok(format!(
                    "freed {} of {}, {} live",
                    stats.freed, stats.live_before, stats.live_after
                ))
            }
            "dump" => Ok(self.heap.dump_state()),
            "help" => Ok(HELP.to_string()),
            _ => Err(format!("unknown command: {line} (try 'help')")),
        }
    }

    /// Resolve a `$N`/`nil` token, rejecting handles to dead objects.
    ///
    /// The heap treats dangling handles as a caller contract violation,
    /// so anything typed by the user is checked against the live set
    /// before it gets anywhere near the root stack or a pair payload.
    fn live_ref(&self, token: &str) -> Result<Option<Handle>, String> {
        if token == "nil" {
            return Ok(None);
        }
        let h = parse_ref(token).ok_or_else(|| format!("bad handle: {token}"))?;
        if self.heap.get(h).is_none() {
            return Err(format!("{h} is not a live object"));
        }
        Ok(Some(h))
    }
}

const HELP: &str = "\
commands:
  int <n>             allocate an integer, prints its handle
  pair <h|nil> <h|nil> allocate a pair of the given children
  set <h> <h|nil> <h|nil> replace a pair's children (cycles allowed)
  push <h>            push a handle onto the root stack
  pop                 pop the most recent root
  gc                  run a mark-and-sweep cycle
  dump                list all live objects and counters
  help                this text
  quit                leave the shell";

/// `$N` to a handle, `nil` to None.
fn parse_ref(token: &str) -> Option<Handle> {
    let index: u32 = token.strip_prefix('$')?.parse().ok()?;
    Some(Handle::from_raw(index))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        run_file(&args[1]);
    } else {
        run_repl();
    }
}

fn run_file(filename: &str) {
    let source = match std::fs::read_to_string(filename) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", filename, e);
            std::process::exit(1);
        }
    };

    let mut shell = Shell::new();

    for (number, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        match shell.eval(line) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Err(e) => {
                eprintln!("{}:{}: {}", filename, number + 1, e);
                std::process::exit(1);
            }
        }
    }
}

fn run_repl() {
    println!("marksweep heap shell");
    println!("Type 'help' for commands, Ctrl+D to exit.\n");

    let mut shell = Shell::new();
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Error initializing line editor: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        match rl.readline("gc> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if line == "quit" || line == "exit" {
                    break;
                }
                match shell.eval(line) {
                    Ok(output) => {
                        if !output.is_empty() {
                            println!("{}", output);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }
}
