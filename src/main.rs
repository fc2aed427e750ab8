use std::fs;
use std::io::{self, BufRead, Write};
use std::process;

use chibi_lisp::runtime::eval::{EvalError, Evaluator};
use chibi_lisp::runtime::mem::MemoryConfig;
use chibi_lisp::runtime::printer::repr;
use chibi_lisp::runtime::Value;

struct CliOptions {
    script: Option<String>,
    config_path: Option<String>,
    debug: bool,
}

fn print_usage(program: &str) {
    println!("Usage: {program} [options] [script]");
    println!("Options:");
    println!("  --config FILE  Load memory configuration from a JSON file");
    println!("  --debug, -d    Show heap occupancy after each evaluation");
    println!("  --help, -h     Show this help message");
    println!();
    println!("REPL Commands:");
    println!("  :quit          Exit the REPL");
    println!("  :mem           Show memory statistics");
    println!("  :mem json      Show memory statistics as JSON");
    println!("  :gc            Run a collection");
}

fn parse_args() -> CliOptions {
    let mut options = CliOptions {
        script: None,
        config_path: None,
        debug: false,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--debug" | "-d" => options.debug = true,
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            "--config" => {
                i += 1;
                match args.get(i) {
                    Some(path) => options.config_path = Some(path.clone()),
                    None => {
                        eprintln!("error: --config requires a file path");
                        process::exit(1);
                    }
                }
            }
            arg if arg.starts_with('-') => {
                eprintln!("error: unknown option '{arg}'");
                process::exit(1);
            }
            arg => options.script = Some(arg.to_string()),
        }
        i += 1;
    }
    options
}

fn load_config(path: Option<&str>) -> MemoryConfig {
    let Some(path) = path else {
        return MemoryConfig::default();
    };
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: cannot read config '{path}': {err}");
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: invalid config '{path}': {err}");
            process::exit(1);
        }
    }
}

fn report_error(err: &EvalError) {
    eprintln!("{err}");
}

fn run_script(ev: &mut Evaluator, path: &str) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read '{path}': {err}");
            return 1;
        }
    };
    match ev.eval_source(&source) {
        Ok(_) => {
            print!("{}", ev.take_output());
            0
        }
        Err(err) => {
            print!("{}", ev.take_output());
            report_error(&err);
            1
        }
    }
}

fn run_repl(ev: &mut Evaluator, debug: bool) {
    println!("chibi-lisp REPL. Type :quit to exit, :mem for memory stats.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let trimmed = line.trim();
        if trimmed == ":quit" {
            break;
        }
        if trimmed == ":mem" {
            print!("{}", ev.heap().report());
            continue;
        }
        if trimmed == ":mem json" {
            match serde_json::to_string_pretty(&ev.heap().stats()) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("{err}"),
            }
            continue;
        }
        if trimmed == ":gc" {
            match ev.heap_mut().collect() {
                Ok(reclaimed) => println!("reclaimed {reclaimed} objects"),
                Err(err) => eprintln!("{err}"),
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        match ev.eval_source(trimmed) {
            Ok(result) => {
                print!("{}", ev.take_output());
                // Void results come from the print builtins; stay quiet.
                if !matches!(ev.heap().value(result), Value::Void) {
                    println!("{}", repr(ev.heap(), result));
                }
            }
            Err(err) => {
                print!("{}", ev.take_output());
                report_error(&err);
            }
        }
        if debug {
            println!(
                "; live objects: {}, free slots: {}",
                ev.heap().live_objects(),
                ev.heap().free_slots()
            );
        }
    }
}

fn main() {
    let options = parse_args();
    let config = load_config(options.config_path.as_deref());

    let mut ev = match Evaluator::new(config) {
        Ok(ev) => ev,
        Err(err) => {
            eprintln!("error: cannot initialize runtime: {err}");
            process::exit(1);
        }
    };

    match options.script {
        Some(path) => process::exit(run_script(&mut ev, &path)),
        None => run_repl(&mut ev, options.debug),
    }
}
