use eventfilter_compiler::{logging, pipeline, CompileError, CompilerPreferences};
use std::env;
use std::process;

/// Where the filter text comes from
enum Source {
    File(String),
    Expression(String),
}

struct Options {
    source: Source,
    json: bool,
    stats: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize global logging system
    if let Err(message) = logging::init_global_logging() {
        logging::safe_log_error(logging::codes::system::INITIALIZATION_FAILURE, &message);
        process::exit(2);
    }

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("eventfilter_compiler");

    if args.len() < 2 {
        print_usage(program);
        process::exit(1);
    }
    if args[1] == "--help" {
        print_help(program);
        return Ok(());
    }

    let options = match parse_options(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage(program);
            process::exit(1);
        }
    };

    let preferences = CompilerPreferences::default();

    // Keep the source text for error rendering
    let (source_name, source_text) = match &options.source {
        Source::File(path) => match pipeline::read_source(path) {
            Ok(text) => (path.as_str(), text),
            Err(error) => report_failure(&error, ""),
        },
        Source::Expression(text) => ("<expr>", text.clone()),
    };

    let result = logging::with_source_context(source_name, || {
        pipeline::compile_event_filter_with(
            &source_text,
            &preferences,
            &eventfilter_compiler::DefaultValueParser,
            &eventfilter_compiler::DefaultAttributePathParser,
        )
    });

    match result {
        Ok(compiled) => {
            if options.json {
                println!("{}", compiled.filter.to_json()?);
            } else {
                print!("{}", compiled.filter);
            }
            if options.stats {
                eprintln!("{}", compiled.stats.resolution.summary());
                eprintln!(
                    "Assembly: {} elements, {} shared, {} select indices",
                    compiled.stats.assembly.elements,
                    compiled.stats.assembly.shared_elements,
                    compiled.stats.assembly.select_indices
                );
                eprintln!(
                    "Time: {:.3} ms",
                    compiled.stats.duration.as_secs_f64() * 1000.0
                );
            }
        }
        Err(error) => {
            report_failure(&error, &source_text);
        }
    }

    Ok(())
}

/// Print a rendered diagnostic with its registry help line and exit
fn report_failure(error: &CompileError, source: &str) -> ! {
    eprint!("{}", error.render(source));
    eprintln!("  = kind: {}", error.kind().as_str());
    if let Some(metadata) = logging::codes::get_error_metadata(error.error_code().as_str()) {
        eprintln!("  = help: {}", metadata.recommended_action);
    }
    process::exit(1);
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut source = None;
    let mut json = false;
    let mut stats = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => json = true,
            "--stats" => stats = true,
            "--expr" => {
                let text = args
                    .get(i + 1)
                    .ok_or_else(|| "--expr requires filter text".to_string())?;
                source = Some(Source::Expression(text.clone()));
                i += 1;
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown option '{}'", other));
            }
            path => {
                if source.is_some() {
                    return Err("Only one filter source may be given".to_string());
                }
                source = Some(Source::File(path.to_string()));
            }
        }
        i += 1;
    }

    let source = source.ok_or_else(|| "No filter source given".to_string())?;
    Ok(Options {
        source,
        json,
        stats,
    })
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <filter-file> [--json] [--stats]", program);
    eprintln!("       {} --expr \"<filter text>\" [--json] [--stats]", program);
    eprintln!("       {} --help", program);
}

fn print_help(program: &str) {
    println!("Event Filter Compiler v{}", env!("CARGO_PKG_VERSION"));
    println!("Compiles SELECT/WHERE/FOR filter text into a linearized event filter");
    println!();
    println!("USAGE:");
    println!("    {} <filter-file>          # Compile a file", program);
    println!("    {} --expr \"<text>\"       # Compile inline text", program);
    println!();
    println!("OPTIONS:");
    println!("    --help     Show this help message");
    println!("    --json     Print the filter as JSON");
    println!("    --stats    Print pass statistics to stderr");
    println!();
    println!("EXAMPLES:");
    println!(
        "    {} --expr 'SELECT /Message WHERE GREATERTHAN(/Severity, UINT16 500)'",
        program
    );
    println!("    {} alarms.filter --json", program);
    println!();
    println!("CONFIGURATION:");
    println!(
        "    {}",
        eventfilter_compiler::config::build_info::source_info()
    );
    for line in logging::get_system_diagnostics().lines() {
        println!("    {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options = parse_options(&args(&["--expr", "SELECT /A", "--json"])).unwrap();
        assert!(matches!(options.source, Source::Expression(ref t) if t == "SELECT /A"));
        assert!(options.json);
        assert!(!options.stats);

        let options = parse_options(&args(&["filter.txt", "--stats"])).unwrap();
        assert!(matches!(options.source, Source::File(ref p) if p == "filter.txt"));
        assert!(options.stats);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(parse_options(&args(&["--expr"])).is_err());
        assert!(parse_options(&args(&["--json"])).is_err());
        assert!(parse_options(&args(&["a.txt", "b.txt"])).is_err());
        assert!(parse_options(&args(&["--threads", "4"])).is_err());
    }
}
