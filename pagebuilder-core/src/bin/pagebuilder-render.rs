use pagebuilder_core::{render_page, BuilderError, PageBuilderConfig, PageDocument, WidgetRegistry};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::process;

fn usage() {
    eprintln!("Usage: pagebuilder-render <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  render <page.yaml|page.json> [--config file.yaml]   Print the rendered HTML document");
    eprintln!("  list [--config file.yaml]                          List registered widget types");
    eprintln!("  schema <type>                                      Print a widget's field schema as JSON");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v, --verbose   Debug logging on stderr");
}

#[derive(Debug, PartialEq)]
enum Command {
    Render { page: String },
    List,
    Schema { widget_type: String },
    Help,
}

#[derive(Debug, PartialEq)]
struct Invocation {
    command: Command,
    config: Option<String>,
    verbose: bool,
}

/// `None` when the arguments do not form a command.
fn parse_args(args: &[String]) -> Option<Invocation> {
    let mut verbose = false;
    let mut config = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "--config" => config = Some(iter.next()?.clone()),
            other if other.starts_with("--") && other != "--help" => return None,
            other => positional.push(other),
        }
    }

    let command = match positional.as_slice() {
        ["render", page] => Command::Render {
            page: page.to_string(),
        },
        ["list"] => Command::List,
        ["schema", widget_type] => Command::Schema {
            widget_type: widget_type.to_string(),
        },
        ["help" | "-h" | "--help"] => Command::Help,
        _ => return None,
    };
    Some(Invocation {
        command,
        config,
        verbose,
    })
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(invocation) = parse_args(&args) else {
        usage();
        process::exit(1);
    };

    let level = if invocation.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Logging disabled: {}", e);
    }

    let result = match &invocation.command {
        Command::Render { page } => render(page, invocation.config.as_deref()),
        Command::List => list(invocation.config.as_deref()),
        Command::Schema { widget_type } => schema(widget_type, invocation.config.as_deref()),
        Command::Help => {
            usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        print_error(&e);
        process::exit(1);
    }
}

fn registry(config_path: Option<&str>) -> Result<WidgetRegistry, BuilderError> {
    let config = match config_path {
        Some(path) => PageBuilderConfig::load(path)?,
        None => PageBuilderConfig::default(),
    };
    WidgetRegistry::with_builtin_widgets(config)
}

fn render(page_path: &str, config_path: Option<&str>) -> Result<(), BuilderError> {
    let registry = registry(config_path)?;
    let page = PageDocument::load(page_path)?;
    let rendered = render_page(&registry, &page);

    println!("{}", rendered.to_html_document());
    for failure in &rendered.failures {
        eprintln!("✗ {} ({}): {}", failure.instance_id, failure.widget_type, failure.error);
    }
    for (id, issue) in &rendered.issues {
        eprintln!("! {}: {}", id, issue);
    }
    log::debug!(
        "Rendered {} widget(s), {} selector(s), {} failure(s)",
        page.widgets.len(),
        rendered.stats.selector_count,
        rendered.failures.len()
    );
    Ok(())
}

fn list(config_path: Option<&str>) -> Result<(), BuilderError> {
    let registry = registry(config_path)?;
    for (category, configs) in registry.by_category() {
        println!("{}:", category.as_str());
        for config in configs {
            let pro = if config.pro { " [pro]" } else { "" };
            println!("  {:<14} {}{}", config.widget_type, config.name, pro);
        }
    }
    Ok(())
}

fn schema(widget_type: &str, config_path: Option<&str>) -> Result<(), BuilderError> {
    let schema = registry(config_path)?.field_schema(widget_type)?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn print_error(error: &BuilderError) {
    match error {
        BuilderError::Config { context, reason } => {
            eprintln!("  Configuration error in '{}':", context);
            eprintln!("    {}", reason);
        }
        BuilderError::Validation { field, reason } => {
            eprintln!("  Invalid value for '{}':", field);
            eprintln!("    {}", reason);
        }
        BuilderError::UnknownWidget { widget_type } => {
            eprintln!("  Unknown widget type '{}'", widget_type);
        }
        other => {
            eprintln!("  {}", other);
        }
    }
}
