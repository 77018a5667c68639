//! Elemental - inspect and edit elements of a markup document
//!
//! Usage: elemental [OPTIONS] <FILE> <SELECTOR>

use std::env;
use std::fs;
use std::process::ExitCode;

use elemental::{DomError, Element};
use elemental_js::{HostConfig, HostRuntime};
use rquickjs::function::This;
use rquickjs::{Ctx, Function, Object, Value};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest child text shown in the children listing
const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Default, PartialEq)]
struct Options {
    file: String,
    selector: String,
    text: Option<String>,
    html: Option<String>,
    attributes: Vec<String>,
    set_attributes: Vec<(String, String)>,
    memory_limit: Option<usize>,
    print_tree: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Version,
    Inspect(Options),
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("elemental");

    let command = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            print_usage(program);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Help => {
            print_usage(program);
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("Elemental {}", VERSION);
            ExitCode::SUCCESS
        }
        Command::Inspect(options) => {
            if let Err(e) = run(&options) {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

fn print_usage(program: &str) {
    println!(
        r#"Elemental {} - inspect and edit elements of a markup document

USAGE:
    {} [OPTIONS] <FILE> <SELECTOR>

OPTIONS:
    -h, --help                 Print this help message
    -V, --version              Print version information
    --text <TEXT>              Set the element's inner text first
    --html <MARKUP>            Set the element's inner markup first
    --set-attr <NAME=VALUE>    Set an attribute first (repeatable)
    --attr <NAME>              Print an attribute (repeatable)
    --memory-limit <BYTES>     Cap the script runtime's memory
    --tree                     Print the document tree before inspecting

SELECTORS:
    #id, .class or a tag name

EXAMPLES:
    {} page.html '#app'
    {} --attr href page.html a
    {} --text 'Hello' --set-attr data-state=done page.html .status
"#,
        VERSION, program, program, program, program
    );
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut options = Options::default();
    let mut positional = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} requires a value", flag))
        };

        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--text" => options.text = Some(value(arg.as_str())?),
            "--html" => options.html = Some(value(arg.as_str())?),
            "--attr" => options.attributes.push(value(arg.as_str())?),
            "--set-attr" => {
                let pair = value(arg.as_str())?;
                let (name, attr_value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", pair))?;
                options.set_attributes.push((name.to_string(), attr_value.to_string()));
            }
            "--memory-limit" => {
                let bytes = value(arg.as_str())?;
                let limit = bytes
                    .parse()
                    .map_err(|e| format!("invalid memory limit '{}': {}", bytes, e))?;
                options.memory_limit = Some(limit);
            }
            "--tree" => options.print_tree = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
            _ => positional.push(arg.clone()),
        }
    }

    match <[String; 2]>::try_from(positional) {
        Ok([file, selector]) => {
            options.file = file;
            options.selector = selector;
            Ok(Command::Inspect(options))
        }
        Err(_) => Err("expected <FILE> and <SELECTOR>".to_string()),
    }
}

fn run(options: &Options) -> Result<(), String> {
    let html = fs::read_to_string(&options.file)
        .map_err(|e| format!("Failed to read {}: {}", options.file, e))?;

    let config = HostConfig {
        memory_limit: options.memory_limit,
        ..HostConfig::default()
    };
    let runtime = HostRuntime::from_html(&html, &config).map_err(|e| e.to_string())?;

    if options.print_tree {
        let dom = runtime.dom().borrow();
        println!("=== DOM Tree ===\n");
        println!("{}", dom.pretty_print());
        println!("Total nodes: {}\n", dom.len());
    }

    runtime.with(|ctx| {
        let element = select(&ctx, &options.selector)?;
        if !element.exists() {
            return Err(format!("No element matches '{}'", options.selector));
        }
        inspect(&element, options).map_err(report)
    })
}

/// Resolve a selector through the document's `querySelector`
fn select<'js>(ctx: &Ctx<'js>, selector: &str) -> Result<Element<'js>, String> {
    let lookup = || -> rquickjs::Result<Value<'js>> {
        let document: Object = ctx.globals().get("document")?;
        let query: Function = document.get("querySelector")?;
        query.call((This(document), selector))
    };

    match lookup() {
        Ok(found) => Ok(Element::from_raw(found)),
        Err(rquickjs::Error::Exception) => Err(format!("querySelector threw {:?}", ctx.catch())),
        Err(e) => Err(e.to_string()),
    }
}

fn inspect(element: &Element<'_>, options: &Options) -> Result<(), DomError> {
    if let Some(text) = &options.text {
        element.set_inner_text(text)?;
    }
    if let Some(html) = &options.html {
        element.set_inner_html(html)?;
    }
    for (name, value) in &options.set_attributes {
        element.set_attribute(name, value)?;
    }

    println!("Text: {}", element.inner_text()?);
    println!("HTML: {}", element.inner_html()?);

    for name in &options.attributes {
        println!("{}=\"{}\"", name, element.attribute(name)?);
    }

    let children = element.children()?;
    println!("Children: {}", children.len());
    for (index, child) in children.iter().enumerate() {
        println!("  [{}] {}", index, preview(&child.inner_text()?));
    }

    Ok(())
}

fn preview(text: &str) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= PREVIEW_CHARS {
        return line;
    }
    let mut short: String = line.chars().take(PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}

fn report(err: DomError) -> String {
    log::debug!("stack trace:\n{}", err.stack_trace());
    format!("{}\nCaused by: {}", err, err.cause())
}
