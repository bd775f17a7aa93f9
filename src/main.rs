mod debug_report;

use chrono::{Local, NaiveDateTime};
use helpdesk_query::{
    Caller, Config, Context, MemoryBackend, QueryRequest, Translator, handle_query, translate_verbose_with,
};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).with_env_filter(EnvFilter::from_default_env()).init();

    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: CliConfig) -> Result<(), String> {
    let config = match &cli.config_path {
        Some(path) => Config::from_file(path).map_err(|err| format!("error: {}: {err}", path.display()))?,
        None => Config::default(),
    };
    let translator = Translator::new(config).map_err(|err| format!("error: {err}"))?;

    let caller = cli.user_id.map(|id| Caller { id, name: cli.user_name.clone().unwrap_or_else(|| format!("user {id}")) });

    if let Some(path) = &cli.tickets_path {
        let json = std::fs::read_to_string(path).map_err(|err| format!("error: {}: {err}", path.display()))?;
        let backend = MemoryBackend::from_json(&json).map_err(|err| format!("error: {}: {err}", path.display()))?;
        let response = handle_query(&translator, &backend, &QueryRequest { query: cli.input.clone() }, caller.as_ref());
        let out = serde_json::to_string_pretty(&response).map_err(|err| format!("error: {err}"))?;
        println!("{out}");
        return Ok(());
    }

    let mut ctx = Context::new(cli.reference_time);
    ctx.caller = caller;

    match translate_verbose_with(&translator, &cli.input, &ctx) {
        Ok(res) if cli.json => {
            let out = serde_json::json!({
                "query": res.text,
                "normalized": res.normalized,
                "summary": res.summary,
                "spec": res.spec,
                "domain": res.spec.domain(),
            });
            println!("{out:#}");
        }
        Ok(res) => debug_report::print_run(&res, cli.color),
        Err(err) if cli.json => println!("{:#}", serde_json::json!({ "query": cli.input, "error": err.to_string() })),
        Err(err) => debug_report::print_error(&cli.input, &err, cli.color),
    }
    Ok(())
}

struct CliConfig {
    input: String,
    reference_time: NaiveDateTime,
    user_id: Option<i64>,
    user_name: Option<String>,
    config_path: Option<PathBuf>,
    tickets_path: Option<PathBuf>,
    json: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut reference_time = Local::now().naive_local();
    let mut user_id: Option<i64> = None;
    let mut user_name: Option<String> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut tickets_path: Option<PathBuf> = None;
    let mut json = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("helpdesk-query {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--json" => json = true,
            "--reference" => reference_time = parse_reference(&expect_value(&mut args, "--reference")?)?,
            "--user-id" => user_id = Some(parse_user_id(&expect_value(&mut args, "--user-id")?)?),
            "--user-name" => user_name = Some(expect_value(&mut args, "--user-name")?),
            "--config" => config_path = Some(PathBuf::from(expect_value(&mut args, "--config")?)),
            "--tickets" => tickets_path = Some(PathBuf::from(expect_value(&mut args, "--tickets")?)),
            "--input" | "-i" => {
                let value = expect_value(&mut args, "--input")?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--reference=") => {
                reference_time = parse_reference(arg.trim_start_matches("--reference="))?;
            }
            _ if arg.starts_with("--user-id=") => {
                user_id = Some(parse_user_id(arg.trim_start_matches("--user-id="))?);
            }
            _ if arg.starts_with("--input=") => {
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(arg.trim_start_matches("--input=").to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    // Empty input is the default view, not an error.
    Ok(CliConfig {
        input: input.trim_end_matches('\n').to_string(),
        reference_time,
        user_id,
        user_name,
        config_path,
        tickets_path,
        json,
        color,
    })
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("error: {flag} expects a value"))
}

fn read_stdin_input() -> Result<String, String> {
    if io::stdin().is_terminal() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn parse_reference(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map_err(|_| format!("error: invalid --reference '{value}' (expected YYYY-MM-DDTHH:MM:SS)"))
}

fn parse_user_id(value: &str) -> Result<i64, String> {
    value.parse().map_err(|_| format!("error: invalid --user-id '{value}' (expected an integer)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "helpdesk-query {version}

Translate a natural-language helpdesk request into a ticket query.

Usage:
  helpdesk-query [OPTIONS] [--] <query...>
  helpdesk-query [OPTIONS] --input <text>

Options:
  -i, --input <text>         Query text. If omitted, reads remaining args
                             or stdin when no args are provided.
  --reference <timestamp>    Reference time in YYYY-MM-DDTHH:MM:SS.
                             Default: now (local time).
  --user-id <id>             Id of the requesting user (needed for \"my\").
  --user-name <name>         Display name of the requesting user.
  --config <path>            TOML configuration file.
  --tickets <path>           JSON ticket list; run the query against it and
                             print the response.
  --json                     Print the translation as JSON.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RUST_LOG                   Log filter, e.g. helpdesk_query=debug.

Exit codes:
  0  Success (a rejected query is reported, not an error).
  1  Configuration or ticket file error.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
