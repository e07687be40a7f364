use std::{env, path::Path, process::ExitCode};

use site_builder::build;

fn main() -> ExitCode {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();

    let name = args
        .first()
        .and_then(|arg| Path::new(arg).file_name())
        .map_or_else(|| "site-builder".into(), |name| name.to_string_lossy());

    if args.len() > 1 {
        eprintln!("{}", help(&name));
        return ExitCode::from(2);
    }

    if let Err(err) = build(".") {
        log::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn help(name: &str) -> String {
    format!("Usage:\n  {}\n(the command takes no options)", name)
}
