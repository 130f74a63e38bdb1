use std::io::Write;

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = retro85::parse_args(std::env::args().skip(1))?;
    let report = retro85::run(&config)?;

    let mut stdout = std::io::stdout().lock();
    if !report.console.is_empty() {
        writeln!(stdout, "{}", report.console)?;
    }
    writeln!(stdout, "{}", report)?;
    Ok(())
}
