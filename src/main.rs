use std::io::{self, BufRead, Write};

use rpncalc::{Config, Session};

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    let mut session = Session::with_config(config);
    session.interpreter_mut().set_sink(|message| println!("» {}", message));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next().transpose()? else { break };
        match session.run_line(&line) {
            Ok(evaluation) => println!("{}", evaluation),
            Err(err) => println!("Error: {}", err),
        }

        let names = session.interpreter().user_function_names();
        if !names.is_empty() {
            println!("custom: {}", names.join(" "));
        }
    }

    Ok(())
}
