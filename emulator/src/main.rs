mod session;

use critical_section as _; // registers the host critical-section implementation

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use session::Session;

fn main() -> io::Result<()> {
    let channel_count = parse_channel_count().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: sampler-emulator [--channels <1-8>]");
        process::exit(2);
    });

    let mut session = Session::new(channel_count).unwrap_or_else(|err| {
        eprintln!("{err}");
        process::exit(1);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Analog sampler emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed) {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_channel_count() -> Result<usize, String> {
    let mut args = env::args().skip(1);
    if let Some(arg) = args.next() {
        let value = if let Some(value) = arg.strip_prefix("--channels=") {
            value.to_string()
        } else if arg == "--channels" {
            args.next().ok_or("Expected value after --channels")?
        } else {
            arg
        };

        value
            .parse()
            .map_err(|_| format!("Invalid channel count `{value}`"))
    } else {
        Ok(session::DEFAULT_CHANNEL_COUNT)
    }
}
