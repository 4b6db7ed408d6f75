use std::process::ExitCode;

use beam_hfs::cli::Command;

fn main() -> ExitCode {
    let cli = beam_hfs::app::parse_cli();

    // The TUI owns the terminal; log lines would corrupt the alternate screen.
    if !matches!(cli.command, Command::Tui(_)) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match beam_hfs::app::dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
