//! main.rs
//! Entry point for exeq

use exeq::config::Config;
use exeq::core::{LogFn, Outcome, RunRequest, Runner, SpawnOptions};
use exeq::utils::cli::{CliAction, handle_args};

fn main() {
    std::panic::set_hook(Box::new(|info| {
        // A pager or terminal child may have left raw mode behind.
        let _ = crossterm::terminal::disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(
            stdout,
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );

        eprintln!("\n[exeq] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    let CliAction::Run(spec) = handle_args() else {
        return;
    };

    let config = Config::load();
    let log: LogFn = Box::new(|msg: &str| eprintln!("[exeq] {}", msg));
    let mut runner = Runner::new(config, None, Box::new(()), Some(log));

    let options = SpawnOptions {
        cwd: spec.cwd,
        ..SpawnOptions::default()
    };
    let request = RunRequest::new()
        .action(spec.action)
        .flags(spec.flags)
        .wait(spec.wait)
        .options(options);

    let code = match runner.execute(request) {
        Outcome::Waited(mut child) => child
            .wait()
            .ok()
            .and_then(|status| status.code())
            .unwrap_or(1),
        Outcome::Detached(_) => 0,
        Outcome::NoProcess => 1,
    };
    std::process::exit(code);
}
