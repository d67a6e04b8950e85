// src/main.rs

use bop_supervisor::{cli, run, types};

#[tokio::main]
async fn main() {
    let args = match cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help / --version are reported as "errors" by clap.
            let code = if err.use_stderr() {
                types::GENERAL_ERROR
            } else {
                types::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    // Everything holding resources (lock guard, child process) is dropped
    // inside `run`, before the process exits.
    let code = run(args).await;
    std::process::exit(code);
}
