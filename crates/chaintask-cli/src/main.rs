use std::process::ExitCode;

fn main() -> ExitCode {
    match chaintask_core::run(std::env::args_os().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("chaintask: {err:#}");
            ExitCode::FAILURE
        }
    }
}
