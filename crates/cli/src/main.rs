use std::process::ExitCode;

fn main() -> ExitCode {
    gpuwatch_cli::run()
}
