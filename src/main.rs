use std::process::ExitCode;

fn main() -> ExitCode {
    flaresense_lib::run()
}
