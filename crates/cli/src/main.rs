use std::process::ExitCode;

fn main() -> ExitCode {
    towdesk_cli::run()
}
