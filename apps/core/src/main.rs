fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match launchpad_core::runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("[launchpad-core] {error}");
            std::process::exit(2);
        }
    };

    if let Err(error) = launchpad_core::runtime::run_with_options(options) {
        eprintln!("[launchpad-core] runtime failed: {error}");
        std::process::exit(1);
    }
}
