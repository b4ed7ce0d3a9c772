mod cli;

fn main() {
    env_logger::init();

    if !cli::run_cli() {
        std::process::exit(1);
    }
}
