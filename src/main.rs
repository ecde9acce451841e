use clap::Parser;

fn main() {
    let cli = xmlconf::cli::Cli::parse();
    if let Err(e) = xmlconf::cmd::dispatch(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
