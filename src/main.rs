use clap::Parser;

fn main() {
    let cli = lanes::cli::Cli::parse();

    if let Err(e) = lanes::cli::run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
