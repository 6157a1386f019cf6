//! `stencil` binary

fn main() {
    let matches = stencil_cli::command().get_matches();
    std::process::exit(stencil_cli::run(&matches));
}
