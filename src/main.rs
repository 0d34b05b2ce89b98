//! The `passview` binary

fn main() {
    if let Err(err) = passview::cli::opt() {
        eprint!("{}", err);
        err.chain().skip(1).for_each(|e| eprint!(": {}", e));
        eprintln!();

        std::process::exit(1);
    }
}
