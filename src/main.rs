fn main() {
    if let Err(err) = school_bundle::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
