fn main() {
    if let Err(error) = callsum::run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
