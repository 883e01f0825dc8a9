fn main() {
    if let Err(err) = keco_evcharger::app::run() {
        eprintln!("application startup failed: {err}");
        std::process::exit(1);
    }
}
