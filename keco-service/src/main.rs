fn main() {
    if let Err(err) = keco_evcharger::app::run_service() {
        eprintln!("service startup failed: {err}");
        std::process::exit(1);
    }
}
