fn main() {
    if let Err(err) = ev_charger_sync::app::run_service() {
        eprintln!("service startup failed: {err}");
        std::process::exit(1);
    }
}
