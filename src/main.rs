fn main() {
    if let Err(err) = ev_charger_sync::app::run() {
        eprintln!("application startup failed: {err}");
        std::process::exit(1);
    }
}
