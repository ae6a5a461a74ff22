fn main() {
    if let Err(err) = ev_charger_sync::app::run_sync_once() {
        eprintln!("charger sync failed: {err}");
        std::process::exit(1);
    }
}
