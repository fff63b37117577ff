fn main() {
    if let Err(e) = lib_easytravel::init() {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
