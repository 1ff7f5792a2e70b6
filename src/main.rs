fn main() {
    if let Err(e) = memory_booth_lib::run() {
        eprintln!("memory-booth: {e}");
        std::process::exit(1);
    }
}
