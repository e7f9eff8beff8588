fn main() {
    if let Err(error) = ilastik_bridge::run_cli() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
