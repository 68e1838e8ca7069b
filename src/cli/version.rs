/// Display version information
pub fn execute() {
    println!("tether {}", env!("CARGO_PKG_VERSION"));
    println!("Companion-device client for the Tether messaging network");
}
