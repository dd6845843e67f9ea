fn main() {
    std::process::exit(portreap::run());
}
