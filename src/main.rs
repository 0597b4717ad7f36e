fn main() {
    holdem_equity::cli::run();
}
