fn main() {
    journal::cli::run_cli();
}
