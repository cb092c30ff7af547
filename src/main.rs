fn main() {
    insight_client::runtime::init_tracing();

    if let Err(error) = insight_client::run_cli() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
