fn main() {
    #[cfg(feature = "cli")]
    chunkzip::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("chunkzip: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
