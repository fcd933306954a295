fn main() -> anyhow::Result<()> {
    formdeck::cli::main()
}
