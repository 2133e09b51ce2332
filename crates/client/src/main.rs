fn main() -> anyhow::Result<()> {
    nashira_client::run()
}
