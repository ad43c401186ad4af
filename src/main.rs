fn main() -> anyhow::Result<()> {
    para_browser_lib::run()
}
