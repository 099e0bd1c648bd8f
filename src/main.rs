use anyhow::Context;

fn main() -> anyhow::Result<()> {
    uis_sdg_etl::run().context("uis-sdg-etl failed")?;
    Ok(())
}
