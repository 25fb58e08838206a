use log::info;

use crate::Srcfetch;

/// Handler to fetch command. Prints one staged path per URI, in input order.
pub fn do_fetch(srcfetch: &Srcfetch, uris: &[String]) -> anyhow::Result<()> {
    for uri in uris {
        let staged = srcfetch.fetch(uri)?;
        info!("Staged {} at {}", uri, staged.display());
        println!("{}", staged.display());
    }
    Ok(())
}

/// Handler to clear-staging command
pub fn do_clear_staging(srcfetch: &Srcfetch) -> anyhow::Result<()> {
    srcfetch.clear_staging()
}
