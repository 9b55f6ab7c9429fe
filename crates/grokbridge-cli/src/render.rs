use anyhow::{anyhow, Result};
use bat::WrappingMode;

pub fn markdown(content: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|err| anyhow!("failed to render reply: {}", err))?;
    println!();
    Ok(())
}
