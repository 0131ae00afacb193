use std::{
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use anyhow::{bail, Result};
use tracing::info;

/// Builds the alias line. A custom ledger location is baked into the alias so the shortcut keeps
/// using it.
pub fn alias_line(name: &str, executable: &Path, ledger: Option<&Path>) -> String {
    match ledger {
        Some(ledger) => format!(
            "alias {name}=\"'{}' --file '{}'\"",
            executable.display(),
            ledger.display()
        ),
        None => format!("alias {name}=\"'{}'\"", executable.display()),
    }
}

/// Appends an alias for `executable` to a shell startup file. Previous installations are left
/// alone, removing them is up to the user. A relative ledger path is resolved against the current
/// directory, the alias would otherwise follow the shell around.
pub fn install_alias(
    name: &str,
    rc_file: &Path,
    executable: &Path,
    ledger: Option<&Path>,
) -> Result<()> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("Alias name {name:?} should only contain letters, digits, '-' or '_'");
    }

    let ledger = ledger.map(std::path::absolute).transpose()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(rc_file)?;
    write!(file, "\n{}", alias_line(name, executable, ledger.as_deref()))?;
    file.flush()?;
    info!("Installed alias {name} into {rc_file:?}");
    Ok(())
}
