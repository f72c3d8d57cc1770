//! Plain-text and image exports of a reading

use std::path::{Path, PathBuf};

use crate::Result;
use crate::audio::decode_base64;
use crate::prompt::{SECTION_MESSAGE, SECTION_RITUAL, SECTION_TIP};
use crate::reading::Spell;

/// File name used when saving a sigil
pub const SIGIL_FILE_NAME: &str = "reading-zegel.png";

/// Title line of shared readings
pub const SHARE_TITLE: &str = "Mijn Kosmische Reading van Nikita";

/// Closing line of shared readings
pub const SHARE_FOOTER: &str = "Gekanaliseerd via Manifestatie365.nl";

/// Text copied when a reading is shared
#[must_use]
pub fn share_text(spell: &Spell) -> String {
    format!(
        "{SHARE_TITLE}\n\n### {SECTION_MESSAGE}\n{}\n\n### {SECTION_RITUAL}\n{}\n\n### {SECTION_TIP}\n{}\n\n{SHARE_FOOTER}",
        spell.geesten_boodschap, spell.rituele_instructie, spell.energetische_tip
    )
}

/// Decode a base64 PNG and write it into `dir`
///
/// # Errors
///
/// Returns error if the payload is not base64 or the file cannot be written
pub fn save_sigil(dir: &Path, base64_png: &str) -> Result<PathBuf> {
    let bytes = decode_base64(base64_png)?;
    std::fs::create_dir_all(dir)?;

    let path = dir.join(SIGIL_FILE_NAME);
    std::fs::write(&path, bytes)?;

    tracing::info!(path = %path.display(), "sigil saved");
    Ok(path)
}
