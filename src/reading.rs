//! Parsing generated reading text into its three sections

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::prompt::ReadingFormat;

static MESSAGE_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"### De boodschap van de geesten ###\s*([\s\S]*?)\s*### De rituele instructie ###")
        .expect("valid regex")
});

static RITUAL_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"### De rituele instructie ###\s*([\s\S]*?)\s*### De energetische tip ###")
        .expect("valid regex")
});

static TIP_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"### De energetische tip ###\s*([\s\S]*)").expect("valid regex")
});

/// Any single-line `### ... ###` header
static ANY_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"###.*?###").expect("valid regex"));

/// A parsed three-part reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spell {
    pub geesten_boodschap: String,
    pub rituele_instructie: String,
    pub energetische_tip: String,
}

impl Spell {
    /// All three sections joined with spaces
    #[must_use]
    pub fn full_text(&self) -> String {
        format!(
            "{} {} {}",
            self.geesten_boodschap, self.rituele_instructie, self.energetische_tip
        )
    }

    /// Text for one section
    #[must_use]
    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::Message => &self.geesten_boodschap,
            Section::Ritual => &self.rituele_instructie,
            Section::Tip => &self.energetische_tip,
        }
    }

    fn trimmed(self) -> Option<Self> {
        let spell = Self {
            geesten_boodschap: self.geesten_boodschap.trim().to_string(),
            rituele_instructie: self.rituele_instructie.trim().to_string(),
            energetische_tip: self.energetische_tip.trim().to_string(),
        };
        let complete = !spell.geesten_boodschap.is_empty()
            && !spell.rituele_instructie.is_empty()
            && !spell.energetische_tip.is_empty();
        complete.then_some(spell)
    }
}

/// One of the three reading sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Message,
    Ritual,
    Tip,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::Message, Self::Ritual, Self::Tip];

    /// Section title as it appears in the reading
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Message => crate::prompt::SECTION_MESSAGE,
            Self::Ritual => crate::prompt::SECTION_RITUAL,
            Self::Tip => crate::prompt::SECTION_TIP,
        }
    }
}

/// Parse header-delimited reading text
///
/// Looks for the three section titles verbatim first. When they are not all
/// present, splits on any `### ... ###` header and takes the first three
/// non-empty fragments. Returns `None` when fewer than three remain.
#[must_use]
pub fn parse_spell(text: &str) -> Option<Spell> {
    let captured = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    if let (Some(message), Some(ritual), Some(tip)) = (
        captured(&MESSAGE_SECTION),
        captured(&RITUAL_SECTION),
        captured(&TIP_SECTION),
    ) {
        return Some(Spell {
            geesten_boodschap: message,
            rituele_instructie: ritual,
            energetische_tip: tip,
        });
    }

    let parts: Vec<&str> = ANY_HEADER
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() < 3 {
        tracing::debug!(fragments = parts.len(), "reading has fewer than three sections");
        return None;
    }

    // Section assignment here is positional only
    if parts.len() > 3 {
        tracing::warn!(
            fragments = parts.len(),
            "reading headers did not match, extra fragments dropped; sections may be misassigned"
        );
    } else {
        tracing::warn!("reading headers did not match, using positional sections");
    }

    Some(Spell {
        geesten_boodschap: parts[0].to_string(),
        rituele_instructie: parts[1].to_string(),
        energetische_tip: parts[2].to_string(),
    })
}

/// Parse a JSON reading object, tolerating a surrounding code fence
#[must_use]
pub fn parse_structured(text: &str) -> Option<Spell> {
    let body = text.trim();
    let body = body
        .strip_prefix("```json")
        .or_else(|| body.strip_prefix("```"))
        .and_then(|b| b.strip_suffix("```"))
        .unwrap_or(body);

    match serde_json::from_str::<Spell>(body.trim()) {
        Ok(spell) => spell.trimmed(),
        Err(e) => {
            tracing::debug!(error = %e, "reading is not a JSON object");
            None
        }
    }
}

/// Parse a reading in the requested format
///
/// JSON readings that fail to decode get a second chance as header text.
#[must_use]
pub fn parse_reading(text: &str, format: ReadingFormat) -> Option<Spell> {
    match format {
        ReadingFormat::Headers => parse_spell(text),
        ReadingFormat::Json => parse_structured(text).or_else(|| parse_spell(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "### De boodschap van de geesten ###\n\nLieve Sanne, de sterren fluisteren.\n\n### De rituele instructie ###\n1. Steek een groene kaars aan.\n2. Schrijf je intentie op.\n\n### De energetische tip ###\n  Laat los en vertrouw.  \n";

    #[test]
    fn exact_headers() {
        let spell = parse_spell(WELL_FORMED).unwrap();
        assert_eq!(spell.geesten_boodschap, "Lieve Sanne, de sterren fluisteren.");
        assert_eq!(
            spell.rituele_instructie,
            "1. Steek een groene kaars aan.\n2. Schrijf je intentie op."
        );
        assert_eq!(spell.energetische_tip, "Laat los en vertrouw.");
    }

    #[test]
    fn preamble_before_headers_is_ignored() {
        let text = format!("Natuurlijk! Hier is je reading.\n\n{WELL_FORMED}");
        let spell = parse_spell(&text).unwrap();
        assert_eq!(spell.geesten_boodschap, "Lieve Sanne, de sterren fluisteren.");
    }

    #[test]
    fn fallback_on_other_headers() {
        let text = "### Boodschap ###\nEen\n### Ritueel ###\nTwee\n### Tip ###\nDrie";
        let spell = parse_spell(text).unwrap();
        assert_eq!(spell.geesten_boodschap, "Een");
        assert_eq!(spell.rituele_instructie, "Twee");
        assert_eq!(spell.energetische_tip, "Drie");
    }

    #[test]
    fn two_sections_fail() {
        let text = "### De boodschap van de geesten ###\nEen\n### De rituele instructie ###\nTwee";
        assert_eq!(parse_spell(text), None);
    }

    #[test]
    fn plain_text_fails() {
        assert_eq!(parse_spell("Het universum zwijgt vandaag."), None);
        assert_eq!(parse_spell(""), None);
    }

    #[test]
    fn structured_json() {
        let text = r#"```json
{"geestenBoodschap": " Een ", "ritueleInstructie": "Twee", "energetischeTip": "Drie"}
```"#;
        let spell = parse_structured(text).unwrap();
        assert_eq!(spell.geesten_boodschap, "Een");
        assert_eq!(spell.energetische_tip, "Drie");
    }

    #[test]
    fn structured_rejects_empty_field() {
        let text = r#"{"geestenBoodschap": "Een", "ritueleInstructie": "  ", "energetischeTip": "Drie"}"#;
        assert_eq!(parse_structured(text), None);
    }

    #[test]
    fn json_format_falls_back_to_headers() {
        let spell = parse_reading(WELL_FORMED, ReadingFormat::Json).unwrap();
        assert_eq!(spell.energetische_tip, "Laat los en vertrouw.");
    }

    #[test]
    fn full_text_and_sections() {
        let spell = parse_spell(WELL_FORMED).unwrap();
        assert!(spell.full_text().starts_with("Lieve Sanne"));
        assert_eq!(spell.section(Section::Tip), "Laat los en vertrouw.");
        assert_eq!(Section::Ritual.title(), "De rituele instructie");
    }

    #[test]
    fn serializes_camel_case() {
        let spell = parse_spell(WELL_FORMED).unwrap();
        let json = serde_json::to_value(&spell).unwrap();
        assert!(json.get("geestenBoodschap").is_some());
        assert!(json.get("ritueleInstructie").is_some());
    }
}
