//! Reading request validation and prompt assembly
//!
//! The generator is instructed in Dutch, in the voice of "Nikita", and asked
//! for three fixed sections. The same three section titles are what
//! [`crate::reading`] looks for in the response.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::moon::MoonPhase;
use crate::numerology::life_path_number;
use crate::{Error, Result};

/// Section title for the spirit message
pub const SECTION_MESSAGE: &str = "De boodschap van de geesten";
/// Section title for the ritual
pub const SECTION_RITUAL: &str = "De rituele instructie";
/// Section title for the closing tip
pub const SECTION_TIP: &str = "De energetische tip";

/// Minimum wish length (exclusive) after trimming
const MIN_WISH_CHARS: usize = 10;

const MSG_MISSING_FIELDS: &str =
    "Vul alsjeblieft alle velden in voor de meest persoonlijke reading.";
const MSG_SHORT_WISH: &str =
    "Beschrijf je wens iets uitgebreider voor een krachtigere boodschap.";
const MSG_BAD_DATE: &str = "Vul een geldige geboortedatum in (JJJJ-MM-DD).";
const MSG_BAD_SIGN: &str = "Kies een geldig sterrenbeeld.";

/// Western zodiac signs, named as offered in the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Ram,
    Stier,
    Tweelingen,
    Kreeft,
    Leeuw,
    Maagd,
    Weegschaal,
    Schorpioen,
    Boogschutter,
    Steenbok,
    Waterman,
    Vissen,
}

impl ZodiacSign {
    /// All signs in calendar order starting at Aries
    pub const ALL: [Self; 12] = [
        Self::Ram,
        Self::Stier,
        Self::Tweelingen,
        Self::Kreeft,
        Self::Leeuw,
        Self::Maagd,
        Self::Weegschaal,
        Self::Schorpioen,
        Self::Boogschutter,
        Self::Steenbok,
        Self::Waterman,
        Self::Vissen,
    ];

    /// Dutch name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ram => "Ram",
            Self::Stier => "Stier",
            Self::Tweelingen => "Tweelingen",
            Self::Kreeft => "Kreeft",
            Self::Leeuw => "Leeuw",
            Self::Maagd => "Maagd",
            Self::Weegschaal => "Weegschaal",
            Self::Schorpioen => "Schorpioen",
            Self::Boogschutter => "Boogschutter",
            Self::Steenbok => "Steenbok",
            Self::Waterman => "Waterman",
            Self::Vissen => "Vissen",
        }
    }
}

impl std::fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ZodiacSign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|sign| sign.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(MSG_BAD_SIGN.to_string()))
    }
}

/// Raw form input as submitted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub zodiac_sign: String,
    #[serde(default)]
    pub wish: String,
}

impl ReadingForm {
    /// Validate into a [`ReadingRequest`]
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` carrying the message to show inline
    pub fn validate(&self) -> Result<ReadingRequest> {
        ReadingRequest::new(&self.name, &self.birth_date, &self.zodiac_sign, &self.wish)
    }
}

/// Validated input for one reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingRequest {
    name: String,
    birth_date: NaiveDate,
    zodiac_sign: ZodiacSign,
    wish: String,
}

impl ReadingRequest {
    /// Validate and build a request
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a field is empty, the wish is too short,
    /// the date is not `YYYY-MM-DD` or the sign is unknown
    pub fn new(name: &str, birth_date: &str, zodiac_sign: &str, wish: &str) -> Result<Self> {
        let (name, birth_date, zodiac_sign, wish) =
            (name.trim(), birth_date.trim(), zodiac_sign.trim(), wish.trim());

        if name.is_empty() || birth_date.is_empty() || zodiac_sign.is_empty() || wish.is_empty() {
            return Err(Error::Validation(MSG_MISSING_FIELDS.to_string()));
        }
        if wish.chars().count() <= MIN_WISH_CHARS {
            return Err(Error::Validation(MSG_SHORT_WISH.to_string()));
        }

        let birth_date = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d")
            .map_err(|_| Error::Validation(MSG_BAD_DATE.to_string()))?;
        let zodiac_sign = zodiac_sign.parse()?;

        Ok(Self {
            name: name.to_string(),
            birth_date,
            zodiac_sign,
            wish: wish.to_string(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    #[must_use]
    pub const fn zodiac_sign(&self) -> ZodiacSign {
        self.zodiac_sign
    }

    #[must_use]
    pub fn wish(&self) -> &str {
        &self.wish
    }

    /// Birth date as `YYYY-MM-DD`
    #[must_use]
    pub fn birth_date_string(&self) -> String {
        self.birth_date.format("%Y-%m-%d").to_string()
    }

    /// Numerology life path number for the birth date
    #[must_use]
    pub fn life_path_number(&self) -> u32 {
        life_path_number(&self.birth_date_string())
    }
}

/// How the generator is asked to lay out its answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingFormat {
    /// Three `### Title ###` delimited sections in free text
    #[default]
    Headers,
    /// A JSON object with one field per section
    Json,
}

impl FromStr for ReadingFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "headers" | "text" => Ok(Self::Headers),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!("unknown reading format: {other}"))),
        }
    }
}

/// Assembled request for the text generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub contents: String,
    pub format: ReadingFormat,
}

/// Builds generator prompts from a reading request and the moon phase
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler {
    format: ReadingFormat,
}

impl PromptAssembler {
    #[must_use]
    pub const fn new(format: ReadingFormat) -> Self {
        Self { format }
    }

    #[must_use]
    pub const fn format(&self) -> ReadingFormat {
        self.format
    }

    /// Build the system instruction and user contents
    #[must_use]
    pub fn assemble(&self, request: &ReadingRequest, phase: MoonPhase) -> Prompt {
        let name = request.name();
        let sign = request.zodiac_sign();
        let birth_date = request.birth_date_string();

        let astrological = format!(
            "Houd rekening met de huidige kosmische energie: de invloed van de {}. Verwerk deze astrologische invloed op een subtiele en relevante manier in je advies, bijvoorbeeld in de energetische tip of het ritueel.",
            phase.full_description()
        );
        let zodiac = format!(
            "De gebruiker identificeert zich met het sterrenbeeld {sign}. Verweef op een subtiele manier de kenmerkende energie of eigenschappen van dit teken in je boodschap, vooral in de energetische tip."
        );
        let numerology = format!(
            "De geboortedatum van de gebruiker ({birth_date}) resulteert in een levenspadgetal van {}. Verweef dit numerologische inzicht op een subtiele en krachtige manier in '{SECTION_TIP}', en leg uit hoe dit getal hun benadering van de wens kan beïnvloeden.",
            request.life_path_number()
        );

        let intro = format!(
            "Je bent Nikita, een liefdevolle en wijze spirituele gids van manifestatie365.nl. Je hebt een diepe connectie met de geestenwereld en de kosmos. Je spreekt in een mystieke, geruststellende en krachtige toon. Gebruik spirituele termen zoals 'energie', 'trilling', 'manifestatie', 'goddelijke leiding', 'maanfasen', en 'universum'. Je doel is om gebruikers een persoonlijke, kosmische reading te geven. Deze reading bevat diepgaande leiding en een praktische, rituele instructie die de gebruiker zelf kan uitvoeren om hun wensen te manifesteren. Spreek de gebruiker, wiens naam {name} is, direct en persoonlijk aan. Baseer je reading op de volgende gegevens: de wens van de gebruiker, hun sterrenbeeld ({sign}), en hun geboortedatum ({birth_date}). {astrological} {zodiac} {numerology}"
        );

        let message_body = format!(
            "(Schrijf hier een korte, intuïtieve en poëtische boodschap die direct van de spirituele wereld lijkt te komen. Spreek de gebruiker aan met hun naam, bijv. \"Lieve {name}, ...\". Geef inzicht in de onderliggende energie van de wens van de gebruiker.)"
        );
        let ritual_body = "(Geef een duidelijk, praktisch stappenplan voor een eenvoudig ritueel dat de gebruiker thuis kan uitvoeren. Vermeld de benodigde materialen, zoals een specifieke kleur kaars, een kristal, kruiden, of een intentiebrief. Maak de stappen eenvoudig en toegankelijk.)";
        let tip_body = "(Geef een afsluitend, wijs advies. Dit kan gaan over de juiste mindset, het belang van loslaten, een suggestie voor de beste timing (bijv. tijdens volle maan of nieuwe maan), of een kleine dagelijkse handeling om de intentie te versterken. Verweef hier de astrologische, numerologische en sterrenbeeld-inzichten.)";

        let structure = match self.format {
            ReadingFormat::Headers => format!(
                "Structureer je antwoord ALTIJD in de volgende drie secties, precies zoals hieronder beschreven, met de titels omringd door '###':\n\n### {SECTION_MESSAGE} ###\n{message_body}\n\n### {SECTION_RITUAL} ###\n{ritual_body}\n\n### {SECTION_TIP} ###\n{tip_body}"
            ),
            ReadingFormat::Json => format!(
                "Geef je antwoord ALTIJD als een JSON-object met precies drie velden, zonder extra tekst:\n\n\"geestenBoodschap\" ({SECTION_MESSAGE}): {message_body}\n\n\"ritueleInstructie\" ({SECTION_RITUAL}): {ritual_body}\n\n\"energetischeTip\" ({SECTION_TIP}): {tip_body}"
            ),
        };

        let contents = format!(
            "Mijn naam is {name}. Mijn geboortedatum is {birth_date}. Mijn sterrenbeeld is {sign}. Mijn wens is: \"{}\".",
            request.wish()
        );

        Prompt {
            system_instruction: format!("{intro} {structure}"),
            contents,
            format: self.format,
        }
    }
}

/// Prompt for narrating a piece of reading text
#[must_use]
pub fn speech_prompt(text: &str) -> String {
    format!("Spreek op een kalme, mystieke en wijze toon: {text}")
}

/// Prompt for generating a sigil that represents the reading
#[must_use]
pub fn sigil_prompt(reading_text: &str) -> String {
    format!(
        "Create a unique, abstract, mystical sigil or seal representing the spiritual concepts in this text: \"{reading_text}\". The design should be elegant, powerful, and suitable for meditation. Generate the sigil in a radiant gold color on a plain, dark, near-black background. The sigil should be centered and the main focus. Avoid any text or recognizable figures."
    )
}
