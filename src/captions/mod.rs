//! Caption pipeline
//!
//! - Store: transient `blob:` resources owned by converted tracks
//! - Convert: SubRip fetch + conversion into renderable WebVTT batches
//! - Cues: WebVTT cue parsing and clock-driven text tracks
//! - Sync: exposes the visible cue lines of the selected language

pub mod convert;
pub mod cues;
pub mod store;
pub mod sync;

pub use convert::{
    srt_to_webvtt, CaptionBatch, CaptionError, CaptionFetcher, ConvertedCaptionTrack,
    HttpCaptionFetcher, SubtitleConverter,
};
pub use cues::{parse_webvtt, Cue, TextTrack, TrackMode};
pub use store::{BlobHandle, BlobStore};
pub use sync::CueSynchronizer;

/// Reduce a language code to a comparable form
///
/// Region subtags are dropped and common ISO 639-2 codes fold onto their
/// two-letter equivalents, so "ara", "ar" and "ar-EG" all compare equal.
pub fn normalize_language(code: &str) -> String {
    let primary = code
        .split(['-', '_'])
        .next()
        .unwrap_or(code)
        .to_ascii_lowercase();
    let folded = match primary.as_str() {
        "eng" => "en",
        "spa" => "es",
        "fre" | "fra" => "fr",
        "ger" | "deu" => "de",
        "ita" => "it",
        "por" | "pob" => "pt",
        "rus" => "ru",
        "jpn" => "ja",
        "kor" => "ko",
        "chi" | "zho" => "zh",
        "ara" => "ar",
        "hin" => "hi",
        "dut" | "nld" => "nl",
        "pol" => "pl",
        "tur" => "tr",
        "swe" => "sv",
        "nor" => "no",
        "dan" => "da",
        "fin" => "fi",
        "gre" | "ell" => "el",
        "heb" => "he",
        "hun" => "hu",
        "cze" | "ces" => "cs",
        "rum" | "ron" => "ro",
        "ukr" => "uk",
        "vie" => "vi",
        "tha" => "th",
        "ind" => "id",
        "per" | "fas" => "fa",
        other => return other.to_string(),
    };
    folded.to_string()
}

/// Human-readable name for a language code
pub fn language_label(code: &str) -> String {
    match normalize_language(code).as_str() {
        "en" => "English".to_string(),
        "es" => "Spanish".to_string(),
        "fr" => "French".to_string(),
        "de" => "German".to_string(),
        "it" => "Italian".to_string(),
        "pt" => "Portuguese".to_string(),
        "ru" => "Russian".to_string(),
        "ja" => "Japanese".to_string(),
        "ko" => "Korean".to_string(),
        "zh" => "Chinese".to_string(),
        "ar" => "Arabic".to_string(),
        "hi" => "Hindi".to_string(),
        "nl" => "Dutch".to_string(),
        "pl" => "Polish".to_string(),
        "tr" => "Turkish".to_string(),
        "sv" => "Swedish".to_string(),
        "no" => "Norwegian".to_string(),
        "da" => "Danish".to_string(),
        "fi" => "Finnish".to_string(),
        "el" => "Greek".to_string(),
        "he" => "Hebrew".to_string(),
        "hu" => "Hungarian".to_string(),
        "cs" => "Czech".to_string(),
        "ro" => "Romanian".to_string(),
        "uk" => "Ukrainian".to_string(),
        "vi" => "Vietnamese".to_string(),
        "th" => "Thai".to_string(),
        "id" => "Indonesian".to_string(),
        "fa" => "Persian".to_string(),
        _ => code.to_uppercase(),
    }
}
