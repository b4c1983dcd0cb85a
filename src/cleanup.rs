//! Optional cleanup applied to extracted text before it is written.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPreset {
    /// Unicode NFC normalization and trailing-whitespace trimming only
    Minimal,
    /// Minimal plus ligature and hyphenation fixes and blank-line collapsing
    #[default]
    Standard,
}

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Replace typographic ligatures (ﬁ, ﬂ, ...) with plain letters
    pub fix_ligatures: bool,

    /// Join words hyphenated across a line break
    pub fix_hyphenation: bool,

    /// Drop U+FFFD replacement characters left by failed glyph mapping
    pub remove_replacement_char: bool,

    /// Strip spaces and tabs at the end of every line
    pub trim_trailing_whitespace: bool,

    /// Maximum consecutive newlines (0 = unlimited)
    pub max_consecutive_newlines: u8,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self {
                normalize_unicode: true,
                fix_ligatures: false,
                fix_hyphenation: false,
                remove_replacement_char: false,
                trim_trailing_whitespace: true,
                max_consecutive_newlines: 0,
            },
            CleanupPreset::Standard => Self {
                normalize_unicode: true,
                fix_ligatures: true,
                fix_hyphenation: true,
                remove_replacement_char: true,
                trim_trailing_whitespace: true,
                max_consecutive_newlines: 2,
            },
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::from_preset(CleanupPreset::default())
    }
}

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Text cleanup pipeline.
#[derive(Debug, Clone)]
pub struct CleanupPipeline {
    options: CleanupOptions,
    trailing_ws: Regex,
    hyphenation: Regex,
    newlines: Option<Regex>,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        let newlines = (options.max_consecutive_newlines > 0).then(|| {
            let pattern = format!(r"\n{{{},}}", options.max_consecutive_newlines as usize + 1);
            Regex::new(&pattern).expect("newline pattern is valid")
        });

        Self {
            trailing_ws: Regex::new(r"(?m)[ \t]+$").expect("trailing whitespace pattern is valid"),
            hyphenation: Regex::new(r"([a-zA-Z])-[ \t]*\n[ \t]*([a-z])")
                .expect("hyphenation pattern is valid"),
            newlines,
            options,
        }
    }

    /// Create a pipeline from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        Self::new(CleanupOptions::from_preset(preset))
    }

    /// The options this pipeline was built with.
    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Run `text` through every enabled stage.
    pub fn process(&self, text: &str) -> String {
        let mut result = if self.options.normalize_unicode {
            text.nfc().collect::<String>()
        } else {
            text.to_string()
        };

        if self.options.fix_ligatures {
            for (ligature, replacement) in LIGATURES {
                if result.contains(*ligature) {
                    result = result.replace(*ligature, replacement);
                }
            }
        }

        if self.options.remove_replacement_char {
            result = result.replace('\u{FFFD}', "");
        }

        if self.options.trim_trailing_whitespace {
            result = self.trailing_ws.replace_all(&result, "").into_owned();
        }

        if self.options.fix_hyphenation {
            result = self.hyphenation.replace_all(&result, "$1$2").into_owned();
        }

        if let Some(re) = &self.newlines {
            let replacement = "\n".repeat(self.options.max_consecutive_newlines as usize);
            result = re.replace_all(&result, replacement.as_str()).into_owned();
        }

        result
    }
}

impl Default for CleanupPipeline {
    fn default() -> Self {
        Self::new(CleanupOptions::default())
    }
}

/// One-shot cleanup; build a [`CleanupPipeline`] when cleaning many strings.
pub fn clean_text(text: &str, options: &CleanupOptions) -> String {
    CleanupPipeline::new(options.clone()).process(text)
}
