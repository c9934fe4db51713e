// crates/trellis-text/src/script.rs
use unicode_script::{Script, UnicodeScript};

/// Scripts written without spaces, where a line may wrap after any letter.
pub fn breaks_between_letters(ch: char) -> bool {
    matches!(
        ch.script(),
        Script::Han
            | Script::Hiragana
            | Script::Katakana
            | Script::Bopomofo
            | Script::Yi
            | Script::Thai
            | Script::Lao
            | Script::Khmer
            | Script::Myanmar
    )
}

/// Characters that end a word in any script.
pub fn is_word_separator(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '.' | ';' | ',')
}
