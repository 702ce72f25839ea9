/// Rough token count for DeepSeek tokenizers.
///
/// DeepSeek documents roughly 0.3 tokens per English character and 0.6 tokens per
/// Chinese character. The estimate applies those ratios per character and rounds up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimate {
    pub estimated_tokens: usize,
    pub cjk_chars: usize,
    pub other_chars: usize,
}

impl TokenEstimate {
    pub fn total_chars(&self) -> usize {
        self.cjk_chars + self.other_chars
    }
}

pub fn estimate_token_count(text: &str) -> TokenEstimate {
    let mut cjk_chars = 0usize;
    let mut other_chars = 0usize;
    for ch in text.chars() {
        if is_cjk(ch) {
            cjk_chars += 1;
        } else {
            other_chars += 1;
        }
    }

    // Tenths of a token, to stay in integer arithmetic.
    let tenths = cjk_chars.saturating_mul(6) + other_chars.saturating_mul(3);
    TokenEstimate {
        estimated_tokens: tenths.div_ceil(10),
        cjk_chars,
        other_chars,
    }
}

fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3040..=0x30FF     // hiragana, katakana
        | 0x3400..=0x4DBF   // CJK extension A
        | 0x4E00..=0x9FFF   // CJK unified ideographs
        | 0xAC00..=0xD7AF   // hangul syllables
        | 0xF900..=0xFAFF   // compatibility ideographs
        | 0xFF00..=0xFFEF   // half/full-width forms
        | 0x20000..=0x2FA1F // extensions B-F, compatibility supplement
    )
}
