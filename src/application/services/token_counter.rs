use std::sync::LazyLock;
use tiktoken_rs::CoreBPE;

static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    tiktoken_rs::cl100k_base().expect("Failed to initialize cl100k_base tokenizer")
});

pub fn count_tokens(text: &str) -> usize {
    TOKENIZER.encode_with_special_tokens(text).len()
}

/// Longest prefix of `text`, cut at a whitespace boundary, that fits in `max_tokens`.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> &str {
    if count_tokens(text) <= max_tokens {
        return text;
    }

    let boundaries: Vec<usize> = text
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i)
        .collect();

    let mut low = 0usize;
    let mut high = boundaries.len();
    while low < high {
        let mid = (low + high).div_ceil(2);
        if count_tokens(&text[..boundaries[mid - 1]]) <= max_tokens {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    match low {
        0 => "",
        n => text[..boundaries[n - 1]].trim_end(),
    }
}
