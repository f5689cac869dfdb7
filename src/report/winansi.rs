//! 文本到 WinAnsiEncoding 的转换
//!
//! 标准 Type1 字体只能显示单字节编码，无法表示的字符替换为 `?`

use phf::phf_map;

/// 0x80–0x9F 区间的排版符号
static TYPOGRAPHIC: phf::Map<char, u8> = phf_map! {
    '€' => 0x80,
    '‚' => 0x82,
    'ƒ' => 0x83,
    '„' => 0x84,
    '…' => 0x85,
    '†' => 0x86,
    '‡' => 0x87,
    'ˆ' => 0x88,
    '‰' => 0x89,
    'Š' => 0x8A,
    '‹' => 0x8B,
    'Œ' => 0x8C,
    'Ž' => 0x8E,
    '‘' => 0x91,
    '’' => 0x92,
    '“' => 0x93,
    '”' => 0x94,
    '•' => 0x95,
    '–' => 0x96,
    '—' => 0x97,
    '˜' => 0x98,
    '™' => 0x99,
    'š' => 0x9A,
    '›' => 0x9B,
    'œ' => 0x9C,
    'ž' => 0x9E,
    'Ÿ' => 0x9F,
};

const REPLACEMENT: u8 = b'?';

pub fn encode(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

fn encode_char(c: char) -> u8 {
    match c {
        '\t' => b' ',
        ' '..='~' | '\u{A0}'..='\u{FF}' => c as u8,
        _ => TYPOGRAPHIC.get(&c).copied().unwrap_or(REPLACEMENT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_latin1_map_to_themselves() {
        assert_eq!(encode("Q1: ok?"), b"Q1: ok?".to_vec());
        assert_eq!(encode("é à ç"), vec![0xE9, b' ', 0xE0, b' ', 0xE7]);
    }

    #[test]
    fn typographic_punctuation_uses_win_ansi_slots() {
        assert_eq!(encode("’–…€"), vec![0x92, 0x96, 0x85, 0x80]);
    }

    #[test]
    fn unsupported_characters_are_replaced() {
        assert_eq!(encode("问题"), b"??".to_vec());
        assert_eq!(encode("\u{7}"), b"?".to_vec());
        assert_eq!(encode("a\tb"), b"a b".to_vec());
    }
}
