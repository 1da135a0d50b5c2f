//! Code page handling for Paradox text.
//!
//! Tables written by Paradox for DOS and Windows store text in the DOS code
//! page recorded in the header. The OEM pages most tables use (437 and 850)
//! are not WHATWG encodings, so they are mapped with built-in tables; the
//! remaining pages go through `encoding_rs`.

use std::borrow::Cow;
use std::sync::OnceLock;

use encoding_rs::Encoding;

/// Upper halves (0x80-0xFF) of the OEM code pages, sixteen per row.
const CP437_HIGH: &str = concat!(
    "ÇüéâäàåçêëèïîìÄÅ",
    "ÉæÆôöòûùÿÖÜ¢£¥₧ƒ",
    "áíóúñÑªº¿⌐¬½¼¡«»",
    "░▒▓│┤╡╢╖╕╣║╗╝╜╛┐",
    "└┴┬├─┼╞╟╚╔╩╦╠═╬╧",
    "╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀",
    "αßΓπΣσµτΦΘΩδ∞φε∩",
    "≡±≥≤⌠⌡÷≈°∙·√ⁿ²■\u{a0}",
);

const CP850_HIGH: &str = concat!(
    "ÇüéâäàåçêëèïîìÄÅ",
    "ÉæÆôöòûùÿÖÜø£Ø×ƒ",
    "áíóúñÑªº¿®¬½¼¡«»",
    "░▒▓│┤ÁÂÀ©╣║╗╝¢¥┐",
    "└┴┬├─┼ãÃ╚╔╩╦╠═╬¤",
    "ðÐÊËÈıÍÎÏ┘┌█▄¦Ì▀",
    "ÓßÔÒõÕµþÞÚÛÙýÝ¯´",
    "\u{ad}±‗¾¶§÷¸°¨·¹³²■\u{a0}",
);

fn high_table(source: &'static str, cell: &'static OnceLock<[char; 128]>) -> &'static [char; 128] {
    cell.get_or_init(|| {
        let mut table = ['\u{fffd}'; 128];
        for (slot, ch) in table.iter_mut().zip(source.chars()) {
            *slot = ch;
        }
        table
    })
}

static CP437: OnceLock<[char; 128]> = OnceLock::new();
static CP850: OnceLock<[char; 128]> = OnceLock::new();

#[derive(Debug, Clone, Copy)]
enum Decoder {
    Oem(&'static str, &'static OnceLock<[char; 128]>),
    Whatwg(&'static Encoding),
}

/// The character encoding of a table's text fields.
#[derive(Debug, Clone, Copy)]
pub struct CodePage {
    id: u16,
    decoder: Decoder,
    exact: bool,
}

impl CodePage {
    /// Map a DOS/Windows code page number. Unknown pages (and 0, which
    /// tables older than version 4 carry) fall back to windows-1252.
    pub fn from_id(id: u16) -> Self {
        let known = match id {
            437 => Some(Decoder::Oem(CP437_HIGH, &CP437)),
            850 => Some(Decoder::Oem(CP850_HIGH, &CP850)),
            866 => Some(Decoder::Whatwg(encoding_rs::IBM866)),
            874 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_874)),
            932 => Some(Decoder::Whatwg(encoding_rs::SHIFT_JIS)),
            936 => Some(Decoder::Whatwg(encoding_rs::GBK)),
            949 => Some(Decoder::Whatwg(encoding_rs::EUC_KR)),
            950 => Some(Decoder::Whatwg(encoding_rs::BIG5)),
            1250 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1250)),
            1251 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1251)),
            1252 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1252)),
            1253 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1253)),
            1254 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1254)),
            1255 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1255)),
            1256 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1256)),
            1257 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1257)),
            1258 => Some(Decoder::Whatwg(encoding_rs::WINDOWS_1258)),
            _ => None,
        };
        Self {
            id,
            exact: known.is_some(),
            decoder: known.unwrap_or(Decoder::Whatwg(encoding_rs::WINDOWS_1252)),
        }
    }

    /// The code page number this was built from.
    #[inline]
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// False when `id` was not recognized and windows-1252 is used instead.
    #[inline]
    pub const fn is_exact(&self) -> bool {
        self.exact
    }

    /// Human-readable encoding name.
    pub fn label(&self) -> &'static str {
        match self.decoder {
            Decoder::Oem(_, cell) if std::ptr::eq(cell, &CP437) => "IBM437",
            Decoder::Oem(..) => "IBM850",
            Decoder::Whatwg(encoding) => encoding.name(),
        }
    }

    /// Decode text bytes. ASCII input is borrowed without copying.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        if bytes.is_ascii() {
            // ASCII is valid UTF-8
            return Cow::Borrowed(std::str::from_utf8(bytes).unwrap_or_default());
        }
        match self.decoder {
            Decoder::Oem(source, cell) => {
                let table = high_table(source, cell);
                Cow::Owned(
                    bytes
                        .iter()
                        .map(|&b| if b < 0x80 { b as char } else { table[(b - 0x80) as usize] })
                        .collect(),
                )
            }
            Decoder::Whatwg(encoding) => encoding.decode_without_bom_handling(bytes).0,
        }
    }
}

impl Default for CodePage {
    fn default() -> Self {
        Self::from_id(0)
    }
}
