//! RTF reading and writing.
//!
//! The writer emits a font table, a color table, per-paragraph spacing and
//! per-run font/size/color/bold/italic/underline. The reader understands the
//! same subset plus `\u` and `\'hh` escapes; anything else is skipped.

use std::collections::HashMap;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use crate::app::domain::document::{Document, LoadedContent};
use crate::app::domain::runs::Run;
use crate::app::domain::style::{CharAttrs, Color, ParagraphAttrs, clamp_font_size};
use crate::app::error::{AppError, Result};
use crate::app::infrastructure::fs::{decode_utf8, read_bytes, write_atomic};

pub fn read(path: &Path, defaults: &CharAttrs) -> Result<LoadedContent> {
    let source = decode_utf8(path, read_bytes(path)?);
    parse(&source, defaults)
}

pub fn write(path: &Path, doc: &Document) -> Result<()> {
    write_atomic(path, render(doc).as_bytes())
}

// --- writer ---

fn twips(points: f32) -> i32 {
    (points * 20.0).round() as i32
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '\\' => out.push_str("\\\\"),
        '{' => out.push_str("\\{"),
        '}' => out.push_str("\\}"),
        '\t' => out.push_str("\\tab "),
        '\r' => out.push_str("\\u13?"),
        ' '..='~' => out.push(ch),
        _ => {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{}?", *unit as i16));
            }
        }
    }
}

fn push_paragraph_header(out: &mut String, attrs: ParagraphAttrs) {
    out.push_str(&format!(
        "\\pard\\sb{}\\sa{} ",
        twips(attrs.space_above),
        twips(attrs.space_below)
    ));
}

/// Serialize a document as RTF.
pub fn render(doc: &Document) -> String {
    let mut fonts: Vec<&str> = Vec::new();
    let mut colors: Vec<Color> = Vec::new();
    for run in doc.runs().iter() {
        if !fonts.contains(&run.attrs.font_family.as_str()) {
            fonts.push(&run.attrs.font_family);
        }
        if !colors.contains(&run.attrs.color) {
            colors.push(run.attrs.color);
        }
    }
    if fonts.is_empty() {
        fonts.push(&doc.typing_attrs().font_family);
    }

    let mut out = String::from("{\\rtf1\\ansi\\deff0\\uc1\n{\\fonttbl");
    for (i, family) in fonts.iter().enumerate() {
        out.push_str(&format!("{{\\f{}\\fnil ", i));
        family.chars().for_each(|c| push_escaped(&mut out, c));
        out.push_str(";}");
    }
    out.push_str("}\n{\\colortbl;");
    for color in &colors {
        out.push_str(&format!("\\red{}\\green{}\\blue{};", color.r, color.g, color.b));
    }
    out.push_str("}\n");

    let paragraphs = doc.paragraphs();
    let mut line = 0;
    push_paragraph_header(&mut out, paragraphs.first().copied().unwrap_or_default());

    let mut chars = doc.text().chars();
    for run in doc.runs().iter() {
        let attrs = &run.attrs;
        let font = fonts
            .iter()
            .position(|f| *f == attrs.font_family)
            .unwrap_or(0);
        let color = colors.iter().position(|c| *c == attrs.color).unwrap_or(0) + 1;
        let mut header = format!("{{\\f{}\\fs{}\\cf{}", font, attrs.font_size.saturating_mul(2), color);
        if attrs.bold {
            header.push_str("\\b");
        }
        if attrs.italic {
            header.push_str("\\i");
        }
        if attrs.underline {
            header.push_str("\\ul");
        }
        header.push(' ');

        // The paragraph mark stays inside the run's group so it keeps the
        // run's attributes when read back.
        out.push_str(&header);
        for ch in chars.by_ref().take(run.len) {
            if ch == '\n' {
                out.push_str("\\par\n");
                line += 1;
                push_paragraph_header(&mut out, paragraphs.get(line).copied().unwrap_or_default());
            } else {
                push_escaped(&mut out, ch);
            }
        }
        out.push('}');
    }
    out.push_str("\n}\n");
    out
}

// --- reader ---

#[derive(Debug, Clone, Copy, PartialEq)]
enum Destination {
    Body,
    FontTable,
    ColorTable,
    Skip,
}

#[derive(Debug, Clone)]
struct Group {
    attrs: CharAttrs,
    dest: Destination,
    /// Fallback chars to drop after `\u`.
    uc: usize,
    font_index: i32,
}

const SKIPPED_DESTINATIONS: &[&str] = &[
    "stylesheet",
    "info",
    "pict",
    "header",
    "headerl",
    "headerr",
    "footer",
    "footerl",
    "footerr",
    "object",
    "fldinst",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "xmlnstbl",
];

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    defaults: CharAttrs,
    group: Group,
    stack: Vec<Group>,
    fonts: HashMap<i32, String>,
    font_name: String,
    colors: Vec<Option<Color>>,
    pending_color: Option<Color>,
    para: ParagraphAttrs,
    skip_fallback: usize,
    high_surrogate: Option<u16>,
    text: String,
    runs: Vec<Run>,
    paragraphs: Vec<ParagraphAttrs>,
}

/// Parse RTF source into document content.
pub fn parse(source: &str, defaults: &CharAttrs) -> Result<LoadedContent> {
    let body = source.trim_start();
    if !body.starts_with("{\\rtf") {
        return Err(AppError::Rtf("missing {\\rtf header".to_string()));
    }

    let mut parser = Parser {
        chars: body.chars().peekable(),
        defaults: defaults.clone(),
        group: Group {
            attrs: defaults.clone(),
            dest: Destination::Body,
            uc: 1,
            font_index: 0,
        },
        stack: Vec::new(),
        fonts: HashMap::new(),
        font_name: String::new(),
        colors: Vec::new(),
        pending_color: None,
        para: ParagraphAttrs::default(),
        skip_fallback: 0,
        high_surrogate: None,
        text: String::new(),
        runs: Vec::new(),
        paragraphs: Vec::new(),
    };
    parser.run();
    Ok(parser.finish())
}

impl Parser<'_> {
    fn run(&mut self) {
        while let Some(c) = self.chars.next() {
            match c {
                '{' => self.stack.push(self.group.clone()),
                '}' => {
                    self.skip_fallback = 0;
                    match self.stack.pop() {
                        Some(outer) => self.group = outer,
                        None => tracing::warn!("RTF has an unmatched closing brace"),
                    }
                }
                '\\' => self.control(),
                '\r' | '\n' => {}
                _ => self.emit(c),
            }
        }
        if !self.stack.is_empty() {
            tracing::warn!("RTF ended with {} unclosed group(s)", self.stack.len());
        }
    }

    fn finish(mut self) -> LoadedContent {
        self.paragraphs.push(self.para);
        LoadedContent {
            text: self.text,
            runs: self.runs,
            paragraphs: self.paragraphs,
        }
    }

    fn control(&mut self) {
        let Some(&next) = self.chars.peek() else {
            return;
        };
        if !next.is_ascii_alphabetic() {
            self.chars.next();
            self.control_symbol(next);
            return;
        }

        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            word.push(c);
            self.chars.next();
        }

        let mut digits = String::new();
        if self.chars.peek() == Some(&'-') {
            digits.push('-');
            self.chars.next();
        }
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        let param = digits.parse::<i32>().ok();

        if self.chars.peek() == Some(&' ') {
            self.chars.next();
        }
        self.control_word(&word, param);
    }

    fn control_symbol(&mut self, symbol: char) {
        match symbol {
            '\\' | '{' | '}' => self.emit(symbol),
            '~' => self.emit('\u{a0}'),
            '_' => self.emit('\u{2011}'),
            '*' => self.group.dest = Destination::Skip,
            '\'' => {
                let hex: String = self.chars.by_ref().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) => self.emit(char::from(byte)),
                    Err(_) => tracing::debug!("Bad RTF hex escape {:?}", hex),
                }
            }
            '\n' | '\r' => self.paragraph_break(),
            _ => {}
        }
    }

    fn control_word(&mut self, word: &str, param: Option<i32>) {
        let n = param.unwrap_or(0);
        match word {
            "fonttbl" => self.group.dest = Destination::FontTable,
            "colortbl" => self.group.dest = Destination::ColorTable,
            w if SKIPPED_DESTINATIONS.contains(&w) => self.group.dest = Destination::Skip,
            "par" | "line" => self.paragraph_break(),
            "tab" => self.emit('\t'),
            "emdash" => self.emit('\u{2014}'),
            "endash" => self.emit('\u{2013}'),
            "bullet" => self.emit('\u{2022}'),
            "lquote" => self.emit('\u{2018}'),
            "rquote" => self.emit('\u{2019}'),
            "ldblquote" => self.emit('\u{201c}'),
            "rdblquote" => self.emit('\u{201d}'),
            "pard" => self.para = ParagraphAttrs::default(),
            "sb" => self.para.space_above = n.max(0) as f32 / 20.0,
            "sa" => self.para.space_below = n.max(0) as f32 / 20.0,
            "plain" => self.group.attrs = self.defaults.clone(),
            "f" => {
                if self.group.dest == Destination::FontTable {
                    self.group.font_index = n;
                } else if let Some(family) = self.fonts.get(&n) {
                    self.group.attrs.font_family = family.clone();
                }
            }
            "fs" => {
                self.group.attrs.font_size = clamp_font_size((param.unwrap_or(24).max(2) / 2) as u32)
            }
            "cf" => {
                self.group.attrs.color = usize::try_from(n)
                    .ok()
                    .and_then(|i| self.colors.get(i).copied().flatten())
                    .unwrap_or(self.defaults.color);
            }
            "b" => self.group.attrs.bold = param != Some(0),
            "i" => self.group.attrs.italic = param != Some(0),
            "ul" => self.group.attrs.underline = param != Some(0),
            "ulnone" => self.group.attrs.underline = false,
            "red" | "green" | "blue" if self.group.dest == Destination::ColorTable => {
                let value = n.clamp(0, 255) as u8;
                let color = self.pending_color.get_or_insert(Color::BLACK);
                match word {
                    "red" => color.r = value,
                    "green" => color.g = value,
                    _ => color.b = value,
                }
            }
            "uc" => self.group.uc = n.max(0) as usize,
            "u" => self.unicode(n),
            _ => {}
        }
    }

    fn unicode(&mut self, n: i32) {
        let unit = if n < 0 { (n + 65536) as u16 } else { n as u16 };
        let decoded = match unit {
            0xD800..=0xDBFF => {
                self.high_surrogate = Some(unit);
                None
            }
            0xDC00..=0xDFFF => self
                .high_surrogate
                .take()
                .and_then(|high| char::decode_utf16([high, unit]).next()?.ok()),
            _ => char::from_u32(u32::from(unit)),
        };
        if let Some(ch) = decoded {
            self.emit(ch);
        }
        self.skip_fallback = self.group.uc;
    }

    fn paragraph_break(&mut self) {
        if self.group.dest == Destination::Body {
            self.push_char('\n');
            self.paragraphs.push(self.para);
        }
    }

    fn emit(&mut self, c: char) {
        match self.group.dest {
            Destination::Skip => {}
            Destination::FontTable => {
                if c == ';' {
                    let name = std::mem::take(&mut self.font_name);
                    self.fonts.insert(self.group.font_index, name.trim().to_string());
                } else {
                    self.font_name.push(c);
                }
            }
            Destination::ColorTable => {
                if c == ';' {
                    self.colors.push(self.pending_color.take());
                }
            }
            Destination::Body => {
                if self.skip_fallback > 0 {
                    self.skip_fallback -= 1;
                    return;
                }
                self.push_char(c);
            }
        }
    }

    fn push_char(&mut self, c: char) {
        self.text.push(c);
        match self.runs.last_mut() {
            Some(last) if last.attrs == self.group.attrs => last.len += 1,
            _ => self.runs.push(Run::new(1, self.group.attrs.clone())),
        }
    }
}
