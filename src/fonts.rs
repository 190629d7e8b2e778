use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

/// Family candidates tried in order when `RESUME_FONT_FAMILY` is not set.
pub const DEFAULT_FAMILIES: &str = "Arial;Helvetica;Liberation Sans;DejaVu Sans;Noto Sans CJK SC";

/// Raw font bytes kept around so the exporter can subset and embed the exact face
/// that measurement used.
#[derive(Clone)]
pub(crate) struct FontSource {
    pub(crate) data: Arc<Vec<u8>>,
    pub(crate) face_index: u32,
}

/// Advance widths and vertical metrics for one face (regular or bold).
#[derive(Clone)]
pub struct FaceMetrics {
    pub family: String,
    pub bold: bool,
    pub(crate) source: Option<FontSource>,
    char_widths_1000: HashMap<char, f32>,
    pub ascender_ratio: f32,
    pub line_h_ratio: f32,
}

impl std::fmt::Debug for FaceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceMetrics")
            .field("family", &self.family)
            .field("bold", &self.bold)
            .field("embedded", &self.source.is_some())
            .finish()
    }
}

/// CJK ideographs, kana, hangul and full-width forms. These break anywhere and,
/// in the built-in metrics, are one em wide.
pub(crate) fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x11FF
        | 0x2E80..=0x9FFF
        | 0xA960..=0xA97F
        | 0xAC00..=0xD7FF
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFFEF
        | 0x20000..=0x3FFFF)
}

impl FaceMetrics {
    /// Width of a single character in 1000-units.
    pub fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(&w) = self.char_widths_1000.get(&ch) {
            return w;
        }
        if is_wide(ch) {
            1000.0
        } else if ch.is_control() {
            0.0
        } else {
            556.0
        }
    }

    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }

    pub fn is_builtin(&self) -> bool {
        self.source.is_none()
    }

    /// Approximate Helvetica, used when no font file can be found.
    fn helvetica(bold: bool) -> Self {
        let mut char_widths_1000 = HashMap::new();
        for byte in 32u8..=255u8 {
            let w = match byte {
                32 => 278.0,
                33..=47 => 333.0,
                48..=57 => 556.0,
                58..=64 => 333.0,
                73 | 74 => 278.0,
                77 => 833.0,
                65..=90 => 667.0,
                91..=96 => 333.0,
                102 | 105 | 106 | 108 | 116 => 278.0,
                109 | 119 => 833.0,
                97..=122 => 556.0,
                _ => 556.0,
            };
            // bold Helvetica runs roughly 5% wider
            let w = if bold { w * 1.05 } else { w };
            char_widths_1000.insert(winansi_to_char(byte), w);
        }
        FaceMetrics {
            family: "Helvetica".to_string(),
            bold,
            source: None,
            char_widths_1000,
            ascender_ratio: 0.718,
            line_h_ratio: 1.15,
        }
    }

    fn from_data(family: &str, bold: bool, data: Arc<Vec<u8>>, face_index: u32) -> Option<Self> {
        let face = Face::parse(&data, face_index).ok()?;
        let units = face.units_per_em() as f32;

        let mut char_widths_1000 = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|cp| {
                    let Some(ch) = char::from_u32(cp) else {
                        return;
                    };
                    if let Some(adv) = face.glyph_index(ch).and_then(|gid| face.glyph_hor_advance(gid)) {
                        char_widths_1000.entry(ch).or_insert(adv as f32 / units * 1000.0);
                    }
                });
            }
        }
        if char_widths_1000.is_empty() {
            return None;
        }

        let line_gap = face.line_gap() as f32;
        let line_h_ratio = (face.ascender() as f32 - face.descender() as f32 + line_gap) / units;
        let ascender_ratio = face.ascender() as f32 / units;

        Some(FaceMetrics {
            family: family.to_string(),
            bold,
            source: Some(FontSource { data, face_index }),
            char_widths_1000,
            ascender_ratio,
            line_h_ratio,
        })
    }
}

/// Regular and bold faces of the family everything is laid out with.
#[derive(Clone, Debug)]
pub struct FontMetrics {
    pub regular: FaceMetrics,
    pub bold: FaceMetrics,
}

impl FontMetrics {
    /// Built-in Helvetica metrics. Deterministic regardless of installed fonts.
    pub fn builtin() -> Self {
        FontMetrics {
            regular: FaceMetrics::helvetica(false),
            bold: FaceMetrics::helvetica(true),
        }
    }

    /// Resolve a `;`-separated family list against the system font index, falling
    /// back to Helvetica metrics when nothing matches.
    pub fn load(families: &str) -> Self {
        let t0 = std::time::Instant::now();
        let regular = load_face(families, false);
        let bold = load_face(families, true).or_else(|| {
            // synthesize bold from the regular face's widths when no bold file exists
            regular.clone().map(|mut f| {
                f.bold = true;
                f
            })
        });
        let metrics = match (regular, bold) {
            (Some(regular), Some(bold)) => FontMetrics { regular, bold },
            _ => {
                log::warn!("Font not found: {families}, using Helvetica metrics");
                FontMetrics::builtin()
            }
        };
        log::debug!(
            "FontMetrics::load: {families} → {} ({:.1}ms)",
            metrics.regular.family,
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        metrics
    }

    /// Family list from `RESUME_FONT_FAMILY`, or the default candidates.
    pub fn from_env() -> Self {
        let families = std::env::var("RESUME_FONT_FAMILY").unwrap_or_else(|_| DEFAULT_FAMILIES.to_string());
        Self::load(&families)
    }

    pub fn face(&self, bold: bool) -> &FaceMetrics {
        if bold { &self.bold } else { &self.regular }
    }
}

fn load_face(families: &str, bold: bool) -> Option<FaceMetrics> {
    for candidate in families.split(';').map(str::trim).filter(|c| !c.is_empty()) {
        let Some((path, face_index)) = find_font_file(candidate, bold) else {
            continue;
        };
        let Ok(data) = std::fs::read(&path) else {
            continue;
        };
        if let Some(face) = FaceMetrics::from_data(candidate, bold, Arc::new(data), face_index) {
            log::debug!("load_face: {candidate} bold={bold} → {}", path.display());
            return Some(face);
        }
    }
    None
}

/// (lowercase family name, bold) -> (file path, face index within a collection)
type FontLookup = HashMap<(String, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("RESUME_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        dirs.extend(
            val.split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        );
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        match std::env::var("WINDIR") {
            Ok(windir) => dirs.push(PathBuf::from(windir).join("Fonts")),
            Err(_) => dirs.push("C:\\Windows\\Fonts".into()),
        }
    }

    dirs
}

/// One face found in a font file: family, bold flag, face index.
type CachedFace = (String, bool, u32);

#[derive(Default)]
struct IndexCache {
    dir_mtimes: HashMap<PathBuf, i64>,
    files: HashMap<PathBuf, Vec<CachedFace>>,
}

const CACHE_VERSION: &str = "resume-pager-v1";

fn cache_path() -> Option<PathBuf> {
    let dir = if cfg!(target_os = "macos") {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Caches/resume-pager"))
    } else if cfg!(target_os = "windows") {
        std::env::var("LOCALAPPDATA")
            .ok()
            .map(|d| PathBuf::from(d).join("resume-pager/cache"))
    } else {
        std::env::var("XDG_CACHE_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".cache")))
            .map(|d| d.join("resume-pager"))
    };
    dir.map(|d| d.join("font-index.tsv"))
}

fn load_cache() -> IndexCache {
    let mut cache = IndexCache::default();
    let Some(content) = cache_path().and_then(|p| std::fs::read_to_string(p).ok()) else {
        return cache;
    };
    let mut lines = content.lines();
    if lines.next() != Some(CACHE_VERSION) {
        return cache;
    }
    for line in lines {
        let parts: Vec<&str> = line.split('\t').collect();
        match parts.as_slice() {
            ["D", dir, mtime] => {
                if let Ok(mtime) = mtime.parse::<i64>() {
                    cache.dir_mtimes.insert(PathBuf::from(dir), mtime);
                }
            }
            ["F", file, family, bold, index] => {
                if let Ok(index) = index.parse::<u32>() {
                    cache
                        .files
                        .entry(PathBuf::from(file))
                        .or_default()
                        .push((family.to_string(), *bold == "1", index));
                }
            }
            ["F", file, "-"] => {
                cache.files.entry(PathBuf::from(file)).or_default();
            }
            _ => {}
        }
    }
    cache
}

fn save_cache(cache: &IndexCache) {
    let Some(path) = cache_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let mut out = format!("{CACHE_VERSION}\n");
    for (dir, mtime) in &cache.dir_mtimes {
        out.push_str(&format!("D\t{}\t{mtime}\n", dir.to_string_lossy()));
    }
    for (file, faces) in &cache.files {
        let file = file.to_string_lossy();
        if faces.is_empty() {
            out.push_str(&format!("F\t{file}\t-\n"));
        }
        for (family, bold, index) in faces {
            out.push_str(&format!("F\t{file}\t{family}\t{}\t{index}\n", if *bold { "1" } else { "0" }));
        }
    }
    let _ = std::fs::write(&path, out);
}

fn dir_mtime(path: &Path) -> i64 {
    std::fs::metadata(path)
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn font_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| matches!(e.as_str(), "ttf" | "otf" | "ttc"))
}

fn read_faces(path: &Path) -> Vec<CachedFace> {
    let Ok(file) = std::fs::File::open(path) else {
        return Vec::new();
    };
    // SAFETY: the mapping is read-only and dropped before this function returns.
    let Ok(data) = (unsafe { Mmap::map(&file) }) else {
        return Vec::new();
    };
    let count = if font_extension(path).as_deref() == Some("ttc") {
        ttf_parser::fonts_in_collection(&data).unwrap_or(1)
    } else {
        1
    };
    (0..count)
        .filter_map(|index| {
            let face = Face::parse(&data, index).ok()?;
            Some((font_family_name(&face)?, face.is_bold(), index))
        })
        .collect()
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let use_cache = std::env::var("RESUME_NO_FONT_CACHE").is_err();
    let cache = if use_cache { load_cache() } else { IndexCache::default() };
    let mut fresh = IndexCache::default();
    let mut index = FontLookup::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let (mut dirs_cached, mut files_parsed) = (0u32, 0u32);

    let mut stack = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut font_files = Vec::new();
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                stack.push(path);
            } else if font_extension(&path).is_some() {
                font_files.push(path);
            }
        }
        if font_files.is_empty() {
            continue;
        }

        let mtime = dir_mtime(&dir);
        let unchanged = cache.dir_mtimes.get(&dir) == Some(&mtime);
        if unchanged {
            dirs_cached += 1;
        }
        fresh.dir_mtimes.insert(dir, mtime);

        for file in font_files {
            let faces = match cache.files.get(&file) {
                Some(faces) if unchanged => faces.clone(),
                _ => {
                    files_parsed += 1;
                    read_faces(&file)
                }
            };
            for (family, bold, face_index) in &faces {
                index
                    .entry((family.to_lowercase(), *bold))
                    .or_insert((file.clone(), *face_index));
            }
            fresh.files.insert(file, faces);
        }
    }

    if use_cache {
        save_cache(&fresh);
    }

    log::info!(
        "Font scan: {:.1}ms, {} dirs ({} cached), {} files parsed → {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        fresh.dir_mtimes.len(),
        dirs_cached,
        files_parsed,
        index.len(),
    );
    index
}

/// Look up a font file by family name. Bold requests do not fall back to regular;
/// the caller decides how to synthesize.
fn find_font_file(family: &str, bold: bool) -> Option<(PathBuf, u32)> {
    FONT_INDEX
        .get_or_init(scan_font_dirs)
        .get(&(family.to_lowercase(), bold))
        .cloned()
}

/// Windows-1252 byte to Unicode. Bytes 0x80-0x9F are remapped, the rest are Latin-1.
fn winansi_to_char(byte: u8) -> char {
    WINANSI_HIGH
        .iter()
        .find(|(b, _)| *b == byte)
        .map(|(_, c)| *c)
        .unwrap_or(byte as char)
}

const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007F | 0x00A0..=0x00FF => Some(c as u8),
        _ => WINANSI_HIGH.iter().find(|(_, ch)| *ch == c).map(|(b, _)| *b),
    }
}

/// UTF-8 to WinAnsi bytes for the standard-font path. Unmappable chars become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| char_to_winansi(c).unwrap_or(b'?')).collect()
}

/// Encode text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.extend_from_slice(&gid.to_be_bytes());
    }
    out
}

/// A face written into the PDF, ready to be referenced from content streams.
pub(crate) struct EmbeddedFont {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
}

impl EmbeddedFont {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Write `face` into the PDF. Real faces become subsetted Type0/CIDFontType2 fonts
/// with Identity-H encoding; the built-in metrics map to standard Helvetica.
pub(crate) fn embed_face(
    pdf: &mut Pdf,
    face: &FaceMetrics,
    pdf_name: String,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> EmbeddedFont {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = face
        .source
        .as_ref()
        .and_then(|src| embed_truetype(pdf, font_ref, &face.family, src, used_chars, alloc));

    if char_to_gid.is_none() {
        let base = if face.bold { &b"Helvetica-Bold"[..] } else { &b"Helvetica"[..] };
        pdf.type1_font(font_ref)
            .base_font(Name(base))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    log::debug!(
        "embed_face: {} bold={} chars={} → {:.1}ms",
        face.family,
        face.bold,
        used_chars.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    EmbeddedFont {
        pdf_name,
        font_ref,
        char_to_gid,
    }
}

fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    family: &str,
    source: &FontSource,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<HashMap<char, u16>> {
    let face = Face::parse(&source.data, source.face_index).ok()?;
    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min as f32),
        to_1000(bb.y_min as f32),
        to_1000(bb.x_max as f32),
        to_1000(bb.y_max as f32),
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    let mut chars: Vec<char> = used_chars.iter().copied().collect();
    chars.sort_unstable();
    for ch in chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            let w = face.glyph_hor_advance(gid).map(|adv| to_1000(adv as f32)).unwrap_or(0.0);
            gid_widths.push((new_gid, w));
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset = subsetter::subset(&source.data, source.face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {family}: {e}; embedding full font");
        source.data.to_vec()
    });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    let data_len = i32::try_from(subset.len()).ok()?;
    pdf.stream(data_ref, &subset).pair(Name(b"Length1"), data_len);

    let ps_name = family.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(face.capital_height().map(|h| to_1000(h as f32)).unwrap_or(700.0))
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = || pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info());
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(char_to_gid)
}
