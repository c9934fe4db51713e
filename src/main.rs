use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use trellis_core::{FontSize, HorizReadingDir, RichText, VertReadingDir};
use trellis_layout::{CellProps, CellRef, Layout, LayoutBox, LayoutLine, LayoutTableSameSize};
use trellis_text::{NativeFontBackend, ScriptTag, ShapedText, ShaperConfig, ShaperManager};

#[derive(Parser)]
#[command(author, version, about = "Shape a string and lay its words out", long_about = None)]
struct Args {
    /// Font to register, as `[SCRIPT:LANG:]PATH` (e.g. `Arab:ar:fonts/arabic.ttf`). Repeat for fallbacks.
    #[arg(short, long = "font", value_name = "FONT", required = true)]
    fonts: Vec<String>,

    /// Text to shape
    #[arg(short, long, default_value = "Hello, world")]
    text: String,

    /// Font size in points
    #[arg(short, long, default_value = "16")]
    size: f32,

    /// Screen resolution used to turn points into pixels
    #[arg(long, default_value = "96")]
    dpi: u32,

    /// Reading direction: default, auto, auto-rtl, ltr or rtl
    #[arg(long, default_value = "default", value_parser = HorizReadingDir::from_str)]
    direction: HorizReadingDir,

    /// Shape top to bottom where the manager allows it
    #[arg(long)]
    vertical: bool,

    /// Width available to the layout
    #[arg(long, default_value = "640")]
    width: f32,

    /// Height available to the layout
    #[arg(long, default_value = "480")]
    height: f32,

    /// Lay words out in a same-size table with this many columns instead of a row
    #[arg(long)]
    columns: Option<usize>,

    /// Space around each word
    #[arg(long, default_value = "4")]
    margin: f32,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

struct FontSpec {
    script: ScriptTag,
    language: String,
    path: PathBuf,
}

fn parse_font_spec(spec: &str) -> FontSpec {
    let mut parts = spec.splitn(3, ':');
    if let (Some(script), Some(language), Some(path)) = (parts.next(), parts.next(), parts.next()) {
        if let Ok(tag) = <ScriptTag>::try_from(script.as_bytes()) {
            if tag.iter().all(u8::is_ascii_alphabetic) {
                return FontSpec {
                    script: tag,
                    language: language.to_string(),
                    path: PathBuf::from(path),
                };
            }
        }
    }

    FontSpec {
        script: *b"Latn",
        language: "en".to_string(),
        path: PathBuf::from(spec),
    }
}

/// One shaped word and the layout cell standing in for it.
struct Word {
    text: String,
    cell: Rc<RefCell<LayoutBox>>,
    glyphs: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    let pt_size = FontSize::try_from_pt(args.size).context("Invalid font size")?;

    let mut manager = ShaperManager::new().with_config(ShaperConfig {
        dpi: args.dpi,
        default_reading_dir: match args.direction {
            HorizReadingDir::Default => HorizReadingDir::AutoLTR,
            other => other,
        },
        use_vertical_layout_when_available: args.vertical,
        ..ShaperConfig::default()
    });

    for spec in args.fonts.iter().map(|s| parse_font_spec(s)) {
        info!("Loading font: {}", spec.path.display());
        manager.add_shaper(&NativeFontBackend, &spec.path, spec.script, &spec.language);
    }
    if !manager.shapers().iter().any(|s| s.is_usable()) {
        anyhow::bail!("None of the given fonts could be opened");
    }

    let vert_reading_dir = if args.vertical {
        VertReadingDir::IfNeededTTB
    } else {
        VertReadingDir::Disabled
    };

    let mut shaped = ShapedText::new();
    let mut words = Vec::new();
    let mut alignments = Vec::new();

    for (index, (offset, word)) in split_words(&args.text).into_iter().enumerate() {
        let mut rich = RichText::covering(&args.text)
            .with_range(offset, word.len())
            .with_pt_size(pt_size)
            .with_reading_dir(args.direction);
        let alignment = manager.render_string(&args.text, &mut rich, index, vert_reading_dir, &mut shaped);
        alignments.push(alignment);

        let glyphs = &shaped.glyphs[rich.glyph_start..rich.glyph_end];
        let width: f32 = glyphs.iter().map(|g| g.advance.x).sum();
        let height = glyphs
            .iter()
            .filter_map(|g| manager.atlas().glyph(&g.glyph))
            .map(|g| g.newline_size)
            .fold(0.0f32, f32::max);
        debug!("Word {:?}: {} glyphs, {}x{}", word, glyphs.len(), width, height);

        let cell = LayoutBox::new(Vec2::new(width, height))
            .with_props(
                CellProps::new()
                    .with_min_size(Vec2::new(width, height))
                    .with_margin(Vec2::splat(args.margin)),
            )
            .shared();
        words.push(Word {
            text: word.to_string(),
            cell,
            glyphs: glyphs.len(),
        });
    }

    if words.is_empty() {
        warn!("Nothing to lay out");
        return Ok(());
    }

    let soft_max = Vec2::new(args.width, args.height);
    let cells: Vec<CellRef> = words.iter().map(|w| w.cell.clone() as CellRef).collect();

    let extent = match args.columns {
        Some(columns) => {
            let mut table = LayoutTableSameSize::new(columns.max(1));
            table.base.set_soft_max_size(soft_max);
            for cell in cells {
                table.add_cell(cell);
            }
            table.layout_as_root();
            info!("Table cell box: {:?}", table.cell_box());
            table.base.current_size
        }
        None => {
            let mut line = LayoutLine::horizontal();
            line.base.set_soft_max_size(soft_max);
            for cell in cells {
                line.add_cell(cell);
            }
            line.layout();
            line.base.current_size
        }
    };

    println!("Layout size: {:.1} x {:.1}", extent.x, extent.y);
    for (word, alignment) in words.iter().zip(&alignments) {
        let cell = word.cell.borrow();
        println!(
            "{:>16}  {:>3} glyphs  at ({:7.1}, {:7.1})  size {:6.1} x {:6.1}  {:?}",
            word.text, word.glyphs, cell.offset.x, cell.offset.y, cell.size.x, cell.size.y, alignment
        );
    }

    let atlas = manager.atlas();
    println!(
        "Atlas: {} glyphs, {} / {} bytes used, {} bytes free{}",
        atlas.live_glyphs(),
        atlas.frontier(),
        atlas.capacity(),
        atlas.free_bytes(),
        if shaped.has_private_use { ", private use glyphs present" } else { "" }
    );

    Ok(())
}

/// Words separated by whitespace, with their byte offsets.
fn split_words(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (offset, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push((s, &text[s..offset]));
                start = None;
            }
            (false, None) => start = Some(offset),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, &text[s..]));
    }
    words
}
