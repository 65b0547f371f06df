//! Pixel-level checks of grid composition and export.
//!
//! Source images are built from solid color bands so that any wrong crop,
//! offset or cell assignment shows up as a wrong color at a known pixel.
//! Opaque colors use only 0 and 255 channels so blending is exact.

#![cfg(feature = "raster")]

use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use zengrid::*;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn solid(w: u32, h: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(w, h, color)
}

/// Vertical bands of equal width, left to right.
fn bands(w: u32, h: u32, colors: &[Rgba<u8>]) -> RgbaImage {
    let n = colors.len() as u32;
    RgbaImage::from_fn(w, h, |x, _| colors[(x * n / w) as usize])
}

fn source_of(images: Vec<(&str, RgbaImage)>) -> ImageSource<RgbaImage> {
    let mut source = ImageSource::new();
    for (id, pixels) in images {
        source.register(ImageAsset::from_rgba(id, pixels).unwrap()).unwrap();
    }
    source
}

fn seq(ids: &[&str]) -> Sequence {
    Sequence::new()
        .append(ids.iter().map(|&id| AssetId::from(id)))
        .unwrap()
}

/// Every pixel of `rect` in `img` equals `color`; returns the first mismatch.
fn first_mismatch(img: &RgbaImage, rect: CellRect, color: Rgba<u8>) -> Option<(u32, u32, Rgba<u8>)> {
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let px = *img.get_pixel(x, y);
            if px != color {
                return Some((x, y, px));
            }
        }
    }
    None
}

#[test]
fn cover_shows_middle_band_of_wide_image() {
    let spec = GridSpec::new(1, 1).gap(0).canvas(300, 300);
    let source = source_of(vec![("wide", bands(900, 300, &[RED, GREEN, BLUE]))]);
    let surface = Compositor::new()
        .compose(&spec, &seq(&["wide"]), &source)
        .unwrap();
    assert_eq!(
        first_mismatch(surface.image(), CellRect::new(0, 0, 300, 300), GREEN),
        None
    );
    assert!(surface.is_settled());
}

#[test]
fn cover_crops_both_sides_equally() {
    // 200x100 red|blue into 100x100: drawn at x = -50, so the cell shows
    // source columns 50..150, half red then half blue.
    let spec = GridSpec::new(1, 1).gap(0).canvas(100, 100);
    let source = source_of(vec![("rb", bands(200, 100, &[RED, BLUE]))]);
    let surface = Compositor::new()
        .compose(&spec, &seq(&["rb"]), &source)
        .unwrap();
    let img = surface.image();
    assert_eq!(first_mismatch(img, CellRect::new(0, 0, 50, 100), RED), None);
    assert_eq!(first_mismatch(img, CellRect::new(50, 0, 50, 100), BLUE), None);
}

#[test]
fn upscaled_image_keeps_band_order() {
    let spec = GridSpec::new(1, 1).gap(0).canvas(100, 100);
    let source = source_of(vec![("tiny", bands(2, 1, &[RED, BLUE]))]);
    let surface = Compositor::new()
        .filter(FilterType::Nearest)
        .compose(&spec, &seq(&["tiny"]), &source)
        .unwrap();
    let img = surface.image();
    assert_eq!(first_mismatch(img, CellRect::new(0, 0, 40, 100), RED), None);
    assert_eq!(first_mismatch(img, CellRect::new(60, 0, 40, 100), BLUE), None);
}

#[test]
fn tall_image_crops_top_and_bottom() {
    // 100x300 top/middle/bottom bands into 100x100: only the middle shows.
    let tall = RgbaImage::from_fn(100, 300, |_, y| [RED, GREEN, BLUE][(y / 100) as usize]);
    let spec = GridSpec::new(1, 1).gap(0).canvas(100, 100);
    let source = source_of(vec![("tall", tall)]);
    let surface = Compositor::new()
        .compose(&spec, &seq(&["tall"]), &source)
        .unwrap();
    assert_eq!(
        first_mismatch(surface.image(), CellRect::new(0, 0, 100, 100), GREEN),
        None
    );
}

#[test]
fn gaps_stay_background() {
    let spec = GridSpec::new(2, 2)
        .gap(10)
        .canvas(210, 210)
        .background(CanvasColor::black());
    let source = source_of(vec![
        ("a", solid(37, 53, WHITE)),
        ("b", solid(300, 20, WHITE)),
        ("c", solid(100, 100, WHITE)),
        ("d", solid(1, 400, WHITE)),
    ]);
    let surface = Compositor::new()
        .filter(FilterType::Nearest)
        .compose(&spec, &seq(&["a", "b", "c", "d"]), &source)
        .unwrap();
    let img = surface.image();

    for (index, cell) in spec.cells().unwrap() {
        assert_eq!(first_mismatch(img, cell, WHITE), None, "cell {index}");
    }
    // Vertical and horizontal gap strips.
    assert_eq!(first_mismatch(img, CellRect::new(100, 0, 10, 210), BLACK), None);
    assert_eq!(first_mismatch(img, CellRect::new(0, 100, 210, 10), BLACK), None);
}

#[test]
fn empty_cells_show_background() {
    // Three cells, two images: the third cell is untouched background.
    let spec = GridSpec::new(1, 3).gap(0).canvas(300, 100);
    let source = source_of(vec![("r", solid(100, 100, RED)), ("b", solid(100, 100, BLUE))]);
    let surface = Compositor::new()
        .compose(&spec, &seq(&["r", "b"]), &source)
        .unwrap();
    let img = surface.image();
    assert_eq!(first_mismatch(img, CellRect::new(0, 0, 100, 100), RED), None);
    assert_eq!(first_mismatch(img, CellRect::new(100, 0, 100, 100), BLUE), None);
    assert_eq!(first_mismatch(img, CellRect::new(200, 0, 100, 100), WHITE), None);
    assert_eq!(surface.cell_asset(2), None);
    assert_eq!(surface.cell_asset(1), Some(&AssetId::from("b")));
}

#[test]
fn overflow_items_are_not_drawn() {
    let spec = GridSpec::new(1, 2).gap(0).canvas(200, 100);
    let source = source_of(vec![
        ("r", solid(10, 10, RED)),
        ("g", solid(10, 10, GREEN)),
        ("b", solid(10, 10, BLUE)),
    ]);
    let surface = Compositor::new()
        .filter(FilterType::Nearest)
        .compose(&spec, &seq(&["r", "g", "b"]), &source)
        .unwrap();
    assert_eq!(surface.overflow(), 1);
    let img = surface.image();
    assert_eq!(first_mismatch(img, CellRect::new(0, 0, 100, 100), RED), None);
    assert_eq!(first_mismatch(img, CellRect::new(100, 0, 100, 100), GREEN), None);
}

#[test]
fn contain_letterboxes_with_background() {
    let spec = GridSpec::new(1, 1)
        .gap(0)
        .canvas(200, 200)
        .background(CanvasColor::black())
        .fit(FitPolicy::Contain);
    let source = source_of(vec![("wide", solid(200, 100, WHITE))]);
    let surface = Compositor::new()
        .compose(&spec, &seq(&["wide"]), &source)
        .unwrap();
    let img = surface.image();
    assert_eq!(first_mismatch(img, CellRect::new(0, 0, 200, 50), BLACK), None);
    assert_eq!(first_mismatch(img, CellRect::new(0, 50, 200, 100), WHITE), None);
    assert_eq!(first_mismatch(img, CellRect::new(0, 150, 200, 50), BLACK), None);
}

#[test]
fn translucent_pixels_blend_over_background() {
    let spec = GridSpec::new(1, 1).gap(0).canvas(10, 10);
    let source = source_of(vec![
        ("half", solid(10, 10, Rgba([255, 0, 0, 128]))),
        ("clear", solid(10, 10, Rgba([0, 0, 255, 0]))),
    ]);

    let surface = Compositor::new()
        .compose(&spec, &seq(&["half"]), &source)
        .unwrap();
    let [r, g, b, a] = surface.image().get_pixel(5, 5).0;
    assert!(r >= 254);
    assert!((125..=129).contains(&g) && g == b, "({r},{g},{b})");
    assert!(a >= 254);

    let surface = Compositor::new()
        .compose(&spec, &seq(&["clear"]), &source)
        .unwrap();
    assert_eq!(surface.image().get_pixel(5, 5), &WHITE);
}

#[test]
fn pending_cell_stays_background_until_settled() {
    let spec = GridSpec::new(1, 2).gap(0).canvas(200, 100);
    let mut source = source_of(vec![("r", solid(100, 100, RED))]);
    source.begin_decode(AssetId::from("b")).unwrap();
    let sequence = seq(&["r", "b"]);
    let compositor = Compositor::new();

    let mut surface = compositor.compose(&spec, &sequence, &source).unwrap();
    assert_eq!(surface.pending_cells(), &[1]);
    assert_eq!(
        first_mismatch(surface.image(), CellRect::new(100, 0, 100, 100), WHITE),
        None
    );
    assert!(matches!(
        encode(&surface, ExportFormat::Png),
        Err(RasterError::Unsettled { pending: 1 })
    ));

    // Nothing resolved yet: settling draws nothing.
    assert_eq!(compositor.settle(&mut surface, &source).unwrap(), 0);

    let before = surface.image().clone();
    assert!(source.complete_decode(ImageAsset::from_rgba("b", solid(100, 100, BLUE)).unwrap()));
    assert_eq!(compositor.settle(&mut surface, &source).unwrap(), 1);
    assert!(surface.is_settled());

    let img = surface.image();
    assert_eq!(first_mismatch(img, CellRect::new(100, 0, 100, 100), BLUE), None);
    for y in 0..100 {
        for x in 0..100 {
            assert_eq!(img.get_pixel(x, y), before.get_pixel(x, y), "({x},{y})");
        }
    }
}

#[test]
fn composition_errors() {
    let source = source_of(vec![("a", solid(4, 4, RED))]);

    let bad = GridSpec::new(1, 3).gap(200).canvas(300, 300);
    assert!(matches!(
        Compositor::new().compose(&bad, &seq(&["a"]), &source),
        Err(GridError::InvalidGridConfiguration {
            axis: Axis::Horizontal,
            ..
        })
    ));

    let huge = GridSpec::new(1, 1).canvas(u32::MAX, u32::MAX);
    assert!(matches!(
        Compositor::new().compose(&huge, &seq(&["a"]), &source),
        Err(GridError::CanvasTooLarge { .. })
    ));

    // A gap never used on a single-cell grid does not matter.
    let lone = GridSpec::new(1, 1).gap(u32::MAX).canvas(20, 20);
    let surface = Compositor::new()
        .compose(&lone, &seq(&["a"]), &source)
        .unwrap();
    assert_eq!(
        first_mismatch(surface.image(), CellRect::new(0, 0, 20, 20), RED),
        None
    );

    let spec = GridSpec::new(1, 2);
    assert!(matches!(
        Compositor::new().compose(&spec, &seq(&["a", "ghost"]), &source),
        Err(GridError::UnknownAsset { id }) if id.as_str() == "ghost"
    ));
}

#[test]
fn png_export_is_lossless() {
    let spec = GridSpec::new(1, 2)
        .gap(4)
        .canvas(204, 100)
        .background(CanvasColor::Transparent);
    let source = source_of(vec![("r", solid(100, 100, RED)), ("g", solid(100, 100, GREEN))]);
    let surface = Compositor::new()
        .compose(&spec, &seq(&["r", "g"]), &source)
        .unwrap();

    let bytes = encode(&surface, ExportFormat::Png).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
    assert_eq!(decoded.dimensions(), (204, 100));
    assert_eq!(&decoded, surface.image());
    assert_eq!(decoded.get_pixel(101, 50), &Rgba([0, 0, 0, 0]));
}

#[test]
fn jpeg_export_drops_alpha() {
    let spec = GridSpec::new(1, 1).gap(0).canvas(64, 48);
    let source = source_of(vec![("r", solid(64, 48, RED))]);
    let surface = Compositor::new()
        .compose(&spec, &seq(&["r"]), &source)
        .unwrap();

    let bytes = encode(&surface, ExportFormat::jpeg()).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 48));
    assert!(!decoded.color().has_alpha());
    let [r, g, b] = decoded.to_rgb8().get_pixel(32, 24).0;
    assert!(r > 200 && g < 60 && b < 60, "({r},{g},{b})");
}

#[test]
fn decode_asset_from_encoded_bytes() {
    let spec = GridSpec::new(1, 1).gap(0).canvas(30, 20);
    let source = source_of(vec![("src", bands(30, 20, &[RED, BLUE]))]);
    let surface = Compositor::new()
        .compose(&spec, &seq(&["src"]), &source)
        .unwrap();
    let png = encode(&surface, ExportFormat::Png).unwrap();

    let asset = ImageAsset::decode("copy", &png).unwrap();
    assert_eq!(asset.size(), Size::new(30, 20));
    assert_eq!(asset.pixels().get_pixel(0, 0), &RED);

    assert!(matches!(
        ImageAsset::decode("junk", b"not an image"),
        Err(RasterError::Image(_))
    ));
}

// ---- Workspace ----

#[test]
fn workspace_out_of_order_decodes() {
    let mut ws = Workspace::new(GridSpec::new(1, 3).gap(0).canvas(300, 100));
    ws.begin_upload(["r", "g", "b"].map(AssetId::from)).unwrap();

    // Decodes finish in reverse order; the middle one last.
    assert!(ws.decoded(ImageAsset::from_rgba("b", solid(100, 100, BLUE)).unwrap()));
    assert!(ws.decoded(ImageAsset::from_rgba("r", solid(100, 100, RED)).unwrap()));

    let surface = ws.compose().unwrap();
    assert_eq!(surface.pending_cells(), &[1]);
    assert!(matches!(
        ws.export(ExportFormat::Png),
        Err(RasterError::Unsettled { pending: 1 })
    ));

    assert!(ws.decoded(ImageAsset::from_rgba("g", solid(100, 100, GREEN)).unwrap()));
    let bytes = ws.export(ExportFormat::Png).unwrap();
    let img = image::load_from_memory(&bytes).unwrap().into_rgba8();
    // Sequence order, not decode order.
    assert_eq!(img.get_pixel(50, 50), &RED);
    assert_eq!(img.get_pixel(150, 50), &GREEN);
    assert_eq!(img.get_pixel(250, 50), &BLUE);
}

#[test]
fn workspace_reorder_and_remove_redraw() {
    let mut ws = Workspace::new(GridSpec::new(1, 2).gap(0).canvas(200, 100));
    let report = ws.upload([
        ("r", solid(100, 100, RED)),
        ("g", solid(100, 100, GREEN)),
        ("b", solid(100, 100, BLUE)),
    ]);
    assert_eq!(report.accepted.len(), 3);
    assert_eq!(ws.session().overflow(), [AssetId::from("b")]);

    ws.move_to(2, 0).unwrap();
    let img = ws.compose().unwrap().into_image();
    assert_eq!(img.get_pixel(50, 50), &BLUE);
    assert_eq!(img.get_pixel(150, 50), &RED);

    ws.remove_at(0).unwrap();
    assert!(!ws.source().contains("b"));
    let img = ws.compose().unwrap().into_image();
    assert_eq!(img.get_pixel(50, 50), &RED);
    assert_eq!(img.get_pixel(150, 50), &GREEN);
}

#[test]
fn workspace_set_spec_keeps_order() {
    let mut ws = Workspace::new(GridSpec::new(1, 1).gap(0).canvas(100, 100));
    ws.upload([("r", solid(10, 10, RED)), ("g", solid(10, 10, GREEN))]);
    let revision = ws.session().revision();

    let err = ws.set_spec(GridSpec::new(1, 2).gap(100).canvas(100, 100));
    assert!(err.is_err());
    assert_eq!(ws.session().revision(), revision);

    let err = ws.set_spec(GridSpec::new(1, 1).canvas(u32::MAX, u32::MAX));
    assert!(matches!(err, Err(GridError::CanvasTooLarge { .. })));
    assert_eq!(ws.spec().canvas_width, 100);
    assert!(ws.compose().is_ok());

    ws.set_spec(GridSpec::new(2, 1).gap(0).canvas(100, 200)).unwrap();
    let surface = ws.compose().unwrap();
    assert_eq!((surface.width(), surface.height()), (100, 200));
    assert_eq!(surface.overflow(), 0);
    assert_eq!(surface.cell_asset(1), Some(&AssetId::from("g")));
}

#[cfg(feature = "options")]
#[test]
fn options_drive_composition_and_export() {
    let parsed = options::parse("rows=1&cols=2&gap=0&w=400&h=200&bg=black&format=jpg&quality=70");
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    let (spec, clamped) = parsed.options.apply(&GridSpec::default());
    assert!(clamped.is_empty());
    let (format, _) = parsed.options.export_format();
    assert_eq!(format, Some(ExportFormat::Jpeg { quality: 70 }));

    let mut ws = Workspace::new(spec);
    ws.upload([("w", solid(50, 50, WHITE))]);
    let bytes = ws.export(format.unwrap_or_default()).unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (400, 200));
    // Empty second cell: black background.
    let [r, g, b] = img.to_rgb8().get_pixel(300, 100).0;
    assert!(r < 20 && g < 20 && b < 20);
}
